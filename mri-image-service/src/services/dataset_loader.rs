//! Startup loading of the dataset table.
//!
//! The table is a CSV file with a header row. Only `image_path`, `mask_path`
//! and `mask` are read; any other columns are ignored.

use crate::models::{Dataset, DatasetRow};
use csv::{ReaderBuilder, Trim};
use service_core::error::AppError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const REQUIRED_COLUMNS: [&str; 3] = ["image_path", "mask_path", "mask"];

/// Loads the table at `path`. Any failure here is fatal for startup.
pub fn load_dataset(path: &Path, image_root: Option<PathBuf>) -> Result<Dataset, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::DatasetError(anyhow::anyhow!(
            "Failed to open dataset {}: {}",
            path.display(),
            e
        ))
    })?;

    let rows = read_rows(file).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Dataset is malformed");
        e
    })?;

    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        image_root = ?image_root,
        "Dataset loaded"
    );

    Ok(Dataset::new(rows, image_root))
}

/// Parses rows from any CSV source, in file order.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<DatasetRow>, AppError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| AppError::DatasetError(anyhow::anyhow!("Failed to read header: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DatasetError(anyhow::anyhow!(
            "Missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<DatasetRow>().enumerate() {
        let line = i + 1;
        let row = result.map_err(|e| {
            AppError::DatasetError(anyhow::anyhow!("Malformed row {}: {}", line, e))
        })?;

        if row.image_path.is_empty() || row.mask_path.is_empty() {
            return Err(AppError::DatasetError(anyhow::anyhow!(
                "Row {} has an empty image or mask path",
                line
            )));
        }

        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_in_order_ignoring_extra_columns() {
        let csv = "\
patient_id,image_path,mask_path,mask
TCGA_1,a/1.tif,a/1_mask.tif,0
TCGA_2,a/2.tif,a/2_mask.tif,1
";
        let rows = read_rows(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].image_path, "a/1.tif");
        assert_eq!(rows[1].mask_path, "a/2_mask.tif");
        assert_eq!(rows[1].mask_label, "1");
    }

    #[test]
    fn column_order_does_not_matter() {
        let csv = "mask,mask_path,image_path\ntumor, m.png , i.png\n";
        let rows = read_rows(csv.as_bytes()).unwrap();

        assert_eq!(
            rows,
            vec![DatasetRow {
                image_path: "i.png".to_string(),
                mask_path: "m.png".to_string(),
                mask_label: "tumor".to_string(),
            }]
        );
    }

    #[test]
    fn header_only_table_is_empty_not_an_error() {
        let rows = read_rows("image_path,mask_path,mask\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read_rows("image_path,mask_path\na.tif,b.tif\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::DatasetError(_)));
        assert!(err.to_string().contains("mask"));
    }

    #[test]
    fn ragged_row_reports_line() {
        let csv = "image_path,mask_path,mask\na.tif,b.tif,1\nc.tif,d.tif\n";
        let err = read_rows(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Malformed row 2"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let csv = "image_path,mask_path,mask\n,b.tif,1\n";
        assert!(read_rows(csv.as_bytes()).is_err());
    }

    #[test]
    fn missing_file_fails_load() {
        let err = load_dataset(Path::new("definitely/not/here.csv"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to open dataset"));
    }
}
