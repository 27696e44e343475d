use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One sample of the table: an MRI slice, its segmentation mask and the mask label.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatasetRow {
    pub image_path: String,
    pub mask_path: String,
    /// Kept verbatim so the caption shows the cell as written (`1`, `0`, `1.0`, ...).
    #[serde(rename = "mask")]
    pub mask_label: String,
}

/// Read-only table of rows, addressed by 0-based position.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
    image_root: Option<PathBuf>,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>, image_root: Option<PathBuf>) -> Self {
        Self { rows, image_root }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, or `None` when `index` is negative or past the end.
    pub fn get(&self, index: i64) -> Option<&DatasetRow> {
        usize::try_from(index).ok().and_then(|i| self.rows.get(i))
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Resolves a path stored in the table. Relative paths are joined onto the
    /// image root when one is configured.
    pub fn resolve(&self, stored: &str) -> PathBuf {
        let path = Path::new(stored);
        match &self.image_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
