use crate::services::composer;
use crate::services::metrics::{
    COMPOSITES_RENDERED, IMAGE_ERRORS, RANDOM_INDEX_SUBSTITUTIONS, RAW_IMAGES_SERVED,
};
use crate::startup::AppState;
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::counter;
use rand::Rng;
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::Path as FsPath;
use tokio_util::io::ReaderStream;

pub const DATASET_INDEX_HEADER: &str = "x-dataset-index";
pub const MASK_LABEL_HEADER: &str = "x-mask-label";

/// Picks the row to render: the requested index when it is in `[0, len)`,
/// otherwise a uniformly random one. `None` only for an empty dataset.
pub fn choose_index<R: Rng + ?Sized>(
    requested: Option<i64>,
    len: usize,
    rng: &mut R,
) -> Option<(usize, bool)> {
    if len == 0 {
        return None;
    }
    match requested.and_then(|i| usize::try_from(i).ok()) {
        Some(i) if i < len => Some((i, false)),
        _ => Some((rng.gen_range(0..len), true)),
    }
}

/// Parses an `{index}` path segment. Any integer is accepted, of any size;
/// `Ok(None)` means it does not fit in an `i64` and so addresses no row.
pub fn parse_index(segment: &str) -> Result<Option<i64>, AppError> {
    let digits = segment
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid index: '{}' is not an integer",
            segment
        )));
    }
    Ok(segment.parse::<i64>().ok())
}

fn index_from_path(path: Result<Path<String>, PathRejection>) -> Result<Option<i64>, AppError> {
    let Path(segment) = path
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid index: {}", e.body_text())))?;
    parse_index(&segment)
}

/// `GET /image` - composite for a random row.
pub async fn get_random_composite_image(
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    render_composite(state, None).await
}

/// `GET /image/{index}` - composite for `index`, or a random row when it is out of range.
pub async fn get_composite_image(
    State(state): State<AppState>,
    index: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let index = index_from_path(index)?;
    render_composite(state, index).await
}

async fn render_composite(state: AppState, requested: Option<i64>) -> Result<Response, AppError> {
    let (index, random) = {
        let mut rng = rand::thread_rng();
        choose_index(requested, state.dataset.len(), &mut rng)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Dataset is empty")))?
    };
    if random {
        counter!(RANDOM_INDEX_SUBSTITUTIONS).increment(1);
    }

    let row = state.dataset.rows()[index].clone();
    let image_path = state.dataset.resolve(&row.image_path);
    let mask_path = state.dataset.resolve(&row.mask_path);

    tracing::info!(
        requested = ?requested,
        index,
        random,
        image_path = %image_path.display(),
        mask_path = %mask_path.display(),
        "Rendering composite"
    );

    let mri_bytes = read_source(&image_path, "Image not found").await?;
    let mask_bytes = read_source(&mask_path, "Mask not found").await?;

    let renderer = state.renderer.clone();
    let label = row.mask_label.clone();
    let composite = tokio::task::spawn_blocking(move || {
        let mri = composer::decode("MRI image", &mri_bytes)?;
        let mask = composer::decode("mask", &mask_bytes)?;
        renderer.render(&mri, &mask, &label)
    })
    .await
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Render task failed: {}", e)))?
    .map_err(|e| {
        counter!(IMAGE_ERRORS, "kind" => "decode").increment(1);
        tracing::error!(index, error = %e, "Failed to render composite");
        e
    })?;

    counter!(COMPOSITES_RENDERED).increment(1);
    tracing::info!(
        index,
        bytes = composite.png.len(),
        width = composite.width,
        height = composite.height,
        caption = %composite.right_caption,
        "Composite rendered"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(DATASET_INDEX_HEADER, HeaderValue::from(index as u64));
    // Labels that are not valid header text are simply not echoed
    if let Ok(value) = HeaderValue::from_str(&row.mask_label) {
        headers.insert(MASK_LABEL_HEADER, value);
    }

    Ok((StatusCode::OK, headers, composite.png).into_response())
}

async fn read_source(path: &FsPath, missing_message: &'static str) -> Result<Vec<u8>, AppError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            counter!(IMAGE_ERRORS, "kind" => "missing").increment(1);
            tracing::warn!(path = %path.display(), "Source file missing");
            AppError::NotFound(anyhow::anyhow!(missing_message))
        } else {
            AppError::InternalError(anyhow::anyhow!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        }
    })
}

/// `GET /raw_image/{index}` - the literal bytes of the row's image file.
pub async fn get_raw_image(
    State(state): State<AppState>,
    index: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    // Integers too large for an i64 are out of range like any other
    let index = index_from_path(index)?;

    let row = index
        .and_then(|i| state.dataset.get(i))
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Index out of bounds")))?;
    let path = state.dataset.resolve(&row.image_path);

    let image_not_found = || {
        counter!(IMAGE_ERRORS, "kind" => "missing").increment(1);
        tracing::warn!(index = ?index, path = %path.display(), "Raw image missing");
        AppError::NotFound(anyhow::anyhow!("Image not found"))
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(image_not_found()),
        Err(e) => return Err(AppError::from(e)),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(image_not_found());
    }

    counter!(RAW_IMAGES_SERVED).increment(1);
    tracing::info!(
        index = ?index,
        path = %path.display(),
        bytes = metadata.len(),
        "Serving raw image"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_LENGTH, HeaderValue::from(metadata.len())),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
