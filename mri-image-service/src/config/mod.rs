use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct MriConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub dataset: DatasetConfig,
    pub render: RenderConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// CSV table with `image_path`, `mask_path` and `mask` columns.
    pub csv_path: PathBuf,
    /// Base directory for relative paths inside the table.
    pub image_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub panel_size: u32,
    pub caption_scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            panel_size: 256,
            caption_scale: 2,
        }
    }
}

impl MriConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(MriConfig {
            common: common_config,
            dataset: DatasetConfig {
                csv_path: get_env("DATASET_CSV_PATH", Some("data_mask.csv"), is_prod)?.into(),
                image_root: env::var("DATASET_IMAGE_ROOT").ok().map(PathBuf::from),
            },
            render: RenderConfig {
                panel_size: parse_positive(
                    "RENDER_PANEL_SIZE",
                    &get_env("RENDER_PANEL_SIZE", Some("256"), is_prod)?,
                )?,
                caption_scale: parse_positive(
                    "RENDER_CAPTION_SCALE",
                    &get_env("RENDER_CAPTION_SCALE", Some("2"), is_prod)?,
                )?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a positive integer, got '{}'",
            key,
            raw
        ))),
    }
}
