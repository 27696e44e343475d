#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use mri_image_service::config::{DatasetConfig, MriConfig, RenderConfig};
use mri_image_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::io::Cursor;
use std::path::PathBuf;
use uuid::Uuid;

pub const PANEL_SIZE: u32 = 64;

/// Three rows with relative paths, labels 0/1/1.
pub const STANDARD_CSV: &str = "\
patient_id,image_path,mask_path,mask
TCGA_A,scans/a_1.jpg,scans/a_1_mask.png,0
TCGA_A,scans/a_2.jpg,scans/a_2_mask.png,1
TCGA_B,scans/b_1.jpg,scans/b_1_mask.png,1
";

pub fn jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg)
        .expect("Failed to encode JPEG fixture");
    buffer.into_inner()
}

pub fn png_mask(width: u32, height: u32, level: u8) -> Vec<u8> {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([level])));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    buffer.into_inner()
}

pub fn standard_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("scans/a_1.jpg", jpeg(40, 40, [90, 90, 90])),
        ("scans/a_1_mask.png", png_mask(40, 40, 0)),
        ("scans/a_2.jpg", jpeg(48, 32, [120, 60, 60])),
        ("scans/a_2_mask.png", png_mask(48, 32, 255)),
        ("scans/b_1.jpg", jpeg(20, 30, [30, 30, 160])),
        ("scans/b_1_mask.png", png_mask(20, 30, 255)),
    ]
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(STANDARD_CSV, standard_files()).await
    }

    /// Writes `csv` and `files` into a fresh directory and serves them.
    pub async fn spawn_with(csv: &str, files: Vec<(&str, Vec<u8>)>) -> Self {
        let data_dir = write_fixture(csv, files);
        let app = Application::build(test_config(&data_dir))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            data_dir,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn file_bytes(&self, relative: &str) -> Vec<u8> {
        std::fs::read(self.data_dir.join(relative)).expect("Fixture file missing")
    }

    /// Cleanup test resources.
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.data_dir).await;
    }
}

pub fn write_fixture(csv: &str, files: Vec<(&str, Vec<u8>)>) -> PathBuf {
    let data_dir = PathBuf::from(format!("target/test-data-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&data_dir).expect("Failed to create fixture directory");

    for (relative, bytes) in files {
        let path = data_dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        std::fs::write(path, bytes).expect("Failed to write fixture file");
    }
    std::fs::write(data_dir.join("data_mask.csv"), csv).expect("Failed to write dataset CSV");

    data_dir
}

pub fn test_config(data_dir: &std::path::Path) -> MriConfig {
    MriConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        dataset: DatasetConfig {
            csv_path: data_dir.join("data_mask.csv"),
            image_root: Some(data_dir.to_path_buf()),
        },
        render: RenderConfig {
            panel_size: PANEL_SIZE,
            caption_scale: 1,
        },
        otlp_endpoint: None,
    }
}
