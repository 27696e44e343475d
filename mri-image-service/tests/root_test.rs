mod common;

use common::TestApp;
use mri_image_service::handlers::root::WELCOME_MESSAGE;
use reqwest::StatusCode;

const EXPECTED: &str =
    "Welcome to the Brain MRI API. Use /image/{index} to get an MRI image and mask.";

#[tokio::test]
async fn root_returns_welcome_message() {
    let app = TestApp::spawn().await;

    let response = app.get("/").await;
    assert_eq!(StatusCode::OK, response.status());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, serde_json::json!({ "message": EXPECTED }));
    assert_eq!(WELCOME_MESSAGE, EXPECTED);

    app.cleanup().await;
}

#[tokio::test]
async fn root_is_independent_of_dataset_contents() {
    let app = TestApp::spawn_with("image_path,mask_path,mask\n", vec![]).await;

    let body: serde_json::Value = app.get("/").await.json().await.unwrap();
    assert_eq!(body["message"], EXPECTED);

    app.cleanup().await;
}
