pub mod health;
pub mod images;
pub mod root;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use images::{get_composite_image, get_random_composite_image, get_raw_image};
pub use root::read_root;
