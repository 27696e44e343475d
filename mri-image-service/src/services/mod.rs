pub mod caption;
pub mod composer;
pub mod dataset_loader;
pub mod metrics;

pub use composer::{Composite, CompositeRenderer};
pub use dataset_loader::load_dataset;
pub use self::metrics::{get_metrics, init_metrics};
