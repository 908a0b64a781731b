pub mod types;
pub mod classification;

pub use types::KeyrunError;
pub use classification::ErrorClassification;
