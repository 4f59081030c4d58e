//! Data module - CSV loading and normalization

mod loader;
mod normalizer;
pub mod variant;

pub use loader::{DataLoader, LoaderError};
pub use normalizer::{DataNormalizer, NormalizeError};
pub use variant::DatasetVariant;
