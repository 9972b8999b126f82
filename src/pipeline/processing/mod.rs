// Pipeline processing: field derivation, genre expansion, and aggregation

pub mod aggregate;
pub mod derive;
pub mod explode;

// Re-export key types and functions
pub use aggregate::{GroupMean, ValueCount};
pub use derive::derive_year;
pub use explode::explode_genres;
