pub mod types;
pub mod classification;

pub use types::HexstrikeError;
pub(crate) use types::sql_err;
pub use classification::ErrorClassification;
