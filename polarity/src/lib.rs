pub mod error;
pub mod from_pretrained;

pub use error::Error;
pub use from_pretrained::FromPretrainedParameters;

/// A type alias for `Result<T, Error>` for the `polarity` crates.
pub type Result<T> = std::result::Result<T, Error>;
