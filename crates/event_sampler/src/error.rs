//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! rejected weights, out-of-range indices, invalid configuration, and generic errors.
//!
//! Only caller mistakes that can be reported are errors. A key equal to
//! [`crate::queue::SENTINEL`] and `pop` on a [`crate::queue::PlaceboQueue`] panic instead,
//! and all-zero weights or a collapsing rejection efficiency are handled inside the samplers.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid weight {value} at index {index}: weights must be finite and non-negative")]
    InvalidWeight { index: usize, value: f64 },

    #[error("index {index} out of range for {len} weights")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn invalid_weight_message_names_index_and_value() {
        let err = Error::InvalidWeight {
            index: 3,
            value: -1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 3"));
        assert!(msg.contains("-1.5"));
    }

    #[test]
    fn out_of_range_message() {
        let err = Error::IndexOutOfRange { index: 9, len: 4 };
        assert_eq!(err.to_string(), "index 9 out of range for 4 weights");
    }
}
