//! Error types for dual-diagram configuration.

use thiserror::Error;

/// Errors raised by configuration of the dual extraction.
///
/// Geometric failures (duplicate sites, points outside the hull) are not
/// errors; they are reported as `false` / `None` by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The center calculator name is not one of the known kinds.
    #[error("unknown center calculator: {name:?}")]
    UnknownCenter {
        /// The name that failed to parse.
        name: String,
    },

    /// The radius used for vertices at infinity must be positive and finite.
    #[error("invalid radius for vertices at infinity: {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
