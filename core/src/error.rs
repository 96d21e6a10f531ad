//! Error types for the bike-share API client.
//!
//! # Design
//! Only whole-call failures are errors. A field inside a document that fails
//! to coerce (a latitude of `"abc"`, a count of `"seven"`) is absorbed by the
//! normalizer and never reaches this enum. HTTP status codes are not mapped
//! here either: the service signals failure through undecodable bodies, so a
//! bad status surfaces as `Decode`.

use thiserror::Error;

/// Errors returned by `BikeshareClient` and `Transport` implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the round-trip (connection refused,
    /// DNS failure, TLS error, ...). The message is passed through verbatim.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be decoded into the expected wire document.
    #[error("decode failed: {0}")]
    Decode(String),

    /// A request payload could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The distances document returned item and distance lists of different
    /// lengths, so they cannot be paired by position.
    #[error("distance list has {distances} entries but {items} items were returned")]
    DistanceMismatch { items: usize, distances: usize },

    /// Client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}
