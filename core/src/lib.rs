//! Synchronous client core for the bike-share information service.
//!
//! # Overview
//! Encodes typed search options into query strings, and normalizes the
//! service's loosely typed JSON (string-encoded numbers, per-endpoint field
//! subsets) into a small set of domain entities.
//!
//! # Design
//! - `BikeshareClient` holds only immutable configuration and is safe to share.
//! - Each endpoint is split into `build_*` (produces a request) and `parse_*`
//!   (consumes a response); `fetch_*` joins them through a `Transport`.
//! - Wire documents (`wire`) never escape the crate's normalizer; callers only
//!   see `types`.
//! - Field-level coercion failures are absorbed (zero value, or a skipped
//!   count entry); only transport and top-level decode failures are errors.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod query;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::BikeshareClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::parse_or_default;
pub use query::{
    QueryOption, SearchCountsOption, SearchDistanceOption, SearchGraphOption, SearchPlacesOption,
};
pub use transport::Transport;
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use types::{BikeCount, DistanceInfo, GraphInfo, SpotDistance, SpotInfo, SpotName, User};
