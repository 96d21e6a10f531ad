//! Wire documents exactly as the service emits them.
//!
//! # Design
//! Field names mirror the JSON. Every numeric value except `num` is a string
//! on the wire, and stays a string here; coercion belongs to the normalizer.
//! Item fields default when absent so that a sparse item still decodes and
//! the normalizer can apply its zero-on-failure policy. Each document's
//! defining key (`items`, `counts`, `users`, the graph fields) is required,
//! so a document that is not JSON, or whose top level has the wrong shape,
//! fails to decode.

use serde::{Deserialize, Serialize};

/// Most recent single observation embedded in a spot listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireRecent {
    pub count: String,
    pub datetime: String,
}

/// One spot in a places listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePlace {
    pub area: String,
    pub spot: String,
    pub description: String,
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub recent: WireRecent,
}

/// `GET places` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacesDocument {
    #[serde(default)]
    pub num: i64,
    pub items: Vec<WirePlace>,
}

/// One historical observation in a counts document. The split date parts
/// duplicate `datetime` and are not used for normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCount {
    pub count: String,
    pub datetime: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
    pub month: String,
    pub year: String,
}

/// `GET counts` response: a single spot with its full history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountsDocument {
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub spot: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
    #[serde(default)]
    pub name: String,
    pub counts: Vec<WireCount>,
}

/// One spot in a distances listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireDistancePlace {
    pub area: String,
    pub spot: String,
    pub description: String,
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub distance: Option<String>,
    pub recent: WireRecent,
}

/// `GET distances` response. Distances arrive either per item or as a
/// top-level list parallel to `items`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistancesDocument {
    #[serde(default)]
    pub num: i64,
    pub items: Vec<WireDistancePlace>,
    #[serde(default)]
    pub distances: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireSpotName {
    pub area: String,
    pub spot: String,
    pub name: String,
}

/// `GET all_places` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllPlacesDocument {
    #[serde(default)]
    pub num: i64,
    pub items: Vec<WireSpotName>,
}

/// `GET graph` response. All four fields are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDocument {
    pub title: String,
    pub width: String,
    pub height: String,
    pub url: String,
}

/// A user record. Also the request body of the user-update post.
/// `line_id` is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUser {
    pub line_id: String,
    #[serde(default)]
    pub slack_id: String,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub histories: Vec<String>,
    #[serde(default)]
    pub notifies: Vec<String>,
}

/// `GET users` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersDocument {
    pub users: Vec<WireUser>,
}
