//! Search options and their query-string encoding.
//!
//! # Design
//! Each option kind renders its non-default fields as `key=value` pairs in a
//! fixed order joined with `&`. Nothing is percent-encoded and no leading `?`
//! is emitted; the client adds the separator when it appends the query to an
//! endpoint path. Flags render as `key=yes` when set and are omitted
//! otherwise.
//!
//! `from_query` is the inverse used by tests and by callers that persist
//! searches as query strings. It ignores keys it does not know.

use serde::{Deserialize, Serialize};

use crate::normalize::parse_or_default;

const FLAG_SET: &str = "yes";

/// Conversion between a search option and its URL query string.
pub trait QueryOption: Sized {
    /// Render the non-default fields as `key=value&key=value`.
    fn to_query(&self) -> String;

    /// Rebuild an option from a query string produced by `to_query`.
    fn from_query(query: &str) -> Self;
}

/// Parking-spot search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPlacesOption {
    pub area: String,
    pub spot: String,
    /// Free-text match against spot names, sent as `q`.
    pub query: String,
}

/// Bike-count history search for one spot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCountsOption {
    pub area: String,
    pub spot: String,
    /// Day in `YYYYMMDD` form.
    pub day: String,
}

/// Nearest-spot search around a coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDistanceOption {
    pub lat: f64,
    pub lon: f64,
}

/// Usage-graph search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchGraphOption {
    pub area: String,
    pub spot: String,
    pub property: String,
    /// Days to plot, each `YYYYMMDD`. Sent comma-joined as `days`.
    pub days: Vec<String>,
    /// Ask the service to draw a title on the image.
    pub draw_title: bool,
    /// Ask the service to upload the image to imgur.
    pub upload_imgur: bool,
}

impl QueryOption for SearchPlacesOption {
    fn to_query(&self) -> String {
        QueryBuilder::default()
            .text("area", &self.area)
            .text("spot", &self.spot)
            .text("q", &self.query)
            .finish()
    }

    fn from_query(query: &str) -> Self {
        let mut option = Self::default();
        for (key, value) in pairs(query) {
            match key {
                "area" => option.area = value.to_string(),
                "spot" => option.spot = value.to_string(),
                "q" => option.query = value.to_string(),
                _ => {}
            }
        }
        option
    }
}

impl QueryOption for SearchCountsOption {
    fn to_query(&self) -> String {
        QueryBuilder::default()
            .text("area", &self.area)
            .text("spot", &self.spot)
            .text("day", &self.day)
            .finish()
    }

    fn from_query(query: &str) -> Self {
        let mut option = Self::default();
        for (key, value) in pairs(query) {
            match key {
                "area" => option.area = value.to_string(),
                "spot" => option.spot = value.to_string(),
                "day" => option.day = value.to_string(),
                _ => {}
            }
        }
        option
    }
}

impl QueryOption for SearchDistanceOption {
    fn to_query(&self) -> String {
        QueryBuilder::default()
            .number("lat", self.lat)
            .number("lon", self.lon)
            .finish()
    }

    fn from_query(query: &str) -> Self {
        let mut option = Self::default();
        for (key, value) in pairs(query) {
            match key {
                "lat" => option.lat = parse_or_default(value),
                "lon" => option.lon = parse_or_default(value),
                _ => {}
            }
        }
        option
    }
}

impl QueryOption for SearchGraphOption {
    fn to_query(&self) -> String {
        QueryBuilder::default()
            .text("area", &self.area)
            .text("spot", &self.spot)
            .text("property", &self.property)
            .list("days", &self.days)
            .flag("title", self.draw_title)
            .flag("imgur", self.upload_imgur)
            .finish()
    }

    fn from_query(query: &str) -> Self {
        let mut option = Self::default();
        for (key, value) in pairs(query) {
            match key {
                "area" => option.area = value.to_string(),
                "spot" => option.spot = value.to_string(),
                "property" => option.property = value.to_string(),
                "days" if !value.is_empty() => {
                    option.days = value.split(',').map(str::to_string).collect();
                }
                "title" => option.draw_title = value == FLAG_SET,
                "imgur" => option.upload_imgur = value == FLAG_SET,
                _ => {}
            }
        }
        option
    }
}

/// Accumulates `key=value` pairs, skipping default values.
#[derive(Default)]
struct QueryBuilder {
    params: Vec<String>,
}

impl QueryBuilder {
    fn text(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.params.push(format!("{key}={value}"));
        }
        self
    }

    fn number(mut self, key: &str, value: f64) -> Self {
        if value != 0.0 {
            self.params.push(format!("{key}={value}"));
        }
        self
    }

    fn list(mut self, key: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.params.push(format!("{key}={}", values.join(",")));
        }
        self
    }

    fn flag(mut self, key: &str, set: bool) -> Self {
        if set {
            self.params.push(format!("{key}={FLAG_SET}"));
        }
        self
    }

    fn finish(self) -> String {
        self.params.join("&")
    }
}

/// Split a query string into `(key, value)` pairs. A pair without `=` has an
/// empty value; a leading `?` is tolerated.
fn pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .strip_prefix('?')
        .unwrap_or(query)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}
