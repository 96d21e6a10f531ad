//! Conversion from wire documents to domain entities.
//!
//! # Coercion policy
//! - Scalar numerics (`lat`, `lon`, graph `width`/`height`) go through
//!   [`parse_or_default`]: a value that fails to parse becomes zero and the
//!   enclosing entity is still produced.
//! - A count observation goes through [`BikeCount::parse`]: if either half
//!   fails the observation is dropped, because a zero timestamp would be a
//!   false data point.
//! - Distances are paired with items by position and the two lists must have
//!   equal length.

use std::str::FromStr;

use tracing::debug;

use crate::error::ApiError;
use crate::query::SearchDistanceOption;
use crate::types::{BikeCount, DistanceInfo, GraphInfo, SpotDistance, SpotInfo, SpotName, User};
use crate::wire::{
    AllPlacesDocument, CountsDocument, DistancesDocument, GraphDocument, PlacesDocument,
    UsersDocument, WireRecent, WireUser,
};

/// Parse `value`, falling back to `T::default()` when it does not parse.
///
/// This is the only place the zero-on-failure policy lives.
pub fn parse_or_default<T>(value: &str) -> T
where
    T: FromStr + Default,
{
    value.parse().unwrap_or_default()
}

/// Parse one observation, logging it when it has to be skipped.
fn bike_count(datetime: &str, count: &str) -> Option<BikeCount> {
    let parsed = BikeCount::parse(datetime, count);
    if parsed.is_none() {
        debug!(datetime, count, "skipping unparseable bike count");
    }
    parsed
}

fn recent_counts(recent: &WireRecent) -> Vec<BikeCount> {
    bike_count(&recent.datetime, &recent.count).into_iter().collect()
}

/// Identity and position of a spot as every listing carries them.
struct WireSpot {
    area: String,
    spot: String,
    name: String,
    description: String,
    lat: String,
    lon: String,
}

/// The one place wire coordinates become `SpotInfo` coordinates.
fn spot_info(wire: WireSpot, counts: Vec<BikeCount>) -> SpotInfo {
    SpotInfo {
        lat: parse_or_default(&wire.lat),
        lon: parse_or_default(&wire.lon),
        area: wire.area,
        spot: wire.spot,
        name: wire.name,
        description: wire.description,
        counts,
    }
}

pub fn normalize_places(doc: PlacesDocument) -> Vec<SpotInfo> {
    let spots: Vec<SpotInfo> = doc
        .items
        .into_iter()
        .map(|item| {
            let counts = recent_counts(&item.recent);
            let spot = WireSpot {
                area: item.area,
                spot: item.spot,
                name: item.name,
                description: item.description,
                lat: item.lat,
                lon: item.lon,
            };
            spot_info(spot, counts)
        })
        .collect();
    debug!(reported = doc.num, spots = spots.len(), "normalized places");
    spots
}

pub fn normalize_counts(doc: CountsDocument) -> SpotInfo {
    let counts: Vec<BikeCount> = doc
        .counts
        .iter()
        .filter_map(|c| bike_count(&c.datetime, &c.count))
        .collect();
    debug!(
        received = doc.counts.len(),
        kept = counts.len(),
        "normalized counts"
    );
    let spot = WireSpot {
        area: doc.area,
        spot: doc.spot,
        name: doc.name,
        description: doc.description,
        lat: doc.lat,
        lon: doc.lon,
    };
    spot_info(spot, counts)
}

/// Pair each item with its distance. The base coordinates come from the
/// request, not the response.
pub fn normalize_distances(
    option: &SearchDistanceOption,
    doc: DistancesDocument,
) -> Result<DistanceInfo, ApiError> {
    let distances: Vec<String> = match doc.distances {
        Some(list) => list,
        None => doc
            .items
            .iter()
            .filter_map(|item| item.distance.clone())
            .collect(),
    };
    if distances.len() != doc.items.len() {
        return Err(ApiError::DistanceMismatch {
            items: doc.items.len(),
            distances: distances.len(),
        });
    }

    let spots = doc
        .items
        .into_iter()
        .zip(distances)
        .map(|(item, distance)| {
            let counts = recent_counts(&item.recent);
            let spot = WireSpot {
                area: item.area,
                spot: item.spot,
                name: item.name,
                description: item.description,
                lat: item.lat,
                lon: item.lon,
            };
            SpotDistance {
                spot: spot_info(spot, counts),
                distance,
            }
        })
        .collect();

    Ok(DistanceInfo {
        base_lat: option.lat,
        base_lon: option.lon,
        spots,
    })
}

pub fn normalize_spot_names(doc: AllPlacesDocument) -> Vec<SpotName> {
    doc.items
        .into_iter()
        .map(|item| SpotName {
            area: item.area,
            spot: item.spot,
            name: item.name,
        })
        .collect()
}

pub fn normalize_graph(doc: GraphDocument) -> GraphInfo {
    GraphInfo {
        width: parse_or_default(&doc.width),
        height: parse_or_default(&doc.height),
        title: doc.title,
        url: doc.url,
    }
}

pub fn normalize_users(doc: UsersDocument) -> Vec<User> {
    doc.users.into_iter().map(User::from).collect()
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            line_id: wire.line_id,
            slack_id: wire.slack_id,
            favorites: wire.favorites,
            histories: wire.histories,
            notifies: wire.notifies,
        }
    }
}

impl From<&User> for WireUser {
    fn from(user: &User) -> Self {
        Self {
            line_id: user.line_id.clone(),
            slack_id: user.slack_id.clone(),
            favorites: user.favorites.clone(),
            histories: user.histories.clone(),
            notifies: user.notifies.clone(),
        }
    }
}
