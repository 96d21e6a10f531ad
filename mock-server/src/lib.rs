//! In-memory stand-in for the bike-share information service.
//!
//! Serves the same JSON shapes as the real service, including its habit of
//! encoding every number as a string, from a fixed set of spots. Users can be
//! listed and upserted.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

/// Header the real service reads the client certificate from.
pub const CERT_HEADER: &str = "cert";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recent {
    pub count: String,
    pub datetime: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Place {
    pub area: String,
    pub spot: String,
    pub description: String,
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub recent: Recent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacesBody {
    pub num: usize,
    pub items: Vec<Place>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Count {
    pub count: String,
    pub datetime: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
    pub month: String,
    pub year: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountsBody {
    pub area: String,
    pub spot: String,
    pub description: String,
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub counts: Vec<Count>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistancePlace {
    pub area: String,
    pub spot: String,
    pub description: String,
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub distance: String,
    pub recent: Recent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistancesBody {
    pub num: usize,
    pub items: Vec<DistancePlace>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpotName {
    pub area: String,
    pub spot: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllPlacesBody {
    pub num: usize,
    pub items: Vec<SpotName>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphBody {
    pub title: String,
    pub width: String,
    pub height: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
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

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsersBody {
    pub users: Vec<User>,
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// A spot and its observation history, oldest first. Timestamps use the
/// service's `YYYY/MM/DD hh:mm` layout.
#[derive(Clone, Debug)]
pub struct SpotRecord {
    pub area: &'static str,
    pub spot: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub history: Vec<(&'static str, u32)>,
}

pub fn seed_spots() -> Vec<SpotRecord> {
    vec![
        SpotRecord {
            area: "A1",
            spot: "01",
            name: "Chiyoda City Office",
            description: "Kudan-minami 1-2-1, east side of the building",
            lat: 35.694_003,
            lon: 139.753_595,
            history: vec![
                ("2020/05/04 12:00", 4),
                ("2020/05/05 12:00", 7),
                ("2020/05/05 12:20", 6),
                ("2020/05/05 12:40", 9),
            ],
        },
        SpotRecord {
            area: "A1",
            spot: "02",
            name: "Kudanshita Station",
            description: "Exit 4",
            lat: 35.695_589,
            lon: 139.751_16,
            history: vec![("2020/05/05 12:00", 3), ("2020/05/05 12:20", 2)],
        },
        SpotRecord {
            area: "D1",
            spot: "01",
            name: "Shinjuku Station West Exit",
            description: "Under the bus terminal",
            lat: 35.690_921,
            lon: 139.699_258,
            history: vec![("2020/05/05 12:00", 12), ("2020/05/05 12:20", 10)],
        },
        SpotRecord {
            area: "D1",
            spot: "02",
            name: "Shinjuku City Office",
            description: "Kabukicho 1-4-1",
            lat: 35.693_825,
            lon: 139.703_356,
            history: vec![("2020/05/05 12:00", 0)],
        },
    ]
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MockState {
    pub spots: Vec<SpotRecord>,
    pub users: Vec<User>,
    /// When set, every request must carry this value in the `cert` header.
    pub cert: Option<String>,
}

pub type Db = Arc<RwLock<MockState>>;

type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    app_with_cert(None)
}

pub fn app_with_cert(cert: Option<String>) -> Router {
    let db: Db = Arc::new(RwLock::new(MockState {
        spots: seed_spots(),
        users: Vec::new(),
        cert,
    }));
    Router::new()
        .route("/places", get(places))
        .route("/counts", get(counts))
        .route("/distances", get(distances))
        .route("/all_places", get(all_places))
        .route("/graph", get(graph))
        .route("/users", get(list_users).post(upsert_user))
        .with_state(db)
}

pub async fn run_app(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock bike-share service listening");
    axum::serve(listener, app).await
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map_or("", String::as_str)
}

/// Reject the request with a plain-text body, as the real service does,
/// unless the configured certificate matches.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.cert else {
        return Ok(());
    };
    let given = headers.get(CERT_HEADER).and_then(|v| v.to_str().ok());
    if given == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid certificate").into_response())
    }
}

fn fmt_coord(value: f64) -> String {
    format!("{value}")
}

fn recent(record: &SpotRecord) -> Recent {
    record
        .history
        .last()
        .map(|(datetime, count)| Recent {
            count: count.to_string(),
            datetime: (*datetime).to_string(),
        })
        .unwrap_or(Recent {
            count: String::new(),
            datetime: String::new(),
        })
}

fn place(record: &SpotRecord) -> Place {
    Place {
        area: record.area.to_string(),
        spot: record.spot.to_string(),
        description: record.description.to_string(),
        lat: fmt_coord(record.lat),
        lon: fmt_coord(record.lon),
        name: record.name.to_string(),
        recent: recent(record),
    }
}

/// Split `YYYY/MM/DD hh:mm` into the separate string parts the counts
/// endpoint repeats alongside each observation.
fn count(datetime: &str, value: u32) -> Count {
    let (date, time) = datetime.split_once(' ').unwrap_or((datetime, ""));
    let mut date_parts = date.splitn(3, '/');
    let year = date_parts.next().unwrap_or_default();
    let month = date_parts.next().unwrap_or_default();
    let day = date_parts.next().unwrap_or_default();
    let (hour, minute) = time.split_once(':').unwrap_or((time, ""));
    Count {
        count: value.to_string(),
        datetime: datetime.to_string(),
        day: day.to_string(),
        hour: hour.to_string(),
        minute: minute.to_string(),
        month: month.to_string(),
        year: year.to_string(),
    }
}

fn matches(record: &SpotRecord, area: &str, spot: &str) -> bool {
    (area.is_empty() || record.area == area) && (spot.is_empty() || record.spot == spot)
}

/// Approximate ground distance in metres (equirectangular projection).
fn metres_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let x = (lon2 - lon1).to_radians() * ((lat1 + lat2) / 2.0).to_radians().cos();
    let y = (lat2 - lat1).to_radians();
    (x * x + y * y).sqrt() * EARTH_RADIUS_M
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn places(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let (area, spot, q) = (param(&params, "area"), param(&params, "spot"), param(&params, "q"));
    let items: Vec<Place> = state
        .spots
        .iter()
        .filter(|r| matches(r, area, spot) && (q.is_empty() || r.name.contains(q)))
        .map(place)
        .collect();
    Json(PlacesBody {
        num: items.len(),
        items,
    })
    .into_response()
}

async fn counts(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let (area, spot, day) = (
        param(&params, "area"),
        param(&params, "spot"),
        param(&params, "day"),
    );
    let Some(record) = state
        .spots
        .iter()
        .find(|r| r.area == area && r.spot == spot)
    else {
        return (StatusCode::NOT_FOUND, "spot not found").into_response();
    };
    let counts = record
        .history
        .iter()
        .filter(|(datetime, _)| day.is_empty() || datetime.replace('/', "").starts_with(day))
        .map(|(datetime, value)| count(datetime, *value))
        .collect();
    Json(CountsBody {
        area: record.area.to_string(),
        spot: record.spot.to_string(),
        description: record.description.to_string(),
        lat: fmt_coord(record.lat),
        lon: fmt_coord(record.lon),
        name: record.name.to_string(),
        counts,
    })
    .into_response()
}

async fn distances(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let lat: f64 = param(&params, "lat").parse().unwrap_or_default();
    let lon: f64 = param(&params, "lon").parse().unwrap_or_default();

    let mut ranked: Vec<(f64, &SpotRecord)> = state
        .spots
        .iter()
        .map(|r| (metres_between(lat, lon, r.lat, r.lon), r))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let items: Vec<DistancePlace> = ranked
        .into_iter()
        .take(10)
        .map(|(metres, record)| {
            let place = place(record);
            DistancePlace {
                area: place.area,
                spot: place.spot,
                description: place.description,
                lat: place.lat,
                lon: place.lon,
                name: place.name,
                distance: format!("{}m", metres.round()),
                recent: place.recent,
            }
        })
        .collect();
    Json(DistancesBody {
        num: items.len(),
        items,
    })
    .into_response()
}

async fn all_places(State(db): State<Db>, headers: HeaderMap) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let items: Vec<SpotName> = state
        .spots
        .iter()
        .map(|r| SpotName {
            area: r.area.to_string(),
            spot: r.spot.to_string(),
            name: r.name.to_string(),
        })
        .collect();
    Json(AllPlacesBody {
        num: items.len(),
        items,
    })
    .into_response()
}

async fn graph(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let (area, spot) = (param(&params, "area"), param(&params, "spot"));
    let Some(record) = state.spots.iter().find(|r| r.area == area && r.spot == spot) else {
        return (StatusCode::NOT_FOUND, "spot not found").into_response();
    };
    let title = if param(&params, "title") == "yes" {
        format!("{} {}", record.name, param(&params, "days"))
            .trim_end()
            .to_string()
    } else {
        String::new()
    };
    let url = if param(&params, "imgur") == "yes" {
        format!("https://i.imgur.com/{area}{spot}.png")
    } else {
        format!("/static/graph/{area}{spot}.png")
    };
    Json(GraphBody {
        title,
        width: "640".to_string(),
        height: "480".to_string(),
        url,
    })
    .into_response()
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> Response {
    let state = db.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    Json(UsersBody {
        users: state.users.clone(),
    })
    .into_response()
}

async fn upsert_user(State(db): State<Db>, headers: HeaderMap, Json(input): Json<User>) -> Response {
    let mut state = db.write().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    match state.users.iter().position(|u| u.line_id == input.line_id) {
        Some(index) => state.users[index] = input.clone(),
        None => state.users.push(input.clone()),
    }
    Json(input).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_encodes_numbers_as_strings() {
        let record = &seed_spots()[0];
        let json = serde_json::to_value(place(record)).unwrap();
        assert_eq!(json["lat"], "35.694003");
        assert_eq!(json["recent"]["count"], "9");
        assert_eq!(json["recent"]["datetime"], "2020/05/05 12:40");
    }

    #[test]
    fn count_splits_datetime_parts() {
        let c = count("2020/05/05 12:40", 9);
        assert_eq!(c.year, "2020");
        assert_eq!(c.month, "05");
        assert_eq!(c.day, "05");
        assert_eq!(c.hour, "12");
        assert_eq!(c.minute, "40");
        assert_eq!(c.count, "9");
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(metres_between(35.69, 139.7, 35.69, 139.7), 0.0);
        let d = metres_between(35.690_921, 139.699_258, 35.693_825, 139.703_356);
        assert!(d > 400.0 && d < 600.0, "unexpected distance {d}");
    }

    #[test]
    fn user_defaults_optional_fields() {
        let user: User = serde_json::from_str(r#"{"line_id":"U1"}"#).unwrap();
        assert_eq!(user.line_id, "U1");
        assert!(user.favorites.is_empty());
    }

    #[test]
    fn user_rejects_missing_line_id() {
        let result: Result<User, _> = serde_json::from_str(r#"{"slack_id":"S1"}"#);
        assert!(result.is_err());
    }
}
