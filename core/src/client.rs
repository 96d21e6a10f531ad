//! Stateless request builder and response parser for the bike-share API.
//!
//! # Design
//! `BikeshareClient` holds only its base URL and optional credential, so one
//! value can be shared freely between callers and threads. Every endpoint is
//! split into a `build_*` method producing an `HttpRequest` and a `parse_*`
//! method consuming an `HttpResponse`; `fetch_*` strings the two together
//! through a `Transport` for callers who do not want to drive I/O themselves.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::normalize;
use crate::query::{
    QueryOption, SearchCountsOption, SearchDistanceOption, SearchGraphOption, SearchPlacesOption,
};
use crate::transport::Transport;
use crate::types::{DistanceInfo, GraphInfo, SpotInfo, SpotName, User};
use crate::wire::{
    AllPlacesDocument, CountsDocument, DistancesDocument, GraphDocument, PlacesDocument,
    UsersDocument, WireUser,
};

/// Header carrying the client credential.
pub const CERT_HEADER: &str = "cert";

const PLACES: &str = "places";
const COUNTS: &str = "counts";
const DISTANCES: &str = "distances";
const ALL_PLACES: &str = "all_places";
const GRAPH: &str = "graph";
const USERS: &str = "users";

/// Synchronous, stateless client for the bike-share API.
#[derive(Debug, Clone)]
pub struct BikeshareClient {
    base_url: String,
    cert: Option<String>,
}

impl Default for BikeshareClient {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl BikeshareClient {
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cert: config.cert.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_places(&self, option: &SearchPlacesOption) -> HttpRequest {
        self.get(PLACES, &option.to_query())
    }

    pub fn build_counts(&self, option: &SearchCountsOption) -> HttpRequest {
        self.get(COUNTS, &option.to_query())
    }

    pub fn build_distances(&self, option: &SearchDistanceOption) -> HttpRequest {
        self.get(DISTANCES, &option.to_query())
    }

    pub fn build_all_spot_names(&self) -> HttpRequest {
        self.get(ALL_PLACES, "")
    }

    pub fn build_graph(&self, option: &SearchGraphOption) -> HttpRequest {
        self.get(GRAPH, &option.to_query())
    }

    pub fn build_users(&self) -> HttpRequest {
        self.get(USERS, "")
    }

    /// Build the post that creates or replaces `user` on the service.
    pub fn build_update_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(&WireUser::from(user))
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        let mut headers = self.headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.url(USERS, ""),
            headers,
            body: Some(body),
        };
        debug!(method = request.method.as_str(), url = %request.url, "built request");
        Ok(request)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_places(&self, response: HttpResponse) -> Result<Vec<SpotInfo>, ApiError> {
        decode::<PlacesDocument>(PLACES, &response).map(normalize::normalize_places)
    }

    pub fn parse_counts(&self, response: HttpResponse) -> Result<SpotInfo, ApiError> {
        decode::<CountsDocument>(COUNTS, &response).map(normalize::normalize_counts)
    }

    /// The base coordinates of the result are taken from `option`, which
    /// should be the one the request was built from.
    pub fn parse_distances(
        &self,
        option: &SearchDistanceOption,
        response: HttpResponse,
    ) -> Result<DistanceInfo, ApiError> {
        let doc = decode::<DistancesDocument>(DISTANCES, &response)?;
        normalize::normalize_distances(option, doc)
    }

    pub fn parse_all_spot_names(&self, response: HttpResponse) -> Result<Vec<SpotName>, ApiError> {
        decode::<AllPlacesDocument>(ALL_PLACES, &response).map(normalize::normalize_spot_names)
    }

    pub fn parse_graph(&self, response: HttpResponse) -> Result<GraphInfo, ApiError> {
        decode::<GraphDocument>(GRAPH, &response).map(normalize::normalize_graph)
    }

    pub fn parse_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        decode::<UsersDocument>(USERS, &response).map(normalize::normalize_users)
    }

    /// The service echoes the stored user record.
    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode::<WireUser>(USERS, &response).map(User::from)
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    pub fn fetch_places(
        &self,
        transport: &impl Transport,
        option: &SearchPlacesOption,
    ) -> Result<Vec<SpotInfo>, ApiError> {
        let response = transport.execute(self.build_places(option))?;
        self.parse_places(response)
    }

    pub fn fetch_counts(
        &self,
        transport: &impl Transport,
        option: &SearchCountsOption,
    ) -> Result<SpotInfo, ApiError> {
        let response = transport.execute(self.build_counts(option))?;
        self.parse_counts(response)
    }

    pub fn fetch_distances(
        &self,
        transport: &impl Transport,
        option: &SearchDistanceOption,
    ) -> Result<DistanceInfo, ApiError> {
        let response = transport.execute(self.build_distances(option))?;
        self.parse_distances(option, response)
    }

    pub fn fetch_all_spot_names(
        &self,
        transport: &impl Transport,
    ) -> Result<Vec<SpotName>, ApiError> {
        let response = transport.execute(self.build_all_spot_names())?;
        self.parse_all_spot_names(response)
    }

    pub fn fetch_graph(
        &self,
        transport: &impl Transport,
        option: &SearchGraphOption,
    ) -> Result<GraphInfo, ApiError> {
        let response = transport.execute(self.build_graph(option))?;
        self.parse_graph(response)
    }

    pub fn fetch_users(&self, transport: &impl Transport) -> Result<Vec<User>, ApiError> {
        let response = transport.execute(self.build_users())?;
        self.parse_users(response)
    }

    pub fn fetch_update_user(
        &self,
        transport: &impl Transport,
        user: &User,
    ) -> Result<User, ApiError> {
        let response = transport.execute(self.build_update_user(user)?)?;
        self.parse_update_user(response)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}?{query}", self.base_url)
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.cert
            .iter()
            .map(|cert| (CERT_HEADER.to_string(), cert.clone()))
            .collect()
    }

    fn get(&self, endpoint: &str, query: &str) -> HttpRequest {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: self.url(endpoint, query),
            headers: self.headers(),
            body: None,
        };
        debug!(method = request.method.as_str(), url = %request.url, "built request");
        request
    }
}

/// Decode a response body into a wire document. The status is only logged:
/// the service's error pages are not JSON, so they fail here as `Decode`.
fn decode<T: DeserializeOwned>(endpoint: &str, response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        debug!(endpoint, status = response.status, "non-success status");
    }
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn client() -> BikeshareClient {
        BikeshareClient::new("http://localhost:3000")
    }

    /// Replies with a canned response and remembers the request it saw.
    struct CannedTransport {
        response: Result<HttpResponse, String>,
        seen: RefCell<Option<HttpRequest>>,
    }

    impl CannedTransport {
        fn ok(body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::new(200, body)),
                seen: RefCell::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: RefCell::new(None),
            }
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            *self.seen.borrow_mut() = Some(request);
            self.response.clone().map_err(ApiError::Transport)
        }
    }

    #[test]
    fn build_places_produces_correct_request() {
        let option = SearchPlacesOption {
            area: "D1".to_string(),
            ..Default::default()
        };
        let req = client().build_places(&option);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/places?area=D1");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_query_has_no_question_mark() {
        let req = client().build_places(&SearchPlacesOption::default());
        assert_eq!(req.url, "http://localhost:3000/places");
        assert_eq!(
            client().build_all_spot_names().url,
            "http://localhost:3000/all_places"
        );
        assert_eq!(client().build_users().url, "http://localhost:3000/users");
    }

    #[test]
    fn build_graph_produces_correct_request() {
        let option = SearchGraphOption {
            area: "A1".to_string(),
            spot: "01".to_string(),
            draw_title: true,
            ..Default::default()
        };
        let req = client().build_graph(&option);
        assert_eq!(req.url, "http://localhost:3000/graph?area=A1&spot=01&title=yes");
    }

    #[test]
    fn cert_is_sent_on_every_request() {
        let config = ClientConfig::new("http://localhost:3000/").with_cert("abc123");
        let client = BikeshareClient::from_config(&config);
        let expected = vec![(CERT_HEADER.to_string(), "abc123".to_string())];
        assert_eq!(client.build_users().headers, expected);
        assert_eq!(
            client.build_counts(&SearchCountsOption::default()).headers,
            expected
        );
        let post = client.build_update_user(&User::default()).unwrap();
        assert_eq!(post.headers[0], expected[0]);
    }

    #[test]
    fn build_update_user_posts_wire_json() {
        let user = User {
            line_id: "U1".to_string(),
            favorites: vec!["A1-01".to_string()],
            ..Default::default()
        };
        let req = client().build_update_user(&user).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/users");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["line_id"], "U1");
        assert_eq!(body["favorites"][0], "A1-01");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BikeshareClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn default_client_targets_public_endpoint() {
        assert_eq!(
            BikeshareClient::default().base_url(),
            crate::config::DEFAULT_BASE_URL
        );
    }

    #[test]
    fn parse_places_success() {
        let body = r#"{"num":1,"items":[{"area":"A1","spot":"01","name":"Chiyoda","description":"",
            "lat":"35.5","lon":"139.75","recent":{"count":"7","datetime":"2020/05/05 12:30"}}]}"#;
        let spots = client().parse_places(HttpResponse::new(200, body)).unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].lat, 35.5);
        assert_eq!(spots[0].counts[0].count, 7);
    }

    #[test]
    fn parse_graph_success() {
        let body = r#"{"title":"A1-01","width":"640","height":"480","url":"https://i.imgur.com/a.png"}"#;
        let graph = client().parse_graph(HttpResponse::new(200, body)).unwrap();
        assert_eq!(graph.width, 640);
        assert_eq!(graph.height, 480);
    }

    #[test]
    fn parse_empty_body_is_decode_error() {
        let err = client().parse_places(HttpResponse::new(200, "")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn parse_truncated_json_is_decode_error() {
        let err = client()
            .parse_users(HttpResponse::new(200, r#"{"users":[{"line_id":"U1""#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn wrong_top_level_shape_is_decode_error() {
        let err = client().parse_places(HttpResponse::new(200, "[]")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let err = client()
            .parse_graph(HttpResponse::new(200, r#"{"error":"not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let err = client()
            .parse_users(HttpResponse::new(200, r#"{"error":"not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let err = client()
            .parse_counts(HttpResponse::new(200, r#"{"area":"A1","spot":"01"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn error_status_with_html_body_is_decode_error() {
        let err = client()
            .parse_graph(HttpResponse::new(500, "<html>Internal Server Error</html>"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn error_status_with_json_body_still_decodes() {
        let names = client()
            .parse_all_spot_names(HttpResponse::new(404, r#"{"num":0,"items":[]}"#))
            .unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn fetch_distances_uses_option_as_base() {
        let transport = CannedTransport::ok(r#"{"num":1,"items":[{"spot":"01","distance":"12m"}]}"#);
        let option = SearchDistanceOption {
            lat: 35.689274,
            lon: 139.700646,
        };
        let info = client().fetch_distances(&transport, &option).unwrap();
        assert_eq!(info.base_lat, 35.689274);
        assert_eq!(info.base_lon, 139.700646);
        assert_eq!(info.spots[0].distance, "12m");

        let seen = transport.seen.borrow().clone().unwrap();
        assert_eq!(
            seen.url,
            "http://localhost:3000/distances?lat=35.689274&lon=139.700646"
        );
    }

    #[test]
    fn fetch_surfaces_transport_error_verbatim() {
        let transport = CannedTransport::failing("connection refused");
        let err = client().fetch_users(&transport).unwrap_err();
        match err {
            ApiError::Transport(message) => assert_eq!(message, "connection refused"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_update_user_returns_echo() {
        let transport = CannedTransport::ok(
            r#"{"line_id":"U1","slack_id":"","favorites":["A1-01"],"histories":[],"notifies":[]}"#,
        );
        let user = User {
            line_id: "U1".to_string(),
            favorites: vec!["A1-01".to_string()],
            ..Default::default()
        };
        let echoed = client().fetch_update_user(&transport, &user).unwrap();
        assert_eq!(echoed, user);
        let seen = transport.seen.borrow().clone().unwrap();
        assert_eq!(seen.method, HttpMethod::Post);
    }
}
