//! In-process mock of the service used by transport and endpoint tests.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, post},
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub(crate) const TOKEN_ENDPOINT: &str = "/oauth/token";

/// Request counters, split by kind
#[derive(Debug, Default)]
pub(crate) struct Counters {
    /// `HEAD` access checks against protected resources
    pub head_checks: AtomicUsize,
    /// Refresh grants at the token endpoint
    pub refreshes: AtomicUsize,
    /// Real (non-`HEAD`) requests against resources
    pub calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct Seen {
    authorization: Option<String>,
    content_type: Option<String>,
    content_disposition: Option<String>,
    query: Option<String>,
}

#[derive(Clone)]
struct MockState {
    accepted_token: String,
    refresh_issues: Option<String>,
    pages: Arc<HashMap<String, Value>>,
    counters: Arc<Counters>,
    seen: Arc<Mutex<Seen>>,
}

impl MockState {
    async fn record(&self, headers: &HeaderMap, query: Option<String>) {
        let value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut seen = self.seen.lock().await;
        seen.authorization = value(header::AUTHORIZATION);
        seen.content_type = value(header::CONTENT_TYPE);
        seen.content_disposition = value(header::CONTENT_DISPOSITION);
        seen.query = query;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.accepted_token);
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str())
    }

    /// Count the request and check its token
    fn guard(&self, method: &Method, headers: &HeaderMap) -> Result<(), Response> {
        if method == Method::HEAD {
            self.counters.head_checks.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.calls.fetch_add(1, Ordering::SeqCst);
        }

        if self.authorized(headers) {
            Ok(())
        } else {
            Err(unauthorized())
        }
    }
}

/// A running mock server
pub(crate) struct MockApi {
    pub base_url: String,
    pub counters: Arc<Counters>,
    seen: Arc<Mutex<Seen>>,
}

impl MockApi {
    /// Accepts `Bearer <accepted_token>`; the token endpoint hands out
    /// `refresh_issues` on refresh, or rejects refreshes when `None`.
    pub async fn spawn(accepted_token: &str, refresh_issues: Option<&str>) -> Self {
        Self::spawn_with_pages(accepted_token, refresh_issues, HashMap::new()).await
    }

    /// Like [`MockApi::spawn`], also serving feed pages keyed by cursor
    /// (`""` is the first page) on every feed endpoint.
    pub async fn spawn_with_pages(
        accepted_token: &str,
        refresh_issues: Option<&str>,
        pages: HashMap<String, Value>,
    ) -> Self {
        let counters = Arc::new(Counters::default());
        let seen = Arc::new(Mutex::new(Seen::default()));
        let state = MockState {
            accepted_token: accepted_token.to_string(),
            refresh_issues: refresh_issues.map(str::to_string),
            pages: Arc::new(pages),
            counters: counters.clone(),
            seen: seen.clone(),
        };

        let router = Router::new()
            .route(TOKEN_ENDPOINT, post(token))
            .route("/resource", any(resource))
            .route("/public", any(public))
            .route("/missing", any(missing))
            .route("/garbage", any(garbage))
            .route("/forbidden", any(forbidden))
            .route("/echo", post(echo))
            .route("/upload", any(upload))
            .route("/slow-upload", any(slow_upload))
            .route("/gfycats/search", any(feed_page))
            .route("/me/gfycats/search", any(feed_page))
            .route("/me/gfycats", any(feed_page))
            .route("/users/:user_id/gfycats", any(feed_page))
            .route("/gfycats/trending", any(feed_page))
            .route("/tags/trending/populated", any(feed_page))
            .with_state(state);

        Self {
            base_url: serve(router).await,
            counters,
            seen,
        }
    }

    pub async fn last_authorization(&self) -> Option<String> {
        self.seen.lock().await.authorization.clone()
    }

    pub async fn last_content_type(&self) -> Option<String> {
        self.seen.lock().await.content_type.clone()
    }

    pub async fn last_content_disposition(&self) -> Option<String> {
        self.seen.lock().await.content_disposition.clone()
    }

    pub async fn last_query(&self) -> Option<String> {
        self.seen.lock().await.query.clone()
    }
}

/// A request seen by [`Recorder`]
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

type Scripted = Arc<Mutex<HashMap<String, VecDeque<(StatusCode, Value)>>>>;

#[derive(Clone)]
struct RecorderState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    scripted: Scripted,
}

/// Catch-all mock that records every request and answers from a script.
///
/// Responses are keyed by `"METHOD /path"`. When several are scripted for a
/// key they are served in order, the last one repeating. Anything unscripted
/// gets `200 {}`.
pub(crate) struct Recorder {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub async fn spawn(script: Vec<(&str, StatusCode, Value)>) -> Self {
        let mut scripted: HashMap<String, VecDeque<(StatusCode, Value)>> = HashMap::new();
        for (key, status, body) in script {
            scripted
                .entry(key.to_string())
                .or_default()
                .push_back((status, body));
        }
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = RecorderState {
            requests: requests.clone(),
            scripted: Arc::new(Mutex::new(scripted)),
        };
        let router = Router::new().fallback(recorded).with_state(state);

        Self {
            base_url: serve(router).await,
            requests,
        }
    }

    /// Every request received, `HEAD` checks included
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Requests other than `HEAD` checks
    pub async fn calls(&self) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method != Method::HEAD)
            .collect()
    }
}

async fn recorded(
    State(state): State<RecorderState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let key = format!("{} {}", method, uri.path());
    state.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let mut scripted = state.scripted.lock().await;
    let reply = scripted.get_mut(&key).and_then(|queue| {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    });
    match reply {
        Some((status, _)) if method == Method::HEAD => status.into_response(),
        Some((status, body)) => (status, Json(body)).into_response(),
        None if method == Method::HEAD => StatusCode::OK.into_response(),
        None => Json(json!({})).into_response(),
    }
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"code": "Unauthorized", "description": "Invalid access token"})),
    )
        .into_response()
}

async fn token(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let grant = body["grant_type"].as_str().unwrap_or_default();
    match grant {
        "refresh" => {
            state.counters.refreshes.fetch_add(1, Ordering::SeqCst);
            match &state.refresh_issues {
                Some(issued) => Json(json!({
                    "token_type": "bearer",
                    "access_token": issued,
                    "refresh_token": "refresh-2",
                    "expires_in": 3600
                }))
                .into_response(),
                None => (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"code": "InvalidRefreshToken", "description": "Refresh token revoked"})),
                )
                    .into_response(),
            }
        }
        "password" if body["username"] == "user" && body["password"] == "pass" => Json(json!({
            "token_type": "bearer",
            "access_token": state.accepted_token,
            "refresh_token": "refresh-1",
            "resource_owner": "user"
        }))
        .into_response(),
        "client_credentials" => Json(json!({
            "token_type": "bearer",
            "access_token": state.accepted_token,
            "expires_in": 3600
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": "InvalidCredentials", "message": "Bad username or password"})),
        )
            .into_response(),
    }
}

async fn resource(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    state.record(&headers, None).await;
    if let Err(rejection) = state.guard(&method, &headers) {
        return rejection;
    }
    Json(json!({"name": "gfy"})).into_response()
}

async fn public(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.record(&headers, None).await;
    Json(json!({"name": "public"})).into_response()
}

async fn missing() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"code": "NotFound", "description": "No such gfy"})),
    )
        .into_response()
}

async fn garbage() -> Response {
    (StatusCode::OK, "definitely not json").into_response()
}

async fn forbidden() -> Response {
    StatusCode::UNAUTHORIZED.into_response()
}

async fn echo(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    state.record(&headers, None).await;
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn upload(State(state): State<MockState>, headers: HeaderMap, _body: Bytes) -> Response {
    state.record(&headers, None).await;
    state.counters.calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK.into_response()
}

async fn slow_upload(State(state): State<MockState>, _body: Bytes) -> Response {
    state.counters.calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    StatusCode::OK.into_response()
}

async fn feed_page(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if method != Method::HEAD {
        let mut pairs: Vec<_> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();
        state.record(&headers, Some(pairs.join("&"))).await;
    }
    if let Err(rejection) = state.guard(&method, &headers) {
        return rejection;
    }

    let cursor = query.get("cursor").cloned().unwrap_or_default();
    match state.pages.get(&cursor) {
        Some(page) => Json(page.clone()).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": "InvalidCursor", "description": cursor})),
        )
            .into_response(),
    }
}
