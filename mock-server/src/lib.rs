//! In-memory stand-in for the RADIUS user management API.
//!
//! Speaks the same JSON contract as the real server: every body is a
//! `{success, message, data}` envelope, every endpoint except `/login`
//! requires `Authorization: Bearer <api key>`, and validation failures are
//! reported as `success: false` with status 200.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "change-me";

const PASSWORD_ATTR: &str = "Cleartext-Password";
const UPLOAD_ATTR: &str = "Huawei-Input-Average-Rate";
const DOWNLOAD_ATTR: &str = "Huawei-Output-Average-Rate";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub bandwidth_up: String,
    pub bandwidth_down: String,
    pub profile: String,
}

/// One accounting record. `stop_time` is `None` while the session is open.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub date: String,
    pub start_time: String,
    pub stop_time: Option<String>,
    pub session_time: u64,
    pub input_octets: u64,
    pub output_octets: u64,
    pub framed_ip: String,
    pub nas_ip: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub events: Vec<String>,
}

/// A webhook notification the server would have posted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub url: String,
    pub event: String,
    pub username: String,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    accounts: Vec<Account>,
    sessions: Vec<Session>,
    webhooks: Vec<Webhook>,
    deliveries: Vec<Delivery>,
}

impl Store {
    fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn trigger(&mut self, event: &str, username: &str) {
        let targets: Vec<String> = self
            .webhooks
            .iter()
            .filter(|w| w.events.iter().any(|e| e == event))
            .map(|w| w.url.clone())
            .collect();
        for url in targets {
            self.deliveries.push(Delivery {
                url,
                event: event.to_string(),
                username: username.to_string(),
            });
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub async fn record_session(&self, session: Session) {
        self.store.write().await.sessions.push(session);
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.store.read().await.deliveries.clone()
    }
}

pub fn app(api_key: &str) -> Router {
    app_with_state(AppState::new(api_key))
}

pub fn app_with_state(state: AppState) -> Router {
    let protected = Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users).post(create_user))
        .route("/user", get(get_user).put(update_user).delete(delete_user))
        .route("/history", get(history))
        .route("/bandwidth-stats", get(bandwidth_stats))
        .route("/export", get(export))
        .route(
            "/webhooks",
            get(list_webhooks).post(create_webhook).delete(delete_webhook),
        )
        .fallback(unknown_endpoint)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn ok(message: &str, data: Value) -> Response {
    Json(json!({ "success": true, "message": message, "data": data })).into_response()
}

fn fail(message: &str) -> Response {
    Json(json!({ "success": false, "message": message, "data": null })).into_response()
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, fail(message)).into_response()
}

fn bearer_key(headers: &HeaderMap) -> &str {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    value.strip_prefix("Bearer ").unwrap_or(value)
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if bearer_key(request.headers()) != &*state.api_key {
        return unauthorized("Unauthorized");
    }
    next.run(request).await
}

async fn unknown_endpoint() -> Response {
    fail("Endpoint not found")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginInput {
    #[serde(default)]
    api_key: String,
}

async fn login(State(state): State<AppState>, Json(input): Json<LoginInput>) -> Response {
    if input.api_key == *state.api_key {
        ok("Login successful", json!({ "token": input.api_key }))
    } else {
        unauthorized("Invalid API key")
    }
}

async fn stats(State(state): State<AppState>) -> Response {
    let store = state.store.read().await;
    let active = store.sessions.iter().filter(|s| s.stop_time.is_none()).count();
    ok(
        "Statistics retrieved",
        json!({ "total_users": store.accounts.len(), "active_sessions": active }),
    )
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    search: String,
}

fn default_limit() -> usize {
    50
}

async fn list_users(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let store = state.store.read().await;
    let matching: Vec<&Account> = store
        .accounts
        .iter()
        .rev()
        .filter(|a| params.search.is_empty() || a.username.contains(&params.search))
        .collect();
    let total = matching.len();
    let users: Vec<Value> = matching
        .into_iter()
        .skip(params.offset)
        .take(params.limit)
        .map(|a| {
            json!({
                "id": a.id,
                "username": a.username,
                "password": a.password,
                "attributes": format!(
                    "{UPLOAD_ATTR}={},{DOWNLOAD_ATTR}={}",
                    a.bandwidth_up, a.bandwidth_down
                ),
            })
        })
        .collect();
    ok("Users retrieved", json!({ "users": users, "total": total }))
}

#[derive(Deserialize)]
struct CreateInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default = "default_rate")]
    bandwidth_up: String,
    #[serde(default = "default_rate")]
    bandwidth_down: String,
    #[serde(default)]
    profile: String,
}

fn default_rate() -> String {
    "10M".to_string()
}

async fn create_user(State(state): State<AppState>, Json(input): Json<CreateInput>) -> Response {
    if input.username.is_empty() || input.password.is_empty() {
        return fail("Username and password are required");
    }
    let mut store = state.store.write().await;
    if store.account(&input.username).is_some() {
        return fail("User already exists");
    }
    store.next_id += 1;
    let account = Account {
        id: store.next_id,
        username: input.username,
        password: input.password,
        bandwidth_up: input.bandwidth_up,
        bandwidth_down: input.bandwidth_down,
        profile: input.profile,
    };
    let username = account.username.clone();
    store.accounts.push(account);
    store.trigger("user.created", &username);
    ok("User created", json!({ "username": username }))
}

#[derive(Deserialize)]
struct UsernameParam {
    #[serde(default)]
    username: String,
}

fn attribute_row(username: &str, attribute: &str, value: &str) -> Value {
    json!({ "username": username, "attribute": attribute, "op": ":=", "value": value })
}

async fn get_user(
    State(state): State<AppState>,
    Query(params): Query<UsernameParam>,
) -> Response {
    if params.username.is_empty() {
        return fail("Username required");
    }
    let store = state.store.read().await;
    // An unknown user is not an error: both row sets are simply empty.
    let (check, reply) = match store.account(&params.username) {
        Some(a) => (
            vec![attribute_row(&a.username, PASSWORD_ATTR, &a.password)],
            vec![
                attribute_row(&a.username, UPLOAD_ATTR, &a.bandwidth_up),
                attribute_row(&a.username, DOWNLOAD_ATTR, &a.bandwidth_down),
            ],
        ),
        None => (Vec::new(), Vec::new()),
    };
    ok("User retrieved", json!({ "check": check, "reply": reply }))
}

#[derive(Deserialize)]
struct UpdateInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    bandwidth_up: Option<String>,
    bandwidth_down: Option<String>,
}

async fn update_user(State(state): State<AppState>, Json(input): Json<UpdateInput>) -> Response {
    if input.username.is_empty() {
        return fail("Username required");
    }
    let mut store = state.store.write().await;
    if let Some(account) = store.accounts.iter_mut().find(|a| a.username == input.username) {
        if !input.password.is_empty() {
            account.password = input.password;
        }
        if let Some(up) = input.bandwidth_up {
            account.bandwidth_up = up;
        }
        if let Some(down) = input.bandwidth_down {
            account.bandwidth_down = down;
        }
    }
    store.trigger("user.updated", &input.username);
    ok("User updated", Value::Null)
}

async fn delete_user(
    State(state): State<AppState>,
    Query(params): Query<UsernameParam>,
) -> Response {
    if params.username.is_empty() {
        return fail("Username required");
    }
    let mut store = state.store.write().await;
    store.accounts.retain(|a| a.username != params.username);
    store.trigger("user.deleted", &params.username);
    ok("User deleted", Value::Null)
}

#[derive(Deserialize)]
struct HistoryParams {
    #[serde(default)]
    username: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

async fn history(State(state): State<AppState>, Query(params): Query<HistoryParams>) -> Response {
    if params.username.is_empty() {
        return fail("Username required");
    }
    let store = state.store.read().await;
    let sessions: Vec<&Session> = store
        .sessions
        .iter()
        .rev()
        .filter(|s| s.username == params.username)
        .take(params.limit)
        .collect();
    ok("History retrieved", json!(sessions))
}

#[derive(Deserialize)]
struct BandwidthParams {
    #[serde(default)]
    username: String,
    #[serde(default = "default_days")]
    days: usize,
}

fn default_days() -> usize {
    30
}

/// Totals per day, newest day first. The mock has no clock, so `days` caps
/// the number of daily rows instead of filtering by date.
async fn bandwidth_stats(
    State(state): State<AppState>,
    Query(params): Query<BandwidthParams>,
) -> Response {
    let store = state.store.read().await;
    let mut per_day: BTreeMap<&str, (u64, u64, u64)> = BTreeMap::new();
    for s in store
        .sessions
        .iter()
        .filter(|s| params.username.is_empty() || s.username == params.username)
    {
        let totals = per_day.entry(s.date.as_str()).or_default();
        totals.0 += s.input_octets;
        totals.1 += s.output_octets;
        totals.2 += s.session_time;
    }
    let rows: Vec<Value> = per_day
        .into_iter()
        .rev()
        .take(params.days)
        .map(|(date, (input, output, time))| {
            json!({ "date": date, "input_bytes": input, "output_bytes": output, "total_time": time })
        })
        .collect();
    ok("Bandwidth statistics retrieved", json!(rows))
}

#[derive(Deserialize)]
struct ExportParams {
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "csv".to_string()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

async fn export(State(state): State<AppState>, Query(params): Query<ExportParams>) -> Response {
    let store = state.store.read().await;
    let accounts = store.accounts.iter().rev();
    if params.format == "csv" {
        let mut csv = String::from("Username,Password,Upload,Download,Profile\n");
        for a in accounts {
            let profile = if a.profile.is_empty() {
                "default"
            } else {
                a.profile.as_str()
            };
            let row = [
                a.username.as_str(),
                a.password.as_str(),
                a.bandwidth_up.as_str(),
                a.bandwidth_down.as_str(),
                profile,
            ]
            .map(csv_field)
            .join(",");
            csv.push_str(&row);
            csv.push('\n');
        }
        return ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response();
    }
    let rows: Vec<Value> = accounts
        .map(|a| {
            json!({
                "username": a.username,
                "password": a.password,
                "bandwidth_up": a.bandwidth_up,
                "bandwidth_down": a.bandwidth_down,
                "profile": a.profile,
            })
        })
        .collect();
    ok("Data exported", json!(rows))
}

async fn list_webhooks(State(state): State<AppState>) -> Response {
    let store = state.store.read().await;
    ok("Webhooks retrieved", json!(store.webhooks))
}

#[derive(Deserialize)]
struct WebhookInput {
    #[serde(default)]
    url: String,
    #[serde(default)]
    events: Vec<String>,
}

async fn create_webhook(
    State(state): State<AppState>,
    Json(input): Json<WebhookInput>,
) -> Response {
    if input.url.is_empty() || input.events.is_empty() {
        return fail("URL and events are required");
    }
    let webhook = Webhook {
        id: Uuid::new_v4().simple().to_string(),
        url: input.url,
        events: input.events,
    };
    state.store.write().await.webhooks.push(webhook.clone());
    ok("Webhook created", json!(webhook))
}

#[derive(Deserialize)]
struct IdParam {
    #[serde(default)]
    id: String,
}

async fn delete_webhook(State(state): State<AppState>, Query(params): Query<IdParam>) -> Response {
    if params.id.is_empty() {
        return fail("ID required");
    }
    state.store.write().await.webhooks.retain(|w| w.id != params.id);
    ok("Webhook deleted", Value::Null)
}
