//! A fake Firestore REST server for integration tests.
//!
//! It keeps documents in memory in their wire encoding, evaluates
//! `fieldFilter`/`compositeFilter` equality queries, and records every request
//! it sees. A `/token` route plays the OAuth token endpoint.

#![allow(dead_code)]

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use nichedoc_firestore::FirestoreConfig;

pub const PROJECT: &str = "demo-project";
pub const PRIVATE_KEY: &str = include_str!("../fixtures/service-account-key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service-account-pub.pem");
pub const CLIENT_EMAIL: &str = "dashboard@demo-project.iam.gserviceaccount.com";

const DOCUMENTS_PREFIX: &str = "/v1/projects/demo-project/databases/(default)/documents";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: JsonValue,
}

impl RecordedRequest {
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    collections: BTreeMap<String, BTreeMap<String, JsonMap<String, JsonValue>>>,
    requests: Vec<RecordedRequest>,
    issued_tokens: usize,
    token_lifetime: i64,
    reject_tokens: bool,
    fail_status: Option<StatusCode>,
    next_id: usize,
}

#[derive(Clone)]
pub struct FakeFirestore {
    state: Arc<Mutex<FakeState>>,
    pub base: String,
}

impl FakeFirestore {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState { token_lifetime: 3600, ..FakeState::default() }));

        let app = Router::new()
            .route("/token", post(token))
            .fallback(firestore)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, base: format!("http://{addr}") }
    }

    /// Configuration pointing at this server with a static bearer token.
    pub fn config(&self) -> FirestoreConfig {
        FirestoreConfig::new(PROJECT)
            .endpoint(format!("{}/v1", self.base))
            .static_token("test-token")
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.base)
    }

    /// Writes a service-account key file whose token endpoint is this server.
    pub fn write_key_file(&self, name: &str) -> std::path::PathBuf {
        let key = json!({
            "type": "service_account",
            "project_id": PROJECT,
            "private_key_id": "fixture-key",
            "private_key": PRIVATE_KEY,
            "client_email": CLIENT_EMAIL,
            "token_uri": self.token_uri(),
        });

        let path = std::env::temp_dir().join(format!("nichedoc-{}-{name}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_vec_pretty(&key).unwrap()).unwrap();
        path
    }

    pub fn set_token_lifetime(&self, seconds: i64) {
        self.state.lock().unwrap().token_lifetime = seconds;
    }

    pub fn reject_tokens(&self) {
        self.state.lock().unwrap().reject_tokens = true;
    }

    pub fn fail_with(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_status = Some(status);
    }

    pub fn insert(&self, collection: &str, id: &str, fields: JsonValue) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.state
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    pub fn fields(&self, collection: &str, id: &str) -> Option<JsonMap<String, JsonValue>> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    pub fn issued_tokens(&self) -> usize {
        self.state.lock().unwrap().issued_tokens
    }
}

type Shared = Arc<Mutex<FakeState>>;

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    assertion: String,
}

#[derive(Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
}

async fn token(State(state): State<Shared>, uri: Uri, headers: HeaderMap, Form(form): Form<TokenForm>) -> Response {
    let mut state = state.lock().unwrap();

    let host = headers
        .get("host")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let audience = format!("http://{host}{}", uri.path());

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);

    let claims = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes())
        .and_then(|key| jsonwebtoken::decode::<AssertionClaims>(&form.assertion, &key, &validation));

    let valid = !state.reject_tokens
        && form.grant_type == "urn:ietf:params:oauth:grant-type:jwt-bearer"
        && claims.is_ok_and(|data| {
            data.claims.iss == CLIENT_EMAIL
                && data.claims.scope == "https://www.googleapis.com/auth/datastore"
        });

    if !valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid JWT Signature." })),
        )
            .into_response();
    }

    state.issued_tokens += 1;
    Json(json!({
        "access_token": format!("fake-token-{}", state.issued_tokens),
        "expires_in": state.token_lifetime,
        "token_type": "Bearer",
    }))
    .into_response()
}

fn resource_name(collection: &str, id: &str) -> String {
    format!("projects/{PROJECT}/databases/(default)/documents/{collection}/{id}")
}

fn render(collection: &str, id: &str, fields: &JsonMap<String, JsonValue>) -> JsonValue {
    json!({
        "name": resource_name(collection, id),
        "fields": fields,
        "createTime": "2024-05-01T12:00:00.000000Z",
        "updateTime": "2024-05-01T12:00:00.000000Z",
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": status.as_u16(), "message": message, "status": "ERROR" } })),
    )
        .into_response()
}

fn unquote(path: &str) -> String {
    match path.strip_prefix('`').and_then(|rest| rest.strip_suffix('`')) {
        Some(inner) => inner.replace("\\`", "`").replace("\\\\", "\\"),
        None => path.to_string(),
    }
}

async fn firestore(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();

    let body = serde_json::from_slice::<JsonValue>(&body).unwrap_or(JsonValue::Null);
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: query.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    if !authorization.is_some_and(|value| value.starts_with("Bearer ")) {
        return error(StatusCode::UNAUTHORIZED, "Missing bearer token");
    }
    if let Some(status) = state.fail_status {
        return error(status, "Injected failure");
    }

    let Some(rest) = uri.path().strip_prefix(DOCUMENTS_PREFIX) else {
        return error(StatusCode::NOT_FOUND, "Unknown path");
    };

    if rest == ":runQuery" && method == Method::POST {
        return run_query(&state, &body);
    }

    let segments = rest
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("%20", " "))
        .collect::<Vec<_>>();

    match (method.as_str(), segments.as_slice()) {
        ("POST", [collection]) => {
            state.next_id += 1;
            let id = format!("gen{}", state.next_id);
            let fields = body["fields"].as_object().cloned().unwrap_or_default();
            state
                .collections
                .entry(collection.clone())
                .or_default()
                .insert(id.clone(), fields.clone());
            Json(render(collection, &id, &fields)).into_response()
        }
        ("GET", [collection]) => {
            let limit = query
                .iter()
                .find(|(key, _)| key == "pageSize")
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(20);
            let documents = state
                .collections
                .get(collection)
                .map(|documents| {
                    documents
                        .iter()
                        .take(limit)
                        .map(|(id, fields)| render(collection, id, fields))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            if documents.is_empty() {
                Json(json!({})).into_response()
            } else {
                Json(json!({ "documents": documents })).into_response()
            }
        }
        ("GET", [collection, id]) => match state.collections.get(collection).and_then(|docs| docs.get(id)) {
            Some(fields) => Json(render(collection, id, fields)).into_response(),
            None => error(StatusCode::NOT_FOUND, &format!("Document \"{}\" not found.", resource_name(collection, id))),
        },
        ("PATCH", [collection, id]) => {
            let mask = query
                .iter()
                .filter(|(key, _)| key == "updateMask.fieldPaths")
                .map(|(_, value)| unquote(value))
                .collect::<Vec<_>>();
            let must_exist = query
                .iter()
                .any(|(key, value)| key == "currentDocument.exists" && value == "true");
            let incoming = body["fields"].as_object().cloned().unwrap_or_default();

            let documents = state.collections.entry(collection.clone()).or_default();
            if must_exist && !documents.contains_key(id) {
                return error(StatusCode::NOT_FOUND, &format!("No document to update: {}", resource_name(collection, id)));
            }

            let stored = if mask.is_empty() {
                documents.insert(id.clone(), incoming);
                documents[id].clone()
            } else {
                let existing = documents.entry(id.clone()).or_default();
                for path in mask {
                    match incoming.get(&path) {
                        Some(value) => {
                            existing.insert(path, value.clone());
                        }
                        None => {
                            existing.remove(&path);
                        }
                    }
                }
                existing.clone()
            };

            Json(render(collection, id, &stored)).into_response()
        }
        ("DELETE", [collection, id]) => {
            if let Some(documents) = state.collections.get_mut(collection) {
                documents.remove(id);
            }
            Json(json!({})).into_response()
        }
        _ => error(StatusCode::NOT_FOUND, "Unknown route"),
    }
}

fn matches(filter: &JsonValue, fields: &JsonMap<String, JsonValue>) -> bool {
    if let Some(field_filter) = filter.get("fieldFilter") {
        let path = unquote(field_filter["field"]["fieldPath"].as_str().unwrap_or_default());
        return field_filter["op"] == "EQUAL" && fields.get(&path) == Some(&field_filter["value"]);
    }
    if let Some(composite) = filter.get("compositeFilter") {
        return composite["op"] == "AND"
            && composite["filters"]
                .as_array()
                .is_some_and(|filters| filters.iter().all(|filter| matches(filter, fields)));
    }
    false
}

fn run_query(state: &FakeState, body: &JsonValue) -> Response {
    let structured = &body["structuredQuery"];
    let collection = structured["from"][0]["collectionId"].as_str().unwrap_or_default();
    let limit = structured["limit"].as_u64().map_or(usize::MAX, |limit| limit as usize);
    let filter = structured.get("where");

    let mut entries = state
        .collections
        .get(collection)
        .map(|documents| {
            documents
                .iter()
                .filter(|(_, fields)| filter.is_none_or(|filter| matches(filter, fields)))
                .take(limit)
                .map(|(id, fields)| {
                    json!({ "document": render(collection, id, fields), "readTime": "2024-05-01T12:00:01Z" })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if entries.is_empty() {
        entries.push(json!({ "readTime": "2024-05-01T12:00:01Z" }));
    }

    Json(JsonValue::Array(entries)).into_response()
}
