use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Verification code the login route accepts.
pub const VALID_CODE: &str = "1234";

/// Key the secure profile route XORs its payload with.
pub const XOR_KEY: &[u8] = b"appkit-mock";

pub const TOKEN_EXPIRED: i64 = 4001;
pub const INVALID_CODE: i64 = 4002;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct SendCode {
    pub phone: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub phone: String,
    pub code: String,
}

/// The wire envelope every route answers with.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub message: Option<String>,
    pub data: Value,
    pub trace_id: Option<String>,
    #[serde(default)]
    pub is_encrypted: bool,
}

impl Envelope {
    fn ok(code: i64, data: Value) -> Json<Self> {
        Json(Self {
            code,
            message: Some("success".to_string()),
            data,
            trace_id: Some(Uuid::new_v4().to_string()),
            is_encrypted: false,
        })
    }

    fn fail(code: i64, message: &str) -> Json<Self> {
        Json(Self {
            code,
            message: Some(message.to_string()),
            data: Value::Null,
            trace_id: Some(Uuid::new_v4().to_string()),
            is_encrypted: false,
        })
    }
}

/// XOR with a repeating key; applying it twice is the identity.
pub fn xor(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

pub fn demo_user() -> User {
    User {
        id: 123,
        name: "Xiaoyuan".to_string(),
    }
}

pub type Tokens = Arc<RwLock<HashSet<String>>>;

pub fn app() -> Router {
    let tokens: Tokens = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/auth/sms-code", post(send_code))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/user/profile", get(profile))
        .route("/user/profile/secure", get(secure_profile))
        .route("/debug/echo", any(echo))
        .route("/debug/broken", get(broken))
        .route("/debug/status/{code}", get(status))
        .with_state(tokens)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn authorized(tokens: &Tokens, headers: &HeaderMap) -> bool {
    match bearer(headers) {
        Some(token) => tokens.read().await.contains(&token),
        None => false,
    }
}

async fn send_code(Json(input): Json<SendCode>) -> Json<Envelope> {
    tracing::info!(phone = %input.phone, "sms code requested");
    Envelope::ok(0, Value::Null)
}

async fn login(State(tokens): State<Tokens>, Json(input): Json<Login>) -> Json<Envelope> {
    if input.code != VALID_CODE {
        tracing::info!(phone = %input.phone, "login rejected");
        return Envelope::fail(INVALID_CODE, "Invalid verification code");
    }
    let token = Uuid::new_v4().to_string();
    tokens.write().await.insert(token.clone());
    Envelope::ok(0, json!({ "token": token, "user": demo_user() }))
}

async fn logout(State(tokens): State<Tokens>, headers: HeaderMap) -> Json<Envelope> {
    if let Some(token) = bearer(&headers) {
        tokens.write().await.remove(&token);
    }
    Envelope::ok(200, Value::Null)
}

async fn profile(State(tokens): State<Tokens>, headers: HeaderMap) -> Json<Envelope> {
    if !authorized(&tokens, &headers).await {
        return Envelope::fail(TOKEN_EXPIRED, "Token Expired");
    }
    Envelope::ok(0, json!(demo_user()))
}

async fn secure_profile(State(tokens): State<Tokens>, headers: HeaderMap) -> Json<Envelope> {
    if !authorized(&tokens, &headers).await {
        return Envelope::fail(TOKEN_EXPIRED, "Token Expired");
    }
    let plain = serde_json::to_vec(&demo_user()).unwrap_or_default();
    let Json(mut envelope) = Envelope::ok(0, Value::String(STANDARD.encode(xor(&plain, XOR_KEY))));
    envelope.is_encrypted = true;
    Json(envelope)
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Envelope> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Envelope::ok(
        0,
        json!({
            "method": method.as_str(),
            "query": query,
            "content_type": content_type,
            "body": String::from_utf8_lossy(&body),
        }),
    )
}

async fn broken() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], "<html>upstream exploded</html>")
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
