//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client two ways:
//! host-does-IO with a blocking ureq agent between `build_request` and
//! `parse_response`, and the async `request` path over `ReqwestTransport`.

use std::net::SocketAddr;
use std::sync::Arc;

use appkit_core::{
    ApiClient, ApiError, AuthApi, ClientConfig, DecodeError, DecryptError, Decrypter, Encoding,
    HttpMethod, HttpRequest, HttpResponse, LoginResponse, ReqwestTransport, Route,
    SessionManager, SessionTokenInterceptor, TransportError, UserProfile,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data and the client maps them itself.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match req.method {
        HttpMethod::Get => {
            let mut call = agent.get(&req.url);
            for (name, value) in &req.headers {
                call = call.header(name.as_str(), value.as_str());
            }
            call.call()
        }
        HttpMethod::Post => {
            let mut call = agent.post(&req.url);
            for (name, value) in &req.headers {
                call = call.header(name.as_str(), value.as_str());
            }
            match &req.body {
                Some(body) => call.send(body.as_bytes()),
                None => call.send_empty(),
            }
        }
        other => panic!("unexpected method in test: {other}"),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_vec().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

#[test]
fn host_driven_login_lifecycle() {
    let addr = start_server();
    let session = Arc::new(SessionManager::new());
    let config = ClientConfig::builder(&format!("http://{addr}"))
        .interceptor(Arc::new(SessionTokenInterceptor::new(Arc::clone(&session))))
        .build()
        .unwrap();
    let client = ApiClient::new(config);

    // Step 1: profile before login is a business error the app reacts to.
    let req = client.build_request(&AuthApi::Profile).unwrap();
    let err = client.parse_response::<UserProfile>(&execute(req)).unwrap_err();
    assert_eq!(err.business_code(), Some(mock_server::TOKEN_EXPIRED));
    assert!(session.require_login());

    // Step 2: request a code, then log in with a wrong one.
    let req = client
        .build_request(&AuthApi::SendCode {
            phone: "13800000000".to_string(),
        })
        .unwrap();
    client.parse_unit(&execute(req)).unwrap();

    let req = client
        .build_request(&AuthApi::Login {
            phone: "13800000000".to_string(),
            code: "0000".to_string(),
        })
        .unwrap();
    let err = client.parse_response::<LoginResponse>(&execute(req)).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Business { code: 4002, message: Some(ref m) } if m == "Invalid verification code"
    ));

    // Step 3: log in for real and record the token.
    let req = client
        .build_request(&AuthApi::Login {
            phone: "13800000000".to_string(),
            code: mock_server::VALID_CODE.to_string(),
        })
        .unwrap();
    let login: LoginResponse = client.parse_response(&execute(req)).unwrap();
    assert_eq!(login.user.name, "Xiaoyuan");
    session.record_login(login.token);

    // Step 4: the interceptor now authorizes the profile call.
    let req = client.build_request(&AuthApi::Profile).unwrap();
    assert!(req.header("authorization").is_some());
    let user: UserProfile = client.parse_response(&execute(req)).unwrap();
    assert_eq!(
        user,
        UserProfile {
            id: 123,
            name: "Xiaoyuan".to_string()
        }
    );

    // Step 5: logout answers code 200, which counts as success.
    let req = client.build_request(&AuthApi::Logout).unwrap();
    client.parse_unit(&execute(req)).unwrap();
    session.logout();

    // Step 6: no token, no profile.
    let req = client.build_request(&AuthApi::Profile).unwrap();
    assert!(req.header("authorization").is_none());
    let err = client.parse_response::<UserProfile>(&execute(req)).unwrap_err();
    assert_eq!(err.business_code(), Some(mock_server::TOKEN_EXPIRED));
}

struct XorDecrypter;

impl Decrypter for XorDecrypter {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
        Ok(mock_server::xor(ciphertext, mock_server::XOR_KEY))
    }
}

async fn logged_in(addr: SocketAddr, transport: &ReqwestTransport) -> Arc<SessionManager> {
    let session = Arc::new(SessionManager::new());
    let client = ApiClient::new(ClientConfig::builder(&format!("http://{addr}")).build().unwrap());
    let login: LoginResponse = client
        .request(
            transport,
            &AuthApi::Login {
                phone: "138".to_string(),
                code: mock_server::VALID_CODE.to_string(),
            },
        )
        .await
        .unwrap();
    session.record_login(login.token);
    session
}

#[tokio::test]
async fn encrypted_profile_requires_decrypter() {
    let addr = start_server();
    let transport = ReqwestTransport::new().unwrap();
    let session = logged_in(addr, &transport).await;
    let interceptor = Arc::new(SessionTokenInterceptor::new(session));

    let plain = ApiClient::new(
        ClientConfig::builder(&format!("http://{addr}"))
            .interceptor(interceptor.clone())
            .build()
            .unwrap(),
    );
    let err = plain
        .request::<UserProfile, _, _>(&transport, &AuthApi::SecureProfile)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decoding(DecodeError::MissingDecrypter)));

    let decrypting = ApiClient::new(
        ClientConfig::builder(&format!("http://{addr}"))
            .interceptor(interceptor)
            .decrypter(Arc::new(XorDecrypter))
            .debug_log(true)
            .build()
            .unwrap(),
    );
    let user: UserProfile = decrypting
        .request(&transport, &AuthApi::SecureProfile)
        .await
        .unwrap();
    assert_eq!(user.id, 123);
    assert_eq!(user.name, "Xiaoyuan");
}

#[tokio::test]
async fn get_with_json_encoding_travels_in_query() {
    let addr = start_server();
    let transport = ReqwestTransport::new().unwrap();
    let client = ApiClient::new(
        ClientConfig::builder(&format!("http://{addr}"))
            .parameter("platform", "ios")
            .build()
            .unwrap(),
    );

    let route = Route::get("/debug/echo")
        .parameter("q", "a b")
        .with_encoding(Encoding::Json);
    let echo: serde_json::Value = client.request(&transport, &route).await.unwrap();
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["query"], "platform=ios&q=a+b");
    assert_eq!(echo["body"], "");
    assert!(echo["content_type"].is_null());
}

#[tokio::test]
async fn post_url_form_travels_in_body() {
    let addr = start_server();
    let transport = ReqwestTransport::new().unwrap();
    let client = ApiClient::new(ClientConfig::builder(&format!("http://{addr}")).build().unwrap());

    let route = Route::post("/debug/echo")
        .parameter("tags", serde_json::json!(["a", "b"]))
        .with_encoding(Encoding::UrlForm);
    let echo: serde_json::Value = client.request(&transport, &route).await.unwrap();
    assert_eq!(echo["method"], "POST");
    assert!(echo["query"].is_null());
    assert_eq!(echo["body"], "tags%5B%5D=a&tags%5B%5D=b");
    assert_eq!(echo["content_type"], "application/x-www-form-urlencoded; charset=utf-8");
}

#[tokio::test]
async fn non_json_body_is_decoding_error() {
    let addr = start_server();
    let transport = ReqwestTransport::new().unwrap();
    let client = ApiClient::new(ClientConfig::builder(&format!("http://{addr}")).build().unwrap());

    let err = client
        .request::<serde_json::Value, _, _>(&transport, &Route::get("/debug/broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decoding(DecodeError::Envelope(_))));
}

#[tokio::test]
async fn http_failure_status_is_transport_error() {
    let addr = start_server();
    let transport = ReqwestTransport::new().unwrap();
    let client = ApiClient::new(ClientConfig::builder(&format!("http://{addr}")).build().unwrap());

    let err = client
        .request_unit(&transport, &Route::get("/debug/status/503"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Status { status: 503, .. })));
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Bind and drop to get a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let transport = ReqwestTransport::new().unwrap();
    let client = ApiClient::new(ClientConfig::builder(&format!("http://{addr}")).build().unwrap());

    let err = client
        .request_unit(&transport, &AuthApi::Logout)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
