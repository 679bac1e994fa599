//! Drive the C ABI the way a mobile host would: build a request, run it on
//! a blocking HTTP client, hand the response back for parsing.

use std::ffi::{CStr, CString};
use std::net::SocketAddr;
use std::os::raw::c_char;

use appkit_ffi::types::{
    FfiApiClient, FfiApiResult, FfiAuthState, FfiDataTag, FfiErrorCode, FfiHttpMethod,
    FfiHttpRequest, FfiHttpResponse, FfiLogin, FfiUser,
};
use appkit_ffi::*;

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

fn c_str<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
}

/// Run an `FfiHttpRequest` and return the status and body. Frees the request.
fn execute(req: *mut FfiHttpRequest) -> (u16, CString) {
    assert!(!req.is_null());
    let r = unsafe { &*req };
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let headers: Vec<(&str, &str)> = if r.headers.is_null() {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) }
            .iter()
            .map(|h| (c_str(h.key), c_str(h.value)))
            .collect()
    };

    let url = c_str(r.url);
    let mut response = match r.method {
        FfiHttpMethod::Get => {
            let mut call = agent.get(url);
            for (name, value) in &headers {
                call = call.header(*name, *value);
            }
            call.call()
        }
        FfiHttpMethod::Post => {
            let mut call = agent.post(url);
            for (name, value) in &headers {
                call = call.header(*name, *value);
            }
            if r.body.is_null() {
                call.send_empty()
            } else {
                call.send(c_str(r.body).as_bytes())
            }
        }
        other => panic!("unexpected method in test: {other:?}"),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    appkit_free_request(req);
    (status, CString::new(body).unwrap())
}

fn parse(
    parser: extern "C" fn(*const FfiApiClient, *const FfiHttpResponse) -> *mut FfiApiResult,
    client: *const FfiApiClient,
    (status, body): (u16, CString),
) -> *mut FfiApiResult {
    parser(
        client,
        &FfiHttpResponse {
            status,
            body: body.as_ptr(),
        },
    )
}

#[test]
fn login_profile_logout_through_c_abi() {
    let addr = start_server();
    appkit_init_logging(false);
    appkit_session_logout();

    let base = CString::new(format!("http://{addr}")).unwrap();
    let client = appkit_client_new(base.as_ptr(), true);
    assert!(!client.is_null());

    // Profile before login: business 4001, host asks for the login screen.
    let result = parse(appkit_parse_profile, client, execute(appkit_build_profile(client)));
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Business);
    assert_eq!(r.business_code, 4001);
    assert_eq!(c_str(r.error_message), "Token Expired");
    appkit_free_result(result);
    assert!(appkit_session_require_login());
    assert_eq!(appkit_session_state(), FfiAuthState::AwaitingLogin);

    // Send a code, then log in.
    let phone = CString::new("13800000000").unwrap();
    let result = parse(
        appkit_parse_empty,
        client,
        execute(appkit_build_send_code(client, phone.as_ptr())),
    );
    assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Ok);
    appkit_free_result(result);

    let code = CString::new(mock_server::VALID_CODE).unwrap();
    let result = parse(
        appkit_parse_login,
        client,
        execute(appkit_build_login(client, phone.as_ptr(), code.as_ptr())),
    );
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::Login);
    let login = unsafe { &*(r.data as *const FfiLogin) };
    assert_eq!(login.user.id, 123);
    assert!(appkit_session_record_login(login.token));
    appkit_free_result(result);
    assert_eq!(appkit_session_state(), FfiAuthState::LoggedIn);

    // The client now carries the bearer token.
    let result = parse(appkit_parse_profile, client, execute(appkit_build_profile(client)));
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::User);
    let user = unsafe { &*(r.data as *const FfiUser) };
    assert_eq!(c_str(user.name), "Xiaoyuan");
    appkit_free_result(result);

    // Logout answers code 200.
    let result = parse(appkit_parse_empty, client, execute(appkit_build_logout(client)));
    assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Ok);
    appkit_free_result(result);
    appkit_session_logout();
    assert!(appkit_session_token().is_null());

    // A bare 503 surfaces as a transport failure with the status attached.
    let result = appkit_parse_empty(
        client,
        &FfiHttpResponse {
            status: 503,
            body: std::ptr::null(),
        },
    );
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Transport);
    assert_eq!(r.http_status, 503);
    appkit_free_result(result);

    appkit_client_free(client);
}
