//! C-ABI wrapper around `appkit-core` for the mobile host.
//!
//! # Overview
//! Exposes the account API, the color codec and the session holder through
//! `extern "C"` functions so Swift/Kotlin can build requests, run them on
//! their own HTTP stack, and parse the envelope without linking an async
//! runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-endpoint `build_*` / `parse_*` mirror the core host-does-IO split.
//! - A single `FfiApiResult` with `FfiDataTag` + `void* data` conveys success
//!   payloads and errors uniformly.
//! - Clients attach the process-wide session's bearer token automatically;
//!   the `appkit_session_*` functions drive that same session.
//! - The C caller owns all returned pointers and must call the matching
//!   `appkit_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Once};

use appkit_core::{
    ApiClient, AuthApi, ClientConfig, HttpResponse, LoginResponse, Rgba, SessionManager,
    SessionTokenInterceptor, UserProfile,
};
use tracing_subscriber::EnvFilter;

use types::*;

/// Borrow a C string as `&str`. Null or invalid UTF-8 yields `None`.
fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

static LOGGING: Once = Once::new();

/// Install the process-wide `tracing` subscriber. `RUST_LOG` wins when set;
/// otherwise `debug` selects debug level for this library. Only the first
/// call has any effect.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_init_logging(debug: bool) {
    let _ = catch_unwind(|| {
        LOGGING.call_once(|| {
            let default = if debug { "appkit=debug" } else { "appkit=info" };
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        });
    });
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`.
///
/// Returns null if `base_url` is null or not an http(s) URL, or if an
/// internal panic occurs. The caller must free the returned pointer with
/// `appkit_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_client_new(base_url: *const c_char, debug_log: bool) -> *mut FfiApiClient {
    catch_unwind(|| {
        let Some(url) = str_arg(base_url) else {
            return std::ptr::null_mut();
        };
        let interceptor = SessionTokenInterceptor::new(SessionManager::global());
        let config = ClientConfig::builder(url)
            .interceptor(Arc::new(interceptor))
            .debug_log(debug_log)
            .build();
        match config {
            Ok(config) => Box::into_raw(Box::new(FfiApiClient {
                inner: ApiClient::new(config),
            })),
            Err(e) => {
                tracing::warn!(target: "appkit::ffi", error = %e, "rejected client configuration");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `appkit_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

fn build(client: *const FfiApiClient, api: &AuthApi) -> *mut FfiHttpRequest {
    if client.is_null() {
        return std::ptr::null_mut();
    }
    let client = unsafe { &*client };
    match client.inner.build_request(api) {
        Ok(req) => FfiHttpRequest::from_core(req),
        Err(e) => {
            tracing::warn!(target: "appkit::ffi", error = %e, "failed to build request");
            std::ptr::null_mut()
        }
    }
}

/// Build a request asking the server to text a verification code.
///
/// Returns null if `client` or `phone` is null.
/// The caller must free the returned pointer with `appkit_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_build_send_code(
    client: *const FfiApiClient,
    phone: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(phone) = str_arg(phone) else {
            return std::ptr::null_mut();
        };
        build(
            client,
            &AuthApi::SendCode {
                phone: phone.to_string(),
            },
        )
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a login request.
///
/// Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_build_login(
    client: *const FfiApiClient,
    phone: *const c_char,
    code: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        let (Some(phone), Some(code)) = (str_arg(phone), str_arg(code)) else {
            return std::ptr::null_mut();
        };
        build(
            client,
            &AuthApi::Login {
                phone: phone.to_string(),
                code: code.to_string(),
            },
        )
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request for the logged-in user's profile.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_build_profile(client: *const FfiApiClient) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| build(client, &AuthApi::Profile))).unwrap_or(std::ptr::null_mut())
}

/// Build a logout request.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_build_logout(client: *const FfiApiClient) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| build(client, &AuthApi::Logout))).unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        Vec::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_bytes().to_vec()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Shared null checks and conversion for every parser.
fn parse_with(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&ApiClient, &HttpResponse) -> *mut FfiApiResult,
) -> *mut FfiApiResult {
    if client.is_null() {
        return FfiApiResult::null_arg("client");
    }
    if response.is_null() {
        return FfiApiResult::null_arg("response");
    }
    let client = unsafe { &*client };
    let resp = ffi_response_to_core(unsafe { &*response });
    parse(&client.inner, &resp)
}

/// Parse the response of a login request.
///
/// Returns a result with `data_tag = Login` on success. The caller records
/// the token with `appkit_session_record_login`.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_parse_login(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiApiResult {
    catch_unwind(AssertUnwindSafe(|| {
        parse_with(client, response, |c, r| match c.parse_response::<LoginResponse>(r) {
            Ok(login) => FfiApiResult::ok_login(login),
            Err(e) => FfiApiResult::from_error(e),
        })
    }))
    .unwrap_or_else(|_| FfiApiResult::panic("panic in appkit_parse_login"))
}

/// Parse the response of a profile request.
///
/// Returns a result with `data_tag = User` on success.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_parse_profile(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiApiResult {
    catch_unwind(AssertUnwindSafe(|| {
        parse_with(client, response, |c, r| match c.parse_response::<UserProfile>(r) {
            Ok(user) => FfiApiResult::ok_user(user),
            Err(e) => FfiApiResult::from_error(e),
        })
    }))
    .unwrap_or_else(|_| FfiApiResult::panic("panic in appkit_parse_profile"))
}

/// Parse a response where only the envelope code matters (send-code, logout).
///
/// Returns a result with `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_parse_empty(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiApiResult {
    catch_unwind(AssertUnwindSafe(|| {
        parse_with(client, response, |c, r| match c.parse_unit(r) {
            Ok(()) => FfiApiResult::ok_empty(),
            Err(e) => FfiApiResult::from_error(e),
        })
    }))
    .unwrap_or_else(|_| FfiApiResult::panic("panic in appkit_parse_empty"))
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Decode `RGB`, `RRGGBB` or `AARRGGBB`. Null or unrecognized input yields
/// opaque black.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_color_from_hex(hex: *const c_char) -> FfiColor {
    catch_unwind(|| FfiColor::from(Rgba::from_hex(str_arg(hex).unwrap_or(""))))
        .unwrap_or(FfiColor::from(Rgba::BLACK))
}

/// Encode as `AARRGGBB`. Free the result with `appkit_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_color_to_hex(color: FfiColor) -> *mut c_char {
    catch_unwind(|| c_string(Rgba::from(color).to_hex())).unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Ask the UI to show login unless already logged in. Returns whether the
/// flag flipped.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_require_login() -> bool {
    catch_unwind(|| SessionManager::global().require_login()).unwrap_or(false)
}

/// Record a successful login. Returns false (and changes nothing) if `token`
/// is null.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_record_login(token: *const c_char) -> bool {
    catch_unwind(|| match str_arg(token) {
        Some(token) => {
            SessionManager::global().record_login(token);
            true
        }
        None => false,
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_logout() {
    let _ = catch_unwind(|| SessionManager::global().logout());
}

#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_state() -> FfiAuthState {
    catch_unwind(|| FfiAuthState::from(SessionManager::global().state())).unwrap_or(FfiAuthState::LoggedOut)
}

#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_show_login() -> bool {
    catch_unwind(|| SessionManager::global().snapshot().show_login).unwrap_or(false)
}

/// The current bearer token, or null when logged out. Free the result with
/// `appkit_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_session_token() -> *mut c_char {
    catch_unwind(|| match SessionManager::global().token() {
        Some(token) => c_string(token),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `appkit_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiApiResult` returned by any `appkit_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_free_result(result: *mut FfiApiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::User => {
                    let user = unsafe { Box::from_raw(result.data as *mut FfiUser) };
                    free_c_string(user.name);
                }
                FfiDataTag::Login => {
                    let login = unsafe { Box::from_raw(result.data as *mut FfiLogin) };
                    free_c_string(login.token);
                    free_c_string(login.user.name);
                }
                FfiDataTag::None => {}
            }
        }
    });
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn appkit_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
