//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use appkit_core::{ApiError, AuthState, HttpMethod, LoginResponse, Rgba, UserProfile};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiApiClient {
    pub(crate) inner: appkit_core::ApiClient,
}

/// Owned C string from Rust text. Interior NULs yield an empty string.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
    Head = 5,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Head => FfiHttpMethod::Head,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `appkit_build_*` functions. The host executes the request
/// (honouring `timeout_ms`) and passes the response back through
/// `appkit_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: appkit_core::HttpRequest) -> *mut Self {
        let url = c_string(req.url);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };
        let timeout_ms = req
            .timeout
            .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
            timeout_ms,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host constructs this on the stack after executing a request, then
/// passes a pointer to an `appkit_parse_*` function. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiApiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NoResponse = 1,
    Decoding = 2,
    Transport = 3,
    Business = 4,
    Unknown = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `appkit_free_result` what `FfiApiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    User = 1,
    Login = 2,
}

/// A user profile exposed to C.
#[repr(C)]
pub struct FfiUser {
    pub id: i64,
    pub name: *mut c_char,
}

impl FfiUser {
    fn from_core(user: UserProfile) -> Self {
        FfiUser {
            id: user.id,
            name: c_string(user.name),
        }
    }
}

/// A successful login exposed to C.
#[repr(C)]
pub struct FfiLogin {
    pub token: *mut c_char,
    pub user: FfiUser,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category and `error_message` is a
/// human-readable C string. For `Business` failures `business_code` holds the
/// server's code and `error_message` its message verbatim (or null when the
/// server sent none); for `Transport` failures on a bad status, `http_status`
/// is set.
#[repr(C)]
pub struct FfiApiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub business_code: i64,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiApiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        data_tag: FfiDataTag,
        data: *mut std::ffi::c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiApiResult {
            error_code,
            error_message,
            business_code: 0,
            http_status: 0,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a single `FfiUser`.
    pub(crate) fn ok_user(user: UserProfile) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiUser::from_core(user)));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::User, data.cast())
    }

    /// Build a success result carrying an `FfiLogin`.
    pub(crate) fn ok_login(login: LoginResponse) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiLogin {
            token: c_string(login.token),
            user: FfiUser::from_core(login.user),
        }));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Login, data.cast())
    }

    /// Build a success result with no data payload (e.g. logout).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        let (error_code, business_code, http_status, message) = match err {
            ApiError::NoResponse => (FfiErrorCode::NoResponse, 0, 0, c_string(msg)),
            ApiError::Decoding(_) => (FfiErrorCode::Decoding, 0, 0, c_string(msg)),
            ApiError::Transport(appkit_core::TransportError::Status { status, .. }) => {
                (FfiErrorCode::Transport, 0, status, c_string(msg))
            }
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0, 0, c_string(msg)),
            ApiError::Business { code, message } => (
                FfiErrorCode::Business,
                code,
                0,
                message.map(c_string).unwrap_or(std::ptr::null_mut()),
            ),
            ApiError::Unknown(_) => (FfiErrorCode::Unknown, 0, 0, c_string(msg)),
        };

        Box::into_raw(Box::new(FfiApiResult {
            error_code,
            error_message: message,
            business_code,
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = c_string(format!("null argument: {name}"));
        Self::boxed(FfiErrorCode::NullArg, msg, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg), FfiDataTag::None, std::ptr::null_mut())
    }
}

// ---------------------------------------------------------------------------
// Color and session
// ---------------------------------------------------------------------------

/// A color with normalized `[0, 1]` channels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FfiColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl From<Rgba> for FfiColor {
    fn from(c: Rgba) -> Self {
        FfiColor {
            red: c.red,
            green: c.green,
            blue: c.blue,
            alpha: c.alpha,
        }
    }
}

impl From<FfiColor> for Rgba {
    fn from(c: FfiColor) -> Self {
        Rgba::new(c.red, c.green, c.blue, c.alpha)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiAuthState {
    LoggedOut = 0,
    AwaitingLogin = 1,
    LoggedIn = 2,
}

impl From<AuthState> for FfiAuthState {
    fn from(s: AuthState) -> Self {
        match s {
            AuthState::LoggedOut => FfiAuthState::LoggedOut,
            AuthState::AwaitingLogin => FfiAuthState::AwaitingLogin,
            AuthState::LoggedIn => FfiAuthState::LoggedIn,
        }
    }
}
