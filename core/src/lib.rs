//! Application-support core for the mobile client.
//!
//! # Overview
//! - A typed request/response layer over the server's uniform envelope
//!   (`{code, message, data, trace_id, is_encrypted}`), with a small error
//!   taxonomy separating transport, decoding and business failures.
//! - An `AARRGGBB` hex codec for colors.
//! - The session (auth) state holder shared by the app.
//!
//! # Design
//! - `ApiClient` is stateless beyond its read-only `ClientConfig`.
//! - Each call splits into `build_request` and `parse_response` so the host
//!   may own the network (host-does-IO); `request` composes both around a
//!   `Transport`.
//! - Capabilities (interceptor, decrypter, transport) are traits handed in
//!   explicitly, never looked up from ambient state.

pub mod api;
pub mod client;
pub mod color;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod merge;
pub mod session;
pub mod trace;
pub mod transport;

pub use api::{AuthApi, LoginResponse, UserProfile};
pub use client::ApiClient;
pub use color::Rgba;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::{Encoding, Endpoint, Headers, Parameters, Route};
pub use envelope::{Decrypter, Envelope};
pub use error::{ApiError, BoxError, ConfigError, DecodeError, DecryptError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{RequestInterceptor, SessionTokenInterceptor};
pub use session::{AuthState, Session, SessionManager};
pub use transport::{ReqwestTransport, Transport};
