//! Request interceptors: last-moment adaptation of a built request.

use std::sync::Arc;

use crate::error::BoxError;
use crate::http::HttpRequest;
use crate::session::SessionManager;

/// Adapts a request after merging and before it is handed to the transport.
/// A failure aborts the call as `ApiError::Unknown`.
pub trait RequestInterceptor: Send + Sync {
    fn adapt(&self, request: HttpRequest) -> Result<HttpRequest, BoxError>;
}

/// Attaches `Authorization: Bearer <token>` while the session is logged in.
#[derive(Debug, Clone)]
pub struct SessionTokenInterceptor {
    session: Arc<SessionManager>,
}

impl SessionTokenInterceptor {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

impl RequestInterceptor for SessionTokenInterceptor {
    fn adapt(&self, mut request: HttpRequest) -> Result<HttpRequest, BoxError> {
        if let Some(token) = self.session.token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        Ok(request)
    }
}
