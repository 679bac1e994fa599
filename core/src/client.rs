//! The request engine.
//!
//! # Design
//! `ApiClient` holds only a shared, read-only `ClientConfig`. Each call is
//! split into `build_request` (merge, encode, intercept, trace) and
//! `parse_response` (trace, status check, envelope decode, unwrap) so a host that
//! owns the network can run the round-trip itself. `request` composes the
//! two around a single `Transport::execute` await.
//!
//! Every call merges into a fresh, call-local request; concurrent calls share
//! nothing mutable.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::envelope::{self, Envelope};
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::merge::MergedRequest;
use crate::trace;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Merge `endpoint` with the configuration and produce the wire request.
    pub fn build_request<E: Endpoint + ?Sized>(&self, endpoint: &E) -> Result<HttpRequest, ApiError> {
        let mut request =
            MergedRequest::merge(endpoint, &self.config).into_http_request(Some(self.config.timeout()));

        if let Some(interceptor) = self.config.interceptor() {
            request = interceptor.adapt(request).map_err(ApiError::Unknown)?;
        }

        if self.config.debug_log() {
            trace::trace_request(&request);
        }
        Ok(request)
    }

    /// Decode the envelope of `response` without unwrapping it.
    pub fn parse_envelope<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<Envelope<T>, ApiError> {
        if self.config.debug_log() {
            trace::trace_response(response);
        }
        check_status(response)?;
        Ok(envelope::decode(&response.body, self.config.decrypter())?)
    }

    /// Decode `response` and return its `data`.
    pub fn parse_response<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, ApiError> {
        self.parse_envelope(response)?.into_data()
    }

    /// Decode `response` where only the success code matters.
    pub fn parse_unit(&self, response: &HttpResponse) -> Result<(), ApiError> {
        self.parse_envelope::<serde::de::IgnoredAny>(response)?.into_outcome()?;
        Ok(())
    }

    /// Perform one call and return the envelope's `data`.
    pub async fn request<T, E, Tr>(&self, transport: &Tr, endpoint: &E) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        E: Endpoint + ?Sized,
        Tr: Transport + ?Sized,
    {
        let response = self.execute(transport, endpoint).await?;
        self.parse_response(&response)
    }

    /// Perform one call whose success envelope carries no `data`.
    pub async fn request_unit<E, Tr>(&self, transport: &Tr, endpoint: &E) -> Result<(), ApiError>
    where
        E: Endpoint + ?Sized,
        Tr: Transport + ?Sized,
    {
        let response = self.execute(transport, endpoint).await?;
        self.parse_unit(&response)
    }

    async fn execute<E, Tr>(&self, transport: &Tr, endpoint: &E) -> Result<HttpResponse, ApiError>
    where
        E: Endpoint + ?Sized,
        Tr: Transport + ?Sized,
    {
        let request = self.build_request(endpoint)?;
        Ok(transport.execute(request).await?)
    }
}

/// Non-2xx statuses never reach the envelope decoder.
fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: response.text(),
    })
}
