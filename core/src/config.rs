//! Client-wide configuration.
//!
//! A `ClientConfig` is supplied once per `ApiClient` and only read afterwards,
//! so concurrent calls share it without coordination.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::endpoint::{Headers, Parameters};
use crate::envelope::Decrypter;
use crate::error::ConfigError;
use crate::interceptor::RequestInterceptor;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_BASE_URL: &str = "APPKIT_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "APPKIT_TIMEOUT_SECS";
const ENV_DEBUG_LOG: &str = "APPKIT_DEBUG_LOG";

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) common_headers: Headers,
    pub(crate) common_parameters: Parameters,
    pub(crate) timeout: Duration,
    pub(crate) interceptor: Option<Arc<dyn RequestInterceptor>>,
    pub(crate) decrypter: Option<Arc<dyn Decrypter>>,
    pub(crate) debug_log: bool,
}

impl ClientConfig {
    pub fn builder(base_url: &str) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Start a builder from `APPKIT_BASE_URL`, `APPKIT_TIMEOUT_SECS` and
    /// `APPKIT_DEBUG_LOG`. Only the base URL is required.
    pub fn from_env() -> Result<ClientConfigBuilder, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfigBuilder, ConfigError> {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingVar(ENV_BASE_URL))?;
        let mut builder = ClientConfigBuilder::new(&base_url);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(ENV_DEBUG_LOG) {
            builder = builder.debug_log(parse_flag(ENV_DEBUG_LOG, &raw)?);
        }

        Ok(builder)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn common_headers(&self) -> &Headers {
        &self.common_headers
    }

    pub fn common_parameters(&self) -> &Parameters {
        &self.common_parameters
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn decrypter(&self) -> Option<&dyn Decrypter> {
        self.decrypter.as_deref()
    }

    pub fn interceptor(&self) -> Option<&dyn RequestInterceptor> {
        self.interceptor.as_deref()
    }

    pub fn debug_log(&self) -> bool {
        self.debug_log
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("common_headers", &self.common_headers)
            .field("common_parameters", &self.common_parameters)
            .field("timeout", &self.timeout)
            .field("interceptor", &self.interceptor.is_some())
            .field("decrypter", &self.decrypter.is_some())
            .field("debug_log", &self.debug_log)
            .finish()
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Builder for [`ClientConfig`]. The base URL is validated in `build`.
pub struct ClientConfigBuilder {
    base_url: String,
    common_headers: Headers,
    common_parameters: Parameters,
    timeout: Duration,
    interceptor: Option<Arc<dyn RequestInterceptor>>,
    decrypter: Option<Arc<dyn Decrypter>>,
    debug_log: bool,
}

impl ClientConfigBuilder {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            common_headers: Headers::new(),
            common_parameters: Parameters::new(),
            timeout: DEFAULT_TIMEOUT,
            interceptor: None,
            decrypter: None,
            debug_log: false,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.common_headers.insert(name.into(), value.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.common_parameters.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn decrypter(mut self, decrypter: Arc<dyn Decrypter>) -> Self {
        self.decrypter = Some(decrypter);
        self
    }

    pub fn debug_log(mut self, enabled: bool) -> Self {
        self.debug_log = enabled;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = Url::parse(self.base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }
        Ok(ClientConfig {
            base_url,
            common_headers: self.common_headers,
            common_parameters: self.common_parameters,
            timeout: self.timeout,
            interceptor: self.interceptor,
            decrypter: self.decrypter,
            debug_log: self.debug_log,
        })
    }
}
