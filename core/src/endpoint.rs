//! Endpoint descriptors.
//!
//! An endpoint is anything that can say where a call goes and what it
//! carries. Concrete APIs implement [`Endpoint`] on an enum (see
//! [`crate::api::AuthApi`]); one-off calls use [`Route`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use crate::http::HttpMethod;

/// Request parameters, keyed by name. Ordered so encoded output is stable.
pub type Parameters = BTreeMap<String, Value>;

/// Request headers, keyed by name.
pub type Headers = BTreeMap<String, String>;

/// How parameters are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// JSON object body.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`, in the query for GET/HEAD/DELETE
    /// and in the body otherwise.
    UrlForm,
}

/// The immutable description of one API call.
pub trait Endpoint {
    /// Overrides the configured base URL when present.
    fn base_url(&self) -> Option<Url> {
        None
    }

    fn path(&self) -> Cow<'_, str>;

    fn method(&self) -> HttpMethod;

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn headers(&self) -> Headers {
        Headers::new()
    }

    fn encoding(&self) -> Encoding {
        Encoding::Json
    }
}

/// Ad-hoc endpoint for calls that do not warrant their own enum.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    base_url: Option<Url>,
    path: String,
    method: HttpMethod,
    parameters: Parameters,
    headers: Headers,
    encoding: Encoding,
}

impl Route {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            base_url: None,
            path: path.into(),
            method,
            parameters: Parameters::new(),
            headers: Headers::new(),
            encoding: Encoding::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl Endpoint for Route {
    fn base_url(&self) -> Option<Url> {
        self.base_url.clone()
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }

    fn headers(&self) -> Headers {
        self.headers.clone()
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }
}
