//! Merging an endpoint with the client configuration.
//!
//! Merging is total: every endpoint/configuration pair produces a request.
//! The endpoint wins on parameter and header name collisions, and a GET that
//! asks for a JSON body is quietly sent URL-form encoded instead.

use std::time::Duration;

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::config::ClientConfig;
use crate::endpoint::{Encoding, Endpoint, Headers, Parameters};
use crate::http::{HttpMethod, HttpRequest};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// The call-local result of merging one endpoint with the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub parameters: Parameters,
    pub encoding: Encoding,
}

impl MergedRequest {
    pub fn merge<E: Endpoint + ?Sized>(endpoint: &E, config: &ClientConfig) -> Self {
        let method = endpoint.method();
        let base = endpoint.base_url().unwrap_or_else(|| config.base_url().clone());
        let url = join_url(&base, &endpoint.path());

        let mut parameters = config.common_parameters().clone();
        parameters.extend(endpoint.parameters());

        let mut headers = config.common_headers().clone();
        for (name, value) in endpoint.headers() {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            headers.insert(name, value);
        }

        let encoding = match (method, endpoint.encoding()) {
            (HttpMethod::Get, Encoding::Json) => Encoding::UrlForm,
            (_, encoding) => encoding,
        };

        Self {
            method,
            url,
            headers,
            parameters,
            encoding,
        }
    }

    /// Encode parameters per `encoding` and produce the wire request.
    pub fn into_http_request(self, timeout: Option<Duration>) -> HttpRequest {
        let mut url = self.url;
        let mut headers: Vec<(String, String)> = self.headers.into_iter().collect();
        let mut body = None;

        match self.encoding {
            Encoding::Json => {
                body = Some(Value::Object(self.parameters.into_iter().collect()).to_string());
                set_default_header(&mut headers, "Content-Type", JSON_CONTENT_TYPE);
            }
            Encoding::UrlForm if self.method.encodes_in_query() => {
                if !self.parameters.is_empty() {
                    let query = form_encode(&self.parameters);
                    let separator = if url.contains('?') { '&' } else { '?' };
                    url.push(separator);
                    url.push_str(&query);
                }
            }
            Encoding::UrlForm => {
                body = Some(form_encode(&self.parameters));
                set_default_header(&mut headers, "Content-Type", FORM_CONTENT_TYPE);
            }
        }

        HttpRequest {
            method: self.method,
            url,
            headers,
            body,
            timeout,
        }
    }
}

/// Append `path` to the base URL's path with exactly one slash between them.
/// A query on the base URL is kept after the joined path; a fragment is dropped.
fn join_url(base: &Url, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let mut url = base.clone();
    let joined = format!("{}/{path}", base.path().trim_end_matches('/'));
    url.set_path(&joined);
    url.set_fragment(None);
    url.into()
}

fn set_default_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)) {
        headers.push((name.to_string(), value.to_string()));
    }
}

/// Form-encode parameters. Arrays become `key[]=v`, objects `key[sub]=v`.
pub fn form_encode(parameters: &Parameters) -> String {
    let mut pairs = Vec::new();
    for (key, value) in parameters {
        flatten(key, value, &mut pairs);
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(&format!("{key}[]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(&format!("{key}[{sub}]"), item, out);
            }
        }
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Null => out.push((key.to_string(), String::new())),
        other => out.push((key.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Route;
    use serde_json::json;
    use url::Url;

    fn config() -> ClientConfig {
        ClientConfig::builder("https://api.example.com/v1/")
            .header("X-App", "campus")
            .header("Accept-Language", "zh")
            .parameter("platform", "ios")
            .parameter("page", 1)
            .build()
            .unwrap()
    }

    #[test]
    fn url_joins_base_and_path() {
        let merged = MergedRequest::merge(&Route::post("/auth/login"), &config());
        assert_eq!(merged.url, "https://api.example.com/v1/auth/login");
        let merged = MergedRequest::merge(&Route::post("auth/login"), &config());
        assert_eq!(merged.url, "https://api.example.com/v1/auth/login");
    }

    #[test]
    fn base_url_query_stays_after_joined_path() {
        let config = ClientConfig::builder("https://api.example.com/v1?k=1#top").build().unwrap();
        let merged = MergedRequest::merge(&Route::post("/auth/login"), &config);
        assert_eq!(merged.url, "https://api.example.com/v1/auth/login?k=1");

        let request = MergedRequest::merge(&Route::get("/x").parameter("page", 2), &config).into_http_request(None);
        assert_eq!(request.url, "https://api.example.com/v1/x?k=1&page=2");
    }

    #[test]
    fn endpoint_base_url_overrides_config() {
        let route = Route::get("/img").with_base_url(Url::parse("https://cdn.example.com").unwrap());
        let merged = MergedRequest::merge(&route, &config());
        assert_eq!(merged.url, "https://cdn.example.com/img");
    }

    #[test]
    fn endpoint_parameters_win_on_collision() {
        let route = Route::post("/list").parameter("page", 3).parameter("q", "x");
        let merged = MergedRequest::merge(&route, &config());
        assert_eq!(merged.parameters["page"], 3);
        assert_eq!(merged.parameters["platform"], "ios");
        assert_eq!(merged.parameters["q"], "x");
    }

    #[test]
    fn headers_merge_additively() {
        let route = Route::post("/x").header("X-Trace", "1").header("accept-language", "en");
        let merged = MergedRequest::merge(&route, &config());
        assert_eq!(merged.headers.len(), 3);
        assert_eq!(merged.headers["X-App"], "campus");
        assert_eq!(merged.headers["X-Trace"], "1");
        assert_eq!(merged.headers["accept-language"], "en");
    }

    #[test]
    fn get_with_json_is_downgraded_to_url_form() {
        let merged = MergedRequest::merge(&Route::get("/x"), &config());
        assert_eq!(merged.encoding, Encoding::UrlForm);

        let request = merged.into_http_request(None);
        assert!(request.body.is_none());
        assert_eq!(request.header("content-type"), None);
        assert_eq!(request.url, "https://api.example.com/v1/x?page=1&platform=ios");
    }

    #[test]
    fn post_json_sends_body() {
        let route = Route::post("/x").parameter("name", "Xiaoyuan");
        let request = MergedRequest::merge(&route, &config()).into_http_request(None);
        assert_eq!(request.header("content-type"), Some(JSON_CONTENT_TYPE));
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "Xiaoyuan", "page": 1, "platform": "ios"}));
    }

    #[test]
    fn post_url_form_sends_form_body() {
        let route = Route::post("/x")
            .parameter("name", "a b")
            .with_encoding(Encoding::UrlForm);
        let request = MergedRequest::merge(&route, &config()).into_http_request(None);
        assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.body.as_deref(), Some("name=a+b&page=1&platform=ios"));
        assert_eq!(request.url, "https://api.example.com/v1/x");
    }

    #[test]
    fn delete_url_form_uses_query() {
        let route = Route::new(HttpMethod::Delete, "/x?force=1")
            .parameter("id", 9)
            .with_encoding(Encoding::UrlForm);
        let request = MergedRequest::merge(&route, &config()).into_http_request(None);
        assert!(request.body.is_none());
        assert_eq!(request.url, "https://api.example.com/v1/x?force=1&id=9&page=1&platform=ios");
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let route = Route::post("/x").header("Content-Type", "application/vnd.api+json");
        let request = MergedRequest::merge(&route, &config()).into_http_request(None);
        assert_eq!(request.header("content-type"), Some("application/vnd.api+json"));
    }

    #[test]
    fn form_encoding_flattens_nested_values() {
        let mut params = Parameters::new();
        params.insert("ids".to_string(), json!([1, 2]));
        params.insert("filter".to_string(), json!({"kind": "new", "open": true}));
        params.insert("note".to_string(), Value::Null);
        assert_eq!(
            form_encode(&params),
            "filter%5Bkind%5D=new&filter%5Bopen%5D=true&ids%5B%5D=1&ids%5B%5D=2&note="
        );
    }

    #[test]
    fn timeout_is_carried() {
        let request = MergedRequest::merge(&Route::get("/x"), &config())
            .into_http_request(Some(Duration::from_secs(3)));
        assert_eq!(request.timeout, Some(Duration::from_secs(3)));
    }
}
