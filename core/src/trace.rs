//! Request/response tracing for debug builds of the host app.
//!
//! Traces are `tracing` events under the `appkit::http` target. Building a
//! trace never fails: bodies that are not JSON are logged as lossy text.

use crate::http::{HttpRequest, HttpResponse};

const TARGET: &str = "appkit::http";

/// Emit the outgoing request with a cURL line that reproduces it.
pub fn trace_request(request: &HttpRequest) {
    tracing::debug!(
        target: TARGET,
        method = %request.method,
        url = %request.url,
        curl = %to_curl(request),
        "sending request"
    );
}

pub fn trace_response(response: &HttpResponse) {
    tracing::debug!(
        target: TARGET,
        status = response.status,
        body = %render_body(&response.body),
        "received response"
    );
}

/// Render a request as an equivalent `curl` command line. Credentials in
/// `Authorization` are masked.
pub fn to_curl(request: &HttpRequest) -> String {
    let mut parts = vec!["curl -v".to_string()];
    parts.push(format!("-X {}", request.method));
    for (name, value) in &request.headers {
        let value = if name.eq_ignore_ascii_case("authorization") {
            mask_credentials(value)
        } else {
            value.clone()
        };
        parts.push(format!("-H {}", shell_quote(&format!("{name}: {value}"))));
    }
    if let Some(body) = &request.body {
        parts.push(format!("-d {}", shell_quote(body)));
    }
    parts.push(shell_quote(&request.url));
    parts.join(" \\\n\t")
}

/// Pretty JSON when the body parses, raw text otherwise.
pub fn render_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

/// Keep the auth scheme, hide the secret: `Bearer abc` becomes `Bearer ***`.
fn mask_credentials(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{scheme} ***"),
        None => "***".to_string(),
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
