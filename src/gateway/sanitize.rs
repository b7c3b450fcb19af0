//! Outgoing response scrubbing.
//!
//! The outermost layer of the stack: every response, success or rejection,
//! passes through here. Implementation details (server banners, debug
//! headers, stack traces, credential material, internal ids) are stripped;
//! unknown-route and disallowed-method responses collapse into one fixed 404.

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// Response body keys that leak implementation detail or credentials.
const SCRUB_KEYS: &[&str] = &[
    "stack",
    "stackTrace",
    "debug",
    "env",
    "environment",
    "config",
    "sql",
    "dbQuery",
    "mongoQuery",
    "version",
    "password",
    "hashedPassword",
    "__v",
    "_id",
];

/// Largest response body the sanitizer will buffer for scrubbing.
const MAX_SCRUB_BYTES: usize = 1 << 20;

/// The fixed body for unknown routes and disallowed methods.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"code": "not_found", "message": "Resource not found"}})),
    )
        .into_response()
}

/// Sanitizing middleware. Mounted outermost so rejections and fallbacks are
/// covered as well as handler output.
pub async fn layer(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    // The verb is always the literal HTTP method; which other verbs a path
    // would accept is not disclosed.
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return not_found();
    }

    sanitize(response).await
}

async fn sanitize(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_headers(&mut parts.headers);

    let is_json = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if !is_json {
        return Response::from_parts(parts, body);
    }

    let bytes = match to_bytes(body, MAX_SCRUB_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            // Oversized or broken body stream. Replace rather than leak,
            // and drop the now-wrong framing header.
            parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let scrubbed = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            scrub_value(&mut value);
            serde_json::to_vec(&value).unwrap_or_default()
        }
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(scrubbed.len() as u64),
    );

    Response::from_parts(parts, Body::from(scrubbed))
}

fn strip_headers(headers: &mut HeaderMap) {
    let doomed: Vec<_> = headers
        .keys()
        .filter(|name| {
            let name = name.as_str();
            name == "x-powered-by"
                || name == "server"
                || name.ends_with("-version")
                || name.starts_with("x-debug")
                || name.starts_with("x-trace")
        })
        .cloned()
        .collect();

    for name in doomed {
        headers.remove(&name);
    }

    // Wildcard origin combined with credentials is never allowed out.
    let wildcard_origin = headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_some_and(|v| v.as_bytes() == b"*");
    if wildcard_origin {
        headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
    }
}

/// Removes scrubbed keys recursively, through objects and arrays.
fn scrub_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !SCRUB_KEYS.contains(&key.as_str()));
            for nested in map.values_mut() {
                scrub_value(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                scrub_value(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_removes_internal_keys_at_depth() {
        let mut value = json!({
            "user": {"name": "a", "password": "x", "_id": "507f1f77"},
            "items": [{"stack": "trace", "keep": 1}],
            "version": "1.2.3"
        });
        scrub_value(&mut value);
        assert_eq!(
            value,
            json!({"user": {"name": "a"}, "items": [{"keep": 1}]})
        );
    }

    #[tokio::test]
    async fn test_unscannable_json_body_is_emptied_with_framing() {
        let oversized = vec![b'a'; MAX_SCRUB_BYTES + 1];
        let response = axum::http::Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, oversized.len())
            .body(Body::from(oversized))
            .unwrap();

        let out = sanitize(response).await;

        assert!(out.headers().get(header::CONTENT_LENGTH).is_none());
        let bytes = to_bytes(out.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_strip_headers_removes_banners_and_debug() {
        let mut headers = HeaderMap::new();
        headers.insert("x-powered-by", HeaderValue::from_static("Express"));
        headers.insert("server", HeaderValue::from_static("nginx/1.2"));
        headers.insert("app-version", HeaderValue::from_static("9.9"));
        headers.insert("x-debug-sql", HeaderValue::from_static("SELECT 1"));
        headers.insert("x-trace-id", HeaderValue::from_static("abc"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        strip_headers(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("content-type"));
    }

    #[test]
    fn test_wildcard_origin_drops_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );

        strip_headers(&mut headers);

        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }

    #[test]
    fn test_specific_origin_keeps_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://app.example.com"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );

        strip_headers(&mut headers);

        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }
}
