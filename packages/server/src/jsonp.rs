//! JSONP response wrapping.
//!
//! Every GET endpoint honors an optional `jsonp` query parameter: when
//! present and syntactically valid, the body becomes a script-executable
//! function call and the content type switches to JavaScript. Absent
//! the parameter, responses pass through unchanged.

use actix_web::HttpResponse;

/// Content type for plain JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for Atom feed responses.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";
/// Content type for JSONP-wrapped responses.
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Whether a callback name is safe to echo into a script body.
///
/// Accepts dotted JavaScript identifier paths (`cb`, `app.handlers.cb`).
#[must_use]
pub fn is_valid_callback(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

/// Wraps a response body in a JSONP function call.
///
/// JSON bodies are embedded as-is; anything else (e.g. Atom XML) is
/// JSON string-encoded first so the result is always valid JavaScript.
#[must_use]
pub fn wrap(callback: &str, body: &str, content_type: &str) -> String {
    if content_type == JSON_CONTENT_TYPE {
        format!("{callback}({body});")
    } else {
        let encoded = serde_json::to_string(body).unwrap_or_else(|_| "\"\"".to_string());
        format!("{callback}({encoded});")
    }
}

/// Builds a GET response, applying JSONP wrapping when requested.
///
/// An invalid callback name is treated as absent rather than echoed
/// into a script body.
#[must_use]
pub fn api_get_response(jsonp: Option<&str>, body: String, content_type: &str) -> HttpResponse {
    match jsonp.filter(|cb| is_valid_callback(cb)) {
        Some(callback) => HttpResponse::Ok()
            .content_type(JAVASCRIPT_CONTENT_TYPE)
            .body(wrap(callback, &body, content_type)),
        None => HttpResponse::Ok().content_type(content_type).body(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_json_body_verbatim() {
        assert_eq!(wrap("cb", r#"{"a":1}"#, JSON_CONTENT_TYPE), r#"cb({"a":1});"#);
    }

    #[test]
    fn string_encodes_non_json_body() {
        let wrapped = wrap("cb", "<feed/>", ATOM_CONTENT_TYPE);
        assert_eq!(wrapped, r#"cb("<feed/>");"#);
    }

    #[test]
    fn accepts_plain_and_dotted_callbacks() {
        assert!(is_valid_callback("cb"));
        assert!(is_valid_callback("_handler$2"));
        assert!(is_valid_callback("app.handlers.cb"));
    }

    #[test]
    fn rejects_script_injection_callbacks() {
        assert!(!is_valid_callback(""));
        assert!(!is_valid_callback("alert(1)//"));
        assert!(!is_valid_callback("2cb"));
        assert!(!is_valid_callback("a..b"));
        assert!(!is_valid_callback("cb;"));
    }

    #[actix_web::test]
    async fn response_without_callback_is_unchanged() {
        let resp = api_get_response(None, r#"{"a":1}"#.to_string(), JSON_CONTENT_TYPE);
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let content_type = resp
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .unwrap();
        assert_eq!(content_type, JSON_CONTENT_TYPE);
    }

    #[actix_web::test]
    async fn response_with_callback_switches_content_type() {
        let resp = api_get_response(Some("cb"), r#"{"a":1}"#.to_string(), JSON_CONTENT_TYPE);
        let content_type = resp
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .unwrap();
        assert_eq!(content_type, JAVASCRIPT_CONTENT_TYPE);
    }
}
