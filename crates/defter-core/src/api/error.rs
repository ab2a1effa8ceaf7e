//! Error taxonomy for API calls.
//!
//! Every failure a caller can observe is an `ApiError`. Four classes carry
//! fixed localized messages matching what the mobile app shows its
//! (Turkish-speaking) users; everything else passes the backend's own words
//! through for the caller to inspect.

use serde::Deserialize;
use thiserror::Error;

use crate::auth::StoreError;

/// Fixed message for an expired or rejected session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Oturum süreniz doldu. Lütfen tekrar giriş yapın.";

/// Fixed message when no response arrives (offline, DNS failure, timeout).
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Sunucuya bağlanılamıyor. Lütfen internet bağlantınızı kontrol edin.";

/// Fixed message for HTTP 429.
pub const RATE_LIMIT_MESSAGE: &str = "Çok fazla istek gönderdiniz. Lütfen biraz bekleyin.";

/// Fixed message for HTTP 5xx.
pub const SERVER_ERROR_MESSAGE: &str = "Sunucu hatası. Lütfen daha sonra tekrar deneyin.";

/// Maximum length of a response body quoted in an error display
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the stored token; the session has been torn
    /// down by the time the caller sees this.
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,

    /// No response was received at all. Covers unreachable hosts, DNS
    /// failures, and the request timeout.
    #[error("{}", CONNECTION_ERROR_MESSAGE)]
    Connection(#[source] reqwest::Error),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("{}", SERVER_ERROR_MESSAGE)]
    Server { status: u16 },

    /// Any other non-success response, passed through unclassified. The
    /// full body is kept; only the display is truncated.
    #[error("HTTP {status}: {}", truncate_body(.body))]
    Http { status: u16, body: String },

    /// The token store failed before the request could be dispatched.
    #[error("Secure storage failed: {0}")]
    Storage(#[from] StoreError),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body could not be parsed as the expected type.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Request construction or another client-side reqwest failure.
    #[error("Request failed: {0}")]
    Unknown(#[source] reqwest::Error),
}

impl ApiError {
    /// Map a non-success status to its side-effect-free error class.
    /// 401 and token-marker detection happen in the client, which also
    /// tears the session down.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server { status },
            _ => ApiError::Http { status, body },
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    // Back off to a char boundary; backend messages are not pure ASCII.
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..cut],
        body.len()
    )
}

/// Minimal view of the backend's `{status, message}` envelope, used to
/// classify responses without knowing the payload shape.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Pull the backend's `message` field out of a raw body, if there is one.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
}

/// The backend flags a dead token by mentioning it in the message, with
/// inconsistent casing across endpoints.
pub(crate) fn mentions_token(message: &str) -> bool {
    message.to_lowercase().contains("token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_messages_are_the_display_output() {
        assert_eq!(ApiError::SessionExpired.to_string(), SESSION_EXPIRED_MESSAGE);
        assert_eq!(ApiError::RateLimited.to_string(), RATE_LIMIT_MESSAGE);
        assert_eq!(
            ApiError::Server { status: 503 }.to_string(),
            SERVER_ERROR_MESSAGE
        );
    }

    #[test]
    fn test_http_display_includes_status_and_body() {
        let err = ApiError::Http {
            status: 404,
            body: r#"{"status":false,"message":"Not bulunamadı"}"#.to_string(),
        };
        let display = err.to_string();
        assert!(display.starts_with("HTTP 404:"));
        assert!(display.contains("Not bulunamadı"));
    }

    #[test]
    fn test_http_display_truncates_long_bodies() {
        let err = ApiError::Http {
            status: 400,
            body: "x".repeat(2000),
        };
        let display = err.to_string();
        assert!(display.contains("truncated, 2000 total bytes"));
        assert!(display.len() < 600);
    }

    #[test]
    fn test_extract_message_reads_the_envelope() {
        let body = r#"{"status":false,"message":"Kullanıcı adı veya şifre hatalı"}"#;
        assert_eq!(
            extract_message(body).as_deref(),
            Some("Kullanıcı adı veya şifre hatalı")
        );
    }

    #[test]
    fn test_extract_message_handles_junk_bodies() {
        assert_eq!(extract_message("<html>502</html>"), None);
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message(r#"{"status":false,"message":""}"#), None);
        assert_eq!(extract_message(r#"{"status":true}"#), None);
    }

    #[test]
    fn test_mentions_token_is_case_insensitive() {
        assert!(mentions_token("Token süresi doldu"));
        assert!(mentions_token("invalid token"));
        assert!(mentions_token("TOKEN EXPIRED"));
        assert!(!mentions_token("Kayıt bulunamadı"));
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(429, String::new()),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(500, String::new()),
            ApiError::Server { status: 500 }
        ));
        assert!(matches!(
            ApiError::from_status(502, String::new()),
            ApiError::Server { status: 502 }
        ));
        assert!(matches!(
            ApiError::from_status(404, String::new()),
            ApiError::Http { status: 404, .. }
        ));
    }
}
