//! HTTP client for the defter REST API.
//!
//! All traffic funnels through `ApiClient`. Before dispatch, every request
//! reads the stored token and attaches it as a bearer header; a failed read
//! rejects the call instead of sending it unauthenticated. After dispatch,
//! every response is classified exactly once, and a rejected token tears the
//! session down and notifies subscribers before the caller sees the error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::auth::{AuthEvent, AuthEvents, TokenStore};
use crate::config::ClientConfig;

use super::error::{mentions_token, ApiError, ErrorEnvelope};

/// Envelope returned by mutating endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the defter REST API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    events: AuthEvents,
    torn_down: Arc<AtomicBool>,
}

impl ApiClient {
    /// Create a client for the given backend.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        events: AuthEvents,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            events,
            torn_down: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start a GET request.
    pub fn get(&self, path: &str) -> ApiRequest<'_> {
        ApiRequest::new(self, Method::GET, path)
    }

    /// Start a POST request.
    pub fn post(&self, path: &str) -> ApiRequest<'_> {
        ApiRequest::new(self, Method::POST, path)
    }

    /// Start a PUT request.
    pub fn put(&self, path: &str) -> ApiRequest<'_> {
        ApiRequest::new(self, Method::PUT, path)
    }

    /// Start a DELETE request. The backend expects record identifiers in a
    /// JSON body on deletes.
    pub fn delete(&self, path: &str) -> ApiRequest<'_> {
        ApiRequest::new(self, Method::DELETE, path)
    }

    /// Auth event registry this client emits on.
    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Token store backing this client.
    pub(crate) fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Classify a settled response. First match wins:
    /// success body flagging a dead token, then 401 or a token message on an
    /// error payload, then 429, then 5xx; anything else passes through.
    /// Connectivity failures never get here - dispatch maps those.
    async fn classify(&self, status: StatusCode, body: String) -> Result<RawResponse, ApiError> {
        let envelope: Option<ErrorEnvelope> = serde_json::from_str(&body).ok();
        let token_in_message = envelope
            .as_ref()
            .and_then(|envelope| envelope.message.as_deref())
            .map(mentions_token)
            .unwrap_or(false);

        if status.is_success() {
            let flagged_failure = envelope
                .as_ref()
                .and_then(|envelope| envelope.status)
                .map(|status| !status)
                .unwrap_or(false);
            if flagged_failure && token_in_message {
                // TODO: confirm with product whether this shape should keep
                // returning the body to the caller. Older app builds did;
                // newer ones reject. We reject so both invalidation paths
                // behave the same.
                self.teardown_session().await;
                return Err(ApiError::SessionExpired);
            }
            return Ok(RawResponse {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::UNAUTHORIZED || token_in_message {
            self.teardown_session().await;
            return Err(ApiError::SessionExpired);
        }

        Err(ApiError::from_status(status.as_u16(), body))
    }

    /// Tear the session down after the backend rejected the token.
    ///
    /// Idempotent: concurrent triggers collapse into a single delete and a
    /// single event. Internal failures are logged and swallowed so the
    /// caller still sees the rejection that got us here.
    pub(crate) async fn teardown_session(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            debug!("Session already torn down, skipping");
            return;
        }

        warn!("Token rejected by backend, tearing down session");
        if let Err(e) = self.store.delete().await {
            error!(error = %e, "Failed to delete stored token during teardown");
        }
        self.events.emit(AuthEvent::SessionInvalidated);
    }

    /// Re-arm the teardown guard once a new session is established.
    pub(crate) fn rearm_teardown(&self) {
        self.torn_down.store(false, Ordering::SeqCst);
    }
}

/// Status and raw body of a response that survived classification.
#[derive(Debug)]
struct RawResponse {
    #[allow(dead_code)]
    status: u16,
    body: String,
}

/// A single outbound request. Built with the verb methods on [`ApiClient`],
/// dispatched with [`ApiRequest::send`].
pub struct ApiRequest<'a> {
    client: &'a ApiClient,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    body: Option<std::result::Result<serde_json::Value, serde_json::Error>>,
}

impl<'a> ApiRequest<'a> {
    fn new(client: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: None,
            body: None,
        }
    }

    /// Append a query pair.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header beyond the JSON defaults.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Override the client-level timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a JSON body. Serialization errors surface when the request is
    /// sent.
    pub fn json<B: Serialize>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_value(body));
        self
    }

    /// Dispatch the request and decode the response body as `T`.
    pub async fn send<T: DeserializeOwned>(self) -> std::result::Result<T, ApiError> {
        let raw = self.dispatch().await?;
        serde_json::from_str(&raw.body).map_err(ApiError::Decode)
    }

    async fn dispatch(self) -> std::result::Result<RawResponse, ApiError> {
        let ApiRequest {
            client,
            method,
            path,
            query,
            headers,
            timeout,
            body,
        } = self;

        let url = format!("{}{}", client.base_url, path);
        debug!(%method, url = %url, "Dispatching API request");

        let mut request = client.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            let value = body.map_err(ApiError::Encode)?;
            request = request.json(&value);
        }

        // Token attachment happens before every dispatch. A store failure
        // rejects the call; there is no unauthenticated fallback.
        if let Some(token) = client.store.get().await? {
            request = request.bearer_auth(&token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(ApiError::Unknown(e)),
            Err(e) => {
                warn!(url = %url, error = %e, "Request failed without a response");
                return Err(ApiError::Connection(e));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, url = %url, "Response received");

        client.classify(status, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{
        CONNECTION_ERROR_MESSAGE, RATE_LIMIT_MESSAGE, SERVER_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE,
    };
    use crate::auth::{MemoryTokenStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Store double that counts deletes and can be told to fail them.
    struct CountingStore {
        inner: MemoryTokenStore,
        deletes: AtomicUsize,
        fail_deletes: bool,
    }

    impl CountingStore {
        fn with_token(token: &str) -> Self {
            Self {
                inner: MemoryTokenStore::with_token(token),
                deletes: AtomicUsize::new(0),
                fail_deletes: false,
            }
        }

        fn failing_deletes(token: &str) -> Self {
            Self {
                fail_deletes: true,
                ..Self::with_token(token)
            }
        }
    }

    #[async_trait]
    impl TokenStore for CountingStore {
        async fn get(&self) -> std::result::Result<Option<String>, StoreError> {
            self.inner.get().await
        }

        async fn set(&self, token: &str) -> std::result::Result<(), StoreError> {
            self.inner.set(token).await
        }

        async fn delete(&self) -> std::result::Result<(), StoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes {
                return Err(StoreError::Backend("keychain unavailable".to_string()));
            }
            self.inner.delete().await
        }
    }

    /// Store double whose reads fail outright.
    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn get(&self) -> std::result::Result<Option<String>, StoreError> {
            Err(StoreError::Access("keychain locked".to_string()))
        }

        async fn set(&self, _token: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Access("keychain locked".to_string()))
        }

        async fn delete(&self) -> std::result::Result<(), StoreError> {
            Err(StoreError::Access("keychain locked".to_string()))
        }
    }

    fn test_client(base_url: &str, store: Arc<dyn TokenStore>, events: AuthEvents) -> ApiClient {
        ApiClient::new(&ClientConfig::new(base_url), store, events).expect("build client")
    }

    fn ok_body() -> String {
        r#"{"status":true}"#.to_string()
    }

    #[tokio::test]
    async fn test_attaches_bearer_header_from_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getNotes"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ok_body(), "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), store, AuthEvents::new());

        let ack: Ack = client.get("/getNotes").send().await.expect("request");
        assert!(ack.status);
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getNotes"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ok_body(), "application/json"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let client = test_client(&server.uri(), store, AuthEvents::new());
        let _: Ack = client.get("/getNotes").send().await.expect("request");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_store_failure_rejects_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ok_body(), "application/json"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Arc::new(BrokenStore), AuthEvents::new());
        let result = client.get("/getNotes").send::<Ack>().await;

        assert!(matches!(result, Err(ApiError::Storage(_))));
        let requests = server.received_requests().await.expect("recording enabled");
        assert!(requests.is_empty(), "request must not be sent");
    }

    #[tokio::test]
    async fn test_unauthorized_deletes_token_and_reports_session_expiry() {
        let server = MockServer::start().await;
        // Body deliberately says nothing about tokens; the status alone decides.
        Mock::given(method("GET"))
            .and(path("/getNotes"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"status":false,"message":"yetkisiz erişim"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_message_on_error_payload_invalidates_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"status":false,"message":"Token geçersiz"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flagged_success_with_token_message_invalidates_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":false,"message":"Token süresi doldu"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flagged_success_without_token_message_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":false,"message":"Kayıt bulunamadı"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let ack: Ack = client.get("/getNotes").send().await.expect("request");
        assert!(!ack.status);
        assert_eq!(store.get().await.unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_teardown_runs_once_for_repeated_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"status":false,"message":"yetkisiz"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(CountingStore::with_token("tok-123"));
        let events = AuthEvents::new();
        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&emitted);
        let _sub = events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let client = test_client(
            &server.uri(),
            Arc::clone(&store) as Arc<dyn TokenStore>,
            events,
        );

        for _ in 0..3 {
            let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
            assert!(matches!(err, ApiError::SessionExpired));
        }

        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_swallows_store_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"status":false,"message":"yetkisiz"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(CountingStore::failing_deletes("tok-123"));
        let events = AuthEvents::new();
        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&emitted);
        let _sub = events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let client = test_client(
            &server.uri(),
            Arc::clone(&store) as Arc<dyn TokenStore>,
            events,
        );

        // The delete fails internally; the caller still sees the original
        // session-expired rejection and subscribers are still notified.
        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_fixed_message_and_keeps_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_raw(
                r#"{"status":false,"message":"Too many requests"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
        assert_eq!(err.to_string(), RATE_LIMIT_MESSAGE);
        assert_eq!(store.get().await.unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_server_errors_map_to_fixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_raw("upstream down", "text/plain"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), store, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 503 }));
        assert_eq!(err.to_string(), SERVER_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_other_statuses_pass_through_unclassified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(
                r#"{"status":false,"message":"Not bulunamadı"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not bulunamadı"));
            }
            other => panic!("expected passthrough, got {other:?}"),
        }
        assert_eq!(store.get().await.unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_network_failure_maps_to_connectivity_message() {
        // Nothing listens on the discard port.
        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client("http://127.0.0.1:9", Arc::clone(&store) as Arc<dyn TokenStore>, AuthEvents::new());

        let err = client.get("/getNotes").send::<Ack>().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
        assert_eq!(err.to_string(), CONNECTION_ERROR_MESSAGE);
        assert_eq!(store.get().await.unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_delete_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notes"))
            .and(body_json(serde_json::json!({"note_id": 7})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":true,"message":"Silindi"}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_token("tok-123"));
        let client = test_client(&server.uri(), store, AuthEvents::new());

        let ack: Ack = client
            .delete("/notes")
            .json(&serde_json::json!({"note_id": 7}))
            .send()
            .await
            .expect("request");
        assert!(ack.status);
        assert_eq!(ack.message.as_deref(), Some("Silindi"));
    }

    #[tokio::test]
    async fn test_query_pairs_and_extra_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notifications/filtered"))
            .and(query_param("priority", "high"))
            .and(query_param("is_read", "0"))
            .and(header("x-client", "defter-tests"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ok_body(), "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let client = test_client(&server.uri(), store, AuthEvents::new());

        let ack: Ack = client
            .get("/notifications/filtered")
            .query("priority", "high")
            .query("is_read", 0)
            .header("x-client", "defter-tests")
            .send()
            .await
            .expect("request");
        assert!(ack.status);
    }

    #[tokio::test]
    async fn test_decode_failure_surfaces_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "text/plain"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let client = test_client(&server.uri(), store, AuthEvents::new());

        let result = client.get("/getNotes").send::<Ack>().await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
