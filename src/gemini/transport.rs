use crate::{
    broker::ApiKeySource,
    models::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse},
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

/// A failed dispatch. `message` is the service's own wording whenever the
/// service supplied one.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub status: Option<u16>,
    pub message: String,
}

impl DispatchError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// One request, one response. Implementations must not retry.
#[async_trait]
pub trait ImageTransport: Send + Sync {
    async fn dispatch(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, DispatchError>;
}

pub struct HttpTransport {
    http: Client,
    api_base: String,
    keys: Arc<dyn ApiKeySource>,
}

impl HttpTransport {
    pub fn new(api_base: impl Into<String>, keys: Arc<dyn ApiKeySource>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            keys,
        }
    }

    /// Swaps in a preconfigured client (proxy, TLS, timeouts).
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

#[async_trait]
impl ImageTransport for HttpTransport {
    async fn dispatch(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, DispatchError> {
        // Read per request; the key may have changed since the last call.
        let api_key = self.keys.api_key().ok_or_else(|| {
            DispatchError::new(
                None,
                "An API key must be set when using the Gemini API (GEMINI_API_KEY)",
            )
        })?;

        let endpoint = self.endpoint_for_model(model);
        log::debug!("POST {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                DispatchError::new(
                    e.status().map(|s| s.as_u16()),
                    format!("Gemini request failed: {}", e),
                )
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            log::error!("Gemini returned HTTP {}: {}", status.as_u16(), body);
            return Err(DispatchError::new(
                Some(status.as_u16()),
                error_message_from_body(status.as_u16(), &body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            DispatchError::new(
                Some(status.as_u16()),
                format!("Failed to parse Gemini response: {}", e),
            )
        })
    }
}

pub(crate) fn error_message_from_body(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if !envelope.error.message.trim().is_empty() {
            return envelope.error.message;
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{CredentialBroker, SharedApiKey};
    use crate::config::StudioConfig;
    use crate::error::StudioError;
    use crate::gemini::ImageClient;
    use crate::models::{AspectRatio, GenerationSettings, ImageConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    const IMAGE_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"aGVsbG8="}}]}}]}"#;

    /// A request as it arrived on the wire.
    struct Received {
        head: String,
        body: String,
    }

    impl Received {
        fn header(&self, name: &str) -> Option<&str> {
            self.head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim())
            })
        }
    }

    /// Serves one scripted `(status, body)` reply per connection, in order,
    /// and hands back what each request looked like.
    async fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Received>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1beta", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                received.push(read_request(&mut stream).await);
                let response = format!(
                    "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            received
        });
        (base, handle)
    }

    async fn read_request(stream: &mut TcpStream) -> Received {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body was complete");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string();
        Received { head, body }
    }

    fn local_transport(base: &str, keys: SharedApiKey) -> HttpTransport {
        let http = Client::builder().no_proxy().build().unwrap();
        HttpTransport::new(base, Arc::new(keys)).with_http_client(http)
    }

    fn square_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest::from_prompt(
            prompt,
            ImageConfig {
                aspect_ratio: AspectRatio::Square,
                image_size: None,
            },
        )
    }

    /// Reports a key as selected and counts selection flows.
    #[derive(Default)]
    struct CountingBroker {
        opened: AtomicUsize,
    }

    #[async_trait]
    impl CredentialBroker for CountingBroker {
        async fn has_selected_key(&self) -> bool {
            true
        }

        async fn open_selection_flow(&self) {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn each_dispatch_sends_the_currently_selected_key() {
        let (base, server) = serve(vec![(200, IMAGE_BODY), (200, IMAGE_BODY)]).await;
        let keys = SharedApiKey::isolated(None);
        let transport = local_transport(&base, keys.clone());

        keys.select("first-key");
        transport
            .dispatch("gemini-2.5-flash-image", &square_request("a red fox"))
            .await
            .unwrap();
        keys.select("second-key");
        let response = transport
            .dispatch("gemini-2.5-flash-image", &square_request("a blue fox"))
            .await
            .unwrap();
        assert_eq!(response.candidates.len(), 1);

        let received = server.await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].header("x-goog-api-key"), Some("first-key"));
        assert_eq!(received[1].header("x-goog-api-key"), Some("second-key"));
        assert!(received[1]
            .head
            .starts_with("POST /v1beta/models/gemini-2.5-flash-image:generateContent "));

        let sent: serde_json::Value = serde_json::from_str(&received[1].body).unwrap();
        assert_eq!(sent["contents"][0]["parts"][0]["text"], "a blue fox");
        assert_eq!(
            sent["generationConfig"]["imageConfig"],
            serde_json::json!({ "aspectRatio": "1:1" })
        );
    }

    #[tokio::test]
    async fn not_found_body_reaches_client_as_expired_credential() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        let (base, server) = serve(vec![(404, body)]).await;
        let transport = local_transport(&base, SharedApiKey::isolated(Some("old-key".into())));
        let broker = Arc::new(CountingBroker::default());
        let client = ImageClient::new(Arc::new(transport), &StudioConfig::default())
            .with_broker(broker.clone());

        let err = client
            .generate("a red fox", &GenerationSettings::new().with_pro_mode(true))
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::CredentialExpired));
        assert_eq!(broker.opened.load(Ordering::SeqCst), 1);
        let received = server.await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].head.contains("gemini-3-pro-image-preview"));
    }

    #[tokio::test]
    async fn error_status_carries_service_message() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        let (base, server) = serve(vec![(429, body), (503, "upstream unavailable")]).await;
        let transport = local_transport(&base, SharedApiKey::isolated(Some("key".into())));

        let err = transport
            .dispatch("gemini-2.5-flash-image", &square_request("a red fox"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Resource has been exhausted (e.g. check quota).");

        let err = transport
            .dispatch("gemini-2.5-flash-image", &square_request("a red fox"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "HTTP 503: upstream unavailable");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn unparseable_success_body_is_a_dispatch_failure() {
        let (base, server) = serve(vec![(200, "<html>not json</html>")]).await;
        let transport = local_transport(&base, SharedApiKey::isolated(Some("key".into())));

        let err = transport
            .dispatch("gemini-2.5-flash-image", &square_request("a red fox"))
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(200));
        assert!(err.message.starts_with("Failed to parse Gemini response"));

        server.await.unwrap();
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            Arc::new(SharedApiKey::isolated(None)),
        )
    }

    #[test]
    fn endpoint_prefixes_models_path_once() {
        let t = transport();
        assert_eq!(
            t.endpoint_for_model("gemini-2.5-flash-image"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            t.endpoint_for_model("models/gemini-3-pro-image-preview"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
    }

    #[test]
    fn error_message_prefers_service_wording() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message_from_body(404, body), "Requested entity was not found.");
        assert_eq!(error_message_from_body(502, "bad gateway"), "HTTP 502: bad gateway");
        assert_eq!(error_message_from_body(500, ""), "HTTP 500");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_network_call() {
        let request = square_request("p");
        let err = transport()
            .dispatch("gemini-2.5-flash-image", &request)
            .await
            .unwrap_err();
        assert!(err.status.is_none());
        assert!(err.message.contains("API key"));
    }
}
