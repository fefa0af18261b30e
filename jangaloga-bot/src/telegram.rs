//! Telegram Bot API client
//!
//! Implements [`DeliveryChannel`] over the HTTP Bot API plus the two calls the
//! polling loop needs (`getUpdates`, `deleteWebhook`).
//!
//! # Failure classification
//!
//! Timeouts, connection failures, `429 Too Many Requests` and server errors
//! are [`DeliveryError::Transient`]; every other refusal is
//! [`DeliveryError::Permanent`].

use async_trait::async_trait;
use jangaloga::pipeline::{ChatId, DeliveryChannel, DeliveryError, MessageId};
use jangaloga::{JgError, JgResult};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Server-side wait of one long poll
pub const POLL_SECONDS: u64 = 30;

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat: Chat,
    pub text: Option<String>,
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct File {
    file_path: Option<String>,
}

/// Map a failed HTTP status to a delivery error
pub fn classify_status(status: StatusCode, description: &str) -> DeliveryError {
    let message = format!("{}: {}", status, description);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryError::Transient(message)
    } else {
        DeliveryError::Permanent(message)
    }
}

/// Map a transport failure to a delivery error
///
/// The request URL carries the bot token and is stripped before formatting.
fn classify_transport(error: reqwest::Error) -> DeliveryError {
    let error = error.without_url();
    if error.is_timeout() || error.is_connect() || error.is_request() {
        DeliveryError::Transient(error.to_string())
    } else {
        DeliveryError::Permanent(error.to_string())
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Async Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    method_url: String,
    file_url: String,
    request_timeout: Duration,
}

impl TelegramClient {
    /// Create a client for `token`
    ///
    /// # Arguments
    ///
    /// * `token` - Bot token from BotFather
    /// * `api_url` - API root, normally `https://api.telegram.org`
    /// * `request_timeout` - Timeout of ordinary requests
    pub fn new(token: &str, api_url: &str, request_timeout: Duration) -> JgResult<Self> {
        if token.trim().is_empty() {
            return Err(JgError::Config("Bot token cannot be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| JgError::Network(format!("Failed to create HTTP client: {}", e)))?;
        let root = api_url.trim_end_matches('/');

        Ok(Self {
            client,
            method_url: format!("{}/bot{}", root, token),
            file_url: format!("{}/file/bot{}", root, token),
            request_timeout,
        })
    }

    async fn parse<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, DeliveryError> {
        let status = response.status();
        let body: ApiResponse<T> = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(classify_status(status, "no body")),
            Err(e) => {
                return Err(DeliveryError::Permanent(format!(
                    "{}: invalid response: {}",
                    method,
                    e.without_url()
                )));
            }
        };

        let description = body.description.unwrap_or_default();
        if !status.is_success() {
            return Err(classify_status(status, &description));
        }
        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DeliveryError::Permanent(format!(
                "{} failed: {}",
                method, description
            ))),
        }
    }

    /// Call a JSON method
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<T, DeliveryError> {
        let response = self
            .client
            .post(format!("{}/{}", self.method_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(classify_transport)?;
        Self::parse(method, response).await
    }

    /// Upload `file` under `field` with a multipart request
    async fn upload(
        &self,
        method: &str,
        field: &'static str,
        chat: ChatId,
        file: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            DeliveryError::Permanent(format!("Cannot read '{}': {}", file.display(), e))
        })?;
        debug!(method, bytes = bytes.len(), timeout_secs = timeout.as_secs(), "Uploading");

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(file))
            .map_err(|e| DeliveryError::Permanent(format!("Invalid attachment: {}", e)))?;
        let form = Form::new().text("chat_id", chat.to_string()).part(field, part);

        let response = self
            .client
            .post(format!("{}/{}", self.method_url, method))
            .timeout(timeout)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;
        Self::parse::<Value>(method, response).await.map(|_| ())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DeliveryError> {
        let body = json!({
            "offset": offset,
            "timeout": POLL_SECONDS,
            "allowed_updates": ["message"],
        });
        let timeout = self.request_timeout + Duration::from_secs(POLL_SECONDS);
        self.call("getUpdates", &body, timeout).await
    }

    /// Remove any webhook so polling is allowed, dropping queued updates
    pub async fn delete_webhook(&self) -> Result<(), DeliveryError> {
        self.call::<bool>(
            "deleteWebhook",
            &json!({ "drop_pending_updates": true }),
            self.request_timeout,
        )
        .await
        .map(|_| ())
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"***")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[async_trait]
impl DeliveryChannel for TelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, DeliveryError> {
        let message: Message = self
            .call(
                "sendMessage",
                &json!({ "chat_id": chat, "text": text }),
                self.request_timeout,
            )
            .await?;
        Ok(message.message_id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.call::<Value>(
            "editMessageText",
            &json!({ "chat_id": chat, "message_id": message, "text": text }),
            self.request_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn delete_message(
        &self,
        chat: ChatId,
        message: MessageId,
    ) -> Result<(), DeliveryError> {
        self.call::<bool>(
            "deleteMessage",
            &json!({ "chat_id": chat, "message_id": message }),
            self.request_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn send_voice(
        &self,
        chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        self.upload("sendVoice", "voice", chat, audio, timeout).await
    }

    async fn send_audio(
        &self,
        chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        self.upload("sendAudio", "audio", chat, audio, timeout).await
    }

    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), DeliveryError> {
        let file: File = self
            .call("getFile", &json!({ "file_id": file_id }), self.request_timeout)
            .await?;
        let file_path = file
            .file_path
            .ok_or_else(|| DeliveryError::Permanent("File is not downloadable".to_string()))?;

        let response = self
            .client
            .get(format!("{}/{}", self.file_url, file_path))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify_transport)?;
        if !response.status().is_success() {
            return Err(classify_status(response.status(), "download failed"));
        }
        let bytes = response.bytes().await.map_err(classify_transport)?;
        tokio::fs::write(destination, &bytes).await.map_err(|e| {
            DeliveryError::Permanent(format!(
                "Cannot write '{}': {}",
                destination.display(),
                e
            ))
        })?;
        debug!(file_id, bytes = bytes.len(), "Downloaded attachment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_URL;

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down").is_transient());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "chat not found").is_transient());
        assert!(!classify_status(StatusCode::FORBIDDEN, "blocked").is_transient());
    }

    #[test]
    fn test_parse_updates() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "Привет"}},
                {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 42}, "voice": {"file_id": "abc", "duration": 7, "mime_type": "audio/ogg"}}},
                {"update_id": 12, "edited_message": {"message_id": 1}}
            ]
        }"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = response.result.unwrap();

        assert_eq!(updates.len(), 3);
        let text = updates[0].message.as_ref().unwrap();
        assert_eq!(text.chat.id, 42);
        assert_eq!(text.text.as_deref(), Some("Привет"));
        let voice = updates[1].message.as_ref().unwrap().voice.as_ref().unwrap();
        assert_eq!(voice.file_id, "abc");
        assert_eq!(voice.duration, Some(7));
        assert!(updates[2].message.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let raw = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let response: ApiResponse<Value> = serde_json::from_str(raw).unwrap();
        assert!(!response.ok);
        assert_eq!(
            response.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }

    #[test]
    fn test_urls_and_debug() {
        let client =
            TelegramClient::new("123:secret", "https://api.example.org/", Duration::from_secs(60))
                .unwrap();
        assert_eq!(client.method_url, "https://api.example.org/bot123:secret");
        assert_eq!(client.file_url, "https://api.example.org/file/bot123:secret");
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let client =
            TelegramClient::new("123:SECRETTOKEN", "http://127.0.0.1:9", Duration::from_secs(2))
                .unwrap();
        let error = client.send_text(1, "hi").await.unwrap_err();
        assert!(error.is_transient());
        assert!(!error.to_string().contains("SECRETTOKEN"));

        let error = client.get_updates(0).await.unwrap_err();
        assert!(!format!("{:?}", error).contains("SECRETTOKEN"));
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            TelegramClient::new(" ", DEFAULT_API_URL, Duration::from_secs(60)),
            Err(JgError::Config(_))
        ));
    }

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for(Path::new("a.ogg")), "audio/ogg");
        assert_eq!(mime_for(Path::new("a.wav")), "audio/wav");
        assert_eq!(mime_for(Path::new("a")), "application/octet-stream");
    }
}
