use std::path::Path;
use std::time::Duration;

use relay_core::AttachmentDescriptor;
use relay_logging::relay_debug;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::orchestrator::Delivery;
use crate::DeliveryError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API client posting into one chat. Text goes first; images and files
/// follow as replies to it so they stay attached to their post.
#[derive(Debug, Clone)]
pub struct TelegramDelivery {
    client: reqwest::Client,
    method_base: String,
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramDelivery {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        chat_id: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| DeliveryError::new(err.to_string()))?;
        Ok(Self {
            client,
            method_base: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
            chat_id: chat_id.into(),
        })
    }

    fn common_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("chat_id", self.chat_id.clone()),
            ("parse_mode", "HTML".to_string()),
            ("disable_web_page_preview", "true".to_string()),
        ]
    }

    pub async fn send_message(&self, text: &str) -> Result<i64, DeliveryError> {
        let mut fields = self.common_fields();
        fields.push(("text", text.to_string()));
        let request = self.client.post(self.method_url("sendMessage")).form(&fields);
        self.call("sendMessage", request).await
    }

    pub async fn send_photo(&self, photo_url: &str, reply_to: i64) -> Result<i64, DeliveryError> {
        let mut fields = self.common_fields();
        fields.push(("photo", photo_url.to_string()));
        fields.push(("reply_to_message_id", reply_to.to_string()));
        let request = self.client.post(self.method_url("sendPhoto")).form(&fields);
        self.call("sendPhoto", request).await
    }

    pub async fn send_document(
        &self,
        path: &Path,
        filename: &str,
        reply_to: i64,
    ) -> Result<i64, DeliveryError> {
        let bytes = std::fs::read(path)
            .map_err(|err| DeliveryError::new(format!("cannot read {path:?}: {err}")))?;
        let mut form = Form::new();
        for (name, value) in self.common_fields() {
            form = form.text(name, value);
        }
        let form = form
            .text("reply_to_message_id", reply_to.to_string())
            .part("document", Part::bytes(bytes).file_name(filename.to_string()));
        let request = self.client.post(self.method_url("sendDocument")).multipart(form);
        self.call("sendDocument", request).await
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.method_base, method)
    }

    async fn call(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<i64, DeliveryError> {
        let response = request
            .send()
            .await
            .map_err(|err| DeliveryError::new(format!("{method}: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| DeliveryError::new(format!("{method}: {err}")))?;
        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|err| {
            DeliveryError::new(format!("{method}: http {status}, unreadable reply: {err}"))
        })?;
        if !parsed.ok {
            return Err(DeliveryError::new(format!(
                "{method}: {}",
                parsed.description.unwrap_or_else(|| status.to_string())
            )));
        }
        let message_id = parsed
            .result
            .map(|sent| sent.message_id)
            .ok_or_else(|| DeliveryError::new(format!("{method}: reply without message id")))?;
        relay_debug!("{} ok, message {}", method, message_id);
        Ok(message_id)
    }
}

#[async_trait::async_trait]
impl Delivery for TelegramDelivery {
    async fn deliver(
        &self,
        message: &str,
        attachment: &AttachmentDescriptor,
    ) -> Result<(), DeliveryError> {
        let message_id = self.send_message(message).await?;
        match attachment {
            AttachmentDescriptor::Image { url } => {
                self.send_photo(url, message_id).await?;
            }
            AttachmentDescriptor::File {
                local_path,
                original_filename,
            } => {
                self.send_document(local_path, original_filename, message_id)
                    .await?;
            }
            // Links are already part of the message text.
            AttachmentDescriptor::Link { .. } | AttachmentDescriptor::None => {}
        }
        Ok(())
    }
}
