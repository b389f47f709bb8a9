use {
    super::{
        Announcer,
        AnnouncerError,
    },
    crate::kernel::{
        entities::{
            BidderId,
            ExternalRef,
        },
        retry::{
            self,
            RetryPolicy,
        },
    },
    async_trait::async_trait,
    serde::Deserialize,
    serde_json::json,
    std::time::Duration,
};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Announcer over the Telegram Bot API: the auction card lives as a
/// channel message, notifications go as direct messages. Every call
/// carries the client-level timeout and a bounded retry, so a stuck
/// Telegram endpoint cannot block a caller indefinitely.
pub struct TelegramAnnouncer {
    http:       reqwest::Client,
    base_url:   String,
    channel_id: i64,
    retry:      RetryPolicy,
}

impl std::fmt::Debug for TelegramAnnouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // skip base_url, it embeds the bot token
        f.debug_struct("TelegramAnnouncer")
            .field("channel_id", &self.channel_id)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok:          bool,
    result:      Option<serde_json::Value>,
    description: Option<String>,
}

impl TelegramAnnouncer {
    pub fn new(
        bot_token: &str,
        channel_id: i64,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: format!("{TELEGRAM_API_BASE}/bot{bot_token}"),
            channel_id,
            retry,
        })
    }

    async fn call(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, AnnouncerError> {
        let url = format!("{}/{}", self.base_url, method);
        retry::with_backoff(self.retry, AnnouncerError::is_retryable, || {
            let url = url.clone();
            let payload = payload.clone();
            async move {
                let response: ApiResponse = self
                    .http
                    .post(url)
                    .json(&payload)
                    .send()
                    .await?
                    .json()
                    .await?;
                if response.ok {
                    Ok(response.result.unwrap_or(serde_json::Value::Null))
                } else {
                    Err(AnnouncerError::Rejected(
                        response.description.unwrap_or_else(|| "unknown error".to_string()),
                    ))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl Announcer for TelegramAnnouncer {
    async fn publish(&self, content: &str) -> Result<ExternalRef, AnnouncerError> {
        let result = self
            .call(
                "sendMessage",
                json!({ "chat_id": self.channel_id, "text": content }),
            )
            .await?;
        result
            .get("message_id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| AnnouncerError::Rejected("response carried no message_id".to_string()))
    }

    async fn update(
        &self,
        external_ref: ExternalRef,
        content: &str,
    ) -> Result<(), AnnouncerError> {
        self.call(
            "editMessageText",
            json!({
                "chat_id": self.channel_id,
                "message_id": external_ref,
                "text": content,
            }),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, external_ref: ExternalRef) -> Result<(), AnnouncerError> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": self.channel_id, "message_id": external_ref }),
        )
        .await?;
        Ok(())
    }

    async fn notify(&self, recipient: BidderId, content: &str) -> Result<(), AnnouncerError> {
        self.call(
            "sendMessage",
            json!({ "chat_id": recipient, "text": content }),
        )
        .await?;
        Ok(())
    }
}
