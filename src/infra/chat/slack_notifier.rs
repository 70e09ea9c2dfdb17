use crate::domain::models::event::MessageRef;
use crate::domain::ports::ChatNotifier;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Chat notifier speaking the Slack Web API.
pub struct SlackNotifier {
    client: Client,
    api_url: String,
    token: String,
}

impl SlackNotifier {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn call<P: Serialize + ?Sized>(&self, method: &str, payload: &P) -> Result<ApiResponse, AppError> {
        let res = self.client.post(format!("{}/{}", self.api_url, method))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Chat API connection error on {}: {}", method, e);
                error!("{}", msg);
                AppError::External(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::External(format!("Chat API {} failed. Status: {}, Body: {}", method, status, text)));
        }

        let body: ApiResponse = res.json().await
            .map_err(|e| AppError::External(format!("Chat API {} returned malformed JSON: {}", method, e)))?;
        if !body.ok {
            return Err(AppError::External(format!(
                "Chat API {} rejected the call: {}", method, body.error.as_deref().unwrap_or("unknown_error")
            )));
        }

        debug!("Chat API {} succeeded", method);
        Ok(body)
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
    permalink: Option<String>,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateMessage<'a> {
    channel: &'a str,
    ts: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct PermalinkQuery<'a> {
    channel: &'a str,
    message_ts: &'a str,
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn publish_vote_message(&self, channel: &str, text: &str) -> Result<MessageRef, AppError> {
        let body = self.call("chat.postMessage", &PostMessage { channel, text, thread_ts: None }).await?;
        match body.ts {
            Some(ts) => Ok(MessageRef { channel: body.channel.unwrap_or_else(|| channel.to_string()), ts }),
            None => Err(AppError::External("chat.postMessage returned no message timestamp".into())),
        }
    }

    async fn update_vote_message(&self, message: &MessageRef, text: &str) -> Result<(), AppError> {
        self.call("chat.update", &UpdateMessage { channel: &message.channel, ts: &message.ts, text }).await?;
        Ok(())
    }

    async fn post_thread_reply(&self, message: &MessageRef, text: &str) -> Result<(), AppError> {
        let payload = PostMessage { channel: &message.channel, text, thread_ts: Some(&message.ts) };
        self.call("chat.postMessage", &payload).await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), AppError> {
        // Posting to a user id opens the bot's DM channel with that user.
        self.call("chat.postMessage", &PostMessage { channel: user_id, text, thread_ts: None }).await?;
        Ok(())
    }

    async fn resolve_permalink(&self, message: &MessageRef) -> Result<Option<String>, AppError> {
        let body = self.call("chat.getPermalink", &PermalinkQuery { channel: &message.channel, message_ts: &message.ts }).await?;
        Ok(body.permalink)
    }
}
