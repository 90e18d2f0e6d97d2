use crate::config::Config;
use crate::handlers::{handle_text, Reply};
use crate::state::AppState;
use reqwest::{multipart, Client, StatusCode};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);
const REQUEST_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram rejected the bot token")]
    Unauthorized,
    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()?;
        Ok(Self {
            client,
            base_url: format!("{api_url}/bot{token}"),
            poll_timeout,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let response = self
            .client
            .post(self.url("getUpdates"))
            .json(&json!({
                "offset": offset,
                "timeout": self.poll_timeout.as_secs(),
                "allowed_updates": ["message"],
            }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(self.url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;
        decode::<IgnoredAny>(response).await?;
        Ok(())
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        caption: &str,
    ) -> Result<(), TelegramError> {
        let photo = multipart::Part::bytes(png)
            .file_name("report.png")
            .mime_str("image/png")?;
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .client
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        decode::<IgnoredAny>(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TelegramError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(TelegramError::Unauthorized);
    }

    let body: ApiResponse<T> = response.json().await?;
    match body {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        other => Err(TelegramError::Api {
            code: other
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16())),
            description: other
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }),
    }
}

pub struct TelegramBot {
    client: TelegramClient,
    state: AppState,
    offset: i64,
}

impl TelegramBot {
    pub fn new(config: &Config, state: AppState) -> Result<Self, TelegramError> {
        let client = TelegramClient::new(
            &config.telegram_api_url,
            &config.bot_token,
            config.poll_timeout,
        )?;
        Ok(Self {
            client,
            state,
            offset: 0,
        })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Polls until the token is rejected; other failures are retried.
    pub async fn run(mut self) -> Result<(), TelegramError> {
        info!("🤖 bot is running");
        loop {
            match self.poll_once().await {
                Ok(count) => debug!(count, "handled updates"),
                Err(TelegramError::Unauthorized) => return Err(TelegramError::Unauthorized),
                Err(err) => {
                    warn!("polling failed, retrying in {}s: {err}", RETRY_DELAY.as_secs());
                    sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Fetches one batch of updates and handles them in order.
    pub async fn poll_once(&mut self) -> Result<usize, TelegramError> {
        let updates = self.client.get_updates(self.offset).await?;
        let count = updates.len();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            match self.handle_update(update).await {
                Ok(()) => {}
                Err(TelegramError::Unauthorized) => return Err(TelegramError::Unauthorized),
                Err(err) => warn!("failed to deliver reply: {err}"),
            }
        }
        Ok(count)
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), TelegramError> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        let Some(reply) = handle_text(&self.state, text).await else {
            debug!(chat_id, "ignoring non-command message");
            return Ok(());
        };
        info!(
            chat_id,
            user = message.from.as_ref().and_then(|user| user.username.as_deref()),
            "replied to {text:?}"
        );

        match reply {
            Reply::Text(text) => self.client.send_message(chat_id, &text).await,
            Reply::Photo { png, caption } => self.client.send_photo(chat_id, png, &caption).await,
        }
    }
}
