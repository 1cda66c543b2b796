use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::{ApiError, RequestError};

use crate::error::{AppError, AppResult};

/// Classification of a single outbound send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The platform accepted the message.
    Delivered,
    /// The recipient blocked the bot or deactivated their account. Terminal:
    /// never retried.
    Unreachable,
    /// Anything else (network, rate limit, timeout). Retryable.
    Failed,
}

/// A rendered outbound message. When `attendance_prompt` carries a
/// registration id, the message is decorated with confirm/decline buttons
/// whose callback data is handled by the conversational frontend.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub text: String,
    pub attendance_prompt: Option<i64>,
}

impl OutgoingMessage {
    pub fn plain(text: String) -> Self {
        Self {
            text,
            attendance_prompt: None,
        }
    }

    pub fn with_attendance_prompt(text: String, registration_id: i64) -> Self {
        Self {
            text,
            attendance_prompt: Some(registration_id),
        }
    }
}

/// Outbound notification channel. The delivery loop and every bulk-send
/// flow go through this seam, so tests substitute a scripted fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: i64, message: &OutgoingMessage) -> DeliveryOutcome;
}

pub struct TelegramNotifier {
    bot: Bot,
    send_timeout: Duration,
}

impl TelegramNotifier {
    pub async fn new(token: String, send_timeout: Duration) -> AppResult<Self> {
        let bot = Bot::new(token);

        // Verify the token by fetching bot info before accepting traffic.
        match bot.get_me().await {
            Ok(me) => {
                tracing::info!("Telegram bot initialized: @{}", me.username());
                Ok(Self { bot, send_timeout })
            }
            Err(e) => {
                tracing::error!("Failed to initialize Telegram bot: {}", e);
                Err(AppError::Telegram(format!(
                    "Failed to initialize bot: {}",
                    e
                )))
            }
        }
    }

    fn classify(chat_id: i64, error: &RequestError) -> DeliveryOutcome {
        match error {
            RequestError::Api(
                ApiError::BotBlocked
                | ApiError::UserDeactivated
                | ApiError::BotKicked
                | ApiError::BotKickedFromSupergroup,
            ) => {
                tracing::warn!("Recipient {} is unreachable: {}", chat_id, error);
                DeliveryOutcome::Unreachable
            }
            _ => {
                tracing::warn!("Failed to send message to {}: {}", chat_id, error);
                DeliveryOutcome::Failed
            }
        }
    }
}

fn attendance_keyboard(registration_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback("✅ Приду", format!("remind_confirm:{}", registration_id)),
        InlineKeyboardButton::callback("❌ Не приду", format!("remind_decline:{}", registration_id)),
    ]])
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, chat_id: i64, message: &OutgoingMessage) -> DeliveryOutcome {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), &message.text)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true);

        if let Some(registration_id) = message.attendance_prompt {
            request = request.reply_markup(attendance_keyboard(registration_id));
        }

        match tokio::time::timeout(self.send_timeout, request.send()).await {
            Ok(Ok(sent)) => {
                tracing::debug!("Message sent to {}: message_id={}", chat_id, sent.id);
                DeliveryOutcome::Delivered
            }
            Ok(Err(e)) => Self::classify(chat_id, &e),
            Err(_) => {
                tracing::warn!(
                    "Send to {} timed out after {:?}",
                    chat_id,
                    self.send_timeout
                );
                DeliveryOutcome::Failed
            }
        }
    }
}
