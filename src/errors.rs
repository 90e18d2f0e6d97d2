use crate::models::{Branch, MetricKind, PeriodSlot};
use axum::http::StatusCode;
use std::fmt;
use thiserror::Error;

/// A value a report needs before it can be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Period(PeriodSlot),
    Metric { branch: Branch, kind: MetricKind },
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Period(slot) => write!(
                f,
                "{} month and year not set. Use {} to set them.",
                slot.label(),
                slot.set_command()
            ),
            MissingField::Metric { branch, kind } => write!(
                f,
                "{} value for '{}' is not set. Use {} to set it.",
                kind.label(),
                branch,
                kind.set_command()
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    MissingData(MissingField),
    #[error("Failed to create image: {0}")]
    Render(String),
    #[error("Failed to save data: {0}")]
    Persistence(String),
}

impl BotError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn render(err: impl fmt::Display) -> Self {
        Self::Render(err.to_string())
    }

    pub fn persistence(err: impl fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Text shown to the chat user.
    pub fn user_message(&self) -> String {
        format!("❌ {self}")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<BotError> for AppError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Validation(message) => Self::bad_request(message),
            BotError::MissingData(field) => Self {
                status: StatusCode::CONFLICT,
                message: field.to_string(),
            },
            err @ (BotError::Render(_) | BotError::Persistence(_)) => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
