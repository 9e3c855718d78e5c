use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;

/// Ошибки внешнего API (то, что отдаём клиенту).
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error", content = "message", rename_all = "snake_case")]
pub enum ApiError {
    /// Неправильные входные данные (битый JSON, плохие параметры, плохая цель).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Команда пришла без идентификатора игрока.
    #[error("actor identity is missing")]
    Unauthorized,

    /// Сессия / игрок / карта не найдены.
    #[error("not found: {0}")]
    NotFound(String),

    /// Действие запрещено текущим состоянием сессии.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Внутренняя ошибка сервера.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP-статус для транспорта.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::SessionNotFound(_)
            | EngineError::PlayerNotFound(_)
            | EngineError::CardNotFound(_) => ApiError::NotFound(message),
            EngineError::InvalidRequest(_) | EngineError::InvalidTarget(_) => {
                ApiError::BadRequest(message)
            }
            EngineError::Internal(_) => ApiError::Internal(message),
            EngineError::NotYourTurn(_)
            | EngineError::InvalidPhase { .. }
            | EngineError::InsufficientCards
            | EngineError::AlreadyActed(_)
            | EngineError::ConflictState(_)
            | EngineError::SessionFull
            | EngineError::PowerWindowClosed
            | EngineError::PowerMismatch { .. }
            | EngineError::MustSwapDiscardDraw => ApiError::Conflict(message),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
