use thiserror::Error;

use crate::domain::{GamePhase, PlayerId, PowerKind, SessionId};

/// Ошибки движка Cambio.
///
/// Всё, кроме `Internal`, — синхронные ошибки валидации: они поднимаются
/// до любой записи, транзакция ничего не меняет.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Сессия {0} не найдена")]
    SessionNotFound(SessionId),

    #[error("Игрок {0} не найден в сессии")]
    PlayerNotFound(PlayerId),

    #[error("Карта не найдена: {0}")]
    CardNotFound(&'static str),

    #[error("Сейчас не ход игрока с id={0}")]
    NotYourTurn(PlayerId),

    #[error("Действие недопустимо в фазе {found:?}")]
    InvalidPhase { found: GamePhase },

    #[error("Недопустимая цель: {0}")]
    InvalidTarget(&'static str),

    #[error("Недостаточно карт в колоде и сбросе")]
    InsufficientCards,

    #[error("Действие уже выполнено: {0}")]
    AlreadyActed(&'static str),

    #[error("Конфликт состояния: {0}")]
    ConflictState(&'static str),

    #[error("Сессия заполнена")]
    SessionFull,

    #[error("Окно спец-способности закрыто")]
    PowerWindowClosed,

    #[error("Открыто окно {expected}, а запрошено {requested}")]
    PowerMismatch {
        expected: PowerKind,
        requested: PowerKind,
    },

    #[error("Карту из сброса нужно обменять, а не сбросить")]
    MustSwapDiscardDraw,

    #[error("Некорректный запрос: {0}")]
    InvalidRequest(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}

impl EngineError {
    /// Ошибка "не найдено": сессия, игрок или карта.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::SessionNotFound(_)
                | EngineError::PlayerNotFound(_)
                | EngineError::CardNotFound(_)
        )
    }
}
