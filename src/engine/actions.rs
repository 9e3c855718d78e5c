use serde::{Deserialize, Serialize};

use crate::domain::{DrawSource, PlayerId, PowerKind};

/// Запрос на спец-способность. Набор полей зависит от типа.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "power_type", rename_all = "snake_case")]
pub enum PowerRequest {
    PeekOwn {
        index: usize,
    },
    PeekOpponent {
        target_player: PlayerId,
        index: usize,
    },
    BlindSwap {
        my_index: usize,
        target_player: PlayerId,
        target_index: usize,
    },
    LookOwn,
}

impl PowerRequest {
    pub fn kind(&self) -> PowerKind {
        match self {
            PowerRequest::PeekOwn { .. } => PowerKind::PeekOwn,
            PowerRequest::PeekOpponent { .. } => PowerKind::PeekOpponent,
            PowerRequest::BlindSwap { .. } => PowerKind::BlindSwap,
            PowerRequest::LookOwn => PowerKind::LookOwn,
        }
    }
}

/// Тип действия игрока в раунде.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerActionKind {
    /// Посмотреть две нижние карты (фаза initial_view).
    ViewInitialCards,
    Draw { source: DrawSource },
    /// Положить взятую карту в слот руки.
    Swap { slot: usize },
    /// Сбросить взятую карту.
    Discard,
    ActivatePower(PowerRequest),
    /// Отказаться от открытой способности.
    SkipPower,
    CallCambio,
}

/// Конкретное действие игрока.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerAction {
    pub player_id: PlayerId,
    pub kind: PlayerActionKind,
}
