use serde::{Deserialize, Serialize};

use crate::domain::{
    CardFace, CardId, DrawSource, GamePhase, GridPosition, PlayerId, PlayerKind, PlayerScore,
    PowerKind, SessionId, Visibility,
};

/// DTO карты в руке. Лицо есть только у открытых карт.
///
/// id виден владельцу и всем, если карта открыта.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandCardDto {
    pub card_id: Option<CardId>,
    pub position: GridPosition,
    pub visibility: Visibility,
    pub face: Option<CardFace>,
}

/// DTO игрока в сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerViewDto {
    pub player_id: PlayerId,
    pub display_name: String,
    pub kind: PlayerKind,
    pub turn_order: u8,
    pub is_connected: bool,
    pub has_viewed_initial_cards: bool,
    pub has_taken_final_turn: bool,
    pub hand: Vec<HandCardDto>,
    /// Есть ли у игрока взятая карта.
    pub has_drawn_card: bool,
    /// Лицо взятой карты – только самому игроку (или всем, если она из сброса).
    pub drawn_card: Option<CardFace>,
}

/// Открытое окно способности.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerWindowDto {
    pub player_id: PlayerId,
    pub power: PowerKind,
}

/// DTO сессии глазами конкретного зрителя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionViewDto {
    pub session_id: SessionId,
    pub phase: GamePhase,
    pub seats: u8,
    pub viewer: Option<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub cambio_caller: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
    pub power_window: Option<PowerWindowDto>,
    pub deck_size: usize,
    pub discard_size: usize,
    pub discard_top: Option<CardFace>,
    pub players: Vec<PlayerViewDto>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub completed_at_ms: Option<u64>,
}

/// DTO итогов раунда.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoresDto {
    pub session_id: SessionId,
    /// Канонический победитель (первый по порядку хода).
    pub winner_id: Option<PlayerId>,
    pub winners: Vec<PlayerId>,
    pub min_base_score: u32,
    pub scores: Vec<PlayerScore>,
}

/// Запись журнала ходов глазами зрителя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnRecordDto {
    pub index: u32,
    pub player_id: PlayerId,
    pub action: TurnActionDto,
    pub created_at_ms: u64,
}

/// Действие из журнала. Чужим видны только id карт, лежащих лицом вверх.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TurnActionDto {
    Draw {
        source: DrawSource,
        card_id: Option<CardId>,
    },
    Swap {
        position: GridPosition,
        old_card_id: CardId,
        new_card_id: Option<CardId>,
    },
    Discard {
        card_id: CardId,
    },
    Power {
        power: PowerKind,
        target_player: Option<PlayerId>,
        target_cards: Vec<CardId>,
    },
    Cambio,
}
