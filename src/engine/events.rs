//! События для наблюдателей и "исходящий ящик" транзакции.
//!
//! Движок ничего не отправляет сам: всё складывается в `Outbox`,
//! а менеджер сессий рассылает его уже после снятия блокировки.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CardFace, CardId, DrawSource, GamePhase, GridPosition, PlayerId, PlayerKind, PlayerScore,
    PowerKind,
};

/// Событие сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        display_name: String,
        kind: PlayerKind,
    },
    PhaseChanged {
        phase: GamePhase,
    },
    TurnStarted {
        player_id: PlayerId,
    },
    /// Приватно: две нижние карты игрока.
    InitialCards {
        cards: Vec<(GridPosition, CardFace)>,
    },
    /// Публично: кто и откуда взял. Лицо видно только для карты из сброса.
    CardDrawn {
        player_id: PlayerId,
        source: DrawSource,
        card: Option<CardFace>,
    },
    /// Приватно: какую карту взял сам игрок.
    DrawnCardRevealed {
        card_id: CardId,
        card: CardFace,
    },
    CardSwapped {
        player_id: PlayerId,
        position: GridPosition,
        discarded: CardFace,
    },
    CardDiscarded {
        player_id: PlayerId,
        card: CardFace,
    },
    /// Открылось окно способности.
    PowerAvailable {
        player_id: PlayerId,
        power: PowerKind,
    },
    PowerActivated {
        player_id: PlayerId,
        power: PowerKind,
        target_player: Option<PlayerId>,
    },
    /// Приватно: подсмотренная карта.
    CardRevealed {
        card_id: CardId,
        owner: PlayerId,
        position: GridPosition,
        card: CardFace,
        expires_at_ms: u64,
    },
    /// Приватно: подсмотр закончился.
    CardHidden {
        card_id: CardId,
    },
    /// Публично: обмен вслепую, без лиц карт.
    BlindSwapped {
        from_player: PlayerId,
        to_player: PlayerId,
    },
    CambioCalled {
        player_id: PlayerId,
        caller_name: String,
    },
    GameCompleted {
        winners: Vec<PlayerId>,
        scores: Vec<PlayerScore>,
    },
    ConnectionChanged {
        player_id: PlayerId,
        connected: bool,
    },
}

/// Кому адресовано событие.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Delivery {
    Public(GameEvent),
    Private(PlayerId, GameEvent),
}

/// Заявка на авто-скрытие подсмотренной карты.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HideRequest {
    pub card_id: CardId,
    /// Версия карты на момент подсмотра.
    pub version: u32,
    /// Кому слать `CardHidden`.
    pub viewer: PlayerId,
    pub delay_ms: u64,
}

/// Побочные эффекты транзакции, которые выполняются после коммита.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    pub deliveries: Vec<Delivery>,
    pub hides: Vec<HideRequest>,
    /// Карты, сменившие контейнер/владельца: их таймеры скрытия больше не нужны.
    pub cancelled_hides: Vec<CardId>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(&mut self, event: GameEvent) {
        self.deliveries.push(Delivery::Public(event));
    }

    pub fn private(&mut self, player_id: PlayerId, event: GameEvent) {
        self.deliveries.push(Delivery::Private(player_id, event));
    }

    pub fn schedule_hide(&mut self, request: HideRequest) {
        self.hides.push(request);
    }

    pub fn cancel_hide(&mut self, card_id: CardId) {
        if !self.cancelled_hides.contains(&card_id) {
            self.cancelled_hides.push(card_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty() && self.hides.is_empty() && self.cancelled_hides.is_empty()
    }
}
