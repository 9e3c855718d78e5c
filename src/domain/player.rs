use serde::{Deserialize, Serialize};

use crate::domain::card::{Card, CardFace};
use crate::domain::PlayerId;

/// Количество карт в руке (сетка 2×2).
pub const HAND_SIZE: usize = 4;

/// Кто управляет игроком.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    #[default]
    Human,
    Bot,
}

/// Откуда взята карта.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawSource {
    Deck,
    Discard,
}

/// Взятая, но ещё не разыгранная карта (максимум одна на игрока).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawnCard {
    pub card: Card,
    pub source: DrawSource,
}

/// Игрок в контексте сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub kind: PlayerKind,
    /// Порядок хода (уникален в сессии, 0..).
    pub turn_order: u8,
    /// Рука: индекс = слот сетки 2×2. Пустая до раздачи, ровно 4 карты после.
    pub hand: Vec<Card>,
    /// Слот взятой карты.
    pub drawn: Option<DrawnCard>,
    pub has_viewed_initial_cards: bool,
    pub has_taken_final_turn: bool,
    pub is_connected: bool,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String, kind: PlayerKind, turn_order: u8) -> Self {
        Self {
            id,
            display_name,
            kind,
            turn_order,
            hand: Vec::with_capacity(HAND_SIZE),
            drawn: None,
            has_viewed_initial_cards: false,
            has_taken_final_turn: false,
            is_connected: true,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, PlayerKind::Bot)
    }

    pub fn card_at(&self, slot: usize) -> Option<&Card> {
        self.hand.get(slot)
    }

    /// Сумма очков карт в руке.
    pub fn hand_points(&self) -> u32 {
        self.hand.iter().map(|c| c.point_value()).sum()
    }

    pub fn hand_faces(&self) -> Vec<CardFace> {
        self.hand.iter().map(|c| c.face()).collect()
    }

    /// Сколько карт принадлежит игроку (рука + взятая).
    pub fn cards_held(&self) -> usize {
        self.hand.len() + usize::from(self.drawn.is_some())
    }
}
