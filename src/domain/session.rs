use serde::{Deserialize, Serialize};

use crate::domain::card::{Card, CardLocation, GridPosition, PowerKind};
use crate::domain::deck::{Pile, DECK_SIZE};
use crate::domain::player::{Player, HAND_SIZE};
use crate::domain::rules::GameRules;
use crate::domain::{CardId, PlayerId, SessionId};

/// Фаза сессии. Движется только вперёд.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    InitialView,
    Playing,
    FinalRound,
    Completed,
}

impl GamePhase {
    /// Фазы, в которых обязан быть текущий игрок.
    pub fn is_active(self) -> bool {
        matches!(self, GamePhase::InitialView | GamePhase::Playing | GamePhase::FinalRound)
    }

    /// Фазы, в которых ходят (draw / swap / discard / power).
    pub fn accepts_turns(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::FinalRound)
    }
}

/// Открытое одноразовое окно спец-способности.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerWindow {
    pub player_id: PlayerId,
    pub power: PowerKind,
    /// Карта, давшая способность.
    pub card_id: CardId,
}

/// Основное состояние сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub phase: GamePhase,
    pub rules: GameRules,
    /// Сколько мест запрошено при создании (раздача, когда все сели).
    pub seats: u8,

    /// Игроки строго по `turn_order`.
    pub players: Vec<Player>,

    pub draw_pile: Pile,
    pub discard_pile: Pile,

    pub current_turn: Option<PlayerId>,
    /// Ставится не больше одного раза.
    pub cambio_caller: Option<PlayerId>,
    /// Канонический победитель (первый из списка победителей).
    pub winner_id: Option<PlayerId>,
    pub power_window: Option<PowerWindow>,

    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub completed_at_ms: Option<u64>,
}

impl Session {
    /// Пустая сессия в фазе setup (колоду кладёт DeckManager).
    pub fn new(id: SessionId, seats: u8, rules: GameRules, now_ms: u64) -> Self {
        Self {
            id,
            phase: GamePhase::Setup,
            rules,
            seats,
            players: Vec::with_capacity(seats as usize),
            draw_pile: Pile::new(),
            discard_pile: Pile::new(),
            current_turn: None,
            cambio_caller: None,
            winner_id: None,
            power_window: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            completed_at_ms: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.seats as usize
    }

    pub fn is_completed(&self) -> bool {
        self.phase == GamePhase::Completed
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_turn.and_then(|id| self.player(id))
    }

    /// Где сейчас карта.
    pub fn card_location(&self, card_id: CardId) -> Option<CardLocation> {
        if let Some(c) = self.draw_pile.find(card_id) {
            return c.pile_order.map(|order| CardLocation::Deck { order });
        }
        if let Some(c) = self.discard_pile.find(card_id) {
            return c.pile_order.map(|order| CardLocation::Discard { order });
        }
        for p in &self.players {
            if let Some(slot) = p.hand.iter().position(|c| c.id == card_id) {
                return Some(CardLocation::Hand {
                    owner: p.id,
                    position: GridPosition::from_slot(slot),
                });
            }
            if p.drawn.map(|d| d.card.id) == Some(card_id) {
                return Some(CardLocation::Drawn { owner: p.id });
            }
        }
        None
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.draw_pile
            .find(card_id)
            .or_else(|| self.discard_pile.find(card_id))
            .or_else(|| {
                self.players.iter().find_map(|p| {
                    p.hand
                        .iter()
                        .find(|c| c.id == card_id)
                        .or_else(|| p.drawn.as_ref().map(|d| &d.card).filter(|c| c.id == card_id))
                })
            })
    }

    pub fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        if let Some(c) = self.draw_pile.find_mut(card_id) {
            return Some(c);
        }
        if let Some(c) = self.discard_pile.find_mut(card_id) {
            return Some(c);
        }
        for p in self.players.iter_mut() {
            if let Some(c) = p.hand.iter_mut().find(|c| c.id == card_id) {
                return Some(c);
            }
            if let Some(d) = p.drawn.as_mut().filter(|d| d.card.id == card_id) {
                return Some(&mut d.card);
            }
        }
        None
    }

    /// Все карты во всех контейнерах.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile
            .iter()
            .chain(self.discard_pile.iter())
            .chain(self.players.iter().flat_map(|p| {
                p.hand.iter().chain(p.drawn.as_ref().map(|d| &d.card))
            }))
    }

    pub fn total_cards(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(Player::cards_held).sum::<usize>()
    }

    /// Проверка инвариантов сессии. `Some(описание)` — состояние битое.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.total_cards() != DECK_SIZE {
            return Some("card count differs from 52");
        }

        let mut seen = [false; DECK_SIZE];
        for card in self.all_cards() {
            let idx = card.id as usize;
            if idx >= DECK_SIZE || seen[idx] {
                return Some("duplicate or unknown card id");
            }
            seen[idx] = true;
        }

        if !self.draw_pile.is_strictly_ordered() || !self.discard_pile.is_strictly_ordered() {
            return Some("pile order is not strictly increasing");
        }

        for (i, p) in self.players.iter().enumerate() {
            if p.turn_order as usize != i {
                return Some("turn orders are not unique and dense");
            }
            if self.phase != GamePhase::Setup && p.hand.len() != HAND_SIZE {
                return Some("hand does not hold exactly 4 cards");
            }
        }

        if self.phase.is_active() && self.current_player().is_none() {
            return Some("current turn does not reference a live player");
        }

        if self.cambio_caller.is_some()
            != matches!(self.phase, GamePhase::FinalRound | GamePhase::Completed)
        {
            return Some("cambio caller does not match phase");
        }

        if let Some(window) = self.power_window {
            if Some(window.player_id) != self.current_turn {
                return Some("power window belongs to a player out of turn");
            }
        }

        None
    }
}
