use serde::{Deserialize, Serialize};

use crate::domain::{CardId, DrawSource, GridPosition, PlayerId, PowerKind, SessionId};

/// Что сделал игрок (запись аудита).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TurnAction {
    Draw {
        source: DrawSource,
        card_id: CardId,
    },
    Swap {
        position: GridPosition,
        /// Карта, ушедшая в сброс.
        old_card_id: CardId,
        /// Взятая карта, легшая в руку.
        new_card_id: CardId,
    },
    Discard {
        card_id: CardId,
    },
    Power {
        power: PowerKind,
        target_player: Option<PlayerId>,
        /// Затронутые карты (для blind_swap — обе).
        target_cards: Vec<CardId>,
    },
    Cambio,
}

/// Запись журнала ходов. После создания не меняется.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnRecord {
    pub index: u32,
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub action: TurnAction,
    pub created_at_ms: u64,
}

/// Журнал ходов сессии: только дописывание.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnLog {
    records: Vec<TurnRecord>,
}

impl TurnLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TurnRecord] {
        &self.records
    }

    /// Дописать готовые записи. Индексы обязаны идти подряд.
    pub fn append(&mut self, records: impl IntoIterator<Item = TurnRecord>) -> Result<(), u32> {
        for record in records {
            let expected = self.records.len() as u32;
            if record.index != expected {
                return Err(record.index);
            }
            self.records.push(record);
        }
        Ok(())
    }
}
