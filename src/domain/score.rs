use serde::{Deserialize, Serialize};

use crate::domain::card::CardFace;
use crate::domain::{PlayerId, SessionId};

/// Итог одного игрока. Пишется один раз при завершении раунда.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub display_name: String,
    /// Сумма очков карт.
    pub base_score: u32,
    /// Очки после штрафа.
    pub final_score: u32,
    pub is_cambio_caller: bool,
    pub penalty_applied: bool,
    pub is_winner: bool,
    /// Карты, которые были на руке в конце.
    pub cards: Vec<CardFace>,
}

/// Итог раунда: все записи + полный список победителей (ничьи не схлопываются).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResult {
    pub session_id: SessionId,
    pub min_base_score: u32,
    pub min_final_score: u32,
    /// Победители в порядке хода. Первый — канонический `winner_id` сессии.
    pub winners: Vec<PlayerId>,
    pub scores: Vec<PlayerScore>,
}

impl RoundResult {
    pub fn canonical_winner(&self) -> Option<PlayerId> {
        self.winners.first().copied()
    }

    pub fn score_of(&self, player_id: PlayerId) -> Option<&PlayerScore> {
        self.scores.iter().find(|s| s.player_id == player_id)
    }
}
