//! ScoringEngine: базовые/итоговые очки, штраф Cambio, победители.

use crate::domain::{Player, PlayerScore, RoundResult, Session};
use crate::engine::errors::EngineError;

/// Сумма очков карт в руке.
pub fn base_score(player: &Player) -> u32 {
    player.hand_points()
}

/// Итоговые очки одного игрока.
///
/// Штраф получает только объявивший Cambio и только если его база
/// строго больше минимальной базы за столом.
pub fn final_score(base: u32, is_caller: bool, min_base: u32, multiplier: u32) -> (u32, bool) {
    if is_caller && base != min_base {
        (base.saturating_mul(multiplier), true)
    } else {
        (base, false)
    }
}

/// Посчитать итог раунда по текущим рукам.
pub fn score_round(session: &Session) -> Result<RoundResult, EngineError> {
    if session.players.is_empty() {
        return Err(EngineError::Internal("no players to score"));
    }

    let bases: Vec<u32> = session.players.iter().map(base_score).collect();
    let min_base = bases
        .iter()
        .copied()
        .min()
        .ok_or(EngineError::Internal("no players to score"))?;

    let multiplier = session.rules.cambio_penalty_multiplier;

    let mut scores: Vec<PlayerScore> = session
        .players
        .iter()
        .zip(bases.iter().copied())
        .map(|(p, base)| {
            let is_caller = session.cambio_caller == Some(p.id);
            let (final_score, penalty_applied) = final_score(base, is_caller, min_base, multiplier);
            PlayerScore {
                player_id: p.id,
                display_name: p.display_name.clone(),
                base_score: base,
                final_score,
                is_cambio_caller: is_caller,
                penalty_applied,
                is_winner: false,
                cards: p.hand_faces(),
            }
        })
        .collect();

    let min_final = scores
        .iter()
        .map(|s| s.final_score)
        .min()
        .ok_or(EngineError::Internal("no players to score"))?;

    let mut winners = Vec::new();
    for s in scores.iter_mut() {
        if s.final_score == min_final {
            s.is_winner = true;
            winners.push(s.player_id);
        }
    }

    Ok(RoundResult {
        session_id: session.id,
        min_base_score: min_base,
        min_final_score: min_final,
        winners,
        scores,
    })
}
