//! PowerResolver: одноразовые спец-способности карт.
//!
//! Ранг → способность фиксирован (см. `Rank::power`). Здесь только проверка
//! целей и применение эффекта; окно способности открывает/закрывает `turn_engine`.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CardFace, CardId, GridPosition, PlayerId, PowerKind, Session, Visibility,
};
use crate::engine::actions::PowerRequest;
use crate::engine::errors::EngineError;
use crate::engine::events::{GameEvent, HideRequest, Outbox};
use crate::engine::transaction::Transaction;
use crate::engine::turn_log::TurnAction;
use crate::engine::validation::{require_hand_slot, require_player};
use crate::engine::RandomSource;

/// Карта, приватно показанная игроку.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealedCard {
    pub card_id: CardId,
    pub owner: PlayerId,
    pub position: GridPosition,
    pub card: CardFace,
    pub expires_at_ms: u64,
}

/// Результат применения способности.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerOutcome {
    pub power: PowerKind,
    /// Для подсмотров — что увидел игрок.
    pub revealed: Option<RevealedCard>,
    /// Для blind_swap — с кем был обмен.
    pub swapped_with: Option<PlayerId>,
}

/// Проверка целей запроса (индексы, соперник, запрет на себя).
pub fn validate_power_request(
    session: &Session,
    actor: PlayerId,
    request: &PowerRequest,
) -> Result<(), EngineError> {
    let me = require_player(session, actor)?;

    match *request {
        PowerRequest::PeekOwn { index } => require_hand_slot(me, index),

        PowerRequest::PeekOpponent {
            target_player,
            index,
        } => {
            let opponent = require_opponent(session, actor, target_player)?;
            require_hand_slot(opponent, index)
        }

        PowerRequest::BlindSwap {
            my_index,
            target_player,
            target_index,
        } => {
            require_hand_slot(me, my_index)?;
            let opponent = require_opponent(session, actor, target_player)?;
            require_hand_slot(opponent, target_index)
        }

        PowerRequest::LookOwn => {
            if me.hand.is_empty() {
                return Err(EngineError::InvalidTarget("no cards available to look at"));
            }
            Ok(())
        }
    }
}

fn require_opponent(
    session: &Session,
    actor: PlayerId,
    target: PlayerId,
) -> Result<&crate::domain::Player, EngineError> {
    if target == actor {
        return Err(EngineError::InvalidTarget("cannot target yourself with this power"));
    }
    require_player(session, target)
}

/// Применить уже проверенную способность и записать ход в журнал.
pub fn resolve_power<R: RandomSource>(
    tx: &mut Transaction,
    rng: &mut R,
    actor: PlayerId,
    request: PowerRequest,
    outbox: &mut Outbox,
) -> Result<PowerOutcome, EngineError> {
    let now_ms = tx.now_ms();

    let outcome = match request {
        PowerRequest::PeekOwn { index } => {
            let revealed = peek(&mut tx.session, actor, index, actor, now_ms, outbox)?;
            tx.append_turn(
                actor,
                TurnAction::Power {
                    power: PowerKind::PeekOwn,
                    target_player: None,
                    target_cards: vec![revealed.card_id],
                },
            );
            PowerOutcome {
                power: PowerKind::PeekOwn,
                revealed: Some(revealed),
                swapped_with: None,
            }
        }

        PowerRequest::PeekOpponent {
            target_player,
            index,
        } => {
            let revealed = peek(&mut tx.session, target_player, index, actor, now_ms, outbox)?;
            tx.append_turn(
                actor,
                TurnAction::Power {
                    power: PowerKind::PeekOpponent,
                    target_player: Some(target_player),
                    target_cards: vec![revealed.card_id],
                },
            );
            PowerOutcome {
                power: PowerKind::PeekOpponent,
                revealed: Some(revealed),
                swapped_with: None,
            }
        }

        PowerRequest::BlindSwap {
            my_index,
            target_player,
            target_index,
        } => {
            let (mine, theirs) =
                blind_swap(&mut tx.session, actor, my_index, target_player, target_index)?;
            outbox.cancel_hide(mine);
            outbox.cancel_hide(theirs);
            outbox.public(GameEvent::BlindSwapped {
                from_player: actor,
                to_player: target_player,
            });
            tx.append_turn(
                actor,
                TurnAction::Power {
                    power: PowerKind::BlindSwap,
                    target_player: Some(target_player),
                    target_cards: vec![mine, theirs],
                },
            );
            PowerOutcome {
                power: PowerKind::BlindSwap,
                revealed: None,
                swapped_with: Some(target_player),
            }
        }

        PowerRequest::LookOwn => {
            let hand_len = require_player(&tx.session, actor)?.hand.len();
            if hand_len == 0 {
                return Err(EngineError::InvalidTarget("no cards available to look at"));
            }
            let slot = rng.pick_index(hand_len);
            let revealed = peek(&mut tx.session, actor, slot, actor, now_ms, outbox)?;
            tx.append_turn(
                actor,
                TurnAction::Power {
                    power: PowerKind::LookOwn,
                    target_player: None,
                    target_cards: vec![revealed.card_id],
                },
            );
            PowerOutcome {
                power: PowerKind::LookOwn,
                revealed: Some(revealed),
                swapped_with: None,
            }
        }
    };

    let target_player = outcome.swapped_with.or_else(|| {
        outcome
            .revealed
            .map(|r| r.owner)
            .filter(|owner| *owner != actor)
    });
    outbox.public(GameEvent::PowerActivated {
        player_id: actor,
        power: outcome.power,
        target_player,
    });

    Ok(outcome)
}

/// Подсмотр: карта → `peeking`, лицо приватно зрителю, заявка на авто-скрытие.
fn peek(
    session: &mut Session,
    owner: PlayerId,
    slot: usize,
    viewer: PlayerId,
    now_ms: u64,
    outbox: &mut Outbox,
) -> Result<RevealedCard, EngineError> {
    let duration = session.rules.peek_duration_ms;
    let player = session
        .player_mut(owner)
        .ok_or(EngineError::PlayerNotFound(owner))?;
    let card = player
        .hand
        .get_mut(slot)
        .ok_or(EngineError::InvalidTarget("hand index out of range"))?;

    card.visibility = Visibility::Peeking;

    let revealed = RevealedCard {
        card_id: card.id,
        owner,
        position: GridPosition::from_slot(slot),
        card: card.face(),
        expires_at_ms: now_ms.saturating_add(duration),
    };

    outbox.private(
        viewer,
        GameEvent::CardRevealed {
            card_id: revealed.card_id,
            owner,
            position: revealed.position,
            card: revealed.card,
            expires_at_ms: revealed.expires_at_ms,
        },
    );
    outbox.schedule_hide(HideRequest {
        card_id: card.id,
        version: card.version,
        viewer,
        delay_ms: duration,
    });

    Ok(revealed)
}

/// Обмен вслепую: меняются ровно две карты, размеры рук не меняются.
fn blind_swap(
    session: &mut Session,
    actor: PlayerId,
    my_index: usize,
    target: PlayerId,
    target_index: usize,
) -> Result<(CardId, CardId), EngineError> {
    let me = session
        .player_index(actor)
        .ok_or(EngineError::PlayerNotFound(actor))?;
    let them = session
        .player_index(target)
        .ok_or(EngineError::PlayerNotFound(target))?;

    let mine = *session.players[me]
        .hand
        .get(my_index)
        .ok_or(EngineError::InvalidTarget("hand index out of range"))?;
    let theirs = *session.players[them]
        .hand
        .get(target_index)
        .ok_or(EngineError::InvalidTarget("hand index out of range"))?;

    session.players[me].hand[my_index] = theirs.relocated(Visibility::Hidden);
    session.players[them].hand[target_index] = mine.relocated(Visibility::Hidden);

    Ok((mine.id, theirs.id))
}
