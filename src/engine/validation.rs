use crate::domain::{DrawSource, GamePhase, Player, PlayerId, Session, HAND_SIZE};
use crate::engine::actions::{PlayerAction, PlayerActionKind};
use crate::engine::deck_manager::ensure_drawable;
use crate::engine::errors::EngineError;
use crate::engine::powers::validate_power_request;

/// Найти игрока в сессии.
pub fn require_player(session: &Session, player_id: PlayerId) -> Result<&Player, EngineError> {
    session
        .player(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))
}

/// Фаза из разрешённого набора.
pub fn require_phase(session: &Session, allowed: &[GamePhase]) -> Result<(), EngineError> {
    if allowed.contains(&session.phase) {
        Ok(())
    } else {
        Err(EngineError::InvalidPhase {
            found: session.phase,
        })
    }
}

/// Сейчас ход именно этого игрока.
pub fn require_turn(session: &Session, player_id: PlayerId) -> Result<(), EngineError> {
    if session.current_turn == Some(player_id) {
        Ok(())
    } else {
        Err(EngineError::NotYourTurn(player_id))
    }
}

/// Слот руки 0..3 и в нём есть карта.
pub fn require_hand_slot(player: &Player, slot: usize) -> Result<(), EngineError> {
    if slot >= HAND_SIZE || player.card_at(slot).is_none() {
        return Err(EngineError::InvalidTarget("hand index out of range"));
    }
    Ok(())
}

/// Полная проверка действия до любой записи.
pub fn validate_action(session: &Session, action: &PlayerAction) -> Result<(), EngineError> {
    let player_id = action.player_id;

    match action.kind {
        PlayerActionKind::ViewInitialCards => {
            require_phase(session, &[GamePhase::InitialView])?;
            let player = require_player(session, player_id)?;
            if player.has_viewed_initial_cards {
                return Err(EngineError::AlreadyActed("initial cards already viewed"));
            }
            Ok(())
        }

        PlayerActionKind::Draw { source } => {
            let player = require_turn_owner(session, player_id)?;
            if player.drawn.is_some() {
                return Err(EngineError::AlreadyActed("a drawn card is outstanding"));
            }
            if session.power_window.is_some() {
                return Err(EngineError::AlreadyActed("a special power window is open"));
            }
            ensure_drawable(session, source)
        }

        PlayerActionKind::Swap { slot } => {
            let player = require_turn_owner(session, player_id)?;
            if player.drawn.is_none() {
                return Err(EngineError::ConflictState("no drawn card to resolve"));
            }
            require_hand_slot(player, slot)
        }

        PlayerActionKind::Discard => {
            let player = require_turn_owner(session, player_id)?;
            let drawn = player
                .drawn
                .ok_or(EngineError::ConflictState("no drawn card to resolve"))?;
            if drawn.source == DrawSource::Discard && session.rules.require_swap_after_discard_draw {
                return Err(EngineError::MustSwapDiscardDraw);
            }
            Ok(())
        }

        PlayerActionKind::ActivatePower(request) => {
            require_turn_owner(session, player_id)?;
            let window = session.power_window.ok_or(EngineError::PowerWindowClosed)?;
            if window.player_id != player_id {
                return Err(EngineError::PowerWindowClosed);
            }
            if window.power != request.kind() {
                return Err(EngineError::PowerMismatch {
                    expected: window.power,
                    requested: request.kind(),
                });
            }
            validate_power_request(session, player_id, &request)
        }

        PlayerActionKind::SkipPower => {
            require_turn_owner(session, player_id)?;
            match session.power_window {
                Some(window) if window.player_id == player_id => Ok(()),
                _ => Err(EngineError::PowerWindowClosed),
            }
        }

        PlayerActionKind::CallCambio => {
            if session.cambio_caller.is_some() {
                return Err(EngineError::ConflictState("cambio already called"));
            }
            require_phase(session, &[GamePhase::Playing])?;
            let player = require_player(session, player_id)?;
            require_turn(session, player_id)?;
            if player.drawn.is_some() {
                return Err(EngineError::AlreadyActed("a drawn card is outstanding"));
            }
            if session.power_window.is_some() {
                return Err(EngineError::AlreadyActed("a special power window is open"));
            }
            Ok(())
        }
    }
}

/// Общая часть для ходовых действий: фаза, игрок, очередь.
fn require_turn_owner(session: &Session, player_id: PlayerId) -> Result<&Player, EngineError> {
    if !session.phase.accepts_turns() {
        return Err(EngineError::InvalidPhase {
            found: session.phase,
        });
    }
    let player = require_player(session, player_id)?;
    require_turn(session, player_id)?;
    Ok(player)
}
