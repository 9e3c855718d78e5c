//! TurnEngine: машина фаз и ходов одной сессии.
//!
//! Высокоуровневые операции:
//!   - `create_session` / `join` – рассадка и автоматическая раздача;
//!   - `apply_action` – любое действие игрока (валидация до записи);
//!   - `advance_turn` – переход хода, финальный круг и подсчёт очков;
//!   - `set_connected` – отметка подключения.
//!
//! Все мутации идут по рабочей копии внутри `Transaction`, побочные эффекты
//! складываются в `Outbox`.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CardFace, CardId, DrawSource, DrawnCard, GamePhase, GameRules, GridPosition, Player,
    PlayerId, PlayerKind, PowerKind, PowerWindow, Session, SessionId, Visibility,
};
use crate::engine::actions::{PlayerAction, PlayerActionKind, PowerRequest};
use crate::engine::deck_manager::{deal, draw_top, place_on_discard, prepare_deck};
use crate::engine::errors::EngineError;
use crate::engine::events::{GameEvent, Outbox};
use crate::engine::powers::{resolve_power, PowerOutcome};
use crate::engine::scoring::score_round;
use crate::engine::transaction::Transaction;
use crate::engine::turn_log::TurnAction;
use crate::engine::validation::{require_phase, require_player, validate_action};
use crate::engine::RandomSource;

/// Имена ботов по порядку рассадки.
pub const BOT_NAMES: [&str; 3] = ["Bot Alpha", "Bot Beta", "Bot Gamma"];

/// Параметры новой сессии. Идентификаторы выдаёт вызывающий код.
#[derive(Clone, Debug)]
pub struct NewSession {
    pub session_id: SessionId,
    pub player_count: u8,
    pub creator_id: PlayerId,
    pub creator_name: String,
    pub bot_ids: Vec<PlayerId>,
    pub rules: GameRules,
    pub now_ms: u64,
}

/// Что получил игрок в ответ на действие.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    InitialCards {
        cards: Vec<(GridPosition, CardFace)>,
    },
    Drawn {
        card_id: CardId,
        card: CardFace,
        source: DrawSource,
    },
    Swapped {
        position: GridPosition,
        discarded: CardFace,
        /// Открылось ли окно способности.
        power_window: Option<PowerKind>,
    },
    Discarded {
        card: CardFace,
        power_window: Option<PowerKind>,
    },
    PowerResolved(PowerOutcome),
    PowerSkipped,
    CambioCalled,
}

/// Проверка отображаемого имени: 3–20 символов, латиница, цифры, пробелы.
pub fn validate_display_name(raw: &str) -> Result<String, EngineError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(3..=20).contains(&len) {
        return Err(EngineError::InvalidRequest(format!(
            "display name must be 3-20 characters, got {len}"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        return Err(EngineError::InvalidRequest(
            "display name may contain only letters, digits and spaces".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Создать сессию: колода, создатель, боты; раздача, если мест больше нет.
pub fn create_session<R: RandomSource>(
    params: NewSession,
    rng: &mut R,
    outbox: &mut Outbox,
) -> Result<Session, EngineError> {
    let NewSession {
        session_id,
        player_count,
        creator_id,
        creator_name,
        bot_ids,
        rules,
        now_ms,
    } = params;

    rules
        .validate()
        .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
    if !rules.allows_player_count(player_count) {
        return Err(EngineError::InvalidRequest(format!(
            "player count must be {}-{}, got {player_count}",
            rules.min_players, rules.max_players
        )));
    }
    if bot_ids.len() >= player_count as usize || bot_ids.len() > BOT_NAMES.len() {
        return Err(EngineError::InvalidRequest(format!(
            "bot count must be below player count, got {} of {player_count}",
            bot_ids.len()
        )));
    }
    let creator_name = validate_display_name(&creator_name)?;

    let mut session = Session::new(session_id, player_count, rules, now_ms);
    prepare_deck(&mut session, rng)?;

    seat_player(&mut session, creator_id, creator_name, PlayerKind::Human, outbox)?;
    for (bot_id, name) in bot_ids.iter().zip(BOT_NAMES) {
        seat_player(&mut session, *bot_id, name.to_string(), PlayerKind::Bot, outbox)?;
    }

    start_if_full(&mut session, outbox)?;
    Ok(session)
}

/// Присоединить игрока к сессии в фазе setup.
pub fn join(
    tx: &mut Transaction,
    player_id: PlayerId,
    display_name: &str,
    kind: PlayerKind,
    outbox: &mut Outbox,
) -> Result<(), EngineError> {
    require_phase(&tx.session, &[GamePhase::Setup])?;
    if tx.session.is_full() {
        return Err(EngineError::SessionFull);
    }
    let name = validate_display_name(display_name)?;

    seat_player(&mut tx.session, player_id, name, kind, outbox)?;
    start_if_full(&mut tx.session, outbox)
}

fn seat_player(
    session: &mut Session,
    player_id: PlayerId,
    display_name: String,
    kind: PlayerKind,
    outbox: &mut Outbox,
) -> Result<(), EngineError> {
    if session.player(player_id).is_some() {
        return Err(EngineError::ConflictState("player already seated"));
    }
    let turn_order = session.players.len() as u8;
    outbox.public(GameEvent::PlayerJoined {
        player_id,
        display_name: display_name.clone(),
        kind,
    });
    session
        .players
        .push(Player::new(player_id, display_name, kind, turn_order));
    Ok(())
}

/// setup → initial_view, как только сели все.
fn start_if_full(session: &mut Session, outbox: &mut Outbox) -> Result<(), EngineError> {
    if !session.is_full() {
        return Ok(());
    }

    deal(session)?;
    session.phase = GamePhase::InitialView;
    session.current_turn = session.players.first().map(|p| p.id);
    for p in session.players.iter_mut().filter(|p| p.is_bot()) {
        p.has_viewed_initial_cards = true;
    }
    outbox.public(GameEvent::PhaseChanged {
        phase: GamePhase::InitialView,
    });

    if session.players.iter().all(|p| p.has_viewed_initial_cards) {
        start_playing(session, outbox)?;
    }
    Ok(())
}

/// initial_view → playing: первым ходит turnOrder 0.
fn start_playing(session: &mut Session, outbox: &mut Outbox) -> Result<(), EngineError> {
    let first = session
        .players
        .first()
        .map(|p| p.id)
        .ok_or(EngineError::Internal("no players to start the round"))?;
    session.phase = GamePhase::Playing;
    session.current_turn = Some(first);
    outbox.public(GameEvent::PhaseChanged {
        phase: GamePhase::Playing,
    });
    outbox.public(GameEvent::TurnStarted { player_id: first });
    Ok(())
}

/// Применить действие игрока.
pub fn apply_action<R: RandomSource>(
    tx: &mut Transaction,
    rng: &mut R,
    action: PlayerAction,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    validate_action(&tx.session, &action)?;

    let player_id = action.player_id;
    match action.kind {
        PlayerActionKind::ViewInitialCards => view_initial(tx, player_id, outbox),
        PlayerActionKind::Draw { source } => draw(tx, rng, player_id, source, outbox),
        PlayerActionKind::Swap { slot } => swap(tx, player_id, slot, outbox),
        PlayerActionKind::Discard => discard(tx, player_id, outbox),
        PlayerActionKind::ActivatePower(request) => {
            activate_power(tx, rng, player_id, request, outbox)
        }
        PlayerActionKind::SkipPower => {
            tx.session.power_window = None;
            advance_turn(tx, outbox)?;
            Ok(ActionOutcome::PowerSkipped)
        }
        PlayerActionKind::CallCambio => call_cambio(tx, player_id, outbox),
    }
}

fn view_initial(
    tx: &mut Transaction,
    player_id: PlayerId,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let player = tx
        .session
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    player.has_viewed_initial_cards = true;

    let cards: Vec<(GridPosition, CardFace)> = player
        .hand
        .iter()
        .enumerate()
        .map(|(slot, card)| (GridPosition::from_slot(slot), card.face()))
        .filter(|(position, _)| position.is_initial_view_row())
        .collect();

    outbox.private(
        player_id,
        GameEvent::InitialCards {
            cards: cards.clone(),
        },
    );

    if tx.session.players.iter().all(|p| p.has_viewed_initial_cards) {
        start_playing(&mut tx.session, outbox)?;
    }

    Ok(ActionOutcome::InitialCards { cards })
}

fn draw<R: RandomSource>(
    tx: &mut Transaction,
    rng: &mut R,
    player_id: PlayerId,
    source: DrawSource,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let card = draw_top(&mut tx.session, rng, source)?;
    let player = tx
        .session
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    player.drawn = Some(DrawnCard { card, source });

    tx.append_turn(
        player_id,
        TurnAction::Draw {
            source,
            card_id: card.id,
        },
    );

    let public_face = match source {
        DrawSource::Discard => Some(card.face()),
        DrawSource::Deck => None,
    };
    outbox.public(GameEvent::CardDrawn {
        player_id,
        source,
        card: public_face,
    });
    outbox.private(
        player_id,
        GameEvent::DrawnCardRevealed {
            card_id: card.id,
            card: card.face(),
        },
    );

    Ok(ActionOutcome::Drawn {
        card_id: card.id,
        card: card.face(),
        source,
    })
}

fn take_drawn(session: &mut Session, player_id: PlayerId) -> Result<DrawnCard, EngineError> {
    session
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?
        .drawn
        .take()
        .ok_or(EngineError::ConflictState("no drawn card to resolve"))
}

fn swap(
    tx: &mut Transaction,
    player_id: PlayerId,
    slot: usize,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let drawn = take_drawn(&mut tx.session, player_id)?;

    let player = tx
        .session
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    let hand_slot = player
        .hand
        .get_mut(slot)
        .ok_or(EngineError::InvalidTarget("hand index out of range"))?;
    let displaced = std::mem::replace(hand_slot, drawn.card.relocated(Visibility::Hidden));

    place_on_discard(&mut tx.session, displaced);
    outbox.cancel_hide(displaced.id);

    let position = GridPosition::from_slot(slot);
    tx.append_turn(
        player_id,
        TurnAction::Swap {
            position,
            old_card_id: displaced.id,
            new_card_id: drawn.card.id,
        },
    );
    outbox.public(GameEvent::CardSwapped {
        player_id,
        position,
        discarded: displaced.face(),
    });

    let power_window = open_window_or_advance(tx, player_id, drawn, outbox)?;
    Ok(ActionOutcome::Swapped {
        position,
        discarded: displaced.face(),
        power_window,
    })
}

fn discard(
    tx: &mut Transaction,
    player_id: PlayerId,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let drawn = take_drawn(&mut tx.session, player_id)?;
    place_on_discard(&mut tx.session, drawn.card);

    tx.append_turn(
        player_id,
        TurnAction::Discard {
            card_id: drawn.card.id,
        },
    );
    outbox.public(GameEvent::CardDiscarded {
        player_id,
        card: drawn.card.face(),
    });

    let power_window = open_window_or_advance(tx, player_id, drawn, outbox)?;
    Ok(ActionOutcome::Discarded {
        card: drawn.card.face(),
        power_window,
    })
}

/// После swap/discard: либо окно способности (ход не переходит), либо переход хода.
fn open_window_or_advance(
    tx: &mut Transaction,
    player_id: PlayerId,
    drawn: DrawnCard,
    outbox: &mut Outbox,
) -> Result<Option<PowerKind>, EngineError> {
    let eligible =
        drawn.source == DrawSource::Deck || tx.session.rules.powers_on_discard_draws;

    match drawn.card.rank.power().filter(|_| eligible) {
        Some(power) => {
            tx.session.power_window = Some(PowerWindow {
                player_id,
                power,
                card_id: drawn.card.id,
            });
            outbox.public(GameEvent::PowerAvailable { player_id, power });
            Ok(Some(power))
        }
        None => {
            advance_turn(tx, outbox)?;
            Ok(None)
        }
    }
}

fn activate_power<R: RandomSource>(
    tx: &mut Transaction,
    rng: &mut R,
    player_id: PlayerId,
    request: PowerRequest,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let outcome = resolve_power(tx, rng, player_id, request, outbox)?;
    tx.session.power_window = None;
    advance_turn(tx, outbox)?;
    Ok(ActionOutcome::PowerResolved(outcome))
}

fn call_cambio(
    tx: &mut Transaction,
    player_id: PlayerId,
    outbox: &mut Outbox,
) -> Result<ActionOutcome, EngineError> {
    let caller_name = {
        let player = tx
            .session
            .player_mut(player_id)
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        player.has_taken_final_turn = true;
        player.display_name.clone()
    };
    tx.session.cambio_caller = Some(player_id);
    tx.session.phase = GamePhase::FinalRound;

    tx.append_turn(player_id, TurnAction::Cambio);
    outbox.public(GameEvent::CambioCalled {
        player_id,
        caller_name,
    });
    outbox.public(GameEvent::PhaseChanged {
        phase: GamePhase::FinalRound,
    });

    advance_turn(tx, outbox)?;
    Ok(ActionOutcome::CambioCalled)
}

/// Передать ход следующему по кругу.
///
/// В финальном круге текущий игрок отмечается как сходивший, уже сходившие
/// пропускаются; когда сходили все, раунд завершается подсчётом очков.
pub fn advance_turn(tx: &mut Transaction, outbox: &mut Outbox) -> Result<(), EngineError> {
    let session = &mut tx.session;
    let current = session
        .current_turn
        .ok_or(EngineError::Internal("no current turn to advance"))?;
    let idx = session
        .player_index(current)
        .ok_or(EngineError::Internal("current turn references a missing player"))?;

    let final_round = session.phase == GamePhase::FinalRound;
    if final_round {
        session.players[idx].has_taken_final_turn = true;
        if session.players.iter().all(|p| p.has_taken_final_turn) {
            return complete_round(tx, outbox);
        }
    }

    let n = session.players.len();
    let next = (1..=n)
        .map(|step| &session.players[(idx + step) % n])
        .find(|p| !final_round || !p.has_taken_final_turn)
        .map(|p| p.id)
        .ok_or(EngineError::Internal("no player can take the next turn"))?;

    session.current_turn = Some(next);
    outbox.public(GameEvent::TurnStarted { player_id: next });
    Ok(())
}

/// final_round → completed: очки, победители, все карты открыты.
fn complete_round(tx: &mut Transaction, outbox: &mut Outbox) -> Result<(), EngineError> {
    let result = score_round(&tx.session)?;
    let now_ms = tx.now_ms();

    let session = &mut tx.session;
    session.phase = GamePhase::Completed;
    session.winner_id = result.canonical_winner();
    session.completed_at_ms = Some(now_ms);
    session.power_window = None;
    for card in session.players.iter_mut().flat_map(|p| p.hand.iter_mut()) {
        card.visibility = Visibility::Visible;
        outbox.cancel_hide(card.id);
    }

    outbox.public(GameEvent::PhaseChanged {
        phase: GamePhase::Completed,
    });
    outbox.public(GameEvent::GameCompleted {
        winners: result.winners.clone(),
        scores: result.scores.clone(),
    });

    tx.record_scores(result)
}

/// Отметить подключение/отключение игрока. В любой фазе, кроме completed.
pub fn set_connected(
    tx: &mut Transaction,
    player_id: PlayerId,
    connected: bool,
    outbox: &mut Outbox,
) -> Result<(), EngineError> {
    if tx.session.is_completed() {
        return Err(EngineError::InvalidPhase {
            found: tx.session.phase,
        });
    }
    require_player(&tx.session, player_id)?;
    if let Some(p) = tx.session.player_mut(player_id) {
        p.is_connected = connected;
    }
    outbox.public(GameEvent::ConnectionChanged {
        player_id,
        connected,
    });
    Ok(())
}
