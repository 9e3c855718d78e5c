// src/engine/session_manager.rs

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::domain::{
    CardFace, DrawSource, GameRules, GridPosition, PlayerId, PlayerKind, RoundResult, Session,
    SessionId,
};
use crate::engine::actions::{PlayerAction, PlayerActionKind, PowerRequest};
use crate::engine::errors::EngineError;
use crate::engine::events::{Delivery, GameEvent, Outbox};
use crate::engine::turn_engine::{self, ActionOutcome, NewSession};
use crate::engine::turn_log::TurnRecord;
use crate::engine::RandomSource;
use crate::infra::auto_hide::AutoHideScheduler;
use crate::infra::events::EventSink;
use crate::infra::ids::{now_ms, IdGenerator};
use crate::infra::persistence::SessionStore;

/// Запрос на создание сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSessionRequest {
    pub player_count: u8,
    #[serde(default)]
    pub bot_count: u8,
    pub creator_name: String,
    /// Свои правила; иначе берутся правила менеджера.
    #[serde(default)]
    pub rules: Option<GameRules>,
}

/// Созданная сессия и id её создателя.
#[derive(Clone, Debug)]
pub struct CreatedSession {
    pub session: Session,
    pub creator_id: PlayerId,
}

/// Менеджер сессий:
/// - выдаёт id и создаёт сессии;
/// - каждое действие выполняет одной транзакцией хранилища;
/// - после коммита (уже без блокировки) рассылает события и ставит/снимает
///   таймеры авто-скрытия.
pub struct SessionManager<S: SessionStore + 'static, R: RandomSource> {
    store: Arc<S>,
    sink: Arc<dyn EventSink>,
    rng: Mutex<R>,
    rules: GameRules,
    ids: IdGenerator,
    hides: AutoHideScheduler<S>,
}

impl<S: SessionStore + 'static, R: RandomSource> SessionManager<S, R> {
    /// `runtime` — где запускать отложенные задачи авто-скрытия.
    pub fn new(
        store: Arc<S>,
        sink: Arc<dyn EventSink>,
        rng: R,
        rules: GameRules,
        runtime: Handle,
    ) -> Self {
        let hides = AutoHideScheduler::new(Arc::clone(&store), Arc::clone(&sink), runtime);
        Self {
            store,
            sink,
            rng: Mutex::new(rng),
            rules,
            ids: IdGenerator::new(),
            hides,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn auto_hide(&self) -> &AutoHideScheduler<S> {
        &self.hides
    }

    // ---------- жизненный цикл сессии ----------

    /// Создать сессию, посадить создателя и ботов.
    pub fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CreatedSession, EngineError> {
        let session_id = self.ids.next_session_id();
        let creator_id = self.ids.next_player_id();
        let bot_ids = (0..request.bot_count)
            .map(|_| self.ids.next_player_id())
            .collect();

        let params = NewSession {
            session_id,
            player_count: request.player_count,
            creator_id,
            creator_name: request.creator_name,
            bot_ids,
            rules: request.rules.unwrap_or_else(|| self.rules.clone()),
            now_ms: now_ms(),
        };

        let mut outbox = Outbox::new();
        let session = turn_engine::create_session(params, &mut self.shared_rng(), &mut outbox)?;
        if let Some(violation) = session.invariant_violation() {
            return Err(EngineError::Internal(violation));
        }

        self.store.insert(session.clone())?;
        info!(
            session_id,
            creator_id,
            seats = session.seats,
            bots = request.bot_count,
            phase = ?session.phase,
            "session created"
        );
        self.flush(session_id, outbox);

        Ok(CreatedSession {
            session,
            creator_id,
        })
    }

    /// Посадить нового игрока. Возвращает его id.
    pub fn join(
        &self,
        session_id: SessionId,
        display_name: &str,
        kind: PlayerKind,
    ) -> Result<PlayerId, EngineError> {
        let player_id = self.ids.next_player_id();
        let mut outbox = Outbox::new();

        self.store.transact(session_id, now_ms(), |tx| {
            turn_engine::join(tx, player_id, display_name, kind, &mut outbox)
        })?;

        info!(session_id, player_id, ?kind, "player joined");
        self.flush(session_id, outbox);
        Ok(player_id)
    }

    /// Удалить сессию, её таймеры и канал событий.
    pub fn remove_session(&self, session_id: SessionId) -> Result<(), EngineError> {
        self.store.remove(session_id)?;
        self.hides.cancel_session(session_id);
        self.sink.close(session_id);
        info!(session_id, "session removed");
        Ok(())
    }

    // ---------- действия игроков ----------

    /// Применить любое действие одной транзакцией.
    pub fn act(
        &self,
        session_id: SessionId,
        action: PlayerAction,
    ) -> Result<ActionOutcome, EngineError> {
        let mut outbox = Outbox::new();

        let result = self.store.transact(session_id, now_ms(), |tx| {
            turn_engine::apply_action(tx, &mut self.shared_rng(), action, &mut outbox)
        });

        match &result {
            Ok(outcome) => {
                debug!(session_id, player_id = action.player_id, ?outcome, "action applied");
            }
            Err(EngineError::Internal(reason)) => {
                warn!(session_id, player_id = action.player_id, reason, "transaction aborted");
            }
            Err(e) => {
                debug!(session_id, player_id = action.player_id, error = %e, "action rejected");
            }
        }
        let outcome = result?;

        if outbox
            .deliveries
            .iter()
            .any(|d| matches!(d, Delivery::Public(GameEvent::GameCompleted { .. })))
        {
            info!(session_id, "round completed");
        }
        self.flush(session_id, outbox);
        Ok(outcome)
    }

    pub fn view_initial_cards(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<Vec<(GridPosition, CardFace)>, EngineError> {
        match self.act(session_id, action(player_id, PlayerActionKind::ViewInitialCards))? {
            ActionOutcome::InitialCards { cards } => Ok(cards),
            _ => Err(EngineError::Internal("unexpected outcome for initial view")),
        }
    }

    pub fn draw(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        source: DrawSource,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(session_id, action(player_id, PlayerActionKind::Draw { source }))
    }

    pub fn swap(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        slot: usize,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(session_id, action(player_id, PlayerActionKind::Swap { slot }))
    }

    pub fn discard(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(session_id, action(player_id, PlayerActionKind::Discard))
    }

    pub fn activate_power(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        request: PowerRequest,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(
            session_id,
            action(player_id, PlayerActionKind::ActivatePower(request)),
        )
    }

    pub fn skip_power(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(session_id, action(player_id, PlayerActionKind::SkipPower))
    }

    pub fn call_cambio(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<ActionOutcome, EngineError> {
        self.act(session_id, action(player_id, PlayerActionKind::CallCambio))
    }

    pub fn set_connected(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        connected: bool,
    ) -> Result<(), EngineError> {
        let mut outbox = Outbox::new();
        self.store.transact(session_id, now_ms(), |tx| {
            turn_engine::set_connected(tx, player_id, connected, &mut outbox)
        })?;
        debug!(session_id, player_id, connected, "connection changed");
        self.flush(session_id, outbox);
        Ok(())
    }

    // ---------- чтение ----------

    pub fn session(&self, session_id: SessionId) -> Result<Session, EngineError> {
        self.store.get(session_id)
    }

    /// Итоги раунда. До завершения — конфликт состояния.
    pub fn scores(&self, session_id: SessionId) -> Result<RoundResult, EngineError> {
        self.store
            .scores(session_id)?
            .ok_or(EngineError::ConflictState("round is not completed yet"))
    }

    pub fn turn_log(&self, session_id: SessionId) -> Result<Vec<TurnRecord>, EngineError> {
        self.store.turn_log(session_id)
    }

    // ---------- внутреннее ----------

    fn shared_rng(&self) -> SharedRng<'_, R> {
        SharedRng(&self.rng)
    }

    /// Выполнить побочные эффекты коммита. Блокировка сессии уже снята.
    fn flush(&self, session_id: SessionId, outbox: Outbox) {
        for card_id in outbox.cancelled_hides {
            self.hides.cancel(session_id, card_id);
        }
        for request in outbox.hides {
            self.hides.schedule(session_id, request);
        }
        for delivery in outbox.deliveries {
            match delivery {
                Delivery::Public(event) => self.sink.publish(session_id, event),
                Delivery::Private(player_id, event) => {
                    self.sink.publish_to(session_id, player_id, event)
                }
            }
        }
    }
}

/// Общий RNG менеджера. Мьютекс берётся только на время одного вызова,
/// поэтому транзакции разных сессий друг друга не ждут.
struct SharedRng<'a, R>(&'a Mutex<R>);

impl<R: RandomSource> RandomSource for SharedRng<'_, R> {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shuffle(slice);
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pick_index(len)
    }
}

fn action(player_id: PlayerId, kind: PlayerActionKind) -> PlayerAction {
    PlayerAction { player_id, kind }
}
