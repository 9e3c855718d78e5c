//! Отложенное скрытие подсмотренных карт.
//!
//! Задача привязана к `(card_id, version)`: если карта успела сменить
//! контейнер или владельца, версия другая и задача ничего не делает.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::domain::{CardId, SessionId, Visibility};
use crate::engine::{GameEvent, HideRequest};
use crate::infra::events::EventSink;
use crate::infra::ids::now_ms;
use crate::infra::persistence::SessionStore;

type PendingHides = DashMap<(SessionId, CardId), (u32, AbortHandle)>;

/// Планировщик авто-скрытия поверх tokio.
pub struct AutoHideScheduler<S> {
    store: Arc<S>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    pending: Arc<PendingHides>,
}

impl<S: SessionStore + 'static> AutoHideScheduler<S> {
    pub fn new(store: Arc<S>, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self {
            store,
            sink,
            runtime,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Запланировать скрытие. Прежняя задача для той же карты отменяется.
    pub fn schedule(&self, session_id: SessionId, request: HideRequest) {
        let key = (session_id, request.card_id);
        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let pending = Arc::clone(&self.pending);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(request.delay_ms)).await;
            pending.remove_if(&key, |_, (version, _)| *version == request.version);
            hide_if_current(store.as_ref(), sink.as_ref(), session_id, request);
        });

        if let Some((_, previous)) = self
            .pending
            .insert(key, (request.version, task.abort_handle()))
        {
            previous.abort();
        }
    }

    /// Отменить скрытие одной карты.
    pub fn cancel(&self, session_id: SessionId, card_id: CardId) {
        if let Some((_, (_, task))) = self.pending.remove(&(session_id, card_id)) {
            task.abort();
        }
    }

    /// Отменить все задачи сессии.
    pub fn cancel_session(&self, session_id: SessionId) {
        self.pending.retain(|(sid, _), (_, task)| {
            if *sid == session_id {
                task.abort();
                false
            } else {
                true
            }
        });
    }

    /// Сколько задач ещё ждут.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Вернуть карту в `hidden`, если это всё ещё тот самый подсмотр.
fn hide_if_current<S: SessionStore>(
    store: &S,
    sink: &dyn EventSink,
    session_id: SessionId,
    request: HideRequest,
) {
    let result = store.transact(session_id, now_ms(), |tx| {
        if tx.session.is_completed() {
            return Ok(false);
        }
        let Some(card) = tx.session.card_mut(request.card_id) else {
            return Ok(false);
        };
        if card.version != request.version || card.visibility != Visibility::Peeking {
            return Ok(false);
        }
        card.visibility = Visibility::Hidden;
        Ok(true)
    });

    match result {
        Ok(true) => {
            debug!(session_id, card_id = request.card_id, "peeked card hidden");
            sink.publish_to(
                session_id,
                request.viewer,
                GameEvent::CardHidden {
                    card_id: request.card_id,
                },
            );
        }
        Ok(false) => {
            debug!(session_id, card_id = request.card_id, "auto-hide skipped: card moved or session over");
        }
        Err(e) if e.is_not_found() => {
            debug!(session_id, card_id = request.card_id, "auto-hide skipped: session gone");
        }
        Err(e) => {
            warn!(session_id, card_id = request.card_id, error = %e, "auto-hide failed");
        }
    }
}
