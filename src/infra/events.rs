//! Доставка событий наблюдателям.
//!
//! `BroadcastHub` держит по одному broadcast-каналу на сессию. Публикация
//! никогда не блокирует: нет подписчиков — событие просто теряется.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use crate::domain::{PlayerId, SessionId};
use crate::engine::GameEvent;

/// Ёмкость канала одной сессии.
pub const CHANNEL_CAPACITY: usize = 256;

/// Канал уведомлений. Реализация обязана быть неблокирующей.
pub trait EventSink: Send + Sync {
    /// Всем наблюдателям сессии.
    fn publish(&self, session_id: SessionId, event: GameEvent);

    /// Только одному игроку.
    fn publish_to(&self, session_id: SessionId, player_id: PlayerId, event: GameEvent);

    /// Сессия удалена: освободить её канал.
    fn close(&self, session_id: SessionId);
}

/// Событие в канале вместе с адресатом.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub session_id: SessionId,
    /// `None` — публичное событие.
    pub recipient: Option<PlayerId>,
    pub event: GameEvent,
}

/// In-process pub/sub на tokio broadcast.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    channels: DashMap<SessionId, broadcast::Sender<Arc<Envelope>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписаться на сессию. `viewer = None` — зритель без приватных событий.
    pub fn subscribe(&self, session_id: SessionId, viewer: Option<PlayerId>) -> Subscription {
        let rx = self
            .channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        Subscription {
            session_id,
            viewer,
            rx,
        }
    }

    /// Сколько сессий сейчас держат канал.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn send(&self, envelope: Envelope) {
        if let Some(tx) = self.channels.get(&envelope.session_id) {
            // Ошибка = нет подписчиков; доставка best-effort.
            let _ = tx.send(Arc::new(envelope));
        }
    }
}

impl EventSink for BroadcastHub {
    fn publish(&self, session_id: SessionId, event: GameEvent) {
        self.send(Envelope {
            session_id,
            recipient: None,
            event,
        });
    }

    fn publish_to(&self, session_id: SessionId, player_id: PlayerId, event: GameEvent) {
        self.send(Envelope {
            session_id,
            recipient: Some(player_id),
            event,
        });
    }

    /// Подписчики получат конец потока.
    fn close(&self, session_id: SessionId) {
        self.channels.remove(&session_id);
    }
}

/// Подписка одного наблюдателя: чужие приватные события отфильтрованы.
#[derive(Debug)]
pub struct Subscription {
    session_id: SessionId,
    viewer: Option<PlayerId>,
    rx: broadcast::Receiver<Arc<Envelope>>,
}

impl Subscription {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn visible(&self, envelope: &Envelope) -> bool {
        match envelope.recipient {
            None => true,
            Some(recipient) => self.viewer == Some(recipient),
        }
    }

    /// Следующее видимое событие. `None` — канал закрыт.
    pub async fn recv(&mut self) -> Option<GameEvent> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if self.visible(&envelope) => return Some(envelope.event.clone()),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = self.session_id, skipped, "subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Неблокирующий вариант: следующее уже доставленное видимое событие.
    pub fn try_next(&mut self) -> Option<GameEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) if self.visible(&envelope) => return Some(envelope.event.clone()),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(session_id = self.session_id, skipped, "subscriber lagged behind");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Всё, что накопилось к этому моменту.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
