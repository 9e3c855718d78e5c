use std::sync::{Arc, Mutex};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{RoundResult, Session, SessionId};
use crate::engine::{EngineError, Transaction, TurnLog, TurnRecord};

/// Абстракция хранилища сессий.
///
/// Единственный способ изменить сессию — `transact`: эксклюзивная блокировка
/// сессии, чтение, валидация и запись одним куском. Если замыкание вернуло
/// ошибку, ничего не записывается.
pub trait SessionStore: Send + Sync {
    /// Положить новую сессию.
    fn insert(&self, session: Session) -> Result<(), EngineError>;

    /// Снимок сессии.
    fn get(&self, id: SessionId) -> Result<Session, EngineError>;

    /// Заблокированный read-modify-write.
    fn transact<T, F>(&self, id: SessionId, now_ms: u64, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Transaction) -> Result<T, EngineError>;

    /// Журнал ходов сессии.
    fn turn_log(&self, id: SessionId) -> Result<Vec<TurnRecord>, EngineError>;

    /// Итоги раунда, если он завершён.
    fn scores(&self, id: SessionId) -> Result<Option<RoundResult>, EngineError>;

    /// Удалить сессию со всеми картами и журналом.
    fn remove(&self, id: SessionId) -> Result<(), EngineError>;

    fn session_ids(&self) -> Vec<SessionId>;
}

/// Всё, что хранится по одной сессии.
#[derive(Debug)]
struct SessionRecord {
    session: Session,
    turn_log: TurnLog,
    scores: Option<RoundResult>,
    /// Растёт на каждом коммите.
    version: u64,
}

/// Простая in-memory реализация для тестов и локального запуска.
///
/// Карта шардирована (`DashMap`), у каждой сессии свой мьютекс: разные
/// сессии друг друга не блокируют.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Arc<Mutex<SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сколько коммитов было у сессии.
    pub fn version(&self, id: SessionId) -> Result<u64, EngineError> {
        let record = self.record(id)?;
        let guard = record
            .lock()
            .map_err(|_| EngineError::Internal("session lock poisoned"))?;
        Ok(guard.version)
    }

    fn record(&self, id: SessionId) -> Result<Arc<Mutex<SessionRecord>>, EngineError> {
        // Гард шарда отпускается до захвата мьютекса сессии.
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::SessionNotFound(id))
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) -> Result<(), EngineError> {
        match self.sessions.entry(session.id) {
            Entry::Occupied(_) => Err(EngineError::ConflictState("session id already taken")),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(SessionRecord {
                    session,
                    turn_log: TurnLog::new(),
                    scores: None,
                    version: 0,
                })));
                Ok(())
            }
        }
    }

    fn get(&self, id: SessionId) -> Result<Session, EngineError> {
        let record = self.record(id)?;
        let guard = record
            .lock()
            .map_err(|_| EngineError::Internal("session lock poisoned"))?;
        Ok(guard.session.clone())
    }

    fn transact<T, F>(&self, id: SessionId, now_ms: u64, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Transaction) -> Result<T, EngineError>,
    {
        let record = self.record(id)?;
        let mut guard = record
            .lock()
            .map_err(|_| EngineError::Internal("session lock poisoned"))?;

        let mut tx = Transaction::begin(
            guard.session.clone(),
            guard.turn_log.len(),
            guard.scores.is_some(),
            now_ms,
        );
        let value = f(&mut tx)?;
        let commit = tx.finish()?;

        guard
            .turn_log
            .append(commit.turns)
            .map_err(|_| EngineError::Internal("turn log index gap"))?;
        if let Some(scores) = commit.scores {
            guard.scores = Some(scores);
        }
        guard.session = commit.session;
        guard.version += 1;

        Ok(value)
    }

    fn turn_log(&self, id: SessionId) -> Result<Vec<TurnRecord>, EngineError> {
        let record = self.record(id)?;
        let guard = record
            .lock()
            .map_err(|_| EngineError::Internal("session lock poisoned"))?;
        Ok(guard.turn_log.records().to_vec())
    }

    fn scores(&self, id: SessionId) -> Result<Option<RoundResult>, EngineError> {
        let record = self.record(id)?;
        let guard = record
            .lock()
            .map_err(|_| EngineError::Internal("session lock poisoned"))?;
        Ok(guard.scores.clone())
    }

    fn remove(&self, id: SessionId) -> Result<(), EngineError> {
        self.sessions
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::SessionNotFound(id))
    }

    fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }
}
