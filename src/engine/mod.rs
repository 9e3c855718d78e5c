//! Движок Cambio: колода, ходы, спец-способности, подсчёт очков.
//!
//! Высокоуровневый объект: `SessionManager`
//! Основные операции:
//!   - `turn_engine::create_session` / `turn_engine::join` – рассадка и раздача
//!   - `turn_engine::apply_action` – применить действие игрока
//!   - `turn_engine::advance_turn` – переход хода и завершение раунда

pub mod actions;
pub mod deck_manager;
pub mod errors;
pub mod events;
pub mod powers;
pub mod scoring;
pub mod session_manager;
pub mod transaction;
pub mod turn_engine;
pub mod turn_log;
pub mod validation;

pub use actions::{PlayerAction, PlayerActionKind, PowerRequest};
pub use errors::EngineError;
pub use events::{Delivery, GameEvent, HideRequest, Outbox};
pub use powers::{PowerOutcome, RevealedCard};
pub use session_manager::{CreateSessionRequest, SessionManager};
pub use transaction::{CommitSet, Transaction};
pub use turn_engine::{apply_action, ActionOutcome};
pub use turn_log::{TurnAction, TurnLog, TurnRecord};

/// RNG интерфейс для engine.
/// Реализации лежат в infra (обёртки над `rand`).
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);

    /// Равномерный индекс в `0..len`. `len` больше нуля.
    fn pick_index(&mut self, len: usize) -> usize;
}
