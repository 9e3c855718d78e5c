//! Движок карточной игры Cambio.
//!
//! Слои:
//! - `domain` — карты, стопки, игроки, сессия, правила, итоги;
//! - `engine` — машина ходов, колода, спец-способности, подсчёт очков, менеджер сессий;
//! - `infra` — id, RNG, хранилище, события, авто-скрытие, маппинг в DTO;
//! - `api` — команды, запросы, DTO и ошибки с HTTP-статусами.

pub mod api;
pub mod domain;
pub mod engine;
pub mod infra;

pub use api::{handle_command, handle_query, ApiError, Command, CommandEnvelope, Query};
pub use domain::{GameRules, Session};
pub use engine::{EngineError, SessionManager};
pub use infra::{BroadcastHub, InMemorySessionStore};
