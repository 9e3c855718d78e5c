//! Инфраструктурный слой вокруг движка Cambio:
//! - генерация ID и время;
//! - RNG-реализации для движка;
//! - хранилище сессий (in-memory, с блокировкой на сессию);
//! - доставка событий наблюдателям;
//! - отложенное авто-скрытие подсмотренных карт;
//! - маппинги domain -> API DTO.

pub mod auto_hide;
pub mod events;
pub mod ids;
pub mod mapping;
pub mod persistence;
pub mod rng;

pub use auto_hide::AutoHideScheduler;
pub use events::{BroadcastHub, Envelope, EventSink, Subscription};
pub use ids::{now_ms, IdGenerator};
pub use mapping::*;
pub use persistence::{InMemorySessionStore, SessionStore};
pub use rng::{DeterministicRng, SystemRng};
