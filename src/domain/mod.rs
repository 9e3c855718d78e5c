//! Доменная модель Cambio: карты, стопки, игроки, сессия, правила, итоги.

pub mod card;
pub mod deck;
pub mod player;
pub mod rules;
pub mod score;
pub mod session;

// Базовые идентификаторы.
pub type SessionId = u64;
pub type PlayerId = u64;
/// Индекс карты внутри сессии (0..52).
pub type CardId = u8;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Card и т.п.
pub use card::*;
pub use deck::*;
pub use player::*;
pub use rules::*;
pub use score::*;
pub use session::*;
