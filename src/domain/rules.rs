//! Правила партии: всё, что настраивается, без состояния.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Нижняя граница числа игроков в любой партии.
pub const MIN_PLAYERS: u8 = 2;
/// Верхняя граница числа игроков.
pub const MAX_PLAYERS: u8 = 4;
/// Дольше минуты подсмотр не держим.
pub const MAX_PEEK_DURATION_MS: u64 = 60_000;
pub const MAX_PENALTY_MULTIPLIER: u32 = 10;

/// Почему набор правил нельзя использовать.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("игроков должно быть от {MIN_PLAYERS} до {MAX_PLAYERS}, задано {min}–{max}")]
    PlayerBounds { min: u8, max: u8 },

    #[error("длительность подсмотра должна быть 1..={MAX_PEEK_DURATION_MS} мс, задано {0}")]
    PeekDuration(u64),

    #[error("множитель штрафа должен быть 1..={MAX_PENALTY_MULTIPLIER}, задано {0}")]
    PenaltyMultiplier(u32),
}

/// Конфигурация одной сессии.
///
/// Отсутствующие в JSON поля берутся из `GameRules::standard()`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
    /// Минимум игроков, с которым вообще можно раздавать.
    pub min_players: u8,
    /// Максимум мест в сессии.
    pub max_players: u8,
    /// Сколько миллисекунд подсмотренная карта остаётся открытой.
    pub peek_duration_ms: u64,
    /// Во сколько раз умножается счёт ошибившегося Cambio-игрока.
    pub cambio_penalty_multiplier: u32,
    /// Строгий вариант: карту, взятую из сброса, обязательно менять.
    pub require_swap_after_discard_draw: bool,
    /// Даёт ли способность карта, взятая из сброса.
    pub powers_on_discard_draws: bool,
}

impl GameRules {
    /// Стандартный профиль: 2–4 игрока, подсмотр 5 сек, штраф ×2, мягкое правило сброса.
    pub const fn standard() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            peek_duration_ms: 5_000,
            cambio_penalty_multiplier: 2,
            require_swap_after_discard_draw: false,
            powers_on_discard_draws: false,
        }
    }

    /// Строгий профиль: взятую из сброса карту нельзя просто сбросить.
    pub const fn strict() -> Self {
        Self {
            require_swap_after_discard_draw: true,
            ..Self::standard()
        }
    }

    /// Разобрать правила из JSON. Проверку делает `validate`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Проверить границы всех настраиваемых полей.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.min_players < MIN_PLAYERS
            || self.max_players > MAX_PLAYERS
            || self.min_players > self.max_players
        {
            return Err(RulesError::PlayerBounds {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if !(1..=MAX_PEEK_DURATION_MS).contains(&self.peek_duration_ms) {
            return Err(RulesError::PeekDuration(self.peek_duration_ms));
        }
        if !(1..=MAX_PENALTY_MULTIPLIER).contains(&self.cambio_penalty_multiplier) {
            return Err(RulesError::PenaltyMultiplier(self.cambio_penalty_multiplier));
        }
        Ok(())
    }

    pub fn allows_player_count(&self, count: u8) -> bool {
        count >= self.min_players && count <= self.max_players
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::standard()
    }
}
