use serde::{Deserialize, Serialize};

use crate::domain::{DrawSource, GameRules, PlayerId, PlayerKind, SessionId};
use crate::engine::actions::{PlayerActionKind, PowerRequest};
use crate::engine::turn_engine::ActionOutcome;

use super::dto::SessionViewDto;

/// Команда вместе с идентичностью того, кто её прислал.
///
/// Идентичность разрешает транспорт; сюда она приходит уже готовым id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub actor: Option<PlayerId>,
    pub command: Command,
}

/// Команда верхнего уровня.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Создать новую сессию (создатель садится первым).
    CreateSession(CreateSessionCommand),

    /// Сесть в существующую сессию.
    JoinSession {
        session_id: SessionId,
        display_name: String,
        #[serde(default)]
        kind: PlayerKind,
    },

    /// Операция в конкретной сессии от имени `actor`.
    SessionCommand {
        session_id: SessionId,
        command: SessionCommand,
    },
}

/// Команда создания сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSessionCommand {
    /// Сколько мест (2–4). Раздача начнётся, когда сядут все.
    pub player_count: u8,
    #[serde(default)]
    pub bot_count: u8,
    pub display_name: String,
    #[serde(default)]
    pub rules: Option<GameRules>,
}

/// Команды, которые относятся к существующей сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionCommand {
    ViewInitialCards,
    Draw { source: DrawSource },
    Swap { index: usize },
    Discard,
    ActivatePower(PowerRequest),
    SkipPower,
    CallCambio,
    SetConnection { connected: bool },
}

impl SessionCommand {
    /// Игровое действие движка; `None` для служебных команд.
    pub fn as_action(&self) -> Option<PlayerActionKind> {
        match *self {
            SessionCommand::ViewInitialCards => Some(PlayerActionKind::ViewInitialCards),
            SessionCommand::Draw { source } => Some(PlayerActionKind::Draw { source }),
            SessionCommand::Swap { index } => Some(PlayerActionKind::Swap { slot: index }),
            SessionCommand::Discard => Some(PlayerActionKind::Discard),
            SessionCommand::ActivatePower(request) => {
                Some(PlayerActionKind::ActivatePower(request))
            }
            SessionCommand::SkipPower => Some(PlayerActionKind::SkipPower),
            SessionCommand::CallCambio => Some(PlayerActionKind::CallCambio),
            SessionCommand::SetConnection { .. } => None,
        }
    }
}

/// Ответ на команду.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResponse {
    SessionCreated {
        session_id: SessionId,
        player_id: PlayerId,
        session: SessionViewDto,
    },
    Joined {
        player_id: PlayerId,
        session: SessionViewDto,
    },
    ActionApplied {
        outcome: ActionOutcome,
        session: SessionViewDto,
    },
    ConnectionUpdated {
        session: SessionViewDto,
    },
}
