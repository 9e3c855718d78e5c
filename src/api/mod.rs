//! Внешний API движка Cambio.
//!
//! Здесь описываются:
//! - команды (commands.rs) — всё, что меняет состояние (создать сессию, сесть, ход игрока);
//! - запросы (queries.rs) — только чтение;
//! - DTO (dto.rs) — структуры для клиента, с учётом того, кто смотрит;
//! - ошибки (errors.rs) — то, что видит клиент, с HTTP-статусами.
//!
//! `handle_command` / `handle_query` — диспетчер поверх `SessionManager`.

pub mod commands;
pub mod dto;
pub mod errors;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use queries::*;

use crate::domain::PlayerId;
use crate::engine::actions::PlayerAction;
use crate::engine::session_manager::{CreateSessionRequest, SessionManager};
use crate::engine::RandomSource;
use crate::infra::mapping::{map_scores_to_dto, map_session_to_dto, map_turn_log_to_dto};
use crate::infra::persistence::SessionStore;

/// Разобрать конверт команды из JSON.
pub fn parse_command(raw: &str) -> Result<CommandEnvelope, ApiError> {
    Ok(serde_json::from_str(raw)?)
}

/// Разобрать запрос из JSON.
pub fn parse_query(raw: &str) -> Result<Query, ApiError> {
    Ok(serde_json::from_str(raw)?)
}

/// Выполнить команду.
pub fn handle_command<S, R>(
    manager: &SessionManager<S, R>,
    envelope: CommandEnvelope,
) -> Result<CommandResponse, ApiError>
where
    S: SessionStore + 'static,
    R: RandomSource,
{
    match envelope.command {
        Command::CreateSession(cmd) => {
            let created = manager.create_session(CreateSessionRequest {
                player_count: cmd.player_count,
                bot_count: cmd.bot_count,
                creator_name: cmd.display_name,
                rules: cmd.rules,
            })?;
            let player_id = created.creator_id;
            Ok(CommandResponse::SessionCreated {
                session_id: created.session.id,
                player_id,
                session: map_session_to_dto(&created.session, Some(player_id)),
            })
        }

        Command::JoinSession {
            session_id,
            display_name,
            kind,
        } => {
            let player_id = manager.join(session_id, &display_name, kind)?;
            let session = manager.session(session_id)?;
            Ok(CommandResponse::Joined {
                player_id,
                session: map_session_to_dto(&session, Some(player_id)),
            })
        }

        Command::SessionCommand {
            session_id,
            command,
        } => {
            let actor = require_actor(envelope.actor)?;

            if let SessionCommand::SetConnection { connected } = command {
                manager.set_connected(session_id, actor, connected)?;
                let session = manager.session(session_id)?;
                return Ok(CommandResponse::ConnectionUpdated {
                    session: map_session_to_dto(&session, Some(actor)),
                });
            }

            let kind = command
                .as_action()
                .ok_or_else(|| ApiError::BadRequest("unsupported session command".to_string()))?;
            let outcome = manager.act(
                session_id,
                PlayerAction {
                    player_id: actor,
                    kind,
                },
            )?;
            let session = manager.session(session_id)?;
            Ok(CommandResponse::ActionApplied {
                outcome,
                session: map_session_to_dto(&session, Some(actor)),
            })
        }
    }
}

/// Выполнить запрос. `viewer` определяет, какие приватные данные видны.
pub fn handle_query<S, R>(
    manager: &SessionManager<S, R>,
    viewer: Option<PlayerId>,
    query: Query,
) -> Result<QueryResponse, ApiError>
where
    S: SessionStore + 'static,
    R: RandomSource,
{
    match query {
        Query::GetSession { session_id } => {
            let session = manager.session(session_id)?;
            Ok(QueryResponse::Session(map_session_to_dto(&session, viewer)))
        }
        Query::GetScores { session_id } => {
            let result = manager.scores(session_id)?;
            Ok(QueryResponse::Scores(map_scores_to_dto(&result)))
        }
        Query::GetTurnLog { session_id } => {
            let records = manager.turn_log(session_id)?;
            Ok(QueryResponse::TurnLog(map_turn_log_to_dto(&records, viewer)))
        }
    }
}

fn require_actor(actor: Option<PlayerId>) -> Result<PlayerId, ApiError> {
    actor.ok_or(ApiError::Unauthorized)
}
