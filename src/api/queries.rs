use serde::{Deserialize, Serialize};

use crate::domain::SessionId;

use super::dto::{ScoresDto, SessionViewDto, TurnRecordDto};

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Состояние сессии глазами зрителя.
    GetSession { session_id: SessionId },

    /// Итоги завершённого раунда.
    GetScores { session_id: SessionId },

    /// Журнал ходов глазами зрителя.
    GetTurnLog { session_id: SessionId },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum QueryResponse {
    Session(SessionViewDto),
    Scores(ScoresDto),
    TurnLog(Vec<TurnRecordDto>),
}
