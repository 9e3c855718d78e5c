use crate::domain::{PlayerId, RoundResult, Session};
use crate::engine::errors::EngineError;
use crate::engine::turn_log::{TurnAction, TurnRecord};

/// Рабочая копия сессии внутри блокировки.
///
/// Хранилище открывает транзакцию, движок мутирует `session` и дописывает
/// журнал; при `Ok` хранилище коммитит всё разом, при `Err` копия выбрасывается.
#[derive(Debug)]
pub struct Transaction {
    pub session: Session,
    now_ms: u64,
    next_turn_index: u32,
    pending_turns: Vec<TurnRecord>,
    scores_recorded: bool,
    pending_scores: Option<RoundResult>,
}

/// Что хранилище должно записать при коммите.
#[derive(Debug)]
pub struct CommitSet {
    pub session: Session,
    pub turns: Vec<TurnRecord>,
    pub scores: Option<RoundResult>,
}

impl Transaction {
    pub fn begin(session: Session, log_len: usize, scores_recorded: bool, now_ms: u64) -> Self {
        Self {
            session,
            now_ms,
            next_turn_index: log_len as u32,
            pending_turns: Vec::new(),
            scores_recorded,
            pending_scores: None,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_turns(&self) -> &[TurnRecord] {
        &self.pending_turns
    }

    /// Дописать запись в журнал ходов.
    pub fn append_turn(&mut self, player_id: PlayerId, action: TurnAction) {
        let record = TurnRecord {
            index: self.next_turn_index,
            session_id: self.session.id,
            player_id,
            action,
            created_at_ms: self.now_ms,
        };
        self.next_turn_index += 1;
        self.pending_turns.push(record);
    }

    /// Итоги раунда пишутся ровно один раз.
    pub fn record_scores(&mut self, result: RoundResult) -> Result<(), EngineError> {
        if self.scores_recorded || self.pending_scores.is_some() {
            return Err(EngineError::Internal("round scores already recorded"));
        }
        self.pending_scores = Some(result);
        Ok(())
    }

    /// Закрыть транзакцию: проверить инварианты и отдать набор на запись.
    pub fn finish(mut self) -> Result<CommitSet, EngineError> {
        if let Some(violation) = self.session.invariant_violation() {
            return Err(EngineError::Internal(violation));
        }
        self.session.updated_at_ms = self.now_ms;
        Ok(CommitSet {
            session: self.session,
            turns: self.pending_turns,
            scores: self.pending_scores,
        })
    }
}
