use std::fmt;

use teloxide::types::MessageId;
use uuid::Uuid;

use crate::{
    bank::{Contribution, Question},
    error::SessionError,
};

/// Accumulated score of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Score {
    Count(u32),
    Vector(Vec<i32>),
}

/// Per-chat quiz progress. Kept in the session store after completion with
/// `active` cleared so late button presses can be told the quiz is over.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    questions: Vec<Question>,
    pub(crate) current_index: usize,
    pub(crate) score: Score,
    pub(crate) active: bool,
    message_id: Option<MessageId>,
}

impl Score {
    /// Leaves the score untouched when the contribution does not fit it.
    pub(crate) fn add(&mut self, contribution: &Contribution) -> Result<(), SessionError> {
        match (self, contribution) {
            (Score::Count(count), Contribution::Correct(true)) => *count += 1,
            (Score::Count(_), Contribution::Correct(false)) => {}
            (Score::Vector(totals), Contribution::Weights(weights))
                if totals.len() == weights.len() =>
            {
                for (total, weight) in totals.iter_mut().zip(weights) {
                    *total += weight;
                }
            }
            (score, contribution) => {
                return Err(SessionError::ScoreMismatch {
                    score: score.to_string(),
                    contribution: contribution.to_string(),
                })
            }
        }
        Ok(())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Count(count) => write!(f, "{count}"),
            Score::Vector(totals) => {
                let parts: Vec<String> = totals.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl Session {
    pub(crate) fn new(questions: Vec<Question>, score: Score) -> Self {
        Self {
            id: Uuid::new_v4(),
            questions,
            current_index: 0,
            score,
            active: true,
            message_id: None,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The chat message that currently shows this session's question.
    pub fn message_id(&self) -> Option<MessageId> {
        self.message_id
    }

    pub(crate) fn set_message_id(&mut self, message_id: MessageId) {
        self.message_id = Some(message_id);
    }

    /// Ends the session without a result.
    pub fn cancel(&mut self) {
        self.active = false;
    }
}
