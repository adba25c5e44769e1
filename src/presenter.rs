use crate::{
    engine::{PresentedQuestion, ResultSummary},
    error::PayloadError,
    payload::AnswerPayload,
    state::Score,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

/// Transport-agnostic message: text plus one button per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutboundMessage {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl OutboundMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: vec![],
        }
    }
}

pub fn render_question(question: &PresentedQuestion) -> OutboundMessage {
    let mut text = format!(
        "Question {}/{}:\n\n{}\n\n",
        question.index + 1,
        question.total,
        question.text
    );
    for option in &question.options {
        text.push_str(&format!("{}. {}\n", option.label, option.text));
    }

    let buttons = question
        .options
        .iter()
        .enumerate()
        .map(|(position, option)| Button {
            label: option.label.to_string(),
            payload: AnswerPayload {
                question_index: question.index,
                display_position: position,
                contribution: option.contribution.clone(),
                identity: option.identity,
            }
            .encode(),
        })
        .collect();

    OutboundMessage { text, buttons }
}

pub fn decode_answer_event(payload: &str) -> Result<AnswerPayload, PayloadError> {
    AnswerPayload::decode(payload)
}

pub fn render_result(summary: &ResultSummary) -> OutboundMessage {
    let text = match &summary.score {
        Score::Count(correct) => format!(
            "You got {correct} out of {} questions correct!",
            summary.total
        ),
        Score::Vector(totals) => {
            let mut text = format!("Quiz finished! Your score: {}\n", summary.score);
            for (dimension, total) in totals.iter().enumerate() {
                text.push_str(&format!("{}. {total}\n", dimension + 1));
            }
            text
        }
    };

    OutboundMessage::plain(text)
}
