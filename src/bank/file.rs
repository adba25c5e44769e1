use std::path::Path;

use serde::Deserialize;

use super::{Contribution, Question, QuestionBank, QuizOption};
use crate::error::BankError;

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<RawOption>,
    #[serde(default)]
    correct_option_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Weighted { text: String, weights: Vec<i32> },
}

impl TryFrom<RawQuestion> for Question {
    type Error = BankError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let count = raw.options.len();
        if let Some(index) = raw.correct_option_index {
            if index >= count {
                return Err(BankError::CorrectIndexOutOfRange {
                    question: raw.question,
                    index,
                    count,
                });
            }
        }

        let mut options = Vec::with_capacity(count);
        for (i, option) in raw.options.into_iter().enumerate() {
            let option = match (option, raw.correct_option_index) {
                (RawOption::Plain(text), Some(correct)) => {
                    QuizOption::new(text, Contribution::Correct(i == correct))
                }
                (RawOption::Weighted { text, weights }, None) => {
                    QuizOption::new(text, Contribution::Weights(weights))
                }
                _ => {
                    return Err(BankError::MixedOptions {
                        question: raw.question,
                    })
                }
            };
            options.push(option);
        }

        Ok(Question::new(raw.question, options))
    }
}

impl QuestionBank {
    pub fn from_json_str(json: &str) -> Result<Self, BankError> {
        let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
        raw.into_iter().map(Question::try_from).collect()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_owned(),
            source,
        })?;
        let bank = Self::from_json_str(&json)?;
        log::info!("Loaded {} questions from {}", bank.len(), path.display());
        Ok(bank)
    }
}
