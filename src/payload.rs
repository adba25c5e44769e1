//! Callback data carried by answer buttons.
//!
//! Layout: `<question index>|<display position>|<contribution>|<option identity>`.
//! The contribution is `1`/`0` in binary mode and `(w1,w2,...)` in weighted
//! mode. Everything needed to decode an answer travels with the button, so the
//! displayed option order never has to be stored.

use std::{fmt, str::FromStr};

use crate::{bank::Contribution, error::PayloadError};

/// Telegram rejects callback data longer than this.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

const SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPayload {
    pub question_index: usize,
    pub display_position: usize,
    pub contribution: Contribution,
    pub identity: usize,
}

impl fmt::Display for AnswerPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.question_index, self.display_position, self.contribution, self.identity
        )
    }
}

impl FromStr for AnswerPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PayloadError::Empty);
        }

        let fields: Vec<&str> = s.split(SEPARATOR).collect();
        let [question_index, display_position, contribution, identity] = &fields[..] else {
            return Err(PayloadError::FieldCount(fields.len()));
        };

        Ok(Self {
            question_index: parse_index("question_index", question_index)?,
            display_position: parse_index("display_position", display_position)?,
            contribution: parse_contribution(contribution)?,
            identity: parse_index("identity", identity)?,
        })
    }
}

impl AnswerPayload {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(data: &str) -> Result<Self, PayloadError> {
        data.parse()
    }
}

fn parse_index(field: &'static str, value: &str) -> Result<usize, PayloadError> {
    value.parse().map_err(|_| PayloadError::NotAnInteger {
        field,
        value: value.to_owned(),
    })
}

fn parse_contribution(value: &str) -> Result<Contribution, PayloadError> {
    let malformed = || PayloadError::Contribution(value.to_owned());

    if let Some(inner) = value.strip_prefix('(') {
        let inner = inner.strip_suffix(')').ok_or_else(malformed)?;
        let weights = inner
            .split(',')
            .map(|w| w.parse::<i32>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Contribution::Weights(weights));
    }

    match value {
        "1" => Ok(Contribution::Correct(true)),
        "0" => Ok(Contribution::Correct(false)),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_binary_payload() {
        let payload = AnswerPayload::decode("3|1|1|0").unwrap();
        assert_eq!(
            payload,
            AnswerPayload {
                question_index: 3,
                display_position: 1,
                contribution: Contribution::Correct(true),
                identity: 0,
            }
        );
    }

    #[test]
    fn weighted_payload_round_trips() {
        let payload = AnswerPayload {
            question_index: 12,
            display_position: 2,
            contribution: Contribution::Weights(vec![0, 1, 0, -3]),
            identity: 3,
        };
        let encoded = payload.encode();
        assert_eq!(encoded, "12|2|(0,1,0,-3)|3");
        assert_eq!(AnswerPayload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            AnswerPayload::decode("0|1|2"),
            Err(PayloadError::FieldCount(3))
        );
        assert_eq!(
            AnswerPayload::decode("0|1|1|2|9"),
            Err(PayloadError::FieldCount(5))
        );
        assert_eq!(AnswerPayload::decode(""), Err(PayloadError::Empty));
    }

    #[test]
    fn rejects_non_integers() {
        assert!(matches!(
            AnswerPayload::decode("x|0|1|0"),
            Err(PayloadError::NotAnInteger { field: "question_index", .. })
        ));
        assert!(matches!(
            AnswerPayload::decode("0|0|1|-1"),
            Err(PayloadError::NotAnInteger { field: "identity", .. })
        ));
    }

    #[test]
    fn rejects_bad_contributions() {
        for data in ["0|0|2|0", "0|0|(1,0|0", "0|0|(1,a)|0", "0|0|()|0", "0|0||0"] {
            assert!(
                matches!(
                    AnswerPayload::decode(data),
                    Err(PayloadError::Contribution(_))
                ),
                "{data} should be rejected"
            );
        }
    }
}
