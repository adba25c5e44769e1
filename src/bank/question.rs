use std::fmt;

/// What choosing an option adds to the session score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// Binary scoring: whether the option is the correct one.
    Correct(bool),
    /// Weighted scoring: a fixed-length vector added element-wise.
    Weights(Vec<i32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<QuizOption>,
}

/// An answer option. Its identity is its position in [`Question::options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    text: String,
    contribution: Contribution,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Correct(is_correct) => write!(f, "{}", u8::from(*is_correct)),
            Contribution::Weights(weights) => {
                let parts: Vec<String> = weights.iter().map(|w| w.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} options)", self.text, self.options.len())
    }
}

impl Question {
    pub fn new(text: impl Into<String>, options: Vec<QuizOption>) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    /// Builds a binary question from plain option texts.
    pub fn with_correct(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct: usize,
    ) -> Self {
        let options = options
            .into_iter()
            .enumerate()
            .map(|(i, option)| QuizOption::new(option, Contribution::Correct(i == correct)))
            .collect();
        Self::new(text, options)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    pub fn option(&self, identity: usize) -> Option<&QuizOption> {
        self.options.get(identity)
    }

    /// The first option flagged correct, if this is a binary question.
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options
            .iter()
            .find(|option| option.contribution == Contribution::Correct(true))
    }
}

impl QuizOption {
    pub fn new(text: impl Into<String>, contribution: Contribution) -> Self {
        Self {
            text: text.into(),
            contribution,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn contribution(&self) -> &Contribution {
        &self.contribution
    }

    pub fn is_correct(&self) -> bool {
        matches!(self.contribution, Contribution::Correct(true))
    }
}
