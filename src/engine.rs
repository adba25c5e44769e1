use std::fmt;

use rand::{seq::SliceRandom, Rng};

use crate::{
    bank::{Contribution, QuestionBank},
    config::{QuizSettings, SampleMode, ScoringMode},
    error::{ConfigError, SessionError},
    payload::{AnswerPayload, MAX_CALLBACK_DATA_LEN},
    state::{Score, Session},
};

/// Options are labelled `A`..`Z`.
pub const MAX_OPTIONS: usize = 26;

pub fn option_label(position: usize) -> char {
    debug_assert!(position < MAX_OPTIONS);
    char::from(b'A' + position as u8)
}

/// One option as shown to the user, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOption {
    pub label: char,
    pub text: String,
    pub identity: usize,
    pub contribution: Contribution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<DisplayOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong { correct_answer: String },
    Chose { label: char },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub score: Score,
    pub total: usize,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Correct => write!(f, "✅ Correct!"),
            Feedback::Wrong { correct_answer } => {
                write!(f, "❌ Wrong! The correct answer was: {correct_answer}")
            }
            Feedback::Chose { label } => write!(f, "You chose {label}."),
        }
    }
}

impl Feedback {
    /// Binary verdicts are shown as a modal alert, weighted echoes as a toast.
    pub fn is_modal(&self) -> bool {
        !matches!(self, Feedback::Chose { .. })
    }
}

/// Quiz rules over a validated question bank. Holds no per-user state.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    bank: QuestionBank,
    settings: QuizSettings,
}

impl QuizEngine {
    pub fn new(bank: QuestionBank, settings: QuizSettings) -> Result<Self, ConfigError> {
        validate(&bank, &settings)?;
        Ok(Self { bank, settings })
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn begin_session<R: Rng + ?Sized>(&self, rng: &mut R) -> Session {
        let count = self.settings.questions_per_session;
        let questions = match self.settings.sample_mode {
            SampleMode::Random => rand::seq::index::sample(rng, self.bank.len(), count)
                .into_iter()
                .map(|i| self.bank.questions()[i].clone())
                .collect(),
            SampleMode::Prefix => self.bank.questions()[..count].to_vec(),
        };

        let score = match self.settings.scoring_mode {
            ScoringMode::Binary => Score::Count(0),
            ScoringMode::Weighted { dimension } => Score::Vector(vec![0; dimension]),
        };

        Session::new(questions, score)
    }

    /// Shuffles the current question's options for display.
    pub fn present_question<R: Rng + ?Sized>(
        &self,
        session: &Session,
        rng: &mut R,
    ) -> Result<PresentedQuestion, SessionError> {
        if !session.is_active() {
            return Err(SessionError::Inactive);
        }
        let question = session.current_question().ok_or(SessionError::Exhausted)?;

        let mut order: Vec<usize> = (0..question.options().len()).collect();
        order.shuffle(rng);

        let options = order
            .into_iter()
            .enumerate()
            .map(|(position, identity)| {
                let option = &question.options()[identity];
                DisplayOption {
                    label: option_label(position),
                    text: option.text().to_owned(),
                    identity,
                    contribution: option.contribution().clone(),
                }
            })
            .collect();

        Ok(PresentedQuestion {
            index: session.current_index(),
            total: session.total(),
            text: question.text().to_owned(),
            options,
        })
    }

    /// Applies an answer to the open question and advances the session.
    ///
    /// Answers for any question other than the open one are rejected as
    /// stale. The score comes from the stored option; a payload whose
    /// contribution disagrees with it is rejected.
    pub fn score_answer(
        &self,
        session: &mut Session,
        answer: &AnswerPayload,
    ) -> Result<Feedback, SessionError> {
        if !session.is_active() {
            return Err(SessionError::Inactive);
        }
        if answer.question_index != session.current_index() {
            return Err(SessionError::Stale {
                expected: session.current_index(),
                received: answer.question_index,
            });
        }

        let question = session.current_question().ok_or(SessionError::Exhausted)?;
        let option = question
            .option(answer.identity)
            .ok_or(SessionError::UnknownOption {
                question: answer.question_index,
                identity: answer.identity,
            })?;
        if option.contribution() != &answer.contribution {
            return Err(SessionError::ContributionMismatch {
                identity: answer.identity,
            });
        }
        if answer.display_position >= question.options().len() {
            return Err(SessionError::UnknownOption {
                question: answer.question_index,
                identity: answer.identity,
            });
        }

        let feedback = match option.contribution() {
            Contribution::Correct(true) => Feedback::Correct,
            Contribution::Correct(false) => Feedback::Wrong {
                correct_answer: question
                    .correct_option()
                    .map(|o| o.text().to_owned())
                    .unwrap_or_default(),
            },
            // The position is echoed from the pressed button and only picks
            // the letter shown back. Scoring uses the stored option.
            Contribution::Weights(_) => Feedback::Chose {
                label: option_label(answer.display_position),
            },
        };
        let contribution = option.contribution().clone();

        session.score.add(&contribution)?;
        session.current_index += 1;

        Ok(feedback)
    }

    /// True once every question of the session has been answered.
    pub fn is_complete(&self, session: &Session) -> bool {
        session.current_index() >= session.total()
    }

    pub fn finalize(&self, session: &mut Session) -> Result<ResultSummary, SessionError> {
        if !session.is_active() {
            return Err(SessionError::Inactive);
        }
        if !self.is_complete(session) {
            return Err(SessionError::NotComplete);
        }
        session.active = false;

        Ok(ResultSummary {
            score: session.score().clone(),
            total: session.total(),
        })
    }
}

fn validate(bank: &QuestionBank, settings: &QuizSettings) -> Result<(), ConfigError> {
    if bank.is_empty() {
        return Err(ConfigError::EmptyQuestionBank);
    }
    let count = settings.questions_per_session;
    if count == 0 {
        return Err(ConfigError::NoQuestionsRequested);
    }
    if count > bank.len() {
        return Err(ConfigError::NotEnoughQuestions {
            requested: count,
            available: bank.len(),
        });
    }

    for (i, question) in bank.questions().iter().enumerate() {
        let invalid = |reason: String| ConfigError::InvalidQuestion {
            question: i + 1,
            reason,
        };
        let options = question.options();

        if options.len() < 2 {
            return Err(invalid(format!("{} options, at least 2 required", options.len())));
        }
        if options.len() > MAX_OPTIONS {
            return Err(invalid(format!(
                "{} options, at most {MAX_OPTIONS} allowed",
                options.len()
            )));
        }

        match settings.scoring_mode {
            ScoringMode::Binary => {
                if options
                    .iter()
                    .any(|o| !matches!(o.contribution(), Contribution::Correct(_)))
                {
                    return Err(invalid("weighted option in binary mode".into()));
                }
                let correct = options.iter().filter(|o| o.is_correct()).count();
                if correct != 1 {
                    return Err(invalid(format!(
                        "{correct} correct options, exactly 1 required"
                    )));
                }
            }
            ScoringMode::Weighted { dimension } => {
                for option in options {
                    match option.contribution() {
                        Contribution::Weights(weights) if weights.len() == dimension => {}
                        Contribution::Weights(weights) => {
                            return Err(invalid(format!(
                                "option '{}' has {} weights, expected {dimension}",
                                option.text(),
                                weights.len()
                            )))
                        }
                        Contribution::Correct(_) => {
                            return Err(invalid("binary option in weighted mode".into()))
                        }
                    }
                }
            }
        }

        // Any question may land on the last slot and any option on the last
        // display position, so check the widest combination.
        for (identity, option) in options.iter().enumerate() {
            let length = AnswerPayload {
                question_index: count - 1,
                display_position: options.len() - 1,
                contribution: option.contribution().clone(),
                identity,
            }
            .encode()
            .len();
            if length > MAX_CALLBACK_DATA_LEN {
                return Err(ConfigError::PayloadTooLong {
                    question: i + 1,
                    length,
                    limit: MAX_CALLBACK_DATA_LEN,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::bank::{Question, QuizOption};

    pub(crate) fn binary_bank(size: usize) -> QuestionBank {
        (0..size)
            .map(|i| {
                Question::with_correct(
                    format!("Question {i}"),
                    ["Right", "Wrong 1", "Wrong 2", "Wrong 3"],
                    0,
                )
            })
            .collect()
    }

    pub(crate) fn weighted_bank(size: usize) -> QuestionBank {
        (0..size)
            .map(|i| {
                let options = (0..4)
                    .map(|d| {
                        let mut weights = vec![0; 4];
                        weights[d] = 1;
                        QuizOption::new(format!("Trait {d}"), Contribution::Weights(weights))
                    })
                    .collect();
                Question::new(format!("Question {i}"), options)
            })
            .collect()
    }

    pub(crate) fn settings(count: usize, scoring_mode: ScoringMode) -> QuizSettings {
        QuizSettings {
            questions_per_session: count,
            sample_mode: SampleMode::Prefix,
            scoring_mode,
        }
    }

    fn answer_for(presented: &PresentedQuestion, identity: usize) -> AnswerPayload {
        let (position, option) = presented
            .options
            .iter()
            .enumerate()
            .find(|(_, o)| o.identity == identity)
            .unwrap();
        AnswerPayload {
            question_index: presented.index,
            display_position: position,
            contribution: option.contribution.clone(),
            identity,
        }
    }

    #[test]
    fn empty_bank_is_rejected() {
        let err = QuizEngine::new(QuestionBank::default(), settings(1, ScoringMode::Binary))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyQuestionBank));
    }

    #[test]
    fn session_size_is_bounded_by_bank() {
        let err = QuizEngine::new(binary_bank(3), settings(4, ScoringMode::Binary)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotEnoughQuestions { requested: 4, available: 3 }
        ));
        let err = QuizEngine::new(binary_bank(3), settings(0, ScoringMode::Binary)).unwrap_err();
        assert!(matches!(err, ConfigError::NoQuestionsRequested));
    }

    #[test]
    fn questions_need_two_options_and_one_correct() {
        let single = QuestionBank::new(vec![Question::with_correct("Q", ["only"], 0)]);
        assert!(matches!(
            QuizEngine::new(single, settings(1, ScoringMode::Binary)),
            Err(ConfigError::InvalidQuestion { question: 1, .. })
        ));

        let none_correct = QuestionBank::new(vec![Question::with_correct("Q", ["a", "b"], 7)]);
        assert!(matches!(
            QuizEngine::new(none_correct, settings(1, ScoringMode::Binary)),
            Err(ConfigError::InvalidQuestion { question: 1, .. })
        ));
    }

    #[test]
    fn bank_must_match_scoring_mode() {
        let weighted = |dimension| settings(2, ScoringMode::Weighted { dimension });
        assert!(QuizEngine::new(binary_bank(2), weighted(4)).is_err());
        assert!(QuizEngine::new(weighted_bank(2), settings(2, ScoringMode::Binary)).is_err());
        assert!(QuizEngine::new(weighted_bank(2), weighted(3)).is_err());
        assert!(QuizEngine::new(weighted_bank(2), weighted(4)).is_ok());
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        let options = (0..2)
            .map(|i| QuizOption::new(format!("{i}"), Contribution::Weights(vec![1_000_000; 8])))
            .collect();
        let bank = QuestionBank::new(vec![Question::new("Q", options)]);
        let err = QuizEngine::new(bank, settings(1, ScoringMode::Weighted { dimension: 8 }))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PayloadTooLong { question: 1, .. }));
    }

    #[test]
    fn shipped_banks_validate() {
        let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");

        let bank = QuestionBank::from_json_file(data.join("questions.json")).unwrap();
        QuizEngine::new(bank, QuizSettings::default()).unwrap();

        let bank = QuestionBank::from_json_file(data.join("temperament.json")).unwrap();
        QuizEngine::new(bank, settings(4, ScoringMode::Weighted { dimension: 4 })).unwrap();
    }

    #[test]
    fn prefix_mode_takes_bank_order() {
        let engine = QuizEngine::new(binary_bank(5), settings(3, ScoringMode::Binary)).unwrap();
        let session = engine.begin_session(&mut StdRng::seed_from_u64(1));
        let texts: Vec<&str> = session.questions().iter().map(|q| q.text()).collect();
        assert_eq!(texts, ["Question 0", "Question 1", "Question 2"]);
    }

    #[test]
    fn random_mode_samples_without_replacement() {
        let mut settings = settings(10, ScoringMode::Binary);
        settings.sample_mode = SampleMode::Random;
        let engine = QuizEngine::new(binary_bank(10), settings).unwrap();

        let session = engine.begin_session(&mut StdRng::seed_from_u64(7));
        let texts: HashSet<&str> = session.questions().iter().map(|q| q.text()).collect();
        assert_eq!(texts.len(), 10);
    }

    #[test]
    fn fresh_session_is_not_complete() {
        let engine = QuizEngine::new(binary_bank(2), settings(1, ScoringMode::Binary)).unwrap();
        let session = engine.begin_session(&mut StdRng::seed_from_u64(0));
        assert!(session.is_active());
        assert_eq!(session.score(), &Score::Count(0));
        assert!(!engine.is_complete(&session));
    }

    #[test]
    fn single_correct_answer_completes_quiz() {
        let bank = QuestionBank::new(vec![Question::with_correct("Q", ["A", "B", "C", "D"], 0)]);
        let engine = QuizEngine::new(bank, settings(1, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = engine.begin_session(&mut rng);

        let presented = engine.present_question(&session, &mut rng).unwrap();
        assert_eq!(presented.options.len(), 4);

        let feedback = engine
            .score_answer(&mut session, &answer_for(&presented, 0))
            .unwrap();
        assert_eq!(feedback, Feedback::Correct);
        assert_eq!(feedback.to_string(), "✅ Correct!");
        assert_eq!(session.score(), &Score::Count(1));
        assert!(engine.is_complete(&session));

        let summary = engine.finalize(&mut session).unwrap();
        assert_eq!(summary.score.to_string(), "1");
        assert!(!session.is_active());
    }

    #[test]
    fn wrong_answer_names_the_correct_option() {
        let engine = QuizEngine::new(binary_bank(1), settings(1, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = engine.begin_session(&mut rng);
        let presented = engine.present_question(&session, &mut rng).unwrap();

        let feedback = engine
            .score_answer(&mut session, &answer_for(&presented, 2))
            .unwrap();
        assert_eq!(
            feedback.to_string(),
            "❌ Wrong! The correct answer was: Right"
        );
        assert_eq!(session.score(), &Score::Count(0));
    }

    #[test]
    fn all_correct_and_all_wrong_runs() {
        let engine = QuizEngine::new(binary_bank(5), settings(5, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        for (identity, expected) in [(0, 5), (1, 0)] {
            let mut session = engine.begin_session(&mut rng);
            while !engine.is_complete(&session) {
                let presented = engine.present_question(&session, &mut rng).unwrap();
                engine
                    .score_answer(&mut session, &answer_for(&presented, identity))
                    .unwrap();
            }
            let summary = engine.finalize(&mut session).unwrap();
            assert_eq!(summary.score, Score::Count(expected));
            assert_eq!(summary.total, 5);
        }
    }

    #[test]
    fn weighted_scores_sum_selected_vectors() {
        let engine = QuizEngine::new(
            weighted_bank(2),
            settings(2, ScoringMode::Weighted { dimension: 4 }),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = engine.begin_session(&mut rng);

        let presented = engine.present_question(&session, &mut rng).unwrap();
        let answer = answer_for(&presented, 1);
        let feedback = engine.score_answer(&mut session, &answer).unwrap();
        assert_eq!(
            feedback,
            Feedback::Chose {
                label: option_label(answer.display_position)
            }
        );
        assert!(!feedback.is_modal());

        let presented = engine.present_question(&session, &mut rng).unwrap();
        engine
            .score_answer(&mut session, &answer_for(&presented, 0))
            .unwrap();

        assert!(engine.is_complete(&session));
        let summary = engine.finalize(&mut session).unwrap();
        assert_eq!(summary.score, Score::Vector(vec![1, 1, 0, 0]));
    }

    #[test]
    fn stale_answers_are_ignored() {
        let engine = QuizEngine::new(binary_bank(3), settings(3, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let mut session = engine.begin_session(&mut rng);
        let first = engine.present_question(&session, &mut rng).unwrap();
        engine
            .score_answer(&mut session, &answer_for(&first, 0))
            .unwrap();

        let replay = engine.score_answer(&mut session, &answer_for(&first, 0));
        assert_eq!(
            replay,
            Err(SessionError::Stale {
                expected: 1,
                received: 0
            })
        );
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.score(), &Score::Count(1));
    }

    #[test]
    fn tampered_contribution_is_rejected() {
        let engine = QuizEngine::new(binary_bank(1), settings(1, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = engine.begin_session(&mut rng);
        let presented = engine.present_question(&session, &mut rng).unwrap();

        let mut forged = answer_for(&presented, 3);
        forged.contribution = Contribution::Correct(true);
        assert_eq!(
            engine.score_answer(&mut session, &forged),
            Err(SessionError::ContributionMismatch { identity: 3 })
        );

        let mut unknown = answer_for(&presented, 3);
        unknown.identity = 9;
        assert!(matches!(
            engine.score_answer(&mut session, &unknown),
            Err(SessionError::UnknownOption { identity: 9, .. })
        ));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn pressed_position_must_be_on_screen() {
        let engine = QuizEngine::new(
            weighted_bank(1),
            settings(1, ScoringMode::Weighted { dimension: 4 }),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        let mut session = engine.begin_session(&mut rng);
        let presented = engine.present_question(&session, &mut rng).unwrap();

        let mut off_screen = answer_for(&presented, 2);
        off_screen.display_position = presented.options.len();
        assert!(matches!(
            engine.score_answer(&mut session, &off_screen),
            Err(SessionError::UnknownOption { identity: 2, .. })
        ));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), &Score::Vector(vec![0; 4]));

        // A shifted position changes the echoed letter, never the score.
        let mut shifted = answer_for(&presented, 2);
        shifted.display_position = (shifted.display_position + 1) % presented.options.len();
        let feedback = engine.score_answer(&mut session, &shifted).unwrap();
        assert_eq!(
            feedback,
            Feedback::Chose {
                label: option_label(shifted.display_position)
            }
        );
        assert_eq!(session.score(), &Score::Vector(vec![0, 0, 1, 0]));
    }

    #[test]
    fn score_that_cannot_take_the_option_is_not_advanced() {
        let engine = QuizEngine::new(binary_bank(1), settings(1, ScoringMode::Binary)).unwrap();
        let mut session = Session::new(weighted_bank(1).questions().to_vec(), Score::Count(0));
        let presented = engine
            .present_question(&session, &mut StdRng::seed_from_u64(13))
            .unwrap();

        let answer = answer_for(&presented, 0);
        assert!(matches!(
            engine.score_answer(&mut session, &answer),
            Err(SessionError::ScoreMismatch { .. })
        ));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), &Score::Count(0));
    }

    #[test]
    fn inactive_session_rejects_everything() {
        let engine = QuizEngine::new(binary_bank(2), settings(2, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(10);
        let mut session = engine.begin_session(&mut rng);
        let presented = engine.present_question(&session, &mut rng).unwrap();
        session.cancel();

        assert_eq!(
            engine.score_answer(&mut session, &answer_for(&presented, 0)),
            Err(SessionError::Inactive)
        );
        assert_eq!(
            engine.present_question(&session, &mut rng),
            Err(SessionError::Inactive)
        );
        assert_eq!(session.score(), &Score::Count(0));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn finalize_requires_completion_and_runs_once() {
        let engine = QuizEngine::new(binary_bank(1), settings(1, ScoringMode::Binary)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = engine.begin_session(&mut rng);
        assert_eq!(engine.finalize(&mut session), Err(SessionError::NotComplete));

        let presented = engine.present_question(&session, &mut rng).unwrap();
        engine
            .score_answer(&mut session, &answer_for(&presented, 0))
            .unwrap();
        assert!(engine.finalize(&mut session).is_ok());
        assert_eq!(engine.finalize(&mut session), Err(SessionError::Inactive));
    }

    proptest! {
        #[test]
        fn shuffle_is_a_bijection(seed in any::<u64>(), option_count in 2usize..=MAX_OPTIONS) {
            let question = Question::with_correct(
                "Q",
                (0..option_count).map(|i| format!("option {i}")),
                0,
            );
            let engine = QuizEngine::new(
                QuestionBank::new(vec![question]),
                settings(1, ScoringMode::Binary),
            )
            .unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let session = engine.begin_session(&mut rng);
            let presented = engine.present_question(&session, &mut rng).unwrap();

            let mut identities: Vec<usize> = presented.options.iter().map(|o| o.identity).collect();
            identities.sort_unstable();
            prop_assert_eq!(identities, (0..option_count).collect::<Vec<_>>());
            for (position, option) in presented.options.iter().enumerate() {
                prop_assert_eq!(option.label, option_label(position));
                prop_assert_eq!(&option.text, &format!("option {}", option.identity));
            }
        }

        #[test]
        fn index_stays_in_bounds(
            seed in any::<u64>(),
            events in prop::collection::vec((0usize..8, 0usize..5, any::<bool>()), 0..40),
        ) {
            let engine = QuizEngine::new(binary_bank(5), settings(5, ScoringMode::Binary)).unwrap();
            let mut session = engine.begin_session(&mut StdRng::seed_from_u64(seed));

            for (question_index, identity, correct) in events {
                let before = (session.current_index(), session.score().clone());
                let answer = AnswerPayload {
                    question_index,
                    display_position: 0,
                    contribution: Contribution::Correct(correct),
                    identity,
                };
                if engine.score_answer(&mut session, &answer).is_err() {
                    prop_assert_eq!((session.current_index(), session.score().clone()), before);
                }
                prop_assert!(session.current_index() <= session.total());
                if engine.is_complete(&session) && session.is_active() {
                    engine.finalize(&mut session).unwrap();
                }
            }
        }
    }
}
