use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{Contribution, Question, QuestionBank, QuizOption};
use crate::error::BankError;

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> Result<Self, BankError> {
        let pool = PgPool::connect(connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn prepare_schema(&self) -> Result<(), BankError> {
        log::debug!("Running question bank migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[allow(async_fn_in_trait)]
pub trait RetrieveQuestions {
    async fn retrieve_question_bank(&self) -> Result<QuestionBank, BankError>;
}

#[derive(sqlx::FromRow)]
struct QuestionRecord {
    uuid: Uuid,
    text: String,
}

#[derive(sqlx::FromRow)]
struct OptionRecord {
    text: String,
    is_correct: Option<bool>,
    weights: Option<Vec<i32>>,
}

impl OptionRecord {
    /// A row carries either `weights` or `is_correct`; a missing flag means wrong.
    fn into_option(self, question: &str) -> Result<QuizOption, BankError> {
        let contribution = match (self.weights, self.is_correct) {
            (Some(weights), None) => Contribution::Weights(weights),
            (None, is_correct) => Contribution::Correct(is_correct.unwrap_or(false)),
            (Some(_), Some(_)) => {
                return Err(BankError::MixedOptions {
                    question: question.to_owned(),
                })
            }
        };
        Ok(QuizOption::new(self.text, contribution))
    }
}

impl RetrieveQuestions for Connection {
    async fn retrieve_question_bank(&self) -> Result<QuestionBank, BankError> {
        let mut tx = self.pool.begin().await?;

        let question_records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT uuid, text FROM questions ORDER BY position",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(question_records.len());
        for question_record in question_records {
            log::debug!(
                "Loading options for question {} with uuid {}",
                question_record.text,
                question_record.uuid
            );
            let option_records = sqlx::query_as::<_, OptionRecord>(
                "SELECT text, is_correct, weights FROM options \
                 WHERE question_id = $1 ORDER BY position",
            )
            .bind(question_record.uuid)
            .fetch_all(&mut *tx)
            .await?;

            let options = option_records
                .into_iter()
                .map(|option| option.into_option(&question_record.text))
                .collect::<Result<Vec<_>, _>>()?;

            questions.push(Question::new(question_record.text, options));
        }

        tx.commit().await?;

        log::info!("Loaded {} questions from the database", questions.len());
        Ok(QuestionBank::new(questions))
    }
}
