use std::{net::SocketAddr, path::PathBuf};

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_QUESTIONS_PER_SESSION: usize = 20;
pub const DEFAULT_QUESTION_BANK: &str = "data/questions.json";

/// How a session picks its questions from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Uniform sample without replacement, in random order.
    #[default]
    Random,
    /// The first N questions of the bank, in bank order.
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Count of correctly answered questions.
    #[default]
    Binary,
    /// Element-wise sum of per-option vectors of the given length.
    Weighted { dimension: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub questions_per_session: usize,
    pub sample_mode: SampleMode,
    pub scoring_mode: ScoringMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    File(PathBuf),
    Database(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub bank_source: BankSource,
    pub settings: QuizSettings,
    pub log_level: String,
    pub webhook: Option<WebhookConfig>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            sample_mode: SampleMode::default(),
            scoring_mode: ScoringMode::default(),
        }
    }
}

impl std::str::FromStr for SampleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SampleMode::Random),
            "prefix" => Ok(SampleMode::Prefix),
            _ => Err("expected 'random' or 'prefix'".into()),
        }
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "binary" {
            return Ok(ScoringMode::Binary);
        }
        match s.strip_prefix("weighted:").map(str::parse::<usize>) {
            Some(Ok(dimension)) if dimension > 0 => Ok(ScoringMode::Weighted { dimension }),
            _ => Err("expected 'binary' or 'weighted:<dimension>'".into()),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment, loading `.env`
    /// first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let bank_source = match lookup("DATABASE_URL") {
            Some(url) => BankSource::Database(url),
            None => BankSource::File(
                lookup("QUESTION_BANK")
                    .unwrap_or_else(|| DEFAULT_QUESTION_BANK.into())
                    .into(),
            ),
        };

        let settings = QuizSettings {
            questions_per_session: parse_or(
                &lookup,
                "QUESTIONS_PER_SESSION",
                DEFAULT_QUESTIONS_PER_SESSION,
            )?,
            sample_mode: parse_or(&lookup, "SAMPLE_MODE", SampleMode::default())?,
            scoring_mode: parse_or(&lookup, "SCORING_MODE", ScoringMode::default())?,
        };

        let webhook = match (lookup("NGROK_URL"), lookup("NGROK_ADDR")) {
            (Some(url), Some(addr)) => Some(WebhookConfig {
                url: parse("NGROK_URL", &url)?,
                addr: parse("NGROK_ADDR", &addr)?,
            }),
            _ => None,
        };

        Ok(Self {
            token,
            bank_source,
            settings,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            webhook,
        })
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: ToString,
{
    match lookup(key) {
        Some(value) => parse(key, &value),
        None => Ok(default),
    }
}
