//! Runtime configuration read from the environment.

use std::str::FromStr;

use lessondeck_core::{NewCardOrder, Sm2};

use crate::error::{ApiError, Result};

/// Limits and ordering used when building study batches.
#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub default_new_limit: usize,
    pub default_due_limit: usize,
    pub max_batch_size: usize,
    pub new_card_order: NewCardOrder,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            default_new_limit: 20,
            default_due_limit: 100,
            max_batch_size: 200,
            new_card_order: NewCardOrder::Created,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub study: StudyConfig,
    pub sm2: Sm2,
}

impl Config {
    /// Load configuration from process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::Config("DATABASE_URL must be set".to_string()))?;

        let study_defaults = StudyConfig::default();
        let sm2_defaults = Sm2::default();

        let study = StudyConfig {
            default_new_limit: parse_or(
                &lookup,
                "STUDY_DEFAULT_NEW_LIMIT",
                study_defaults.default_new_limit,
            )?,
            default_due_limit: parse_or(
                &lookup,
                "STUDY_DEFAULT_DUE_LIMIT",
                study_defaults.default_due_limit,
            )?,
            max_batch_size: parse_or(
                &lookup,
                "STUDY_MAX_BATCH_SIZE",
                study_defaults.max_batch_size,
            )?,
            new_card_order: match lookup("STUDY_NEW_CARD_ORDER") {
                Some(raw) => raw
                    .parse::<NewCardOrder>()
                    .map_err(|e| ApiError::Config(format!("STUDY_NEW_CARD_ORDER: {e}")))?,
                None => study_defaults.new_card_order,
            },
        };

        let sm2 = Sm2 {
            initial_ease: parse_or(&lookup, "SM2_INITIAL_EASE", sm2_defaults.initial_ease)?,
            minimum_ease: parse_or(&lookup, "SM2_MINIMUM_EASE", sm2_defaults.minimum_ease)?,
            first_interval: parse_or(&lookup, "SM2_FIRST_INTERVAL", sm2_defaults.first_interval)?,
            second_interval: parse_or(
                &lookup,
                "SM2_SECOND_INTERVAL",
                sm2_defaults.second_interval,
            )?,
            maximum_interval: parse_or(
                &lookup,
                "SM2_MAXIMUM_INTERVAL",
                sm2_defaults.maximum_interval,
            )?,
        };

        if sm2.minimum_ease <= 0.0 || sm2.initial_ease < sm2.minimum_ease {
            return Err(ApiError::Config(
                "SM2_INITIAL_EASE must be at least SM2_MINIMUM_EASE, which must be positive"
                    .to_string(),
            ));
        }
        if sm2.first_interval < 1 || sm2.second_interval < sm2.first_interval {
            return Err(ApiError::Config(
                "SM2 seed intervals must be positive and non-decreasing".to_string(),
            ));
        }
        if sm2.maximum_interval < sm2.second_interval {
            return Err(ApiError::Config(
                "SM2_MAXIMUM_INTERVAL must be at least SM2_SECOND_INTERVAL".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            study,
            sm2,
        })
    }

    /// Address to bind the HTTP listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ApiError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}
