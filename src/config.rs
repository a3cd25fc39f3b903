//! Run configuration: assignment policy, encoding strategy, objective weighting
//! and solver limits.
use crate::error::ConfigurationError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many preference sets a student may be granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// Zero or one set; unassigned students are allowed.
    #[default]
    AtMostOne,
    /// Every student must be granted exactly one set.
    ExactlyOne,
}

/// How conditional preference constraints are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Indicator constraints if the solver supports them, big-M otherwise.
    #[default]
    Auto,
    BigM,
    Indicator,
}

impl EncodingStrategy {
    /// Picks the concrete strategy for a solver. Returns `BigM` or `Indicator`.
    pub fn resolve(self, native_indicators: bool) -> EncodingStrategy {
        match self {
            EncodingStrategy::Auto if native_indicators => EncodingStrategy::Indicator,
            EncodingStrategy::Auto => EncodingStrategy::BigM,
            EncodingStrategy::Indicator if !native_indicators => {
                tracing::warn!("solver has no native indicator constraints, falling back to big-M");
                EncodingStrategy::BigM
            }
            other => other,
        }
    }
}

/// Objective weight per preference rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RankWeighting {
    /// Weight 1 for ranks below `n`, 0 for the rest.
    TopN { n: usize },
    /// Weight `K - k` for rank `k` of a student with `K` sets.
    Ranked,
}

impl Default for RankWeighting {
    fn default() -> Self {
        RankWeighting::TopN { n: 1 }
    }
}

impl RankWeighting {
    pub fn weight(&self, rank: usize, num_sets: usize) -> i64 {
        match *self {
            RankWeighting::TopN { n } => (rank < n) as i64,
            RankWeighting::Ranked => num_sets.saturating_sub(rank) as i64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub time_limit_secs: Option<f64>,
    pub workers: Option<i32>,
    pub random_seed: Option<i32>,
    pub log_search_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub assignment: AssignmentPolicy,
    pub encoding: EncodingStrategy,
    pub weighting: RankWeighting,
    pub solver: SolverSettings,
    /// Re-check every invariant on the decoded schedule.
    pub verify: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            assignment: AssignmentPolicy::default(),
            encoding: EncodingStrategy::default(),
            weighting: RankWeighting::default(),
            solver: SolverSettings::default(),
            verify: true,
        }
    }
}

impl SchedulerConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SchedulerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let RankWeighting::TopN { n: 0 } = self.weighting {
            return Err(ConfigurationError::ZeroTopN);
        }
        Ok(())
    }
}
