use crate::time::Status;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Score weight for {status:?} must lie within [0, 1], got {value}")]
    WeightOutOfRange { status: Status, value: f64 },
    #[error("Availability thresholds must satisfy 1 >= full >= mostly >= partial >= 0, got {full}, {mostly}, {partial}")]
    UnorderedThresholds { full: f64, mostly: f64, partial: f64 },
    #[error("Score weights must satisfy preferred >= available >= unspecified >= busy, got {preferred}, {available}, {unspecified}, {busy}")]
    UnorderedWeights {
        preferred: f64,
        available: f64,
        unspecified: f64,
        busy: f64,
    },
}

/// What one member contributes to a slot's score, by their dominant status.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScoreWeights {
    pub busy: f64,
    pub unspecified: f64,
    pub available: f64,
    pub preferred: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            busy: 0.0,
            unspecified: 0.5,
            available: 0.8,
            preferred: 1.0,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, status: Status) -> f64 {
        match status {
            Status::Busy => self.busy,
            Status::Unspecified => self.unspecified,
            Status::Available => self.available,
            Status::Preferred => self.preferred,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for status in [
            Status::Busy,
            Status::Unspecified,
            Status::Available,
            Status::Preferred,
        ] {
            let value = self.weight(status);
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { status, value });
            }
        }

        let ordered = self.preferred >= self.available
            && self.available >= self.unspecified
            && self.unspecified >= self.busy;

        if ordered {
            Ok(())
        } else {
            Err(ConfigError::UnorderedWeights {
                preferred: self.preferred,
                available: self.available,
                unspecified: self.unspecified,
                busy: self.busy,
            })
        }
    }
}

/// Lower bounds of the score buckets used for the availability text.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextThresholds {
    pub full: f64,
    pub mostly: f64,
    pub partial: f64,
}

impl Default for TextThresholds {
    fn default() -> Self {
        TextThresholds {
            full: 0.9,
            mostly: 0.6,
            partial: 0.3,
        }
    }
}

impl TextThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 1.0 >= self.full
            && self.full >= self.mostly
            && self.mostly >= self.partial
            && self.partial >= 0.0;

        if ordered {
            Ok(())
        } else {
            Err(ConfigError::UnorderedThresholds {
                full: self.full,
                mostly: self.mostly,
                partial: self.partial,
            })
        }
    }
}

/// Tunable policy of the recommendation engine.
///
/// # Examples
/// ```
/// use schedly_libs::config::EngineConfig;
///
/// let config = EngineConfig {
///     granularity_minutes: 30,
///     top_k: Some(5),
///     ..EngineConfig::default()
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub weights: ScoreWeights,
    pub thresholds: TextThresholds,
    #[cfg_attr(feature = "serde", serde(rename = "granularityMinutes"))]
    pub granularity_minutes: u16,
    /// How many recommendations to keep. `None` keeps every scored slot.
    #[cfg_attr(feature = "serde", serde(rename = "topK"))]
    pub top_k: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            weights: ScoreWeights::default(),
            thresholds: TextThresholds::default(),
            granularity_minutes: 15,
            top_k: Some(10),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_weights_outside_unit_range() {
        let config = EngineConfig {
            weights: ScoreWeights {
                preferred: 1.5,
                ..ScoreWeights::default()
            },
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::WeightOutOfRange {
                status: Status::Preferred,
                value: 1.5
            })
        );
    }

    #[test]
    fn rejects_nan_weights() {
        let config = EngineConfig {
            weights: ScoreWeights {
                busy: f64::NAN,
                ..ScoreWeights::default()
            },
            ..EngineConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let config = EngineConfig {
            thresholds: TextThresholds {
                full: 0.5,
                mostly: 0.6,
                partial: 0.3,
            },
            ..EngineConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnorderedThresholds { .. })
        ));
    }

    #[test]
    fn rejects_weights_ranking_busy_above_free() {
        let config = EngineConfig {
            weights: ScoreWeights {
                busy: 0.6,
                ..ScoreWeights::default()
            },
            ..EngineConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::UnorderedWeights {
                preferred: 1.0,
                available: 0.8,
                unspecified: 0.5,
                busy: 0.6,
            })
        );
    }

    #[test]
    fn equal_weights_are_allowed() {
        let config = EngineConfig {
            weights: ScoreWeights {
                busy: 0.5,
                unspecified: 0.5,
                available: 0.5,
                preferred: 0.5,
            },
            ..EngineConfig::default()
        };

        assert_eq!(config.validate(), Ok(()));
    }
}
