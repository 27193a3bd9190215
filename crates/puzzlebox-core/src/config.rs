//! Configuration loading and validation for the Puzzlebox controller.
//!
//! The configuration lives in `puzzle-config.yaml`. [`PuzzleFile`] mirrors
//! the YAML structure; [`PuzzleFile::validate`] turns its `puzzle` section
//! into the immutable [`PuzzleConfig`] the state machine is built from.
//! A configuration that fails validation never produces a machine.

use std::path::Path;
use std::time::Duration;

use puzzlebox_types::{Answer, StepSpec};
use serde::Deserialize;

/// Lowest accepted driver poll interval in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Environment variable overriding `driver.simulation`.
pub const SIMULATION_MODE_ENV: &str = "SIMULATION_MODE";

/// Environment variable overriding `control.port`.
pub const CONTROL_PORT_ENV: &str = "PUZZLE_CONTROL_PORT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content, including missing required fields
    /// and unknown step types.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible puzzle.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration file.
///
/// Only the `puzzle` section is required; the others fall back to
/// defaults suitable for a bench setup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PuzzleFile {
    /// The step sequence and overall deadline.
    pub puzzle: PuzzleSection,

    /// Driver loop settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Control surface (HTTP) settings.
    #[serde(default)]
    pub control: ControlConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PuzzleFile {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SIMULATION_MODE` overrides `driver.simulation`
    /// - `PUZZLE_CONTROL_PORT` overrides `control.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not a valid puzzle file, or
    /// [`ConfigError::Invalid`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not a valid puzzle file.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings with process environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PUZZLE_CONTROL_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// `SIMULATION_MODE` enables simulation only when it equals `true`
    /// (case-insensitive); any other value disables it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PUZZLE_CONTROL_PORT` is not a port.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(SIMULATION_MODE_ENV) {
            self.driver.simulation = val.trim().eq_ignore_ascii_case("true");
        }
        if let Some(val) = lookup(CONTROL_PORT_ENV) {
            self.control.port = val.trim().parse().map_err(|_err| ConfigError::Invalid {
                reason: format!("{CONTROL_PORT_ENV} is not a valid port: {val:?}"),
            })?;
        }
        Ok(())
    }

    /// Validate the file and build the immutable puzzle configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the sequence is empty, a
    /// duration is not a positive finite number of seconds, or the poll
    /// interval is below [`MIN_POLL_INTERVAL_MS`].
    pub fn validate(&self) -> Result<PuzzleConfig, ConfigError> {
        if self.driver.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "driver.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
                    self.driver.poll_interval_ms
                ),
            });
        }

        let overall_timeout = seconds_to_duration("puzzle.timeout", self.puzzle.timeout)?;
        let sequence = self
            .puzzle
            .sequence
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.to_spec(index))
            .collect::<Result<Vec<_>, _>>()?;

        PuzzleConfig::new(sequence, overall_timeout)
    }
}

/// The `puzzle` section: ordered steps plus the overall deadline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PuzzleSection {
    /// Seconds allowed from puzzle start to completion.
    pub timeout: f64,

    /// Ordered step list.
    pub sequence: Vec<StepEntry>,
}

/// One step as written in YAML, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEntry {
    /// A discrete input/action step.
    Input {
        /// Input device identifier.
        input: String,
        /// Expected action on the device.
        action: String,
        /// Seconds allowed for this step.
        max_delay: f64,
    },
    /// A question answered through the control surface.
    Math {
        /// Question displayed to the players.
        question: String,
        /// Expected answer.
        answer: Answer,
        /// Seconds allowed for this step.
        max_delay: f64,
    },
}

impl StepEntry {
    /// Convert to a validated [`StepSpec`]. `index` is used in messages.
    fn to_spec(&self, index: usize) -> Result<StepSpec, ConfigError> {
        let field = format!("puzzle.sequence[{index}].max_delay");
        match self {
            Self::Input {
                input,
                action,
                max_delay,
            } => {
                if input.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        reason: format!("puzzle.sequence[{index}].input must not be empty"),
                    });
                }
                Ok(StepSpec::Input {
                    input: input.clone(),
                    action: action.clone(),
                    max_delay: seconds_to_duration(&field, *max_delay)?,
                })
            }
            Self::Math {
                question,
                answer,
                max_delay,
            } => Ok(StepSpec::Math {
                question: question.clone(),
                expected: *answer,
                max_delay: seconds_to_duration(&field, *max_delay)?,
            }),
        }
    }
}

/// Convert a positive, finite number of seconds into a non-zero duration.
fn seconds_to_duration(field: &str, seconds: f64) -> Result<Duration, ConfigError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ConfigError::Invalid {
            reason: format!("{field} must be a positive number of seconds, got {seconds}"),
        });
    }
    let duration = Duration::try_from_secs_f64(seconds).map_err(|e| ConfigError::Invalid {
        reason: format!("{field} is out of range: {e}"),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::Invalid {
            reason: format!("{field} rounds to zero: {seconds}"),
        });
    }
    Ok(duration)
}

/// Validated, immutable puzzle definition.
///
/// Guarantees at least one step, every `max_delay > 0`, and
/// `overall_timeout > 0`. The overall timeout is enforced independently
/// of the step deadlines and need not exceed their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleConfig {
    sequence: Vec<StepSpec>,
    overall_timeout: Duration,
}

impl PuzzleConfig {
    /// Build a configuration from already-typed steps.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `sequence` is empty or any
    /// duration is zero.
    pub fn new(sequence: Vec<StepSpec>, overall_timeout: Duration) -> Result<Self, ConfigError> {
        if sequence.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "puzzle.sequence must contain at least one step".to_owned(),
            });
        }
        if overall_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "puzzle.timeout must be positive".to_owned(),
            });
        }
        if let Some(index) = sequence.iter().position(|s| s.max_delay().is_zero()) {
            return Err(ConfigError::Invalid {
                reason: format!("puzzle.sequence[{index}].max_delay must be positive"),
            });
        }
        Ok(Self {
            sequence,
            overall_timeout,
        })
    }

    /// The ordered step list.
    pub fn sequence(&self) -> &[StepSpec] {
        &self.sequence
    }

    /// The step at `index`, if any.
    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.sequence.get(index)
    }

    /// Number of steps. Always at least one.
    pub fn step_count(&self) -> usize {
        self.sequence.len()
    }

    /// Maximum time from puzzle start to completion.
    pub const fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }
}

/// Driver loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Milliseconds between state machine updates.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Whether inputs may be triggered from the control surface.
    #[serde(default = "default_true")]
    pub simulation: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            simulation: true,
        }
    }
}

/// Control surface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_control_host")]
    pub host: String,

    /// TCP port for the HTTP server.
    #[serde(default = "default_control_port")]
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: default_control_host(),
            port: default_control_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

const fn default_poll_interval_ms() -> u64 {
    100
}

fn default_control_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_control_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
