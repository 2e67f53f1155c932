use crate::error::{DoorlockError, Result};
use crate::matcher::TargetSequence;
use crate::stabilizer::{GestureStabilizer, DEFAULT_BUFFER_SIZE, DEFAULT_VOTE_WINDOW};
use crate::stepper::MotionProfile;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "doorlock.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SequenceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default)]
    pub target: TargetSequence,
    #[serde(default = "default_max_fingers")]
    pub max_fingers: u8,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: Option<u64>,
}

fn default_max_fingers() -> u8 {
    5
}

fn default_idle_timeout_ms() -> Option<u64> {
    Some(5000)
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            target: TargetSequence::default(),
            max_fingers: default_max_fingers(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl SequenceConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// StabilizerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_vote_window")]
    pub vote_window: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_vote_window() -> usize {
    DEFAULT_VOTE_WINDOW
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            vote_window: default_vote_window(),
        }
    }
}

impl StabilizerConfig {
    pub fn build(&self, max_fingers: u8) -> GestureStabilizer {
        GestureStabilizer::new(self.buffer_size, self.vote_window, max_fingers)
    }
}

// ---------------------------------------------------------------------------
// ActuatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    #[serde(flatten)]
    pub motion: MotionProfile,
}

fn default_steps() -> u32 {
    50
}

fn default_hold_ms() -> u64 {
    5000
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            hold_ms: default_hold_ms(),
            motion: MotionProfile::default(),
        }
    }
}

impl ActuatorConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

// ---------------------------------------------------------------------------
// LinkConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// The device resets when the port opens; wait this long before writing.
    #[serde(default = "default_open_settle_ms")]
    pub open_settle_ms: u64,
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

fn default_port() -> String {
    "/dev/ttyACM0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    10
}

fn default_open_settle_ms() -> u64 {
    2000
}

fn default_reconnect_attempts() -> u32 {
    3
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            open_settle_ms: default_open_settle_ms(),
            reconnect_attempts: default_reconnect_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Ignore further matches for this long after an unlock.
    #[serde(default = "default_unlock_cooldown_ms")]
    pub unlock_cooldown_ms: u64,
    /// Send `off` this long after `on`. Unset leaves relocking to the operator.
    #[serde(default)]
    pub relock_after_ms: Option<u64>,
}

fn default_unlock_cooldown_ms() -> u64 {
    3000
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            unlock_cooldown_ms: default_unlock_cooldown_ms(),
            relock_after_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub host: HostConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            sequence: SequenceConfig::default(),
            stabilizer: StabilizerConfig::default(),
            actuator: ActuatorConfig::default(),
            link: LinkConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DoorlockError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write via a temp file in the same directory so a reader never sees
    /// a half-written config.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        let target = self.sequence.target.as_slice();
        for (i, symbol) in target.iter().enumerate() {
            if *symbol > self.sequence.max_fingers {
                error(format!(
                    "sequence.target[{i}] = {symbol} exceeds max_fingers {}",
                    self.sequence.max_fingers
                ));
            }
        }
        if self.actuator.steps == 0 {
            error("actuator.steps must be greater than zero".to_string());
        }
        if !(self.actuator.motion.max_speed > 0.0) {
            error("actuator.max_speed must be positive".to_string());
        }
        if !(self.actuator.motion.acceleration > 0.0) {
            error("actuator.acceleration must be positive".to_string());
        }
        if self.stabilizer.buffer_size == 0 {
            error("stabilizer.buffer_size must be greater than zero".to_string());
        }
        if self.stabilizer.vote_window == 0
            || self.stabilizer.vote_window > self.stabilizer.buffer_size
        {
            error(format!(
                "stabilizer.vote_window {} must be between 1 and buffer_size {}",
                self.stabilizer.vote_window, self.stabilizer.buffer_size
            ));
        }
        if self.link.baud_rate == 0 {
            error("link.baud_rate must be greater than zero".to_string());
        }

        // Repeats are debounced into one entry, so the sequence can never
        // be completed.
        for (i, pair) in target.windows(2).enumerate() {
            if pair[0] == pair[1] {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "sequence.target[{}] repeats {}; consecutive repeats cannot be entered",
                        i + 1,
                        pair[1]
                    ),
                });
            }
        }
        if target.len() < 3 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("sequence.target has only {} symbol(s)", target.len()),
            });
        }
        if self.sequence.idle_timeout_ms.is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "sequence.idle_timeout_ms unset: partial entries never expire"
                    .to_string(),
            });
        }
        if self.actuator.hold_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "actuator.hold_ms is 0: driver disables as soon as motion ends"
                    .to_string(),
            });
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
