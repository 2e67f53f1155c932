use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// GestureSymbol
// ---------------------------------------------------------------------------

/// One observation from the gesture source: a finger count, or no hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureSymbol {
    None,
    Fingers(u8),
}

impl GestureSymbol {
    /// Build a finger-count symbol, rejecting counts above `max`.
    pub fn from_count(count: u32, max: u8) -> crate::Result<Self> {
        if count > u32::from(max) {
            return Err(crate::DoorlockError::SymbolOutOfRange { symbol: count, max });
        }
        // count <= max <= u8::MAX
        Ok(GestureSymbol::Fingers(count as u8))
    }

    pub fn is_none(self) -> bool {
        matches!(self, GestureSymbol::None)
    }

    pub fn count(self) -> Option<u8> {
        match self {
            GestureSymbol::None => None,
            GestureSymbol::Fingers(n) => Some(n),
        }
    }
}

impl From<Option<u8>> for GestureSymbol {
    fn from(value: Option<u8>) -> Self {
        value.map_or(GestureSymbol::None, GestureSymbol::Fingers)
    }
}

impl fmt::Display for GestureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureSymbol::None => f.write_str("none"),
            GestureSymbol::Fingers(n) => write!(f, "{n}"),
        }
    }
}

impl std::str::FromStr for GestureSymbol {
    type Err = crate::error::DoorlockError;

    /// Accepts a bare finger count, or `none` / `-` / `x` for no hand.
    /// Range checks against `max_fingers` happen where the limit is known.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "none" | "-" | "x" => Ok(GestureSymbol::None),
            other => other
                .parse::<u8>()
                .map(GestureSymbol::Fingers)
                .map_err(|_| crate::error::DoorlockError::InvalidSymbol(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActuatorPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorPhase {
    Disabled,
    Advancing,
    Holding,
    Rewinding,
}

impl ActuatorPhase {
    pub fn all() -> &'static [ActuatorPhase] {
        &[
            ActuatorPhase::Disabled,
            ActuatorPhase::Advancing,
            ActuatorPhase::Holding,
            ActuatorPhase::Rewinding,
        ]
    }

    /// True while the stepper is being driven toward a target.
    pub fn is_moving(self) -> bool {
        matches!(self, ActuatorPhase::Advancing | ActuatorPhase::Rewinding)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActuatorPhase::Disabled => "disabled",
            ActuatorPhase::Advancing => "advancing",
            ActuatorPhase::Holding => "holding",
            ActuatorPhase::Rewinding => "rewinding",
        }
    }
}

impl fmt::Display for ActuatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActuatorPhase {
    type Err = crate::error::DoorlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(ActuatorPhase::Disabled),
            "advancing" => Ok(ActuatorPhase::Advancing),
            "holding" => Ok(ActuatorPhase::Holding),
            "rewinding" => Ok(ActuatorPhase::Rewinding),
            _ => Err(crate::error::DoorlockError::InvalidPhase(s.to_string())),
        }
    }
}
