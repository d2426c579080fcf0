use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Level, Phase};
use crate::CoreError;

/// Filter value meaning "no filtering".
pub const ALL: &str = "all";

/// Phase filter: either everything, or a single phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhaseFilter {
    #[default]
    All,
    Only(Phase),
}

impl PhaseFilter {
    pub fn parse(s: &str) -> Self {
        if s == ALL {
            Self::All
        } else {
            Self::Only(Phase::parse(s))
        }
    }

    /// Whether a feature tagged `phase` passes this filter. An unset phase
    /// passes only the `All` filter.
    pub fn admits(&self, phase: Option<&Phase>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => phase == Some(wanted),
        }
    }
}

impl From<String> for PhaseFilter {
    fn from(s: String) -> Self {
        if s == ALL {
            Self::All
        } else {
            Self::Only(Phase::from(s))
        }
    }
}

impl From<PhaseFilter> for String {
    fn from(filter: PhaseFilter) -> Self {
        match filter {
            PhaseFilter::All => ALL.to_string(),
            PhaseFilter::Only(phase) => phase.into(),
        }
    }
}

impl fmt::Display for PhaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(phase) => f.write_str(phase.as_str()),
        }
    }
}

/// Level filter: either everything, or one floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LevelFilter {
    #[default]
    All,
    Only(i64),
}

impl LevelFilter {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        if trimmed == ALL {
            return Ok(Self::All);
        }
        trimmed
            .parse::<i64>()
            .map(Self::Only)
            .map_err(|_| CoreError::InvalidLevelFilter(s.to_string()))
    }

    /// Whether a feature on `level` passes this filter. An absent level
    /// counts as the ground floor; a level that is not a floor never matches.
    pub fn admits(&self, level: Option<&Level>) -> bool {
        match (self, level) {
            (Self::All, _) => true,
            (Self::Only(wanted), None) => *wanted == 0,
            (Self::Only(wanted), Some(level)) => level.floor() == Some(*wanted),
        }
    }
}

impl TryFrom<String> for LevelFilter {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<LevelFilter> for String {
    fn from(filter: LevelFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(level) => write!(f, "{}", level),
        }
    }
}

/// The filters currently applied to styling. Both default to `all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub phase: PhaseFilter,
    #[serde(default)]
    pub level: LevelFilter,
}

impl FilterState {
    pub fn is_unfiltered(&self) -> bool {
        self.phase == PhaseFilter::All && self.level == LevelFilter::All
    }
}

/// One entry of the level selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelOption {
    pub value: LevelFilter,
    pub label: &'static str,
}

/// Levels offered to the user, with their floor labels.
pub const LEVEL_OPTIONS: [LevelOption; 5] = [
    LevelOption {
        value: LevelFilter::All,
        label: "Tous",
    },
    LevelOption {
        value: LevelFilter::Only(-1),
        label: "R-1",
    },
    LevelOption {
        value: LevelFilter::Only(0),
        label: "RDC",
    },
    LevelOption {
        value: LevelFilter::Only(1),
        label: "R+1",
    },
    LevelOption {
        value: LevelFilter::Only(2),
        label: "R+2",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_state_defaults_to_all() {
        let state = FilterState::default();
        assert!(state.is_unfiltered());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"phase": "all", "level": "all"}));
    }

    #[test]
    fn filter_state_parses_from_strings() {
        let state: FilterState =
            serde_json::from_value(json!({"phase": "phase 2", "level": "-1"})).unwrap();
        assert_eq!(state.phase, PhaseFilter::Only(Phase::Two));
        assert_eq!(state.level, LevelFilter::Only(-1));
    }

    #[test]
    fn level_filter_rejects_non_integers() {
        assert!(LevelFilter::parse("R+1").is_err());
        assert!(serde_json::from_value::<FilterState>(json!({"level": "abc"})).is_err());
    }

    #[test]
    fn absent_level_matches_ground_floor_only() {
        assert!(LevelFilter::Only(0).admits(None));
        assert!(!LevelFilter::Only(1).admits(None));
        assert!(LevelFilter::All.admits(None));
    }

    #[test]
    fn raw_level_matches_only_all() {
        let raw = Level::Raw(json!(""));
        assert!(!LevelFilter::Only(0).admits(Some(&raw)));
        assert!(LevelFilter::All.admits(Some(&raw)));
        assert!(LevelFilter::Only(-1).admits(Some(&Level::Floor(-1))));
    }

    #[test]
    fn unset_phase_fails_every_phase_filter() {
        for phase in Phase::CYCLE {
            assert!(!PhaseFilter::Only(phase).admits(None));
        }
        assert!(PhaseFilter::All.admits(None));
    }
}
