use serde::{Deserialize, Serialize};

use crate::types::Wind;

/// How many winds a regular match lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchLength {
    /// Tonpuusen: East only.
    East,
    /// Hanchan: East and South.
    #[default]
    Hanchan,
}

/// Match-level configuration consumed by the termination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRule {
    pub length: MatchLength,
    pub starting_score: i64,
    /// Score the top seat needs before the match may end after the final wind.
    pub target_score: i64,
    /// End the match as soon as any seat drops below zero.
    pub tobi_ends_game: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        Self::default_hanchan()
    }
}

impl MatchRule {
    pub fn default_hanchan() -> Self {
        Self {
            length: MatchLength::Hanchan,
            starting_score: 25000,
            target_score: 30000,
            tobi_ends_game: true,
        }
    }

    pub fn default_tonpuusen() -> Self {
        Self {
            length: MatchLength::East,
            ..Self::default_hanchan()
        }
    }

    /// Last wind of the regular match.
    pub fn final_wind(&self) -> Wind {
        match self.length {
            MatchLength::East => Wind::East,
            MatchLength::Hanchan => Wind::South,
        }
    }

    /// First wind that is never played: one extra wind of overtime is
    /// allowed after the final wind, and the match ends on reaching this one.
    pub fn cap_wind(&self) -> Wind {
        self.final_wind().next().next()
    }
}
