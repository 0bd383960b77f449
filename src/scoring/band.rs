use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Readiness category derived from a base score.
///
/// Variants are declared in rank order, so the derived `Ord` matches the
/// band ordering (`EarlyStage < Developing < Strong < Ready`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    EarlyStage,
    Developing,
    Strong,
    Ready,
}

impl ScoreBand {
    pub const ALL: [ScoreBand; 4] = [
        ScoreBand::EarlyStage,
        ScoreBand::Developing,
        ScoreBand::Strong,
        ScoreBand::Ready,
    ];

    /// Band for a 0-100 base score. Thresholds are inclusive upper bounds:
    /// 0-40, 41-70, 71-90, 91-100.
    pub fn from_base_score(base_score: u8) -> Self {
        match base_score {
            0..=40 => ScoreBand::EarlyStage,
            41..=70 => ScoreBand::Developing,
            71..=90 => ScoreBand::Strong,
            _ => ScoreBand::Ready,
        }
    }

    /// Stable identifier, as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::EarlyStage => "early-stage",
            ScoreBand::Developing => "developing",
            ScoreBand::Strong => "strong",
            ScoreBand::Ready => "ready",
        }
    }

    /// Display label, e.g. "Early-Stage"
    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::EarlyStage => "Early-Stage",
            ScoreBand::Developing => "Developing",
            ScoreBand::Strong => "Strong",
            ScoreBand::Ready => "Ready",
        }
    }

    /// One-sentence encouragement shown with the result
    pub fn description(&self) -> &'static str {
        match self {
            ScoreBand::EarlyStage => "You're just getting started. Focus on clarifying your problem and talking to potential customers.",
            ScoreBand::Developing => "You're making progress! Continue validating your idea and building your prototype.",
            ScoreBand::Strong => "You're on a solid path. Keep executing and building traction.",
            ScoreBand::Ready => "You're ready to take the next big step. Time to accelerate!",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown score band '{0}' (expected early-stage, developing, strong or ready)")]
pub struct ParseBandError(String);

impl FromStr for ScoreBand {
    type Err = ParseBandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ScoreBand::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(needle) || b.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseBandError(s.to_string()))
    }
}
