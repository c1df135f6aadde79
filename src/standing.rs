use crate::progress::percent_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StandingStatus {
    #[serde(rename = "ahead")]
    Ahead,
    #[serde(rename = "behind")]
    Behind,
    #[serde(rename = "on-track")]
    OnTrack,
}

impl StandingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandingStatus::Ahead => "ahead",
            StandingStatus::Behind => "behind",
            StandingStatus::OnTrack => "on-track",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Standing {
    pub delta: f64,
    pub status: StandingStatus,
    /// `delta` relative to `expected`; 0 when nothing is expected yet.
    pub percent: f64,
}

pub fn standing(actual: f64, expected: f64) -> Standing {
    let delta = actual - expected;
    let status = if delta > 0.0 {
        StandingStatus::Ahead
    } else if delta < 0.0 {
        StandingStatus::Behind
    } else {
        StandingStatus::OnTrack
    };
    let percent = if expected > 0.0 {
        percent_of(delta, expected)
    } else {
        0.0
    };

    Standing {
        delta,
        status,
        percent,
    }
}
