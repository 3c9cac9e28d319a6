use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One of the 16 compass points, ordered clockwise starting at north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardinalDirection {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

pub const COMPASS_POINTS: [CardinalDirection; 16] = [
    CardinalDirection::N,
    CardinalDirection::NNE,
    CardinalDirection::NE,
    CardinalDirection::ENE,
    CardinalDirection::E,
    CardinalDirection::ESE,
    CardinalDirection::SE,
    CardinalDirection::SSE,
    CardinalDirection::S,
    CardinalDirection::SSW,
    CardinalDirection::SW,
    CardinalDirection::WSW,
    CardinalDirection::W,
    CardinalDirection::WNW,
    CardinalDirection::NW,
    CardinalDirection::NNW,
];

const SECTOR_DEGREES: f64 = 360.0 / COMPASS_POINTS.len() as f64;

impl CardinalDirection {
    /// Maps a bearing in degrees onto the nearest compass point.
    ///
    /// Bearings outside [0, 360) wrap around; a bearing that sits exactly on a
    /// sector boundary goes to the even index, so 11.25 is `N` and 33.75 is `NE`.
    pub fn from_degrees(degrees: f64) -> Self {
        let index = (degrees / SECTOR_DEGREES).round_ties_even() as i64;
        COMPASS_POINTS[index.rem_euclid(COMPASS_POINTS.len() as i64) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardinalDirection::N => "N",
            CardinalDirection::NNE => "NNE",
            CardinalDirection::NE => "NE",
            CardinalDirection::ENE => "ENE",
            CardinalDirection::E => "E",
            CardinalDirection::ESE => "ESE",
            CardinalDirection::SE => "SE",
            CardinalDirection::SSE => "SSE",
            CardinalDirection::S => "S",
            CardinalDirection::SSW => "SSW",
            CardinalDirection::SW => "SW",
            CardinalDirection::WSW => "WSW",
            CardinalDirection::W => "W",
            CardinalDirection::WNW => "WNW",
            CardinalDirection::NW => "NW",
            CardinalDirection::NNW => "NNW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardinalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMPASS_POINTS
            .iter()
            .find(|point| point.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown compass point: {}", s))
    }
}
