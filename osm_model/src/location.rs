use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-point coordinates at 1e-7 degree resolution.
const PRECISION: f64 = 10_000_000.0;

/// A lon/lat position stored as fixed-point integers, so positions compare exactly and the
/// assembler's geometry stays in integer arithmetic. `x` is longitude, `y` latitude.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Location {
        Location { x, y }
    }

    pub fn from_degrees(lon: f64, lat: f64) -> Location {
        Location {
            x: (lon * PRECISION).round() as i32,
            y: (lat * PRECISION).round() as i32,
        }
    }

    pub fn lon(self) -> f64 {
        f64::from(self.x) / PRECISION
    }

    pub fn lat(self) -> f64 {
        f64::from(self.y) / PRECISION
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
