use serde::{Deserialize, Serialize};
use std::fmt;

/// Major astrological aspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    /// Get the exact angle for this aspect
    pub fn angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Get the default orb (tolerance) for this aspect
    pub fn default_orb(&self) -> f64 {
        match self {
            AspectType::Conjunction => 10.0,
            AspectType::Opposition => 10.0,
            AspectType::Trine => 8.0,
            AspectType::Square => 5.0,
            AspectType::Sextile => 6.0,
        }
    }

    pub fn all() -> &'static [AspectType] {
        &[
            AspectType::Conjunction,
            AspectType::Sextile,
            AspectType::Square,
            AspectType::Trine,
            AspectType::Opposition,
        ]
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        };
        f.write_str(name)
    }
}

/// Shortest angular distance between two ecliptic longitudes (0-180)
pub fn angular_distance(longitude1: f64, longitude2: f64) -> f64 {
    let diff = (longitude1 - longitude2).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Check if two positions form an aspect, returning it with its orb
pub fn find_aspect(longitude1: f64, longitude2: f64) -> Option<(AspectType, f64)> {
    let distance = angular_distance(longitude1, longitude2);

    AspectType::all().iter().find_map(|aspect| {
        let orb = (distance - aspect.angle()).abs();
        (orb <= aspect.default_orb()).then_some((*aspect, orb))
    })
}

/// One aspect between two chart points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectRecord {
    pub p1_name: String,
    pub p1_abs_pos: f64,
    pub p2_name: String,
    pub p2_abs_pos: f64,
    pub aspect: AspectType,
    /// Exact angle of the aspect type
    pub aspect_degrees: f64,
    /// Distance from exact, in degrees
    pub orbit: f64,
    /// Actual angular separation
    pub diff: f64,
    pub is_major: bool,
}

impl AspectRecord {
    /// Build the record for two named points if they are in aspect
    pub fn between(p1: (&str, f64), p2: (&str, f64)) -> Option<Self> {
        let (aspect, orb) = find_aspect(p1.1, p2.1)?;
        Some(Self {
            p1_name: p1.0.to_string(),
            p1_abs_pos: p1.1,
            p2_name: p2.0.to_string(),
            p2_abs_pos: p2.1,
            aspect,
            aspect_degrees: aspect.angle(),
            orbit: (orb * 100.0).round() / 100.0,
            diff: (angular_distance(p1.1, p2.1) * 100.0).round() / 100.0,
            is_major: true,
        })
    }
}
