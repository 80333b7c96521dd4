use serde::Serialize;

use super::{Planet, ZodiacPosition, ZodiacType};

/// Where and when a natal subject was born
#[derive(Debug, Clone, Serialize)]
pub struct BirthData {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub city: String,
    pub nation: String,
    pub lat: f64,
    pub lng: f64,
    pub tz_str: String,
    pub iso_formatted_utc_datetime: String,
    pub julian_day: f64,
}

/// A planet or angle placed in a chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub name: String,
    #[serde(flatten)]
    pub position: ZodiacPosition,
    pub quality_sign: &'static str,
    pub element: &'static str,
    pub house: u8,
    pub retrograde: bool,
}

impl ChartPoint {
    pub fn new(name: impl Into<String>, position: ZodiacPosition, house: u8, retrograde: bool) -> Self {
        Self {
            name: name.into(),
            quality_sign: position.sign.abbreviation(),
            element: position.sign.element(),
            position,
            house,
            retrograde,
        }
    }
}

/// Kind of chart a subject represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Natal,
    Composite,
}

/// A computed astrological subject
#[derive(Debug, Clone, Serialize)]
pub struct ChartSubject {
    pub name: String,
    pub kind: SubjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<BirthData>,
    pub zodiac_type: ZodiacType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidereal_mode: Option<String>,
    pub houses_system_name: String,
    pub planets: Vec<ChartPoint>,
    /// Twelve cusps, index 0 = first house
    pub houses: Vec<ZodiacPosition>,
    pub ascendant: ZodiacPosition,
    pub medium_coeli: ZodiacPosition,
}

impl ChartSubject {
    /// Position of a planet, if placed
    pub fn planet(&self, planet: Planet) -> Option<&ChartPoint> {
        let name = planet.to_string();
        self.planets.iter().find(|p| p.name == name)
    }

    /// Every point that takes part in aspects: planets plus the two angles
    pub fn aspect_points(&self) -> Vec<(&str, f64)> {
        let mut points: Vec<(&str, f64)> = self
            .planets
            .iter()
            .map(|p| (p.name.as_str(), p.position.abs_pos))
            .collect();
        points.push(("Ascendant", self.ascendant.abs_pos));
        points.push(("Medium_Coeli", self.medium_coeli.abs_pos));
        points
    }
}
