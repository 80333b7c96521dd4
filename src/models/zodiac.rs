use serde::{Deserialize, Serialize};
use std::fmt;

/// Zodiac signs in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Get sign from ecliptic longitude (0-360 degrees)
    pub fn from_longitude(longitude: f64) -> Self {
        let index = (longitude.rem_euclid(360.0) / 30.0).floor() as usize;
        Self::ALL[index % 12]
    }

    /// Get sign index (0 = Aries, 11 = Pisces)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Starting ecliptic degree of this sign
    pub fn start_degree(&self) -> f64 {
        self.index() as f64 * 30.0
    }

    /// Three-letter abbreviation ("Ari", "Tau", ...)
    pub fn abbreviation(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Ari",
            ZodiacSign::Taurus => "Tau",
            ZodiacSign::Gemini => "Gem",
            ZodiacSign::Cancer => "Can",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Vir",
            ZodiacSign::Libra => "Lib",
            ZodiacSign::Scorpio => "Sco",
            ZodiacSign::Sagittarius => "Sag",
            ZodiacSign::Capricorn => "Cap",
            ZodiacSign::Aquarius => "Aqu",
            ZodiacSign::Pisces => "Pis",
        }
    }

    pub fn element(&self) -> &'static str {
        match self.index() % 4 {
            0 => "Fire",
            1 => "Earth",
            2 => "Air",
            _ => "Water",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Celestial bodies placed in every chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// True lunar node
    #[serde(rename = "True_Node")]
    NorthNode,
}

impl Planet {
    pub fn all() -> &'static [Planet] {
        &[
            Planet::Sun,
            Planet::Moon,
            Planet::Mercury,
            Planet::Venus,
            Planet::Mars,
            Planet::Jupiter,
            Planet::Saturn,
            Planet::Uranus,
            Planet::Neptune,
            Planet::Pluto,
            Planet::NorthNode,
        ]
    }

    /// Swiss Ephemeris body ID
    pub fn swe_id(&self) -> i32 {
        match self {
            Planet::Sun => 0,
            Planet::Moon => 1,
            Planet::Mercury => 2,
            Planet::Venus => 3,
            Planet::Mars => 4,
            Planet::Jupiter => 5,
            Planet::Saturn => 6,
            Planet::Uranus => 7,
            Planet::Neptune => 8,
            Planet::Pluto => 9,
            Planet::NorthNode => 11, // SE_TRUE_NODE
        }
    }

    /// Sun and Moon never station
    pub fn can_retrograde(&self) -> bool {
        !matches!(self, Planet::Sun | Planet::Moon)
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Planet::NorthNode => f.write_str("True_Node"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A position in the zodiac with sign and degree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZodiacPosition {
    pub sign: ZodiacSign,
    /// Degree within the sign (0-29.999...)
    pub position: f64,
    /// Full ecliptic longitude (0-360)
    pub abs_pos: f64,
}

impl ZodiacPosition {
    pub fn from_longitude(longitude: f64) -> Self {
        let abs_pos = longitude.rem_euclid(360.0);
        let sign = ZodiacSign::from_longitude(abs_pos);
        Self {
            sign,
            position: abs_pos - sign.start_degree(),
            abs_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_from_longitude() {
        assert_eq!(ZodiacSign::from_longitude(280.0), ZodiacSign::Capricorn);
        assert_eq!(ZodiacSign::from_longitude(45.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(-10.0), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(360.0), ZodiacSign::Aries);
    }

    #[test]
    fn test_position_wraps_longitude() {
        let pos = ZodiacPosition::from_longitude(395.5);
        assert_eq!(pos.sign, ZodiacSign::Taurus);
        assert!((pos.position - 5.5).abs() < 1e-9);
        assert!((pos.abs_pos - 35.5).abs() < 1e-9);
    }

    #[test]
    fn test_elements_cycle() {
        assert_eq!(ZodiacSign::Leo.element(), "Fire");
        assert_eq!(ZodiacSign::Capricorn.element(), "Earth");
        assert_eq!(ZodiacSign::Aquarius.element(), "Air");
        assert_eq!(ZodiacSign::Pisces.element(), "Water");
    }

    #[test]
    fn test_node_display_matches_serde_name() {
        let name = serde_json::to_value(Planet::NorthNode).unwrap();
        assert_eq!(name, serde_json::json!("True_Node"));
        assert_eq!(Planet::NorthNode.to_string(), "True_Node");
        assert_eq!(Planet::Sun.to_string(), "Sun");
    }
}
