use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChartError;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Zodiac reference frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ZodiacType {
    #[default]
    #[serde(alias = "Tropic")]
    Tropical,
    Sidereal,
}

/// Birth data describing one person
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BirthSpec {
    #[schemars(description = "Name of the person")]
    pub name: String,
    #[schemars(description = "Birth year")]
    pub year: i32,
    #[schemars(description = "Birth month (1-12)")]
    pub month: u32,
    #[schemars(description = "Birth day (1-31)")]
    pub day: u32,
    #[schemars(description = "Birth hour (0-23)")]
    pub hour: u32,
    #[schemars(description = "Birth minute (0-59)")]
    pub minute: u32,
    #[schemars(description = "Birth city")]
    pub city: String,
    #[schemars(description = "Two-letter country code (e.g. US, GB, CN)")]
    pub nation: String,
    #[serde(default)]
    #[schemars(description = "Longitude (optional; when given with latitude the city lookup is skipped)")]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[schemars(description = "Latitude (optional; when given with longitude the city lookup is skipped)")]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[schemars(description = "IANA timezone, e.g. Europe/Rome, America/New_York (required unless nation is CN, which defaults to Asia/Shanghai)")]
    pub tz_str: Option<String>,
    #[serde(default)]
    #[schemars(description = "Zodiac type (default: Tropical)")]
    pub zodiac_type: Option<ZodiacType>,
    #[serde(default)]
    #[schemars(description = "Sidereal mode used when zodiac_type is Sidereal (default: LAHIRI)")]
    pub sidereal_mode: Option<String>,
}

impl BirthSpec {
    /// Parse tool arguments leniently: any shape problem becomes a chart error
    pub fn from_arguments(arguments: &Value) -> Result<Self, ChartError> {
        if arguments.is_null() {
            return Err(ChartError::InvalidArguments(
                "birth data is missing".to_string(),
            ));
        }
        serde_json::from_value(arguments.clone())
            .map_err(|e| ChartError::InvalidArguments(e.to_string()))
    }

    /// Explicit coordinate, only when both halves were supplied
    pub fn explicit_coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }

    /// Timezone with the nation default applied
    pub fn effective_timezone(&self) -> Option<String> {
        match self.tz_str.as_deref() {
            Some(tz) if !tz.trim().is_empty() => Some(tz.to_string()),
            _ if self.nation == "CN" => Some(CHINA_DEFAULT_TZ.to_string()),
            _ => None,
        }
    }
}

/// Default zone for CN births without an explicit timezone
pub const CHINA_DEFAULT_TZ: &str = "Asia/Shanghai";

/// Arguments of the two-person tools
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct PairInput {
    #[schemars(description = "Birth data of the first person")]
    pub person1_data: BirthSpec,
    #[schemars(description = "Birth data of the second person")]
    pub person2_data: BirthSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> Value {
        json!({
            "name": "Ada", "year": 1990, "month": 6, "day": 15,
            "hour": 14, "minute": 30, "city": "北京", "nation": "CN"
        })
    }

    #[test]
    fn test_parse_minimal_spec() {
        let spec = BirthSpec::from_arguments(&args()).unwrap();
        assert_eq!(spec.name, "Ada");
        assert!(spec.explicit_coordinate().is_none());
        assert!(spec.zodiac_type.is_none());
    }

    #[test]
    fn test_missing_key_names_field() {
        let mut value = args();
        value.as_object_mut().unwrap().remove("year");
        let err = BirthSpec::from_arguments(&value).unwrap_err();
        assert_eq!(err.kind(), "InvalidArguments");
        assert!(err.to_string().contains("year"));
    }

    #[test]
    fn test_null_arguments_rejected() {
        let err = BirthSpec::from_arguments(&Value::Null).unwrap_err();
        assert_eq!(err.kind(), "InvalidArguments");
    }

    #[test]
    fn test_china_timezone_default() {
        let spec = BirthSpec::from_arguments(&args()).unwrap();
        assert_eq!(spec.effective_timezone().as_deref(), Some("Asia/Shanghai"));

        let mut value = args();
        value["tz_str"] = json!("Asia/Urumqi");
        let spec = BirthSpec::from_arguments(&value).unwrap();
        assert_eq!(spec.effective_timezone().as_deref(), Some("Asia/Urumqi"));

        value["nation"] = json!("US");
        value["tz_str"] = Value::Null;
        let spec = BirthSpec::from_arguments(&value).unwrap();
        assert_eq!(spec.effective_timezone(), None);
    }

    #[test]
    fn test_half_coordinate_is_not_explicit() {
        let mut value = args();
        value["latitude"] = json!(39.9);
        let spec = BirthSpec::from_arguments(&value).unwrap();
        assert!(spec.explicit_coordinate().is_none());

        value["longitude"] = json!(116.4);
        let spec = BirthSpec::from_arguments(&value).unwrap();
        assert_eq!(spec.explicit_coordinate(), Some(Coordinate::new(39.9, 116.4)));
    }

    #[test]
    fn test_tropic_alias() {
        let mut value = args();
        value["zodiac_type"] = json!("Tropic");
        let spec = BirthSpec::from_arguments(&value).unwrap();
        assert_eq!(spec.zodiac_type, Some(ZodiacType::Tropical));
    }
}
