//! Swiss Ephemeris backed engine

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use super::{AstrologyEngine, Dumped, EngineRecord, SubjectRequest};
use crate::ephemeris::{
    ayanamsa, calc_all_planets, calc_houses_with_fallback, datetime_to_julian_day, house_system_name,
    init_ephemeris, local_to_utc, planet_in_house, sidereal_mode_id,
};
use crate::error::ChartError;
use crate::models::{
    AspectRecord, BirthData, ChartPoint, ChartSubject, SubjectKind, ZodiacPosition, ZodiacType,
};
use crate::sandbox::SandboxContext;

const DEFAULT_SIDEREAL_MODE: &str = "LAHIRI";

impl EngineRecord for ChartSubject {
    fn dump(&self) -> Dumped {
        Dumped::structured(self)
    }
}

impl EngineRecord for AspectRecord {
    fn dump(&self) -> Dumped {
        Dumped::structured(self)
    }
}

/// Engine computing charts with Swiss Ephemeris
#[derive(Debug, Clone, Default)]
pub struct SwissEngine;

impl SwissEngine {
    /// `ephe_path` points at Swiss Ephemeris data files; `None` uses Moshier
    pub fn new(ephe_path: Option<&Path>) -> Self {
        init_ephemeris(ephe_path);
        Self
    }
}

/// Midpoint on the shorter arc between two longitudes
fn midpoint(a: f64, b: f64) -> f64 {
    let delta = (b - a + 540.0).rem_euclid(360.0) - 180.0;
    (a + delta / 2.0).rem_euclid(360.0)
}

impl AstrologyEngine for SwissEngine {
    type Subject = ChartSubject;
    type Aspect = AspectRecord;

    fn build_subject(
        &self,
        request: &SubjectRequest,
        sandbox: &SandboxContext,
    ) -> Result<ChartSubject, ChartError> {
        let coordinate = request.coordinate.ok_or_else(|| {
            ChartError::NoCoordinates(format!("{}, {}", request.city, request.nation))
        })?;

        if !(-90.0..=90.0).contains(&coordinate.latitude)
            || !(-180.0..=180.0).contains(&coordinate.longitude)
        {
            return Err(ChartError::InvalidArguments(format!(
                "coordinate out of range: latitude {}, longitude {}",
                coordinate.latitude, coordinate.longitude
            )));
        }

        let date = NaiveDate::from_ymd_opt(request.year, request.month, request.day)
            .ok_or_else(|| {
                ChartError::InvalidDateTime(format!(
                    "{:04}-{:02}-{:02} is not a calendar date",
                    request.year, request.month, request.day
                ))
            })?;
        let time = NaiveTime::from_hms_opt(request.hour, request.minute, 0).ok_or_else(|| {
            ChartError::InvalidDateTime(format!(
                "{:02}:{:02} is not a time of day",
                request.hour, request.minute
            ))
        })?;

        let tz_name = request.tz_str.as_deref().ok_or_else(|| {
            ChartError::MissingTimezone(format!("'{}' ({})", request.city, request.nation))
        })?;
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| ChartError::InvalidTimezone(tz_name.to_string()))?;
        let utc = local_to_utc(date, time, tz).map_err(ChartError::InvalidDateTime)?;
        let julian_day = datetime_to_julian_day(utc);

        let (offset, sidereal_mode) = match request.zodiac_type {
            ZodiacType::Tropical => (0.0, None),
            ZodiacType::Sidereal => {
                let mode = request
                    .sidereal_mode
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SIDEREAL_MODE.to_string());
                let id = sidereal_mode_id(&mode)
                    .ok_or_else(|| ChartError::UnknownSiderealMode(mode.clone()))?;
                (-ayanamsa(julian_day, id), Some(mode.to_ascii_uppercase()))
            }
        };

        let positions = calc_all_planets(julian_day).map_err(ChartError::Ephemeris)?;
        let houses = calc_houses_with_fallback(julian_day, coordinate.latitude, coordinate.longitude)
            .map_err(ChartError::Ephemeris)?
            .shifted(offset);

        let planets = positions
            .iter()
            .map(|(planet, position)| {
                let longitude = (position.longitude + offset).rem_euclid(360.0);
                ChartPoint::new(
                    planet.to_string(),
                    ZodiacPosition::from_longitude(longitude),
                    planet_in_house(longitude, &houses.cusps),
                    position.is_retrograde,
                )
            })
            .collect();

        tracing::debug!(
            subject = %request.name,
            julian_day,
            sandbox = %sandbox.root().display(),
            "subject computed"
        );

        Ok(ChartSubject {
            name: request.name.clone(),
            kind: SubjectKind::Natal,
            birth: Some(BirthData {
                year: request.year,
                month: request.month,
                day: request.day,
                hour: request.hour,
                minute: request.minute,
                city: request.city.clone(),
                nation: request.nation.clone(),
                lat: coordinate.latitude,
                lng: coordinate.longitude,
                tz_str: tz_name.to_string(),
                iso_formatted_utc_datetime: utc.format("%Y-%m-%dT%H:%M:%S+00:00").to_string(),
                julian_day,
            }),
            zodiac_type: request.zodiac_type,
            sidereal_mode,
            houses_system_name: house_system_name(houses.system).to_string(),
            planets,
            houses: houses.cusps.iter().map(|&c| ZodiacPosition::from_longitude(c)).collect(),
            ascendant: ZodiacPosition::from_longitude(houses.ascendant),
            medium_coeli: ZodiacPosition::from_longitude(houses.midheaven),
        })
    }

    fn natal_aspects(
        &self,
        subject: &ChartSubject,
        _sandbox: &SandboxContext,
    ) -> Result<Vec<AspectRecord>, ChartError> {
        let points = subject.aspect_points();
        let mut aspects = Vec::new();
        for (i, first) in points.iter().enumerate() {
            for second in &points[i + 1..] {
                if let Some(aspect) = AspectRecord::between(*first, *second) {
                    aspects.push(aspect);
                }
            }
        }
        Ok(aspects)
    }

    fn synastry_aspects(
        &self,
        first: &ChartSubject,
        second: &ChartSubject,
        _sandbox: &SandboxContext,
    ) -> Result<Vec<AspectRecord>, ChartError> {
        let theirs = second.aspect_points();
        Ok(first
            .aspect_points()
            .into_iter()
            .flat_map(|mine| theirs.iter().filter_map(move |other| AspectRecord::between(mine, *other)))
            .collect())
    }

    fn composite(
        &self,
        first: &ChartSubject,
        second: &ChartSubject,
        name: &str,
        _sandbox: &SandboxContext,
    ) -> Result<ChartSubject, ChartError> {
        if first.zodiac_type != second.zodiac_type || first.sidereal_mode != second.sidereal_mode {
            return Err(ChartError::InvalidArguments(
                "composite charts need both subjects in the same zodiac".to_string(),
            ));
        }

        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = midpoint(first.houses[i].abs_pos, second.houses[i].abs_pos);
        }

        let planets = first
            .planets
            .iter()
            .filter_map(|mine| {
                let other = second.planets.iter().find(|p| p.name == mine.name)?;
                let longitude = midpoint(mine.position.abs_pos, other.position.abs_pos);
                Some(ChartPoint::new(
                    mine.name.clone(),
                    ZodiacPosition::from_longitude(longitude),
                    planet_in_house(longitude, &cusps),
                    false,
                ))
            })
            .collect();

        Ok(ChartSubject {
            name: name.to_string(),
            kind: SubjectKind::Composite,
            birth: None,
            zodiac_type: first.zodiac_type,
            sidereal_mode: first.sidereal_mode.clone(),
            houses_system_name: first.houses_system_name.clone(),
            planets,
            houses: cusps.iter().map(|&c| ZodiacPosition::from_longitude(c)).collect(),
            ascendant: ZodiacPosition::from_longitude(midpoint(
                first.ascendant.abs_pos,
                second.ascendant.abs_pos,
            )),
            medium_coeli: ZodiacPosition::from_longitude(midpoint(
                first.medium_coeli.abs_pos,
                second.medium_coeli.abs_pos,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Planet};
    use crate::sandbox::{run_isolated, SandboxConfig};

    fn request(name: &str) -> SubjectRequest {
        SubjectRequest {
            name: name.to_string(),
            year: 1990,
            month: 6,
            day: 15,
            hour: 14,
            minute: 30,
            city: "北京".to_string(),
            nation: "CN".to_string(),
            coordinate: Some(Coordinate::new(39.9042, 116.4074)),
            tz_str: Some("Asia/Shanghai".to_string()),
            zodiac_type: ZodiacType::Tropical,
            sidereal_mode: None,
        }
    }

    fn build(request: &SubjectRequest) -> Result<ChartSubject, ChartError> {
        let _serial = crate::sandbox::serial_guard();
        let engine = SwissEngine::new(None);
        run_isolated(&SandboxConfig::default(), |ctx| engine.build_subject(request, ctx))
    }

    #[test]
    fn test_midpoint_takes_short_arc() {
        assert!((midpoint(350.0, 10.0) - 0.0).abs() < 1e-9);
        assert!((midpoint(10.0, 350.0) - 0.0).abs() < 1e-9);
        assert!((midpoint(100.0, 140.0) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_subject() {
        let subject = build(&request("Ada")).unwrap();
        assert_eq!(subject.planets.len(), Planet::all().len());
        assert_eq!(subject.houses.len(), 12);

        // Sun in mid-June is in Gemini
        let sun = subject.planet(Planet::Sun).unwrap();
        assert_eq!(sun.position.sign.to_string(), "Gemini");

        let birth = subject.birth.as_ref().unwrap();
        assert_eq!(birth.iso_formatted_utc_datetime, "1990-06-15T06:30:00+00:00");
    }

    #[test]
    fn test_sidereal_shifts_positions() {
        let tropical = build(&request("Ada")).unwrap();
        let mut sidereal_request = request("Ada");
        sidereal_request.zodiac_type = ZodiacType::Sidereal;
        let sidereal = build(&sidereal_request).unwrap();

        assert_eq!(sidereal.sidereal_mode.as_deref(), Some("LAHIRI"));
        let t = tropical.planet(Planet::Sun).unwrap().position.abs_pos;
        let s = sidereal.planet(Planet::Sun).unwrap().position.abs_pos;
        let shift = (t - s).rem_euclid(360.0);
        assert!(shift > 23.0 && shift < 25.0);
    }

    #[test]
    fn test_missing_coordinate_fails() {
        let mut req = request("Ada");
        req.coordinate = None;
        let err = build(&req).unwrap_err();
        assert_eq!(err.kind(), "NoCoordinates");
    }

    #[test]
    fn test_invalid_inputs() {
        let mut req = request("Ada");
        req.month = 13;
        assert_eq!(build(&req).unwrap_err().kind(), "InvalidDateTime");

        let mut req = request("Ada");
        req.tz_str = Some("Mars/Olympus".to_string());
        assert_eq!(build(&req).unwrap_err().kind(), "InvalidTimezone");

        let mut req = request("Ada");
        req.nation = "US".to_string();
        req.tz_str = None;
        let err = build(&req).unwrap_err();
        assert_eq!(err.kind(), "MissingTimezone");
        assert!(err.to_string().contains("tz_str"));

        let mut req = request("Ada");
        req.zodiac_type = ZodiacType::Sidereal;
        req.sidereal_mode = Some("ASTRAL".to_string());
        assert_eq!(build(&req).unwrap_err().kind(), "UnknownSiderealMode");
    }

    #[test]
    fn test_aspects_and_composite() {
        let _serial = crate::sandbox::serial_guard();
        let engine = SwissEngine::new(None);
        let mut other = request("Bob");
        other.year = 1988;
        other.month = 2;

        let (first, second, natal, synastry, composite) =
            run_isolated(&SandboxConfig::default(), |ctx| {
                let first = engine.build_subject(&request("Ada"), ctx)?;
                let second = engine.build_subject(&other, ctx)?;
                let natal = engine.natal_aspects(&first, ctx)?;
                let synastry = engine.synastry_aspects(&first, &second, ctx)?;
                let composite = engine.composite(&first, &second, "Ada & Bob Composite", ctx)?;
                Ok((first, second, natal, synastry, composite))
            })
            .unwrap();

        assert!(!natal.is_empty());
        assert!(natal.iter().all(|a| a.p1_name != a.p2_name));
        assert!(!synastry.is_empty());

        assert_eq!(composite.kind, SubjectKind::Composite);
        assert_eq!(composite.name, "Ada & Bob Composite");
        let sun = composite.planet(Planet::Sun).unwrap().position.abs_pos;
        let expected = midpoint(
            first.planet(Planet::Sun).unwrap().position.abs_pos,
            second.planet(Planet::Sun).unwrap().position.abs_pos,
        );
        assert!((sun - expected).abs() < 1e-9);
    }
}
