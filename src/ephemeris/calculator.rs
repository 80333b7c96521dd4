//! Swiss Ephemeris wrapper for planetary calculations
//!
//! This module provides safe Rust wrappers around the libswisseph-sys FFI bindings.

use std::ffi::CString;
use std::path::Path;
use std::sync::Once;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::Planet;

// Swiss Ephemeris constants
const SE_GREG_CAL: i32 = 1;
const SEFLG_SPEED: i32 = 256; // Include speed in calculations
const SEFLG_SWIEPH: i32 = 2; // Use Swiss Ephemeris

static INIT: Once = Once::new();

/// Initialize Swiss Ephemeris (first call wins)
///
/// With no path the Moshier analytical ephemeris is used, which needs no data
/// files: 0.1 arc seconds precision for planets, 3 arc seconds for the Moon.
pub fn init_ephemeris(path: Option<&Path>) {
    INIT.call_once(|| {
        let c_path = path.and_then(|p| CString::new(p.to_string_lossy().as_bytes()).ok());
        match c_path {
            Some(c_path) => unsafe {
                // The library copies the string
                libswisseph_sys::swe_set_ephe_path(c_path.as_ptr() as _);
            },
            None => unsafe {
                libswisseph_sys::swe_set_ephe_path(std::ptr::null_mut());
            },
        }
        tracing::debug!(path = ?path, "Swiss Ephemeris initialized");
    });
}

/// Result of a planetary calculation
#[derive(Debug, Clone)]
pub struct PlanetaryPosition {
    /// Ecliptic longitude (0-360 degrees)
    pub longitude: f64,
    /// Speed in longitude (degrees per day, negative = retrograde)
    pub speed_longitude: f64,
    pub is_retrograde: bool,
}

/// Convert a UTC date/time to Julian Day (UT)
pub fn datetime_to_julian_day(datetime: NaiveDateTime) -> f64 {
    let year = datetime.date().year();
    let month = datetime.date().month() as i32;
    let day = datetime.date().day() as i32;
    let hour = datetime.time().hour() as f64
        + datetime.time().minute() as f64 / 60.0
        + datetime.time().second() as f64 / 3600.0;

    unsafe { libswisseph_sys::swe_julday(year, month, day, hour, SE_GREG_CAL) }
}

/// Convert local wall-clock birth time to UTC
///
/// Ambiguous times (autumn DST fold) resolve to the earlier instant; times in a
/// spring gap are an error.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<NaiveDateTime, String> {
    let local_datetime = NaiveDateTime::new(date, time);
    let local_dt = tz
        .from_local_datetime(&local_datetime)
        .earliest()
        .ok_or_else(|| format!("{} does not exist in {}", local_datetime, tz.name()))?;

    Ok(local_dt.with_timezone(&Utc).naive_utc())
}

/// Calculate position of a planet at a given Julian Day
pub fn calc_planet_position(planet: Planet, julian_day: f64) -> Result<PlanetaryPosition, String> {
    let mut xx: [f64; 6] = [0.0; 6];
    let mut serr: [i8; 256] = [0; 256];

    let iflg = SEFLG_SPEED | SEFLG_SWIEPH;

    let ret = unsafe {
        libswisseph_sys::swe_calc_ut(
            julian_day,
            planet.swe_id(),
            iflg,
            xx.as_mut_ptr(),
            serr.as_mut_ptr(),
        )
    };

    if ret < 0 {
        let error_msg = unsafe {
            let c_str = std::ffi::CStr::from_ptr(serr.as_ptr());
            c_str.to_string_lossy().to_string()
        };
        return Err(error_msg);
    }

    let speed_longitude = xx[3];

    Ok(PlanetaryPosition {
        longitude: xx[0],
        speed_longitude,
        is_retrograde: planet.can_retrograde() && speed_longitude < 0.0,
    })
}

/// Calculate positions for all planets at a given Julian Day
pub fn calc_all_planets(julian_day: f64) -> Result<Vec<(Planet, PlanetaryPosition)>, String> {
    Planet::all()
        .iter()
        .map(|planet| calc_planet_position(*planet, julian_day).map(|pos| (*planet, pos)))
        .collect()
}

/// Sidereal modes understood by Swiss Ephemeris, by name
const SIDEREAL_MODES: &[(&str, i32)] = &[
    ("FAGAN_BRADLEY", 0),
    ("LAHIRI", 1),
    ("DELUCE", 2),
    ("RAMAN", 3),
    ("USHASHASHI", 4),
    ("KRISHNAMURTI", 5),
    ("DJWHAL_KHUL", 6),
    ("YUKTESHWAR", 7),
    ("JN_BHASIN", 8),
    ("BABYL_KUGLER1", 9),
    ("BABYL_KUGLER2", 10),
    ("BABYL_KUGLER3", 11),
    ("BABYL_HUBER", 12),
    ("BABYL_ETPSC", 13),
    ("ALDEBARAN_15TAU", 14),
    ("HIPPARCHOS", 15),
    ("SASSANIAN", 16),
    ("J2000", 18),
    ("J1900", 19),
    ("B1950", 20),
];

/// Look up a sidereal mode id (case-insensitive)
pub fn sidereal_mode_id(name: &str) -> Option<i32> {
    SIDEREAL_MODES
        .iter()
        .find(|(mode, _)| mode.eq_ignore_ascii_case(name.trim()))
        .map(|(_, id)| *id)
}

/// Ayanamsa (tropical minus sidereal longitude) for a mode at a Julian Day
pub fn ayanamsa(julian_day: f64, mode: i32) -> f64 {
    unsafe {
        libswisseph_sys::swe_set_sid_mode(mode, 0.0, 0.0);
        libswisseph_sys::swe_get_ayanamsa_ut(julian_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_julian_day_conversion() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let jd = datetime_to_julian_day(date.and_hms_opt(0, 0, 0).unwrap());
        // J2000.0 epoch is Julian Day 2451545.0 at noon
        assert!((jd - 2451544.5).abs() < 0.01);
    }

    #[test]
    fn test_local_to_utc_shanghai() {
        let date = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        let utc = local_to_utc(date, time, chrono_tz::Asia::Shanghai).unwrap();
        assert_eq!(utc.to_string(), "1990-06-15 06:30:00");
    }

    #[test]
    fn test_local_to_utc_rejects_spring_gap() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        let time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert!(local_to_utc(date, time, chrono_tz::America::New_York).is_err());
    }

    #[test]
    fn test_planet_calculation() {
        let _serial = crate::sandbox::serial_guard();
        init_ephemeris(None);
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let jd = datetime_to_julian_day(date.and_hms_opt(0, 0, 0).unwrap());
        let sun = calc_planet_position(Planet::Sun, jd).unwrap();

        // Sun should be around 280° (Capricorn) on Jan 1, 2000
        assert!(sun.longitude > 270.0 && sun.longitude < 290.0);
        assert!(!sun.is_retrograde);
    }

    #[test]
    fn test_sidereal_mode_lookup() {
        assert_eq!(sidereal_mode_id("LAHIRI"), Some(1));
        assert_eq!(sidereal_mode_id("fagan_bradley"), Some(0));
        assert_eq!(sidereal_mode_id("NOPE"), None);
    }

    #[test]
    fn test_lahiri_ayanamsa_near_j2000() {
        let _serial = crate::sandbox::serial_guard();
        init_ephemeris(None);
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let jd = datetime_to_julian_day(date.and_hms_opt(12, 0, 0).unwrap());
        let value = ayanamsa(jd, 1);
        // Lahiri ayanamsa at J2000 is about 23°51'
        assert!((value - 23.85).abs() < 0.1);
    }
}
