//! City name to coordinate lookup
//!
//! The gazetteer is a JSON file shaped `{province: {city: {latitude, longitude}}}`.
//! File order matters: when a name is ambiguous, the first match wins.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::{Map, Value};

use crate::models::Coordinate;

/// Nation code the bundled gazetteer covers
pub const GAZETTEER_NATION: &str = "CN";

const GAZETTEER_FILE: &str = "china_cities.json";

/// Sub-district names that resolve to their parent city: (fragment, province, city)
const ALIASES: &[(&str, &str, &str)] = &[("丰宁", "河北省", "承德")];

/// Province to city to coordinate table, in file order
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    provinces: Vec<Province>,
}

#[derive(Debug, Clone)]
struct Province {
    name: String,
    cities: Vec<(String, Coordinate)>,
}

impl Gazetteer {
    /// Parse the nested JSON table; malformed city entries are skipped
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let root: Map<String, Value> = serde_json::from_str(data)?;

        let provinces = root
            .into_iter()
            .filter_map(|(name, cities)| match cities {
                Value::Object(cities) => Some(Province {
                    cities: cities
                        .into_iter()
                        .filter_map(|(city, coord)| {
                            match serde_json::from_value::<Coordinate>(coord) {
                                Ok(c) => Some((city, c)),
                                Err(e) => {
                                    tracing::debug!(province = %name, city = %city, error = %e, "skipping gazetteer entry");
                                    None
                                }
                            }
                        })
                        .collect(),
                    name,
                }),
                _ => None,
            })
            .collect();

        Ok(Self { provinces })
    }

    /// Read a gazetteer file; a missing or unreadable file is `None`
    pub fn load(path: &Path) -> Option<Self> {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "gazetteer unavailable");
                return None;
            }
        };
        match Self::from_json(&data) {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "gazetteer is not valid JSON");
                None
            }
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &str, Coordinate)> {
        self.provinces.iter().flat_map(|p| {
            p.cities
                .iter()
                .map(move |(city, coord)| (p.name.as_str(), city.as_str(), *coord))
        })
    }

    /// Exact city key in any province
    pub fn exact(&self, city: &str) -> Option<Coordinate> {
        self.entries().find(|(_, name, _)| *name == city).map(|(_, _, c)| c)
    }

    /// First city whose name contains the query or is contained in it
    ///
    /// Every name contains the empty string, so an empty query yields the first entry.
    pub fn fuzzy(&self, city: &str) -> Option<Coordinate> {
        self.entries()
            .find(|(_, name, _)| city.contains(name) || name.contains(city))
            .map(|(_, _, c)| c)
    }

    /// Hard-coded sub-district aliases
    pub fn alias(&self, city: &str) -> Option<Coordinate> {
        ALIASES.iter().find_map(|(fragment, province, parent)| {
            if !city.contains(fragment) {
                return None;
            }
            self.entries()
                .find(|(p, name, _)| p == province && name == parent)
                .map(|(_, _, c)| c)
        })
    }

    /// Exact, then fuzzy, then alias
    pub fn lookup(&self, city: &str) -> Option<Coordinate> {
        self.exact(city)
            .or_else(|| self.fuzzy(city))
            .or_else(|| self.alias(city))
    }
}

/// Where the resolver gets its gazetteer from
#[derive(Debug, Clone)]
enum Source {
    /// Re-read on every lookup so the file can be edited while serving
    File(PathBuf),
    Loaded(Gazetteer),
}

/// Best-effort city to coordinate resolution
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    source: Source,
}

impl CoordinateResolver {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn from_gazetteer(gazetteer: Gazetteer) -> Self {
        Self {
            source: Source::Loaded(gazetteer),
        }
    }

    /// Coordinate for a city, or `None` when the city is unknown
    ///
    /// Never fails: only `CN` has a gazetteer, and unreadable data counts as no data.
    pub fn resolve(&self, city: &str, nation: &str) -> Option<Coordinate> {
        if nation != GAZETTEER_NATION {
            return None;
        }

        let found = match &self.source {
            Source::File(path) => Gazetteer::load(path)?.lookup(city),
            Source::Loaded(gazetteer) => gazetteer.lookup(city),
        };
        tracing::debug!(city, nation, found = found.is_some(), "gazetteer lookup");
        found
    }
}

/// Default gazetteer location: the platform data dir, else the working directory
pub fn default_gazetteer_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "astrolabe", "astrolabe") {
        let candidate = proj_dirs.data_dir().join(GAZETTEER_FILE);
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from(GAZETTEER_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "江苏省": {
            "上海郊区": {"latitude": 31.0, "longitude": 121.0},
            "南京": {"latitude": 32.06, "longitude": 118.79}
        },
        "上海市": {
            "上海": {"latitude": 31.23, "longitude": 121.47}
        },
        "河北省": {
            "石家庄": {"latitude": 38.04, "longitude": 114.51},
            "承德": {"latitude": 40.95, "longitude": 117.96},
            "broken": {"lat": 1}
        }
    }"#;

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_exact_match_beats_earlier_fuzzy_candidate() {
        let resolver = CoordinateResolver::from_gazetteer(gazetteer());
        let coord = resolver.resolve("上海", "CN").unwrap();
        assert_eq!(coord, Coordinate::new(31.23, 121.47));
    }

    #[test]
    fn test_fuzzy_in_file_order() {
        let g = gazetteer();
        // Query contains a city name
        assert_eq!(g.lookup("南京市"), Some(Coordinate::new(32.06, 118.79)));
        // City name contains the query; the first province in file order wins
        assert_eq!(g.lookup("郊区"), Some(Coordinate::new(31.0, 121.0)));
    }

    #[test]
    fn test_alias_to_parent_city() {
        let g = gazetteer();
        assert_eq!(g.lookup("丰宁满族自治县"), Some(Coordinate::new(40.95, 117.96)));
    }

    #[test]
    fn test_other_nations_and_unknown_cities() {
        let resolver = CoordinateResolver::from_gazetteer(gazetteer());
        assert!(resolver.resolve("上海", "US").is_none());
        assert!(resolver.resolve("Atlantis", "CN").is_none());
    }

    #[test]
    fn test_empty_city_takes_first_entry() {
        let resolver = CoordinateResolver::from_gazetteer(gazetteer());
        assert_eq!(resolver.resolve("", "CN"), Some(Coordinate::new(31.0, 121.0)));

        let single = Gazetteer::from_json(
            r#"{"北京市": {"北京": {"latitude": 39.9, "longitude": 116.4}}}"#,
        )
        .unwrap();
        assert_eq!(single.lookup(""), Some(Coordinate::new(39.9, 116.4)));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let g = gazetteer();
        assert!(g.exact("broken").is_none());
        assert_eq!(g.entries().count(), 5);
    }

    #[test]
    fn test_file_source_degrades_to_none() {
        let _serial = crate::sandbox::serial_guard();
        let dir = tempfile::tempdir().unwrap();

        let missing = CoordinateResolver::from_file(dir.path().join("nope.json"));
        assert!(missing.resolve("上海", "CN").is_none());

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        assert!(CoordinateResolver::from_file(&garbage).resolve("上海", "CN").is_none());

        let good = dir.path().join(GAZETTEER_FILE);
        fs::write(&good, SAMPLE).unwrap();
        let coord = CoordinateResolver::from_file(&good).resolve("承德", "CN");
        assert_eq!(coord, Some(Coordinate::new(40.95, 117.96)));
    }
}
