//! Chart operations exposed as tools
//!
//! Each operation parses its birth data, fills in coordinates and timezone
//! defaults, runs the engine inside a sandbox and reports an [`Outcome`].
//! Nothing here returns an error or lets a panic escape: every failure becomes
//! `{success: false, ...}`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::{normalize, normalize_all, AstrologyEngine, SubjectRequest};
use crate::error::ChartError;
use crate::gazetteer::CoordinateResolver;
use crate::models::{BirthSpec, Coordinate, Outcome};
use crate::sandbox::{run_isolated, SandboxConfig, SandboxContext};

/// Where a subject's coordinate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    /// Supplied as latitude/longitude arguments
    Explicit,
    /// Found in the gazetteer
    Gazetteer,
    /// Left to the engine's own city lookup
    Engine,
}

/// A birth spec ready for the engine
#[derive(Debug, Clone)]
struct Prepared {
    spec: BirthSpec,
    request: SubjectRequest,
    source: CoordinateSource,
}

impl Prepared {
    /// Echo of the effective input, as reported back to the caller
    fn input(&self) -> Value {
        let coordinate = self.request.coordinate;
        json!({
            "name": self.spec.name,
            "year": self.spec.year,
            "month": self.spec.month,
            "day": self.spec.day,
            "hour": self.spec.hour,
            "minute": self.spec.minute,
            "city": self.spec.city,
            "nation": self.spec.nation,
            "longitude": coordinate.map(|c| c.longitude).or(self.spec.longitude),
            "latitude": coordinate.map(|c| c.latitude).or(self.spec.latitude),
            "tz_str": self.request.tz_str,
            "zodiac_type": self.request.zodiac_type,
            "sidereal_mode": self.request.sidereal_mode,
            "used_coordinates": coordinate.is_some(),
            "coordinate_source": self.source,
        })
    }
}

/// The chart computation adapter
pub struct ChartService<E> {
    engine: E,
    resolver: CoordinateResolver,
    sandbox: SandboxConfig,
}

impl<E: AstrologyEngine> ChartService<E> {
    pub fn new(engine: E, resolver: CoordinateResolver, sandbox: SandboxConfig) -> Self {
        Self {
            engine,
            resolver,
            sandbox,
        }
    }

    /// `create_astrological_subject`
    pub fn create_subject(&self, arguments: &Value) -> Outcome {
        self.guarded("create_astrological_subject", || {
            let person = self.prepare(arguments)?;
            let subject = run_isolated(&self.sandbox, |ctx| self.build(&person, ctx))?;
            Ok(json!({
                "input": person.input(),
                "astrological_data": normalize(&subject),
            }))
        })
    }

    /// `get_natal_aspects`
    pub fn natal_aspects(&self, arguments: &Value) -> Outcome {
        self.guarded("get_natal_aspects", || {
            let person = self.prepare(arguments)?;
            let (subject, aspects) = run_isolated(&self.sandbox, |ctx| {
                let subject = self.build(&person, ctx)?;
                let aspects = self.engine.natal_aspects(&subject, ctx)?;
                Ok((subject, aspects))
            })?;
            Ok(json!({
                "input": person.input(),
                "astrological_data": normalize(&subject),
                "aspects_count": aspects.len(),
                "aspects": normalize_all(&aspects),
            }))
        })
    }

    /// `get_synastry_aspects`
    pub fn synastry_aspects(&self, person1: &Value, person2: &Value) -> Outcome {
        self.guarded("get_synastry_aspects", || {
            let first = self.prepare(person1)?;
            let second = self.prepare(person2)?;
            let (s1, s2, aspects) = run_isolated(&self.sandbox, |ctx| {
                let s1 = self.build(&first, ctx)?;
                let s2 = self.build(&second, ctx)?;
                let aspects = self.engine.synastry_aspects(&s1, &s2, ctx)?;
                Ok((s1, s2, aspects))
            })?;
            Ok(json!({
                "person1_input": person1,
                "person2_input": person2,
                "person1_astrological_data": normalize(&s1),
                "person2_astrological_data": normalize(&s2),
                "aspects_count": aspects.len(),
                "aspects": normalize_all(&aspects),
            }))
        })
    }

    /// `create_composite_chart`
    pub fn composite_chart(&self, person1: &Value, person2: &Value) -> Outcome {
        self.guarded("create_composite_chart", || {
            let first = self.prepare(person1)?;
            let second = self.prepare(person2)?;
            let composite_name = format!("{} & {} Composite", first.spec.name, second.spec.name);
            let (s1, s2, composite) = run_isolated(&self.sandbox, |ctx| {
                let s1 = self.build(&first, ctx)?;
                let s2 = self.build(&second, ctx)?;
                let composite = self.engine.composite(&s1, &s2, &composite_name, ctx)?;
                Ok((s1, s2, composite))
            })?;
            Ok(json!({
                "person1_input": person1,
                "person2_input": person2,
                "person1_astrological_data": normalize(&s1),
                "person2_astrological_data": normalize(&s2),
                "composite_name": composite_name,
                "composite_astrological_data": normalize(&composite),
            }))
        })
    }

    /// Parse arguments and resolve coordinate and timezone
    fn prepare(&self, arguments: &Value) -> Result<Prepared, ChartError> {
        let spec = BirthSpec::from_arguments(arguments)?;

        let (coordinate, source) = match spec.explicit_coordinate() {
            Some(c) => (Some(c), CoordinateSource::Explicit),
            None => match self.resolver.resolve(&spec.city, &spec.nation) {
                Some(c) => (Some(c), CoordinateSource::Gazetteer),
                None => (None::<Coordinate>, CoordinateSource::Engine),
            },
        };

        let request = SubjectRequest {
            name: spec.name.clone(),
            year: spec.year,
            month: spec.month,
            day: spec.day,
            hour: spec.hour,
            minute: spec.minute,
            city: spec.city.clone(),
            nation: spec.nation.clone(),
            coordinate,
            tz_str: spec.effective_timezone(),
            zodiac_type: spec.zodiac_type.unwrap_or_default(),
            sidereal_mode: spec.sidereal_mode.clone(),
        };

        Ok(Prepared {
            spec,
            request,
            source,
        })
    }

    /// Build one subject; a failed engine-side city lookup is reported by name
    fn build(
        &self,
        person: &Prepared,
        ctx: &SandboxContext,
    ) -> Result<E::Subject, ChartError> {
        let result = self.engine.build_subject(&person.request, ctx);
        match (result, person.source) {
            (Err(e), CoordinateSource::Engine) => Err(ChartError::LocationNotFound {
                city: person.spec.city.clone(),
                nation: person.spec.nation.clone(),
                reason: e.to_string(),
            }),
            (result, _) => result,
        }
    }

    /// Operation boundary: errors and panics become a failed outcome
    fn guarded(&self, operation: &str, f: impl FnOnce() -> Result<Value, ChartError>) -> Outcome {
        let result = catch_unwind(AssertUnwindSafe(f))
            .unwrap_or_else(|payload| Err(ChartError::from_panic(payload)));

        match result {
            Ok(data) => Outcome::ok(data),
            Err(e) => {
                tracing::warn!(operation, error_type = e.kind(), error = %e, "chart operation failed");
                Outcome::failure(&e)
            }
        }
    }
}
