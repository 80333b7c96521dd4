//! The astrology engine seam
//!
//! Chart math sits behind [`AstrologyEngine`]. Whatever the engine returns is
//! turned into plain JSON through [`EngineRecord`] before it leaves the adapter.

mod swiss;

pub use swiss::SwissEngine;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ChartError;
use crate::models::{Coordinate, ZodiacType};
use crate::sandbox::SandboxContext;

/// Fully resolved parameters for building one subject
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRequest {
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub city: String,
    pub nation: String,
    /// `None` asks the engine to locate the city itself
    pub coordinate: Option<Coordinate>,
    pub tz_str: Option<String>,
    pub zodiac_type: ZodiacType,
    pub sidereal_mode: Option<String>,
}

/// How an engine value exposes itself as data
#[derive(Debug, Clone, PartialEq)]
pub enum Dumped {
    /// A structured model dump
    Structured(Value),
    /// A flat key/value conversion
    Dict(Map<String, Value>),
    /// Already plain data, passed through unchanged
    Plain(Value),
}

impl Dumped {
    /// Serialize a value into its structured dump
    pub fn structured<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Dumped::Structured(v),
            Err(e) => Dumped::Plain(Value::String(format!("<unserializable: {}>", e))),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Dumped::Structured(v) | Dumped::Plain(v) => v,
            Dumped::Dict(map) => Value::Object(map),
        }
    }
}

/// Anything an engine hands back to the adapter
pub trait EngineRecord {
    fn dump(&self) -> Dumped;
}

impl EngineRecord for Value {
    fn dump(&self) -> Dumped {
        Dumped::Plain(self.clone())
    }
}

/// Plain serializable form of an engine record
pub fn normalize<R: EngineRecord + ?Sized>(record: &R) -> Value {
    record.dump().into_value()
}

/// Plain serializable form of a sequence of records, order preserved
pub fn normalize_all<R: EngineRecord>(records: &[R]) -> Vec<Value> {
    records.iter().map(|r| normalize(r)).collect()
}

/// An astrology engine: pure functions from birth data to chart data
///
/// Every call receives the sandbox it runs in; engines that need scratch or
/// cache space must use it instead of process-wide paths.
pub trait AstrologyEngine {
    type Subject: EngineRecord;
    type Aspect: EngineRecord;

    fn build_subject(
        &self,
        request: &SubjectRequest,
        sandbox: &SandboxContext,
    ) -> Result<Self::Subject, ChartError>;

    fn natal_aspects(
        &self,
        subject: &Self::Subject,
        sandbox: &SandboxContext,
    ) -> Result<Vec<Self::Aspect>, ChartError>;

    fn synastry_aspects(
        &self,
        first: &Self::Subject,
        second: &Self::Subject,
        sandbox: &SandboxContext,
    ) -> Result<Vec<Self::Aspect>, ChartError>;

    /// Midpoint composite of two subjects, named `name`
    fn composite(
        &self,
        first: &Self::Subject,
        second: &Self::Subject,
        name: &str,
        sandbox: &SandboxContext,
    ) -> Result<Self::Subject, ChartError>;
}
