//! Tool catalog and the clock tool

use std::sync::Arc;

use chrono::{Datelike, Local, Timelike};
use rmcp::{
    model::Tool,
    schemars::{self, schema_for},
};
use serde_json::{json, Value};

use crate::models::{BirthSpec, Outcome, PairInput};

pub const GET_CURRENT_TIME: &str = "get_current_time";
pub const CREATE_ASTROLOGICAL_SUBJECT: &str = "create_astrological_subject";
pub const GET_NATAL_ASPECTS: &str = "get_natal_aspects";
pub const GET_SYNASTRY_ASPECTS: &str = "get_synastry_aspects";
pub const CREATE_COMPOSITE_CHART: &str = "create_composite_chart";

/// The tools this server can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    CurrentTime,
    Subject,
    NatalAspects,
    SynastryAspects,
    CompositeChart,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::CurrentTime,
        ToolKind::Subject,
        ToolKind::NatalAspects,
        ToolKind::SynastryAspects,
        ToolKind::CompositeChart,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::CurrentTime => GET_CURRENT_TIME,
            ToolKind::Subject => CREATE_ASTROLOGICAL_SUBJECT,
            ToolKind::NatalAspects => GET_NATAL_ASPECTS,
            ToolKind::SynastryAspects => GET_SYNASTRY_ASPECTS,
            ToolKind::CompositeChart => CREATE_COMPOSITE_CHART,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ToolKind::CurrentTime => {
                "Get the current system time broken down into date and time fields, weekday and Unix timestamp."
            }
            ToolKind::Subject => {
                "Create an astrological subject and return its full chart data, including planets and houses. \
                 Chinese cities are located through the built-in gazetteer; elsewhere pass latitude/longitude."
            }
            ToolKind::NatalAspects => {
                "Get the natal aspects of one chart: the angular relationships between its planets and angles."
            }
            ToolKind::SynastryAspects => {
                "Get synastry aspects between two people's charts, comparing every point of one chart with the other."
            }
            ToolKind::CompositeChart => {
                "Create a midpoint composite chart from two people's birth data, used to analyse the relationship."
            }
        }
    }

    fn input_schema(&self) -> Arc<serde_json::Map<String, Value>> {
        match self {
            ToolKind::CurrentTime => empty_schema(),
            ToolKind::Subject | ToolKind::NatalAspects => schema_to_value::<BirthSpec>(),
            ToolKind::SynastryAspects | ToolKind::CompositeChart => schema_to_value::<PairInput>(),
        }
    }

    pub fn descriptor(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.input_schema())
    }
}

fn schema_to_value<T: schemars::JsonSchema>() -> Arc<serde_json::Map<String, Value>> {
    let schema = schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => Arc::new(map),
        Ok(_) | Err(_) => empty_schema(),
    }
}

fn empty_schema() -> Arc<serde_json::Map<String, Value>> {
    let mut map = serde_json::Map::new();
    map.insert("type".into(), Value::String("object".into()));
    map.insert("properties".into(), Value::Object(serde_json::Map::new()));
    Arc::new(map)
}

/// Descriptors for `tools/list`, in catalog order
pub fn tool_catalog() -> Vec<Tool> {
    ToolKind::ALL.iter().map(ToolKind::descriptor).collect()
}

const WEEKDAYS_CN: [&str; 7] = ["星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日"];

/// `get_current_time`: the local wall clock, decomposed
pub fn current_time() -> Outcome {
    let now = Local::now();
    Outcome::ok(json!({
        "year": now.year(),
        "month": now.month(),
        "day": now.day(),
        "hour": now.hour(),
        "minute": now.minute(),
        "second": now.second(),
        "datetime_str": now.format("%Y-%m-%d %H:%M:%S").to_string(),
        "weekday": now.format("%A").to_string(),
        "weekday_cn": WEEKDAYS_CN[now.weekday().num_days_from_monday() as usize],
        "timestamp": now.timestamp(),
    }))
}
