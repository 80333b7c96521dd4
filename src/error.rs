//! Failures of chart computations

use std::backtrace::{Backtrace, BacktraceStatus};

use thiserror::Error;

/// Anything that can go wrong while computing a chart
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(
        "could not find geographic data for city '{city}' ({nation}); \
         provide latitude/longitude or check the city name. Original error: {reason}"
    )]
    LocationNotFound {
        city: String,
        nation: String,
        reason: String,
    },

    /// The engine was asked to place a subject with no coordinate and has no geocoder
    #[error("no coordinates available for '{0}' and the engine has no city lookup")]
    NoCoordinates(String),

    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("no timezone for {0}; pass tz_str as an IANA zone such as America/New_York")]
    MissingTimezone(String),

    #[error("unknown sidereal mode '{0}'")]
    UnknownSiderealMode(String),

    #[error("Swiss Ephemeris error: {0}")]
    Ephemeris(String),

    #[error("sandbox setup failed: {0}")]
    Sandbox(#[from] std::io::Error),

    #[error("{0}")]
    Panic(String),
}

impl ChartError {
    /// Stable name reported as `error_type`
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::InvalidArguments(_) => "InvalidArguments",
            ChartError::LocationNotFound { .. } => "LocationNotFound",
            ChartError::NoCoordinates(_) => "NoCoordinates",
            ChartError::InvalidDateTime(_) => "InvalidDateTime",
            ChartError::InvalidTimezone(_) => "InvalidTimezone",
            ChartError::MissingTimezone(_) => "MissingTimezone",
            ChartError::UnknownSiderealMode(_) => "UnknownSiderealMode",
            ChartError::Ephemeris(_) => "Ephemeris",
            ChartError::Sandbox(_) => "Sandbox",
            ChartError::Panic(_) => "Panic",
        }
    }

    /// Error chain plus a backtrace when `RUST_BACKTRACE` enables one
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.kind(), self)];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            lines.push(format!("caused by: {}", err));
            source = err.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            lines.push(backtrace.to_string());
        }
        lines.join("\n")
    }

    /// Convert a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        ChartError::Panic(message)
    }
}
