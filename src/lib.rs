//! Astrolabe - Astrology MCP Server
//!
//! A Model Context Protocol server speaking line-delimited JSON-RPC over stdio,
//! computing natal charts, natal and synastry aspects, and composite charts
//! with the Swiss Ephemeris library.

pub mod chart;
pub mod config;
pub mod engine;
pub mod ephemeris;
pub mod error;
pub mod gazetteer;
pub mod models;
pub mod sandbox;
pub mod server;

pub use chart::ChartService;
pub use config::ServerConfig;
pub use engine::{AstrologyEngine, SwissEngine};
pub use error::ChartError;
pub use server::AstrolabeServer;
