//! Polls Sonarr and Radarr and turns their missing, upcoming and queued items
//! into InfluxDB points.

pub mod classify;
pub mod collector;
pub mod config;
pub mod error;
pub mod hash;
pub mod http;
pub mod influx;
pub mod metrics;
pub mod models;
pub mod radarr;
pub mod schema;
pub mod sonarr;
