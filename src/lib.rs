//! ticketboard - ticket metrics dashboard core for GLPI helpdesks
//!
//! This library provides a caching, retrying API client with request
//! telemetry, a reducer-driven state store and the orchestration that ties
//! them together.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod monitor;
pub mod storage;
pub mod store;
