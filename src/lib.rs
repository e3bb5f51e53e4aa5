//! Zaplinker - WhatsApp link tracker
//!
//! Short links that redirect to a WhatsApp chat with a pre-filled message, an optional
//! lead-capture interstitial ("ghost mode"), and per-user click/lead analytics.
//!
//! # Architecture
//! - `api`: HTTP handlers, middleware and session tokens
//! - `services`: link management, lead capture, analytics aggregation
//! - `storage`: SeaORM-backed persistence (SQLite / PostgreSQL / MySQL)
//! - `utils`: WhatsApp URL rendering, UTM/device/IP helpers
//! - `interfaces`: management CLI
//! - `config`: configuration loading
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
