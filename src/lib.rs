//! Batchdub - Batch Media Translation Orchestration
//!
//! A Rust implementation of a batch job orchestration engine for media
//! translation: it validates a translate request, explodes it into
//! per-(asset, language) tasks, drives the batch to an external dubbing
//! engine, synthesizes progress feedback while the batch is in flight,
//! and aggregates partial engine output into a normalized result set.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod job;
pub mod language;
pub mod progress;
