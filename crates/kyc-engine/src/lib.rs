//! KYC decision and scoring engine.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod verification;
