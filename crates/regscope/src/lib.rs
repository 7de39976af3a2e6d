//! Regulatory applicability engine: decides which federal, state, and city rules
//! apply to a described business.

pub mod config;
pub mod error;
pub mod matching;
pub mod telemetry;
