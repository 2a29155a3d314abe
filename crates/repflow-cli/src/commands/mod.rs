pub mod config;
pub mod cue;
pub mod plan;
pub mod session;
pub mod stats;
