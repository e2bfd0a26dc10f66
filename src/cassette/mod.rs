//! Cassette format for recording and replaying port interactions.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
