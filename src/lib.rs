pub mod alerts;
pub mod common;
pub mod config;
pub mod logging;
pub mod market;
pub mod monitor;
pub mod volume_profile;
