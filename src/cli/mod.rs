//! CLI module for VeganFlow

pub mod app;
pub mod commands;

pub use app::{run_hub, run_vendor, today, ProcurementApp};
pub use commands::{Cli, Commands};
