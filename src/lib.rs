// ABOUTME: Library root for ncdeploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod marker;
pub mod orchestrator;
pub mod output;
pub mod playbook;
pub mod prereq;
pub mod report;
pub mod runner;
pub mod signal;
pub mod state;
