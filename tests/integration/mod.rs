//! Integration tests for the coursegen orchestrator

mod config_integration;
mod test_utils;
mod workflow_cancellation;
mod xdg_config;
