//! Integration tests for sigx-bot.
//!
//! Drive the orchestrator against a local mock exchange:
//! - REST catalog, set-leverage and order placement
//! - Private stream login, subscription and order pushes

pub mod common;
