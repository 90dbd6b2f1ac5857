//! TRAINER — Autonomous training-submission agent
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod captcha;
pub mod catalog;
pub mod config;
pub mod cycle;
pub mod identity;
pub mod rotation;
pub mod runner;
pub mod session;
pub mod shutdown;
pub mod types;
