//! City weather TUI
//!
//! This library exposes the app's modules for testing.

pub mod action;
pub mod api;
pub mod components;
pub mod config;
pub mod effect;
pub mod icons;
pub mod logging;
pub mod reducer;
pub mod retry;
pub mod state;
