//! Formwright - a headless multi-step form and wizard engine
//!
//! Host code owns the rendering; the engine tracks mounted fields, their
//! values and validation state, gates submission, and accumulates the
//! results of multi-step wizards.

pub mod config;
pub mod error;
pub mod forms;

pub use config::EngineConfig;
pub use error::{FormError, Stage};
