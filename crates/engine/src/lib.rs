//! Taleforge Engine library.
//!
//! Server-side code for the Taleforge interactive fiction engine.
//!
//! ## Structure
//!
//! - `use_cases/` - Scene pipeline, speculative prefetch and the story state machine
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures shared by unit tests across modules.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
