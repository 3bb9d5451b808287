//! Dashboard core: section state, request orchestration, normalization,
//! analytics shaping and the in-memory credential store.
//!
//! Follows an Elm-style split: [`model`] holds state, [`update::update`] is
//! the pure transition function, and [`orchestrator`] performs the backend
//! I/O that `update` asks for via [`model::DashboardCmd`].

pub mod analytics;
pub mod controller;
pub mod credentials;
#[cfg(feature = "cli")]
pub mod input;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod render;
#[cfg(feature = "cli")]
pub mod runtime;
pub mod update;

pub use controller::{DashboardController, DashboardSnapshot};
pub use model::{DashboardCmd, DashboardModel, DashboardMsg, FidelityMode, Outcome, Section};
pub use orchestrator::{Completion, OperationError, Request, RequestOrchestrator};
