//! Business services layer.
//!
//! Services sit between the callers (classification, sync, UI glue) and the
//! infrastructure (embedding providers, storage):
//!
//! ```text
//! Callers (classification, filing, corrections)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Embedding, Triage engine, Storage)
//! ```
//!
//! - [`TriageService`]: indexes filed emails and suggests folders for new ones

mod triage_service;

pub use triage_service::TriageService;
