//! margin-triage - Offline semantic triage for the margin email client
//!
//! Embeds email text, stores one embedding per (email, model), and suggests a
//! destination folder for new mail by similarity-weighted voting among
//! previously filed and user-corrected emails.

pub mod config;
pub mod domain;
pub mod embedding;
pub mod services;
pub mod storage;
pub mod triage;

pub use services::TriageService;
