//! Studygate - AI mediation gateway for a study-assistant application
//!
//! This crate provides the gateway that turns user requests (chat,
//! summarize, analyze, quiz generation, web-augmented chat) into reliable
//! results despite an unreliable or unconfigured upstream provider,
//! free-form provider output, and a two-tier web acquisition step that can
//! delegate fetching to a companion browser-extension process.

pub mod acquire;
pub mod config;
pub mod error;
pub mod gateway;
pub mod interpret;
pub mod quiz;
pub mod server;

pub use error::StudygateError;
