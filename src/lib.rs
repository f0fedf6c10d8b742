// ABOUTME: Library crate for promoting integration objects between platform orgs
// ABOUTME: Exposes the catalog, drivers and orchestrator used by the CLI

pub mod artifact;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod orchestrator;
pub mod poll;
pub mod remote;
pub mod tasks;

pub use context::RunContext;
pub use error::PromoterError;
pub use orchestrator::{ObjectOutcome, ObjectState, Orchestrator, PromotionSettings, RunReport};
