//! Birth-chart insights over a hosted language model.
//!
//! The user's birth details live in a single [`store::ProfileStore`] slot. A
//! [`session::ChatSession`] turns questions into [`wire::InsightRequest`]s and
//! sends them through an [`flows::InsightProvider`], which validates the
//! model's JSON before anything reaches the transcript.

pub mod cli;
pub mod config;
pub mod contact;
pub mod context;
pub mod errors;
pub mod flows;
pub mod log;
pub mod nav;
pub mod onboarding;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod store;
pub mod ux;
pub mod wire;
