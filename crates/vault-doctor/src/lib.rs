//! Single-node diagnostics for a Vault-compatible secrets cluster.
//!
//! The pipeline classifies the node from its health endpoint, optionally
//! walks the operator through a quorum unseal, gathers extended diagnostics
//! when the node is unsealed, and renders a report in one of three modes.

pub mod auth;
pub mod checks;
pub mod cli;
pub mod client;
pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod health;
pub mod hints;
pub mod logging;
pub mod medic;
pub mod mode;
pub mod report;
pub mod terminal;
pub mod unseal;
