//! Dead-link-aware search core for licensed creative works, plus the thin
//! HTTP API that exposes it.

pub mod api;
pub mod attribution;
pub mod catalog;
pub mod config;
pub mod index;
pub mod licenses;
pub mod liveness;
pub mod o11y;
pub mod routes;
pub mod search;
