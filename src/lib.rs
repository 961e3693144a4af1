//! metalcorr: stock and metal price correlation service.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod settings;
pub mod logging;
pub mod cli;
