//! Library crate for phrase-buzz-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
