//! services/app/src/lib.rs
//!
//! Client logic for the empathy app: configuration, the adapters behind the
//! core ports, the API gateway and the per-screen controllers.

pub mod adapters;
pub mod config;
pub mod error;
pub mod gateway;
pub mod screens;

#[cfg(test)]
mod test_support;
