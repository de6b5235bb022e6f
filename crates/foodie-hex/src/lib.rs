//! foodie-hex: hexagonal storefront API library (core services + inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;

pub use foodie_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
