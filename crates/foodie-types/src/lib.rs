//! foodie-types: domain model and repository ports shared by every crate.

pub mod domain;
pub mod ports;
