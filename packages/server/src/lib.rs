// B2B Organizations - GraphQL API Core
//
// This crate provides the GraphQL backend managing B2B organizational
// entities (organizations, cost centers, users) on top of external platform
// services. Every field resolution passes through the authorization pipeline
// in common::auth before touching any document-store data.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
