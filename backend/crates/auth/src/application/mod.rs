//! Application layer: use cases and services

pub mod authenticate;
pub mod config;
pub mod guard;
pub mod login;
pub mod session_registry;
pub mod token;
