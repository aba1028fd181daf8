//! Domain layer: pure authentication and session types

pub mod credentials;
pub mod directory;
pub mod login_attempts;
pub mod principal;
pub mod session_record;
