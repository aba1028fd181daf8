//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, random tokens, Base64)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Client identification (IP / User-Agent extraction)
//! - Key-value session store (in-memory, optional Redis backend)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod kv;
pub mod password;
