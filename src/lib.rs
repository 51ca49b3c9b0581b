// src/lib.rs

//! Directory client library
//!
//! Discovers virtual-world domains and social connections from a
//! directory service, and tracks the account session.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod storage;
pub mod utils;
