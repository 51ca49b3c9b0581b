//! Client-side pipelines over the directory services.
//!
//! - `DomainDiscovery`: fetch, filter and cache the destinations list
//! - `ConnectionsList`: people list with optimistic friend toggling

pub mod cache;
pub mod connections;
pub mod discovery;
pub mod filter;

pub use cache::DomainCache;
pub use connections::{ConnectionEntry, ConnectionsList, PendingToggle};
pub use discovery::DomainDiscovery;
