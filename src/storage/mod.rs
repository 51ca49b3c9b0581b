//! Storage abstractions for state kept between runs.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── domains.json          # Last discovery result (cache snapshot)
//! └── session.json          # Remembered account and last location
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DomainSnapshot, SavedSession};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last domain list, if one was saved.
    async fn load_domains(&self) -> Result<Option<DomainSnapshot>>;

    async fn save_domains(&self, snapshot: &DomainSnapshot) -> Result<()>;

    /// Load the remembered session; a missing file yields the default.
    async fn load_session(&self) -> Result<SavedSession>;

    async fn save_session(&self, session: &SavedSession) -> Result<()>;
}
