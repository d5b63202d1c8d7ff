//! OKR In-Memory Backend
//!
//! Reference implementation of the `okr-dispatch` collaborator traits:
//! - **InMemoryOkrStore**: tenant-isolated tables for every entity family
//! - Case-insensitive title lookup with ambiguity detection
//! - Business-rule validation (parents, dates, progress, membership, roles)
//! - Failure injection via [`InMemoryOkrStore::set_unavailable`]
//!
//! # Example
//!
//! ```rust,ignore
//! use okr_dispatch::{ConversationMemory, IntentDispatcher, Services};
//! use okr_inmem::InMemoryOkrStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryOkrStore::new());
//! let dispatcher = IntentDispatcher::standard(
//!     Services::from_backend(store),
//!     ConversationMemory::default(),
//! )?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod render;
pub mod store;
mod table;

pub use store::InMemoryOkrStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
