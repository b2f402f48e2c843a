//! Durable persistence for sigil signature caches
//!
//! This crate provides:
//! - The [`BlobStore`] byte-store contract with filesystem and in-memory
//!   implementations
//! - [`FileCache`]: the change-aware, file-backed signature cache tier
//!
//! The cache composes the in-memory tier and provenance tracking from
//! `sigil-core` with a lazily-loaded persisted container; `flush` is the
//! only point at which anything touches the blob store.

pub mod blob;
pub mod cache;

pub use blob::{BlobStore, DirBlobStore, MemoryBlobStore};
pub use cache::{FileCache, DEFAULT_IDENTIFIER};
