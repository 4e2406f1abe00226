//! # entilink model
//!
//! In-memory entity model for the entilink client.
//!
//! This crate provides:
//! - `Entity` with its ordered property list, parent set and messages
//! - `Acl` access control resolution with priority overrides
//! - `Container` with the transaction synchronization and linearization
//!   algorithms
//! - Structured transaction-error aggregation
//!
//! ## Architecture
//!
//! Everything in this crate is a plain owned data structure; no I/O happens
//! here. A caller builds and mutates entities, collects them in a
//! [`Container`], and hands the container to the transaction engine. After
//! the round trip the engine merges the parsed response back via
//! [`Container::sync_with`] and raises structured failures built by the
//! [`report`] module.
//!
//! ## Key invariants
//!
//! - An entity's permanent id, once assigned, never changes
//! - Temporary ids are strictly negative and unique within a container
//! - An access control item is never simultaneously granted and denied at
//!   the same priority tier
//! - Response entities never alias request entities; merging copies fields

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod acl;
mod container;
mod entity;
mod error;
pub mod report;
mod types;

pub use acl::{Aci, Acl, Permission, Subject};
pub use container::{Container, SyncOptions, SyncReport};
pub use entity::{
    Entity, EntityKey, Message, MessageSet, ParentEntry, ParentSet, PropertyEntry, PropertyList,
};
pub use error::{ModelError, ModelResult};
pub use report::{EntityErrorKind, TransactionError};
pub use types::{Cuid, EntityId, Importance, Inheritance, Role};
