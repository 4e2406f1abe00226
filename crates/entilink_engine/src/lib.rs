//! # entilink engine
//!
//! Transaction engine for the entilink client.
//!
//! This crate provides:
//! - `Transport`, the abstraction over the network layer, with a
//!   scriptable `MockTransport` and an in-process `LoopbackStore`
//! - `TransactionFlags` controlling strictness, name uniqueness and
//!   error raising per transaction
//! - `EntityClient`, the executor running retrieve/insert/update/delete
//!   over a transport and merging responses back into the caller's
//!   container
//!
//! ## Architecture
//!
//! The engine owns the transaction lifecycle and nothing else: the entity
//! model lives in `entilink_model`, the payload codec in `entilink_wire`.
//! A write transaction clears stale server messages, linearizes the
//! container (temporary ids plus correlation ids), sends it, merges the
//! response via the four-pass sync and finally raises structured failures
//! from any response error messages. Oversize retrieves are bisected
//! transparently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod executor;
mod flags;
mod loopback;
mod transport;

pub use error::{EngineError, EngineResult};
pub use executor::EntityClient;
pub use flags::TransactionFlags;
pub use loopback::LoopbackStore;
pub use transport::{MockTransport, RetrieveRequest, Transport};
