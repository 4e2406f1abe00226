//! # entilink wire
//!
//! Wire payload tree for the entilink client.
//!
//! This crate provides:
//! - `RawElement`, the generic element tree an XML decoder hands over
//! - `NodeTag`, the closed set of element kinds the protocol knows
//! - Typed encoding of containers/entities into elements
//! - Typed decoding of response elements back into containers/entities
//!
//! This is a pure codec crate with no I/O; producing and consuming the
//! actual XML bytes is the transport's job. Decoding is two-phase: the
//! element tag is decoded into a [`NodeTag`] first, then pattern matching
//! builds the corresponding typed node.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decode;
mod element;
mod encode;
mod error;
mod tag;

pub use decode::{container_from_element, entity_from_element};
pub use element::RawElement;
pub use encode::{encode_request, encode_response, entity_to_element};
pub use error::{WireError, WireResult};
pub use tag::NodeTag;
