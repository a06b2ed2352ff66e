//! # loomq-types
//!
//! Core type definitions for the loomq message broker.
//!
//! This crate is the foundation of the dependency graph -- the broker
//! library and the daemon binary both depend on it. It contains:
//!
//! - **[`error`]** -- [`BrokerError`] and [`CodecError`] error types
//! - **[`envelope`]** -- the [`Envelope`] message unit and its [`MessageKind`]
//! - **[`codec`]** -- the frame-stack wire codec
//! - **[`config`]** -- the broker configuration schema

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;

pub use envelope::{Envelope, MessageKind, ENOSYS, EPROTO};
pub use error::{BrokerError, CodecError, Result};
