//! Aureusd: components of an Aureus node.
//!
//! This crate hosts the daemon-side subsystems built on
//! [`aureus_chain`]: the persistent mempool of unconfirmed transactions,
//! the transaction processor that validates and gossips them, and the
//! background workers that keep the mempool consistent with the
//! confirmed chain.

#![forbid(unsafe_code)]

#[macro_use]
extern crate tracing;

pub mod components;

/// A boxed error used at component and task boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
