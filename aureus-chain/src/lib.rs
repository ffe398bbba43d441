//! Core Aureus data structures.
//!
//! This crate provides definitions of the core datastructures for the
//! Aureus network: transactions and their canonical serialization,
//! user-issued currencies and their capability rules, and consensus
//! parameters.

#[macro_use]
extern crate serde;

pub mod account;
pub mod block;
pub mod currency;
pub mod error;
pub mod monetary_system;
pub mod parameters;
pub mod primitives;
pub mod serialization;
pub mod transaction;
