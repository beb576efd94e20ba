//! The constitution.
//!
//! Amendments are ratified by passed proposals, numbered from 1, and never
//! deleted: a repeal only marks an amendment deprecated so its number is
//! never reused. Each amendment can be put before the judiciary once.

pub mod document;
pub mod engine;
pub mod error;

pub use document::{Article, ConstiDocument};
pub use engine::ConstiEngine;
pub use error::ConstiError;
