//! Room credential handling

pub mod credential;

pub use credential::{digest, Digest};
