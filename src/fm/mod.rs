//! Modules for the 4-operator FM synthesis engine.

pub mod algorithms;
pub mod channel;
pub mod envelope;
pub mod operator;
pub mod phase;
