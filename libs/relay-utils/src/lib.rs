#![forbid(unsafe_code)]

//! Config helpers shared by the relay crates.

pub mod humantime_serde;
mod secret_string;

pub use secret_string::SecretString;
