//! Public client API

pub mod client;

pub use client::LrqClient;
