//! offswitch gateway library
//!
//! A single-purpose power-control gateway: one authenticated HTTP surface
//! that accepts shutdown/reboot/abort requests and shells out to the OS
//! power command.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod power;
pub mod server;
