//! Fluent construction of routing factories
//!
//! [`TlsRoute`] collects the allow-list, protocol, trust and timeout settings
//! and turns them into a [`DispatchingFactory`](tlsroute_client::DispatchingFactory).

pub mod core;
pub mod options;

pub use core::*;
