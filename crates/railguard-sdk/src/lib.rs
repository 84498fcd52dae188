//! Railguard SDK - client library for train units, camera gateways and
//! dashboards integrating with the advisory server.

pub mod backoff;
pub mod client;

pub use backoff::Backoff;
pub use client::RailguardClient;
