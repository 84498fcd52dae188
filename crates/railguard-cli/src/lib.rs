//! Railguard CLI - operator tooling for the advisory system.
//!
//! Provides the `railguard-sim` binary: scripted scenario runs against
//! a live server and a polling advisory monitor.

pub mod sim;
