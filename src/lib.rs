//! dotsync library
//!
//! Mirrors a configured set of files and directory trees into a single
//! mirror root, keyed by each path's absolute location, and keeps the
//! mirror current from filesystem change notifications.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod mirror;
pub mod observability;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
