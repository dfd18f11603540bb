//! EVO Common Library
//!
//! This crate provides shared constants and configuration loading utilities
//! for the EVO motion log workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Log sizing limits, tracked-axis count, cycle timing
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! evo = { package = "evo_common", path = "../evo_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use evo_common::consts::{LOG_NUM_AXES, MOTION_LOG_MAX};
//! use evo_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
