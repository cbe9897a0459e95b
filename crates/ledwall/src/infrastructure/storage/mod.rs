//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the wall's TOML file, applies defaults for
//! the optional sections, and turns the `[matrix]` section into a validated
//! [`ledwall_core::PanelLayout`].

pub mod config;
