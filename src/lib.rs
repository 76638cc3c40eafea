//! Library crate for usradmin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote user API seam and adapters (`api`)
//! - Acting-user context and role gating (`auth`)
//! - Configuration file and overrides (`config`)
//! - The user list synchronization core (`controller`)
//! - Error and result types (`error`)
//! - The create/edit form (`form`) and per-row toggles (`row`)
//! - Wire and internal user records (`user`)
//! - Application state, key handling and rendering (`app`, `ui`)
//!
//! It is used by the `usradmin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod row;
pub mod ui;
pub mod user;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, ErrorInfo, Result};
