//! AdBurst Core - Shared types library.
//!
//! This crate provides the types shared by the AdBurst components:
//! - `server` - JSON API, design generation and rendering
//! - `cli` - Migrations and account administration
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. `sqlx` support for ids and emails is behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Ids, aspect-ratio presets, colours, emails and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
