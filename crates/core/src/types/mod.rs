//! Core types for AdBurst.
//!
//! Type-safe wrappers for ids, design presets, colours and stored enums.

pub mod aspect;
pub mod color;
pub mod email;
pub mod id;
pub mod status;

pub use aspect::{AspectRatio, UnknownAspectRatio, Viewport};
pub use color::{ColorError, HexColor};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
