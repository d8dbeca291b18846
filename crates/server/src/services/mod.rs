//! Business logic services.
//!
//! - `generation` - credit checks, rendering and storage of designs
//! - `media` - rendered image files under the media directory
//! - `publisher` - webhook publishing for social posts
//! - `scheduler` - background task publishing due posts

pub mod generation;
pub mod media;
pub mod publisher;
pub mod scheduler;
