//! Serving a variant: key resolution, song sampling, clip window.

pub mod clip;
mod error;
mod service;

pub use clip::{compute_window, ClipTier, ClipTiers, ClipWindow};
pub use error::PlayError;
pub use service::{
    ClipResult, PlayService, PlaySnapshot, SnapshotHandle, SnapshotRefresher,
};
