//! Cache invalidation for object-store backed CloudFront distributions
//!
//! Consumes queue batches of S3 change notifications, translates the changed
//! keys into CloudFront invalidation paths, collapses them into as few paths
//! as is safe, and submits one invalidation per batch with bounded retry. The
//! result names the queue messages that must be redelivered.

pub mod app;
pub mod cdn;
pub mod error;
pub mod models;
pub mod optimize;
pub mod submitter;
pub mod translate;

pub use error::{Error, Result};
