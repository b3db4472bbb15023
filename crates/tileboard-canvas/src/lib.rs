//! The shared canvas store.
//!
//! One [`CanvasStore`] exists per process. Sessions share it behind an
//! `Arc`, write pixels through it, and subscribe to be told whenever any
//! session's write call returns.

pub mod store;

pub use store::{CanvasChanged, CanvasError, CanvasStore, Subscription, SubscriptionId};
