//! # Lifecycle Events
//!
//! Broadcast channel carrying pipeline lifecycle signals to in-process
//! observers. Event names live in [`crate::constants::events`].

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
