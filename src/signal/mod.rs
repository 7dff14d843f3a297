//! Signal assembly and publishing
//!
//! Confirmed moves become immutable [`Signal`]s and leave the engine through a
//! bounded queue to an [`EventSink`].

mod publisher;
mod sink;
mod types;

pub use publisher::{PublisherConfig, SignalPublisher};
pub use sink::{ChannelSink, EventSink, LogSink, PublishError};
pub use types::Signal;
