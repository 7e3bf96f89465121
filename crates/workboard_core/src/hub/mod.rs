//! Change notification hub.
//!
//! # Responsibility
//! - Fan "an entity changed" events out to every live subscriber.
//! - Emit periodic heartbeats so consumers can detect severed streams.
//!
//! # Invariants
//! - Decoupled from storage: callers publish after a successful mutation.
//! - Never reports errors to publishers.

pub mod broadcaster;
pub mod event;
pub mod heartbeat;

pub use broadcaster::{
    ChangeHub, PublishReport, SubscriberId, Subscription, DEFAULT_CHANNEL_CAPACITY,
};
pub use event::{change_event_type, ChangeAction, HubMessage, HEARTBEAT_EVENT};
pub use heartbeat::spawn_heartbeat;
