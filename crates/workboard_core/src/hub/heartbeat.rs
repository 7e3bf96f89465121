//! Periodic liveness events.

use crate::hub::broadcaster::ChangeHub;
use crate::hub::event::HEARTBEAT_EVENT;
use crate::repo::sql::now_epoch_ms;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Serialize)]
struct Heartbeat {
    ts: i64,
    subscribers: usize,
}

/// Spawns a task publishing a heartbeat every `period`.
///
/// The task only holds a weak reference and exits once the hub is dropped;
/// abort the returned handle to stop it earlier. Must be called from inside
/// a Tokio runtime.
pub fn spawn_heartbeat(hub: &Arc<ChangeHub>, period: Duration) -> JoinHandle<()> {
    let hub = Arc::downgrade(hub);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick resolves immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(hub) = hub.upgrade() else {
                debug!("event=hub_heartbeat module=hub status=stopped reason=hub_dropped");
                break;
            };
            hub.publish(
                HEARTBEAT_EVENT,
                &Heartbeat {
                    ts: now_epoch_ms(),
                    subscribers: hub.subscriber_count(),
                },
            );
        }
    })
}
