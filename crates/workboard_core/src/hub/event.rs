//! Messages delivered to hub subscribers.

use crate::model::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Event type of the periodic liveness message.
pub const HEARTBEAT_EVENT: &str = "heartbeat";

/// One delivered event: its type plus the payload already serialized to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubMessage {
    pub event: String,
    pub data: String,
    /// Publish time in epoch milliseconds.
    pub sent_at: i64,
}

impl HubMessage {
    /// Renders the message as one `text/event-stream` frame.
    pub fn to_sse_frame(&self) -> String {
        let mut frame = format!("event: {}\n", self.event);
        for line in self.data.lines() {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }
        frame.push('\n');
        frame
    }
}

/// Mutation that produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Linked,
    Unlinked,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Linked => "linked",
            Self::Unlinked => "unlinked",
        }
    }
}

impl Display for ChangeAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event type string for an entity mutation, e.g. `task_note_created`.
pub fn change_event_type(kind: EntityKind, action: ChangeAction) -> String {
    format!("{}_{}", kind.as_str(), action.as_str())
}

#[cfg(test)]
mod tests {
    use super::{change_event_type, ChangeAction, HubMessage};
    use crate::model::EntityKind;

    #[test]
    fn event_types_join_kind_and_action() {
        assert_eq!(
            change_event_type(EntityKind::Task, ChangeAction::Created),
            "task_created"
        );
        assert_eq!(
            change_event_type(EntityKind::Goal, ChangeAction::Unlinked),
            "goal_unlinked"
        );
    }

    #[test]
    fn sse_frame_prefixes_every_data_line() {
        let message = HubMessage {
            event: "project_updated".to_string(),
            data: "{\"id\":1}\n{\"id\":2}".to_string(),
            sent_at: 0,
        };
        assert_eq!(
            message.to_sse_frame(),
            "event: project_updated\ndata: {\"id\":1}\ndata: {\"id\":2}\n\n"
        );
    }
}
