//! Enumerated entity fields.
//!
//! Every enumeration is persisted and serialized as its literal snake_case
//! string. Parsing is strict: anything outside the set is a
//! [`ValidationError::InvalidEnumValue`].

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

macro_rules! literal_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $literal:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted literal, in declaration order.
            pub const LITERALS: &'static [&'static str] = &[$($literal),+];

            /// Returns the persisted literal for this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $literal),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($literal => Ok(Self::$variant),)+
                    other => Err(ValidationError::InvalidEnumValue {
                        field: $field,
                        value: other.to_string(),
                        expected: Self::LITERALS,
                    }),
                }
            }
        }
    };
}

literal_enum! {
    /// Project lifecycle state.
    ProjectStatus, field = "status" {
        #[default]
        Active => "active",
        Planning => "planning",
        OnHold => "on_hold",
        Completed => "completed",
        Archived => "archived",
    }
}

literal_enum! {
    /// Kind of work a task represents.
    TaskType, field = "type" {
        #[default]
        General => "general",
        Chore => "chore",
        Investigation => "investigation",
        Feature => "feature",
        Bugfix => "bugfix",
    }
}

literal_enum! {
    /// Task lifecycle state.
    TaskStatus, field = "status" {
        #[default]
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
    }
}

literal_enum! {
    TaskPriority, field = "priority" {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

literal_enum! {
    /// Problem lifecycle state.
    ProblemStatus, field = "status" {
        #[default]
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Blocked => "blocked",
    }
}

literal_enum! {
    /// Outcome lifecycle state.
    OutcomeStatus, field = "status" {
        #[default]
        Open => "open",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
    }
}

literal_enum! {
    /// Horizon or nature of a goal.
    GoalType, field = "type" {
        #[default]
        ShortTerm => "short_term",
        Career => "career",
        Values => "values",
        Requirement => "requirement",
    }
}

#[cfg(test)]
mod tests {
    use super::{GoalType, ProjectStatus, TaskPriority, TaskStatus, TaskType};
    use crate::model::validation::ValidationError;

    #[test]
    fn literals_parse_back_to_their_variant() {
        for literal in ProjectStatus::LITERALS {
            let parsed: ProjectStatus = literal.parse().unwrap();
            assert_eq!(parsed.as_str(), *literal);
        }
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("short_term".parse::<GoalType>().unwrap(), GoalType::ShortTerm);
    }

    #[test]
    fn parsing_is_case_sensitive_and_strict() {
        let err = "Pending".parse::<TaskStatus>().unwrap_err();
        match err {
            ValidationError::InvalidEnumValue {
                field,
                value,
                expected,
            } => {
                assert_eq!(field, "status");
                assert_eq!(value, "Pending");
                assert_eq!(expected, TaskStatus::LITERALS);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!("critical".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        assert_eq!(TaskType::default(), TaskType::General);
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(GoalType::default(), GoalType::ShortTerm);
    }

    #[test]
    fn serde_uses_literal_strings() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
