use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}': expected one of {}", .expected.join(", "))]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
    pub expected: Vec<&'static str>,
}

/// Declares a closed set of upper-case string states with the conversions
/// every record column needs: `FromStr`, `Display`, serde and SQLite TEXT.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == normalized)
                    .ok_or_else(|| ParseStatusError {
                        kind: $kind,
                        value: value.to_string(),
                        expected: $name::ALL.iter().map(|item| item.as_str()).collect(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                $name::from_str(&raw).map_err(serde::de::Error::custom)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                $name::from_str(raw).map_err(|err| FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

text_enum! {
    /// ARCHIVED is only ever set by the user.
    GoalStatus, "goal status" {
        #[default]
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Archived => "ARCHIVED",
    }
}

text_enum! {
    MilestoneStatus, "milestone status" {
        #[default]
        Active => "ACTIVE",
        Completed => "COMPLETED",
    }
}

text_enum! {
    /// OVERDUE is set externally; rollups never enter or leave it.
    TaskStatus, "task status" {
        #[default]
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Overdue => "OVERDUE",
    }
}

text_enum! {
    Priority, "priority" {
        Low => "LOW",
        #[default]
        Medium => "MEDIUM",
        High => "HIGH",
    }
}
