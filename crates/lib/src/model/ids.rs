//! Typed identifiers.
//!
//! All ids are UUIDs on the wire. The newtypes keep a task id from being
//! passed where a list id is expected.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ModelError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifies a board.
    BoardId,
    "board ID"
);
define_id!(
    /// Identifies a list (a column of tasks).
    ListId,
    "list ID"
);
define_id!(
    /// Identifies a task.
    TaskId,
    "task ID"
);
define_id!(
    /// Identifies a user, as produced by the authentication gate.
    UserId,
    "user ID"
);
define_id!(
    /// Identifies an activity log entry.
    ActivityId,
    "activity ID"
);
