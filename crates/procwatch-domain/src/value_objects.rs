//! Value objects representing immutable domain concepts

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new random identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Access the underlying UUID
            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Automated process identifier
    ProcessId
);
uuid_id!(
    /// Execution run identifier
    ExecutionId
);
uuid_id!(
    /// Process monitor identifier
    MonitorId
);
uuid_id!(
    /// Alert identifier
    AlertId
);

/// The authenticated caller, as forwarded by the upstream auth layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Actor used when no user context was forwarded
    pub fn system() -> Self {
        Self::new("system", None)
    }
}
