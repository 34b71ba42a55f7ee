//! Strongly-typed ID types for domain entities.
//!
//! Rows minted by this worker and by the provisioning flow use ULID
//! (Universally Unique Lexicographically Sortable Identifier) format,
//! providing both uniqueness and temporal ordering. The remote-user
//! identifier is the messaging network's own numeric id and is wrapped
//! separately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Creates an ID from a ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Try with prefix first
                let prefix_with_underscore = concat!($prefix, "_");
                let ulid_str = if let Some(stripped) = s.strip_prefix(prefix_with_underscore) {
                    stripped
                } else {
                    // Try parsing as raw ULID
                    s
                };

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }

        impl From<$name> for Ulid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a platform user who owns accounts.
    UserId,
    "usr"
);

define_id!(
    /// Unique identifier for a messaging-network account.
    AccountId,
    "acct"
);

define_id!(
    /// Unique identifier for a persona configuration.
    PersonaId,
    "prs"
);

define_id!(
    /// Unique identifier for a conversation with a remote user.
    ConversationId,
    "conv"
);

define_id!(
    /// Unique identifier for a payment notification.
    PaymentNotificationId,
    "payn"
);

/// The messaging network's numeric identifier for a remote user.
///
/// Unlike the ULID-backed ids above this value is assigned by the network,
/// not by us, and is stored as a 64-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteUserId(i64);

impl RemoteUserId {
    /// Creates a remote-user id from the network's numeric id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RemoteUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RemoteUserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RemoteUserId> for i64 {
    fn from(id: RemoteUserId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_display_format() {
        let id = AccountId::new();
        let display = id.to_string();
        assert!(display.starts_with("acct_"));
    }

    #[test]
    fn conversation_id_display_format() {
        let id = ConversationId::new();
        let display = id.to_string();
        assert!(display.starts_with("conv_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = PaymentNotificationId::new();
        let display = id.to_string();
        let parsed: PaymentNotificationId = display.parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let ulid = Ulid::new();
        let id: PersonaId = ulid.to_string().parse().expect("should parse");
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parse_invalid_ulid() {
        let result: Result<AccountId, _> = "not_a_ulid".parse();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "AccountId");
    }

    #[test]
    fn id_equality() {
        let ulid = Ulid::new();
        let id1 = AccountId::from_ulid(ulid);
        let id2 = AccountId::from_ulid(ulid);
        assert_eq!(id1, id2);
    }

    #[test]
    fn id_hash() {
        use std::collections::HashSet;

        let id1 = AccountId::new();
        let id2 = AccountId::new();

        let mut set = HashSet::new();
        set.insert(id1);
        set.insert(id2);
        set.insert(id1); // duplicate

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = ConversationId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: ConversationId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }

    #[test]
    fn remote_user_id_roundtrip() {
        let id = RemoteUserId::new(987_654_321);
        assert_eq!(id.as_i64(), 987_654_321);
        assert_eq!(id.to_string(), "987654321");
        assert_eq!(RemoteUserId::from(987_654_321_i64), id);
    }
}
