use serde::{Deserialize, Serialize};

use super::profile::Profile;

/// Pairwise relationship between two identities, as seen from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    NoRelation,
    Friends,
    RequestSent,
    RequestReceived,
    RequestRejected,
}

impl FriendshipStatus {
    /// Decision table over the three concurrent checks, first match wins.
    pub fn decide(source_follows: bool, dest_follows: bool, dest_rejected: bool) -> Self {
        match (source_follows, dest_follows) {
            (true, true) => FriendshipStatus::Friends,
            (true, false) => FriendshipStatus::RequestSent,
            (false, true) if dest_rejected => FriendshipStatus::RequestRejected,
            (false, true) => FriendshipStatus::RequestReceived,
            (false, false) => FriendshipStatus::NoRelation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::NoRelation => "no_relation",
            FriendshipStatus::Friends => "friends",
            FriendshipStatus::RequestSent => "request_sent",
            FriendshipStatus::RequestReceived => "request_received",
            FriendshipStatus::RequestRejected => "request_rejected",
        }
    }
}

/// Which bucket of [`FriendLists`] an identity falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Friend,
    RequestSent,
    RequestReceived,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendLists {
    pub friends: Vec<Profile>,
    pub requests_sent: Vec<Profile>,
    pub requests_received: Vec<Profile>,
}

impl FriendLists {
    pub fn push(&mut self, connection: Connection, profile: Profile) {
        match connection {
            Connection::Friend => self.friends.push(profile),
            Connection::RequestSent => self.requests_sent.push(profile),
            Connection::RequestReceived => self.requests_received.push(profile),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty() && self.requests_sent.is_empty() && self.requests_received.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        assert_eq!(FriendshipStatus::decide(true, true, false), FriendshipStatus::Friends);
        assert_eq!(FriendshipStatus::decide(true, true, true), FriendshipStatus::Friends);
        assert_eq!(FriendshipStatus::decide(true, false, true), FriendshipStatus::RequestSent);
        assert_eq!(FriendshipStatus::decide(false, true, true), FriendshipStatus::RequestRejected);
        assert_eq!(FriendshipStatus::decide(false, true, false), FriendshipStatus::RequestReceived);
        assert_eq!(FriendshipStatus::decide(false, false, true), FriendshipStatus::NoRelation);
    }

    #[test]
    fn test_status_wire_names() {
        for status in [
            FriendshipStatus::NoRelation,
            FriendshipStatus::Friends,
            FriendshipStatus::RequestSent,
            FriendshipStatus::RequestReceived,
            FriendshipStatus::RequestRejected,
        ] {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().to_string())
            );
        }
    }
}
