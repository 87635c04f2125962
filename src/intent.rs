//! Intent data model and resource profile extraction
//!
//! An intent is an opaque signed payload plus the resource profile derived
//! from its decoded actions: the resource kinds it gives up and the kinds it
//! wants in return. The profile is derived once when the intent is first
//! observed; intents are immutable after admission.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// One resource line item moved by an action: a unit label and an amount.
///
/// Two line items are interchangeable when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKind {
    /// Unit label (token symbol or resource kind address)
    pub label: String,
    /// Amount of the unit moved
    pub quantity: u64,
}

/// One decoded action from an intent, as delivered by the node's event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    /// Resources consumed by this action
    #[serde(default)]
    pub consumed: Vec<ResourceKind>,
    /// Resources created by this action
    #[serde(default)]
    pub created: Vec<ResourceKind>,
}

/// The want/give profile of a single intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceProfile {
    /// Resource kinds created across all actions (what the intent wants to receive)
    pub wants: HashSet<ResourceKind>,
    /// Resource kinds consumed across all actions (what the intent gives up)
    pub gives: HashSet<ResourceKind>,
}

impl ResourceProfile {
    /// Derive a profile from an intent's decoded action list.
    ///
    /// `gives` aggregates every action's consumed line items, `wants` the
    /// created ones. Malformed notifications are rejected at the feed
    /// boundary; this is a total function over well-formed input.
    pub fn from_actions(actions: &[ActionData]) -> Self {
        let mut wants = HashSet::new();
        let mut gives = HashSet::new();
        for action in actions {
            gives.extend(action.consumed.iter().cloned());
            wants.extend(action.created.iter().cloned());
        }
        Self { wants, gives }
    }
}

/// A pending intent: the encoded payload plus its derived resource profile.
///
/// Identity is the payload bytes (content-addressed); two intents with
/// identical bytes are the same intent. Equality and hashing ignore the
/// profile, which is itself a function of the payload's actions.
#[derive(Debug, Clone)]
pub struct Intent {
    payload: Vec<u8>,
    profile: ResourceProfile,
}

impl Intent {
    /// Create an intent from its payload and pre-derived profile.
    pub fn new(payload: Vec<u8>, profile: ResourceProfile) -> Self {
        Self { payload, profile }
    }

    /// Raw payload bytes as published to the node.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The intent's want/give profile.
    pub fn profile(&self) -> &ResourceProfile {
        &self.profile
    }

    /// Sha3-256 digest of the payload.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(&self.payload);
        hasher.finalize().into()
    }

    /// Short hex identifier for logging (first 8 digest bytes).
    pub fn short_id(&self) -> String {
        hex::encode(&self.digest()[..8])
    }
}

impl PartialEq for Intent {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl Eq for Intent {}

impl Hash for Intent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(label: &str, quantity: u64) -> ResourceKind {
        ResourceKind {
            label: label.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_profile_aggregates_across_actions() {
        let actions = vec![
            ActionData {
                consumed: vec![kind("x", 1)],
                created: vec![kind("y", 2)],
            },
            ActionData {
                consumed: vec![kind("z", 3)],
                created: vec![kind("y", 2)],
            },
        ];

        let profile = ResourceProfile::from_actions(&actions);
        assert_eq!(profile.gives.len(), 2);
        assert!(profile.gives.contains(&kind("x", 1)));
        assert!(profile.gives.contains(&kind("z", 3)));
        // duplicate created item collapses into one set entry
        assert_eq!(profile.wants.len(), 1);
        assert!(profile.wants.contains(&kind("y", 2)));
    }

    #[test]
    fn test_profile_of_empty_action_list() {
        let profile = ResourceProfile::from_actions(&[]);
        assert!(profile.wants.is_empty());
        assert!(profile.gives.is_empty());
    }

    #[test]
    fn test_intent_identity_is_payload_only() {
        let a = Intent::new(b"payload".to_vec(), ResourceProfile::default());
        let b = Intent::new(
            b"payload".to_vec(),
            ResourceProfile::from_actions(&[ActionData {
                consumed: vec![kind("x", 1)],
                created: vec![],
            }]),
        );
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());

        let c = Intent::new(b"other".to_vec(), ResourceProfile::default());
        assert_ne!(a, c);
    }
}
