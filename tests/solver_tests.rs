//! Solver behavior tests
//!
//! Drive the solver against a scripted composition client and check pool
//! mutation and call accounting for each outcome.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use intent_solver::{
    ActionData, ComposeOutcome, CompositionApi, NodeAck, NodeEvent, ResourceKind, SearchStrategy,
    Solver,
};

// ============================================================================
// SCRIPTED CLIENT
// ============================================================================

/// Composition client with scripted outcomes and recorded calls.
///
/// A candidate composes successfully when its payload set equals one of the
/// `accepts` entries; the composed transaction is the payloads joined with
/// `+` in call order.
struct ScriptedClient {
    compose_calls: Mutex<Vec<Vec<Vec<u8>>>>,
    verify_calls: Mutex<Vec<Vec<u8>>>,
    submit_calls: Mutex<Vec<Vec<u8>>>,
    accepts: Vec<HashSet<Vec<u8>>>,
    verifier_verdict: bool,
    submit_ack: NodeAck,
}

impl ScriptedClient {
    fn drain_compose_calls(&self) -> Vec<Vec<Vec<u8>>> {
        std::mem::take(&mut self.compose_calls.lock().unwrap())
    }

    fn compose_call_count(&self) -> usize {
        self.compose_calls.lock().unwrap().len()
    }

    fn verify_call_count(&self) -> usize {
        self.verify_calls.lock().unwrap().len()
    }

    fn submitted(&self) -> Vec<Vec<u8>> {
        self.submit_calls.lock().unwrap().clone()
    }
}

/// Build a scripted client accepting the given payload sets.
fn scripted(accepts: &[&[&str]]) -> ScriptedClient {
    ScriptedClient {
        compose_calls: Mutex::new(Vec::new()),
        verify_calls: Mutex::new(Vec::new()),
        submit_calls: Mutex::new(Vec::new()),
        accepts: accepts
            .iter()
            .map(|set| set.iter().map(|p| p.as_bytes().to_vec()).collect())
            .collect(),
        verifier_verdict: true,
        submit_ack: NodeAck::Accepted {
            message: "transaction added".to_string(),
        },
    }
}

impl CompositionApi for &ScriptedClient {
    fn compose(&self, intents: &[Vec<u8>]) -> Result<ComposeOutcome> {
        self.compose_calls.lock().unwrap().push(intents.to_vec());

        let candidate: HashSet<Vec<u8>> = intents.iter().cloned().collect();
        if self.accepts.iter().any(|set| *set == candidate) {
            Ok(ComposeOutcome::Composed(intents.join(&b'+')))
        } else {
            Ok(ComposeOutcome::Rejected {
                error: "failed to compose the transactions. are all transactions valid?"
                    .to_string(),
                reason: "no balanced match".to_string(),
            })
        }
    }

    fn verify(&self, transaction: &[u8]) -> Result<bool> {
        self.verify_calls.lock().unwrap().push(transaction.to_vec());
        Ok(self.verifier_verdict)
    }

    fn submit(&self, transaction: &[u8]) -> Result<NodeAck> {
        self.submit_calls.lock().unwrap().push(transaction.to_vec());
        Ok(self.submit_ack.clone())
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn kind(label: &str, quantity: u64) -> ResourceKind {
    ResourceKind {
        label: label.to_string(),
        quantity,
    }
}

/// Build an intent-added event with a single action moving the given kinds.
fn intent_added(payload: &str, wants: &[(&str, u64)], gives: &[(&str, u64)]) -> NodeEvent {
    NodeEvent::IntentAdded {
        payload: payload.as_bytes().to_vec(),
        actions: vec![ActionData {
            consumed: gives.iter().map(|(l, q)| kind(l, *q)).collect(),
            created: wants.iter().map(|(l, q)| kind(l, *q)).collect(),
        }],
    }
}

// ============================================================================
// SOLVE SCENARIOS
// ============================================================================

/// What is tested: two complementary intents compose, verify, submit once,
/// and empty the pool
/// Why: the core happy path of the matching engine
#[test]
fn test_complementary_pair_is_solved_and_submitted_once() {
    let client = scripted(&[&["A", "B"]]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    let solved = solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    assert_eq!(solved, 0);
    assert_eq!(solver.pool().len(), 1);
    assert_eq!(client.compose_call_count(), 0);

    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));
    assert_eq!(solved, 1);
    assert!(solver.pool().is_empty());
    assert_eq!(client.compose_call_count(), 1);
    assert_eq!(client.submitted(), vec![b"A+B".to_vec()]);
}

/// What is tested: the pairwise strategy solves a complementary pair too
/// Why: both strategies must drive the same composition protocol
#[test]
fn test_complementary_pair_is_solved_in_pairwise_mode() {
    let client = scripted(&[&["A", "B"]]);
    let mut solver = Solver::new(&client, SearchStrategy::Pairwise);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));

    assert_eq!(solved, 1);
    assert!(solver.pool().is_empty());
    assert_eq!(client.submitted().len(), 1);
}

/// What is tested: a non-matching pair never reaches the composer in
/// pairwise mode
/// Why: the match predicate prunes the search before any remote call
#[test]
fn test_non_matching_pair_never_composes_in_pairwise_mode() {
    let client = scripted(&[]);
    let mut solver = Solver::new(&client, SearchStrategy::Pairwise);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    solver.handle_event(intent_added("C", &[("z", 1)], &[("w", 1)]));

    assert_eq!(client.compose_call_count(), 0);
    assert_eq!(solver.pool().len(), 2);
    assert!(client.submitted().is_empty());
}

/// What is tested: subset mode tries every subset of size >= 2 of a
/// three-intent pool, all fail, pool unchanged
/// Why: subset enumeration does not filter by profile and does not prune
#[test]
fn test_subset_mode_tries_all_subsets_of_three() {
    let client = scripted(&[]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    solver.handle_event(intent_added("B", &[("z", 1)], &[("w", 1)]));
    client.drain_compose_calls();

    solver.handle_event(intent_added("C", &[("u", 1)], &[("v", 1)]));

    // the three pairs and the full triple
    let calls = client.drain_compose_calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|candidate| candidate.len() >= 2));
    assert_eq!(solver.pool().len(), 3);
    assert!(client.submitted().is_empty());
}

/// What is tested: a rejected composition leaves the pool unchanged
/// Why: composition failure is expected and must not mutate state
#[test]
fn test_failed_composition_leaves_pool_unchanged() {
    let client = scripted(&[]);
    let mut solver = Solver::new(&client, SearchStrategy::Pairwise);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));

    assert_eq!(solved, 0);
    assert_eq!(client.compose_call_count(), 1);
    assert_eq!(solver.pool().len(), 2);
    assert!(client.submitted().is_empty());
}

/// What is tested: a composed transaction that fails verification is never
/// submitted and the pool is unchanged
/// Why: the verification double-check gates submission even after a
/// reported composer success
#[test]
fn test_verifier_rejection_blocks_submission() {
    let client = ScriptedClient {
        verifier_verdict: false,
        ..scripted(&[&["A", "B"]])
    };
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));

    assert_eq!(solved, 0);
    assert_eq!(client.verify_call_count(), 1);
    assert!(client.submitted().is_empty());
    assert_eq!(solver.pool().len(), 2);
}

/// What is tested: a duplicate notification for a pending intent does not
/// change the pool or trigger composer calls
/// Why: the feed may deliver duplicates
#[test]
fn test_duplicate_intent_notification_is_noop() {
    let client = scripted(&[]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));

    assert_eq!(solver.pool().len(), 1);
    assert_eq!(client.compose_call_count(), 0);
}

/// What is tested: a late notification for an already-solved intent does
/// not re-enter the pool
/// Why: solved intents must never be proposed again
#[test]
fn test_notification_for_solved_intent_is_noop() {
    let client = scripted(&[&["A", "B"]]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));
    assert!(solver.pool().is_empty());
    client.drain_compose_calls();

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));

    assert!(solver.pool().is_empty());
    assert_eq!(client.compose_call_count(), 0);
}

/// What is tested: a rejected submission still retires the members
/// Why: composition success, not network acceptance, is the solved boundary
#[test]
fn test_submission_rejection_still_retires_members() {
    let client = ScriptedClient {
        submit_ack: NodeAck::Rejected {
            error: "failed to add transaction".to_string(),
            reason: "mempool full".to_string(),
        },
        ..scripted(&[&["A", "B"]])
    };
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("A", &[("x", 1)], &[("y", 1)]));
    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));

    assert_eq!(solved, 1);
    assert_eq!(client.submitted().len(), 1);
    assert!(solver.pool().is_empty());
}

/// What is tested: events other than intent-added are discarded without
/// state change
/// Why: the feed carries unrelated notifications
#[test]
fn test_ignored_event_changes_nothing() {
    let client = scripted(&[]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    let solved = solver.handle_event(NodeEvent::Ignored {
        name: "block_committed".to_string(),
    });

    assert_eq!(solved, 0);
    assert!(solver.pool().is_empty());
    assert_eq!(client.compose_call_count(), 0);
}

/// What is tested: after a subset solves mid-pass, later candidates sharing
/// a member are discarded without a composer call
/// Why: a solved intent must not appear in a later candidate of the same pass
#[test]
fn test_stale_candidates_are_discarded_within_a_pass() {
    // {B, C} would also compose, but B is retired by the earlier {A, B}
    let client = scripted(&[&["A", "B"], &["B", "C"]]);
    let mut solver = Solver::new(&client, SearchStrategy::Subset);

    solver.handle_event(intent_added("C", &[("x", 1)], &[("y", 1)]));
    solver.handle_event(intent_added("A", &[("y", 1)], &[("x", 1)]));
    client.drain_compose_calls();

    let solved = solver.handle_event(intent_added("B", &[("y", 1)], &[("x", 1)]));

    assert_eq!(solved, 1);
    let calls = client.drain_compose_calls();
    assert_eq!(calls.len(), 1);
    let composed: HashSet<Vec<u8>> = calls[0].iter().cloned().collect();
    assert_eq!(
        composed,
        [b"A".to_vec(), b"B".to_vec()].into_iter().collect()
    );
    assert_eq!(client.submitted().len(), 1);
    assert_eq!(solver.pool().len(), 1);
}
