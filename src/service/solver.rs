//! Solver orchestration
//!
//! Single control loop over the pending intent pool.
//!
//! Flow:
//! 1. **Intent added**: derive the resource profile, insert into the pool.
//! 2. **Matching pass**: enumerate candidate subsets over a pool snapshot
//!    and drive a composition attempt for each one.
//! 3. **Composition attempt**: compose via the node, verify the result,
//!    submit it to the mempool, retire the solved members from the pool.
//!
//! A failure of one candidate never halts the pass; the solver has no error
//! state of its own.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::feed::NodeEvent;
use crate::intent::{Intent, ResourceProfile};
use crate::node_client::{ComposeOutcome, CompositionApi, NodeAck};
use crate::pool::PendingPool;
use crate::search::{candidate_subsets, SearchStrategy};

/// Solver over a pending intent pool.
///
/// Owns the pool outright; all mutation goes through this struct, and the
/// async loop in [`Solver::run`] handles one event to completion before
/// taking the next, so a matching pass always works over a consistent
/// snapshot.
pub struct Solver<C: CompositionApi> {
    /// Not-yet-solved intents
    pool: PendingPool,
    /// Composer / verifier / submitter capabilities of the node
    client: C,
    /// Candidate enumeration strategy
    strategy: SearchStrategy,
}

impl<C: CompositionApi> Solver<C> {
    /// Create a solver with an empty pool.
    pub fn new(client: C, strategy: SearchStrategy) -> Self {
        Self {
            pool: PendingPool::new(),
            client,
            strategy,
        }
    }

    /// Read access to the pool, for inspection.
    pub fn pool(&self) -> &PendingPool {
        &self.pool
    }

    /// React to one feed event.
    ///
    /// An intent-added event inserts into the pool and, if the pool changed,
    /// runs one matching pass. Any other event is discarded.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of subsets solved by the triggered pass
    pub fn handle_event(&mut self, event: NodeEvent) -> usize {
        match event {
            NodeEvent::IntentAdded { payload, actions } => {
                let profile = ResourceProfile::from_actions(&actions);
                let intent = Intent::new(payload, profile);
                let id = intent.short_id();

                if !self.pool.insert(intent) {
                    debug!("Intent {} already known, nothing to do", id);
                    return 0;
                }

                info!("Intent {} added to pool ({} pending)", id, self.pool.len());
                self.solve()
            }
            NodeEvent::Ignored { name } => {
                debug!("Event ignored: {}", name);
                0
            }
        }
    }

    /// Run one matching pass over the current pool.
    ///
    /// Candidates whose members were solved earlier in the same pass are
    /// discarded before any composer call.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of subsets solved
    pub fn solve(&mut self) -> usize {
        let snapshot = self.pool.snapshot();
        let candidates = candidate_subsets(&snapshot, self.strategy);
        if candidates.is_empty() {
            debug!(
                "No candidates for pool of {} pending intent(s)",
                snapshot.len()
            );
            return 0;
        }

        info!(
            "Matching pass: {} candidate(s) over {} pending intent(s)",
            candidates.len(),
            snapshot.len()
        );

        let mut solved = 0;
        for candidate in candidates {
            if !candidate.iter().all(|intent| self.pool.contains(intent)) {
                debug!("Skipping candidate with already-solved member");
                continue;
            }

            match self.attempt_composition(&candidate) {
                Ok(true) => solved += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Composition attempt failed: {:#}", e);
                }
            }
        }

        solved
    }

    /// Attempt composition of one candidate subset.
    ///
    /// On a composed and verified transaction the subset is submitted to
    /// the mempool and its members retired from the pool, whatever the
    /// submission outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Subset composed, members retired
    /// * `Ok(false)` - Subset rejected by the composer or verifier
    /// * `Err(anyhow::Error)` - Transport failure before submission
    fn attempt_composition(&mut self, candidate: &[Intent]) -> Result<bool> {
        let ids = candidate
            .iter()
            .map(|intent| intent.short_id())
            .collect::<Vec<_>>()
            .join(", ");
        let payloads: Vec<Vec<u8>> = candidate
            .iter()
            .map(|intent| intent.payload().to_vec())
            .collect();

        let transaction = match self
            .client
            .compose(&payloads)
            .context("Composer call failed")?
        {
            ComposeOutcome::Composed(transaction) => transaction,
            ComposeOutcome::Rejected { error, reason } => {
                info!("Subset [{}] did not compose, skipping: {} ({})", ids, error, reason);
                return Ok(false);
            }
        };

        let valid = self
            .client
            .verify(&transaction)
            .context("Verifier call failed")?;
        if !valid {
            warn!(
                "Composed transaction for [{}] failed verification, skipping",
                ids
            );
            return Ok(false);
        }

        match self.client.submit(&transaction) {
            Ok(NodeAck::Accepted { message }) => {
                info!("Submitted composed transaction for [{}]: {}", ids, message);
            }
            Ok(NodeAck::Rejected { error, reason }) => {
                warn!(
                    "Submission rejected for [{}]: {} ({}); members are retired regardless",
                    ids, error, reason
                );
            }
            Err(e) => {
                warn!(
                    "Submitter call failed for [{}]: {:#}; members are retired regardless",
                    ids, e
                );
            }
        }

        self.pool.remove_solved(candidate);
        Ok(true)
    }

    /// Consume feed events until the channel closes.
    ///
    /// Each event is handled to completion on a blocking task before the
    /// next is taken; events arriving mid-pass queue in the channel.
    pub async fn run(self, mut events: mpsc::Receiver<NodeEvent>) -> Result<()>
    where
        C: Send + 'static,
    {
        info!("Solver loop started ({} strategy)", self.strategy);

        let mut solver = self;
        while let Some(event) = events.recv().await {
            solver = tokio::task::spawn_blocking(move || {
                let solved = solver.handle_event(event);
                if solved > 0 {
                    info!(
                        "Pass solved {} subset(s); {} intent(s) still pending",
                        solved,
                        solver.pool.len()
                    );
                }
                solver
            })
            .await
            .context("Solver task panicked")?;
        }

        info!("Event channel closed, solver loop stopped");
        Ok(())
    }
}
