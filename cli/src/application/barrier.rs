//! Readiness barrier: upstream hosts wait here until enough downstream hosts
//! have published a token.
//!
//! Tokens are only ever appended, so the observed count is monotonic. There is
//! no timeout; a waiter polls until the count is reached or the run ends.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::ports::ProgressReporter;
use crate::domain::{Phase, ReadinessToken, Tier};

/// Append-only set of readiness tokens shared by every worker.
#[derive(Debug)]
pub struct ReadinessBarrier {
    tokens: Mutex<Vec<ReadinessToken>>,
    poll_interval: Duration,
}

impl ReadinessBarrier {
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            tokens: Mutex::new(Vec::new()),
            poll_interval,
        }
    }

    /// Record that a host is up. Publishing the same token twice is a no-op.
    pub fn publish(&self, token: ReadinessToken) {
        let mut tokens = self.lock();
        if tokens.contains(&token) {
            return;
        }
        tokens.push(token);
        tracing::debug!(%token, published = tokens.len(), "readiness token");
    }

    /// Tokens published so far, in publication order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ReadinessToken> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Block until at least `min` tokens have been published.
    ///
    /// Each poll reports `AwaitingPeers` with the observed count through
    /// `reporter`. Returns the count that satisfied the wait.
    pub async fn await_count(&self, min: usize, reporter: &impl ProgressReporter) -> usize {
        loop {
            let tokens = self.snapshot();
            let observed = tokens.len();
            reporter.phase(Phase::AwaitingPeers, &progress_detail(&tokens, min));
            if observed >= min {
                return observed;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReadinessToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// "`observed`/`min` started", with a per-tier breakdown once relays report.
fn progress_detail(tokens: &[ReadinessToken], min: usize) -> String {
    let relays = tokens.iter().filter(|t| t.tier == Tier::Relay).count();
    let base = format!("{}/{min} started", tokens.len());
    if relays == 0 {
        base
    } else {
        let leaves = tokens.iter().filter(|t| t.tier == Tier::Leaf).count();
        format!("{base} ({leaves} leaf, {relays} relay)")
    }
}
