use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use domexp_core::{CheckResult, Snapshot};

use crate::account::AccountClient;
use crate::expiration::ExpirationLookup;
use crate::obs::metrics::CheckerMetrics;

use super::retry::RetryPolicy;

/// Interval between check cycles.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// What to write when every lookup attempt for a domain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustedPolicy {
    /// Write the zero value of the last failed attempt (reported as unknown).
    #[default]
    RecordLastValue,
    /// Write nothing; a previous entry for the domain stays as it was.
    Skip,
}

/// One credential and the results cached for it.
struct AccountHandle {
    client: Arc<dyn AccountClient>,
    results: Mutex<HashMap<String, CheckResult>>,
    in_flight: AtomicBool,
}

impl AccountHandle {
    fn new(client: Arc<dyn AccountClient>) -> Self {
        Self {
            client,
            results: Mutex::new(HashMap::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    fn obfuscated_id(&self) -> &str {
        self.client.obfuscated_id()
    }

    fn results(&self) -> MutexGuard<'_, HashMap<String, CheckResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag when a guarded cycle ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic checker: lists every account's domains, looks up their
/// expiration and keeps a per-account result cache.
pub struct Checker {
    accounts: Vec<Arc<AccountHandle>>,
    lookup: Arc<dyn ExpirationLookup>,
    metrics: Arc<CheckerMetrics>,
    interval: Duration,
    retry: RetryPolicy,
    exhausted: ExhaustedPolicy,
    overlap_guard: bool,
    ready: AtomicBool,
}

impl Checker {
    pub fn new(accounts: Vec<Arc<dyn AccountClient>>, lookup: Arc<dyn ExpirationLookup>) -> Self {
        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(accounts.len());
        for client in accounts {
            if !seen.insert(client.account_key().to_string()) {
                warn!(account = %client.obfuscated_id(), "duplicate credential ignored");
                continue;
            }
            handles.push(Arc::new(AccountHandle::new(client)));
        }

        Self {
            accounts: handles,
            lookup,
            metrics: Arc::new(CheckerMetrics::default()),
            interval: CHECK_INTERVAL,
            retry: RetryPolicy::default(),
            exhausted: ExhaustedPolicy::default(),
            overlap_guard: false,
            ready: AtomicBool::new(false),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_exhausted_policy(mut self, exhausted: ExhaustedPolicy) -> Self {
        self.exhausted = exhausted;
        self
    }

    /// Skip an account's cycle while its previous one is still running.
    pub fn with_overlap_guard(mut self, enabled: bool) -> Self {
        self.overlap_guard = enabled;
        self
    }

    pub fn metrics(&self) -> Arc<CheckerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &str> + '_ {
        self.accounts.iter().map(|a| a.obfuscated_id())
    }

    /// True once the first cycle driven by [`Checker::start`] has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run one cycle to completion, then start a new cycle on every tick.
    /// Ticks do not wait for the previous cycle. Never returns.
    pub async fn start(self: Arc<Self>) {
        self.run_cycle().await;
        self.ready.store(true, Ordering::Release);

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            // Dropping the handles detaches the per-account tasks.
            drop(self.check());
        }
    }

    /// Spawn one cycle task per account.
    pub fn check(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(accounts = self.accounts.len(), "checking domains");
        self.metrics.cycles.inc(&[]);

        self.accounts
            .iter()
            .map(|account| {
                let this = Arc::clone(self);
                let account = Arc::clone(account);
                tokio::spawn(async move { this.check_account(&account).await })
            })
            .collect()
    }

    /// Spawn one cycle and wait for every account to finish.
    pub async fn run_cycle(self: &Arc<Self>) {
        for res in join_all(self.check()).await {
            if let Err(e) = res {
                error!(error = %e, "account check task failed");
            }
        }
    }

    async fn check_account(&self, account: &AccountHandle) {
        let id = account.obfuscated_id();

        let _guard = if self.overlap_guard {
            if account.in_flight.swap(true, Ordering::AcqRel) {
                warn!(account = %id, "previous cycle still running, skipping");
                return;
            }
            Some(InFlight(&account.in_flight))
        } else {
            None
        };

        info!(account = %id, "checking account");

        let domains = match account.client.list_domains().await {
            Ok(d) => d,
            Err(e) => {
                error!(account = %id, error = %e, "failed to list domains");
                self.metrics.listing_errors.inc(&[("account", id)]);
                return;
            }
        };

        // Domains removed from the account are not checked again.
        {
            let listed: HashSet<&str> = domains.iter().map(String::as_str).collect();
            account.results().retain(|d, _| listed.contains(d.as_str()));
        }

        for domain in &domains {
            let Some(result) = self.check_domain(id, domain).await else {
                continue;
            };

            info!(
                account = %id,
                %domain,
                expires_in = result.expires_in_days,
                status = %result.status,
                "zone result"
            );
            account.results().insert(domain.clone(), result);
        }
    }

    async fn check_domain(&self, id: &str, domain: &str) -> Option<CheckResult> {
        let lookup = &self.lookup;
        let metrics = &self.metrics;

        let outcome = self
            .retry
            .execute(
                move || async move {
                    let started = Instant::now();
                    let res = lookup.days_till_expiration(domain).await;
                    metrics
                        .lookup_duration
                        .observe(&[("account", id)], started.elapsed());
                    res
                },
                |attempt, e| {
                    error!(account = %id, %domain, attempt, error = %e, "failed to get expiration");
                    metrics.lookup_failures.inc(&[("account", id)]);
                },
            )
            .await;

        match (outcome, self.exhausted) {
            (Ok(exp), _) => Some(CheckResult::from_days(exp.days)),
            (Err(_), ExhaustedPolicy::RecordLastValue) => Some(CheckResult::from_days(0)),
            (Err(_), ExhaustedPolicy::Skip) => {
                warn!(account = %id, %domain, "lookup attempts exhausted, result not recorded");
                None
            }
        }
    }

    /// Union of every account's cache. For a domain listed under several
    /// accounts the later account wins. The copy is detached from the
    /// checker; each account's cache is read under its own lock.
    pub fn snapshot(&self) -> Snapshot {
        let mut res = Snapshot::new();
        for account in &self.accounts {
            let results = account.results();
            res.extend(results.iter().map(|(d, r)| (d.clone(), *r)));
        }
        res
    }
}
