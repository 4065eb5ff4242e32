use std::fmt;
use std::time::Duration;

use gdb_client::domain::{DailyUsage, TotalUsage, SOURCE_UTC_OFFSET};
use gdb_client::{ApiError, DateRange, GdbClient, Scale};
use time::{Date, Month, OffsetDateTime};
use tokio::time::MissedTickBehavior;

use crate::normalize;
use crate::reconcile::{merge, SeriesTails};
use crate::store::{read_tails, StatisticsStore, StoreError};

/// Steps of one polling cycle, in order. Carried in [`CycleError`] so
/// logs say where a cycle died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Authenticating,
    FetchingSnapshot,
    FetchingSeries,
    Reconciling,
    Persisting,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CyclePhase::Authenticating => "authenticating",
            CyclePhase::FetchingSnapshot => "fetching snapshot",
            CyclePhase::FetchingSeries => "fetching series",
            CyclePhase::Reconciling => "reconciling",
            CyclePhase::Persisting => "persisting",
        };
        f.write_str(s)
    }
}

/// A failed cycle. Nothing is persisted on any of these paths; the
/// variants differ only in who has to act.
#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    /// Credentials rejected. Scheduling continues, but only an operator
    /// fixing the credentials will make future cycles succeed.
    #[error("reauthentication required (while {phase}): {reason}")]
    Auth { phase: CyclePhase, reason: String },
    /// Network or store hiccup; the next scheduled tick retries.
    #[error("transport failure (while {phase}): {reason}")]
    Transport { phase: CyclePhase, reason: String },
    /// Corrupted source data or a store that violates the cross-series
    /// invariant. Never healed by guessing.
    #[error("data integrity violation (while {phase}): {reason}")]
    Integrity { phase: CyclePhase, reason: String },
}

impl CycleError {
    fn from_api(phase: CyclePhase, e: ApiError) -> Self {
        match e {
            ApiError::Auth(reason) => CycleError::Auth { phase, reason },
            ApiError::Transport(reason) => CycleError::Transport { phase, reason },
        }
    }

    fn from_store(phase: CyclePhase, e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(reason) => CycleError::Transport { phase, reason },
            StoreError::Integrity(reason) => CycleError::Integrity { phase, reason },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutcome {
    /// New days appended to each series this cycle.
    pub appended_days: usize,
    /// Current-bill aggregate, when the source published one.
    pub snapshot: Option<TotalUsage>,
}

/// Owns the periodic authenticate/fetch/reconcile/persist cycle.
///
/// The coordinator drives its own interval timer; it does not depend on
/// any display consumer to stay scheduled. Cycles are serialized by
/// construction: `run` is a single task and `run_cycle` takes `&mut
/// self`, so a tick can only wait behind a still-running cycle, never
/// overlap it.
pub struct Coordinator<S> {
    client: GdbClient,
    store: S,
    update_interval: Duration,
}

impl<S: StatisticsStore> Coordinator<S> {
    pub fn new(client: GdbClient, store: S, update_interval: Duration) -> Self {
        Self {
            client,
            store,
            update_interval,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Poll forever. Failed cycles are logged and classified; none of
    /// them stop the schedule.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            metrics::counter!("poller_cycles_total").increment(1);

            match self.run_cycle().await {
                Ok(outcome) if outcome.appended_days > 0 => {
                    tracing::info!(days = outcome.appended_days, "cycle complete");
                }
                Ok(_) => {
                    tracing::debug!("cycle complete, no new days published yet");
                }
                Err(e @ CycleError::Auth { .. }) => {
                    metrics::counter!("poller_auth_failures_total").increment(1);
                    tracing::error!(error = %e, "credentials need operator attention; polling continues");
                }
                Err(e @ CycleError::Transport { .. }) => {
                    metrics::counter!("poller_transport_failures_total").increment(1);
                    tracing::warn!(error = %e, "cycle aborted, retrying on next tick");
                }
                Err(e @ CycleError::Integrity { .. }) => {
                    metrics::counter!("poller_integrity_failures_total").increment(1);
                    tracing::error!(error = %e, "cycle aborted, store needs operator attention");
                }
            }
        }
    }

    /// One full cycle. Nothing is written until the final persist step,
    /// so abandoning a cycle mid-way leaves no partial state.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        // The bearer token expires after minutes and cycles are hours
        // apart; always start from a fresh login.
        self.client
            .login()
            .await
            .map_err(|e| CycleError::from_api(CyclePhase::Authenticating, e))?;

        let snapshot = self.fetch_snapshot().await?;
        if let Some(total) = snapshot {
            publish_snapshot(total);
        }

        let tails = read_tails(&self.store)
            .await
            .map_err(|e| CycleError::from_store(CyclePhase::FetchingSeries, e))?;
        let readings = self.fetch_readings(&tails).await?;

        let plan = merge(&tails, &readings).map_err(|e| CycleError::Integrity {
            phase: CyclePhase::Reconciling,
            reason: e.to_string(),
        })?;

        if plan.is_empty() {
            tracing::debug!("no readings past the committed boundary, skipping persist");
            return Ok(CycleOutcome {
                appended_days: 0,
                snapshot,
            });
        }

        self.store
            .append_plan(&plan)
            .await
            .map_err(|e| CycleError::from_store(CyclePhase::Persisting, e))?;
        metrics::counter!("statistics_days_appended_total").increment(plan.len() as u64);

        Ok(CycleOutcome {
            appended_days: plan.len(),
            snapshot,
        })
    }

    /// Billing-period aggregate, fetched every cycle for display only.
    async fn fetch_snapshot(&mut self) -> Result<Option<TotalUsage>, CycleError> {
        let raw = self
            .client
            .fetch_usage(DateRange::default(), Scale::Year)
            .await
            .map_err(|e| CycleError::from_api(CyclePhase::FetchingSnapshot, e))?;
        Ok(normalize::total_usage(&raw))
    }

    async fn fetch_readings(&mut self, tails: &SeriesTails) -> Result<Vec<DailyUsage>, CycleError> {
        let today = OffsetDateTime::now_utc().to_offset(SOURCE_UTC_OFFSET).date();
        let range = fetch_window(tails.boundary(), today);

        let raw = self
            .client
            .fetch_usage(range, Scale::Month)
            .await
            .map_err(|e| CycleError::from_api(CyclePhase::FetchingSeries, e))?;

        normalize::daily_usage(&raw).map_err(|e| CycleError::Integrity {
            phase: CyclePhase::FetchingSeries,
            reason: e.to_string(),
        })
    }
}

/// Fetch window for the daily breakdown.
///
/// First run reaches back to January 1 of the previous calendar year
/// (the server defaults an open start to the current year only, so the
/// extra year is a deliberate over-fetch margin). Incremental runs
/// start at the boundary day itself: re-fetching it lets `merge` see
/// the day and discard it instead of trusting the source not to have
/// revised it.
fn fetch_window(boundary: Option<Date>, today: Date) -> DateRange {
    let start = match boundary {
        Some(day) => day,
        None => Date::from_calendar_date(today.year() - 1, Month::January, 1)
            .expect("January 1st is a valid date in any year"),
    };
    DateRange {
        start: Some(start),
        end: Some(today),
    }
}

fn publish_snapshot(total: TotalUsage) {
    metrics::gauge!("current_bill_energy_kwh").set(total.energy_kwh);
    metrics::gauge!("current_bill_volume_m3").set(total.volume_m3);
    metrics::gauge!("current_bill_cost_eur").set(total.price_eur);
}
