//! Runs one session at a time: start an interval, wait for completion or an
//! interruption, then decide whether the interval becomes a log record.

pub mod interrupt;

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    errors::{AppError, AppResult},
    log::{
        record::{LogRecord, Status},
        store::{LogResource, LogStore},
    },
    utils::clock::Clock,
};

/// Granularity of the wait loop. Every tick is a suspension point where
/// cancellation can be observed.
const TICK: StdDuration = StdDuration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// A pom: runs until its deadline unless interrupted first.
    Fixed,
    /// Open-ended tracking: only cancellation ends it.
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    TimedOut,
    Cancelled,
}

/// Interaction seam between a running session and whoever is watching it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionUi: Send {
    /// Called once per tick with the elapsed time and, for fixed sessions,
    /// the time remaining.
    fn tick(&mut self, elapsed: Duration, remaining: Option<Duration>);

    /// A fixed session reached its deadline.
    fn completed(&mut self);

    /// Save/discard decision for an interrupted session. `None` means the
    /// caller didn't decide and the kind default applies.
    async fn confirm_save(&mut self, kind: SessionKind, elapsed: Duration) -> Option<bool>;
}

pub struct SessionController<F, U> {
    store: LogStore<F>,
    clock: Box<dyn Clock>,
    ui: U,
}

impl<F: LogResource, U: SessionUi> SessionController<F, U> {
    pub fn new(store: LogStore<F>, clock: Box<dyn Clock>, ui: U) -> Self {
        Self { store, clock, ui }
    }

    pub fn store(&self) -> &LogStore<F> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.time()
    }

    /// Runs a fixed-duration pom. Reaching the deadline always commits, with
    /// `end = start + duration` regardless of tick overshoot; an interruption
    /// commits only on an explicit or default yes.
    pub async fn run_fixed(
        &mut self,
        title: &str,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> AppResult<Option<LogRecord>> {
        let start = self.clock.time();
        let deadline = start + duration;
        info!("Starting pom {title:?}");
        loop {
            let now = self.clock.time();
            if now >= deadline {
                self.ui.completed();
                return self.commit(title, start, deadline).await.map(Some);
            }
            self.ui.tick(now - start, Some(deadline - now));
            if self.wait_tick(cancel).await == WaitOutcome::Cancelled {
                return self.interrupted(SessionKind::Fixed, title, start).await;
            }
        }
    }

    /// Runs an open-ended tracking session until cancelled.
    pub async fn run_open(
        &mut self,
        title: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<LogRecord>> {
        let start = self.clock.time();
        info!("Tracking {title:?}");
        loop {
            self.ui.tick(self.clock.time() - start, None);
            if self.wait_tick(cancel).await == WaitOutcome::Cancelled {
                return self.interrupted(SessionKind::Open, title, start).await;
            }
        }
    }

    async fn interrupted(
        &mut self,
        kind: SessionKind,
        title: &str,
        start: DateTime<Utc>,
    ) -> AppResult<Option<LogRecord>> {
        // The interval ends at the cancellation, not after the user has
        // pondered the save prompt.
        let end = self.clock.time();
        let save = self.ui.confirm_save(kind, end - start).await.unwrap_or(match kind {
            // Don't silently keep a partial pom; do keep ad hoc tracked time.
            SessionKind::Fixed => false,
            SessionKind::Open => true,
        });
        debug!("Session {title:?} interrupted, save = {save}");
        if save {
            self.commit(title, start, end).await.map(Some)
        } else {
            Ok(None)
        }
    }

    async fn commit(
        &mut self,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<LogRecord> {
        let record = LogRecord {
            start,
            end: Some(end),
            title: title.trim().to_string(),
            status: Status::NeverEvaluated,
        };
        self.store.append(record.clone()).await?;
        Ok(record)
    }

    async fn wait_tick(&self, cancel: &CancellationToken) -> WaitOutcome {
        select! {
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            _ = self.clock.sleep(TICK) => WaitOutcome::TimedOut,
        }
    }

    /// Sets the status of the record whose span contains now.
    pub async fn edit_status(&mut self, input: &str) -> AppResult<()> {
        let now = self.clock.time();
        match self.store.current_mut(now) {
            Some(record) => record.status = input.parse()?,
            None => return Err(AppError::NoCurrentSession),
        }
        self.store.normalize_and_persist().await
    }

    /// Sets the title of the record whose span contains now.
    pub async fn edit_title(&mut self, input: &str) -> AppResult<()> {
        let now = self.clock.time();
        let title = input.trim();
        match self.store.current_mut(now) {
            Some(record) => {
                if title.is_empty() {
                    return Err(AppError::EmptyTitle);
                }
                record.title = title.to_string();
            }
            None => return Err(AppError::NoCurrentSession),
        }
        self.store.normalize_and_persist().await
    }
}
