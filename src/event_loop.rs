use std::time::Duration;

use futures::stream::{select_all, StreamExt};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::config::DEFAULT_EVENT_TIMEOUT;
use crate::error::{HarnessError, Result};
use crate::notifications::{Notification, NotificationFilter, NotificationStream};

/// Completion token handed to wait handlers.
///
/// A handler finishes the wait by calling [`Completion::complete`] exactly
/// once. The token only exists for the duration of a wait, so completing
/// outside one cannot be expressed.
#[derive(Debug)]
pub struct Completion<T> {
    value: Option<T>,
    misused: bool,
}

impl<T> Completion<T> {
    fn new() -> Self {
        Self {
            value: None,
            misused: false,
        }
    }

    /// Ends the wait with `value`. A second call is a usage error and fails
    /// the whole wait even if the handler swallows this result.
    pub fn complete(&mut self, value: T) -> Result<()> {
        if self.value.is_some() {
            self.misused = true;
            return Err(HarnessError::Usage("wait completed more than once"));
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.value.is_some()
    }
}

/// Result of one bounded wait
#[derive(Debug)]
pub struct WaitOutcome<T> {
    /// Value passed to [`Completion::complete`], if the wait completed
    pub value: Option<T>,
    /// Set when the deadline fired before completion
    pub timed_out: bool,
    /// Time spent in the wait
    pub elapsed: Duration,
    timeout: Duration,
    awaited: String,
}

impl<T> WaitOutcome<T> {
    /// Converts a timed-out wait into `HarnessError::WaitTimeout`
    pub fn into_result(self) -> Result<T> {
        match self.value {
            Some(value) if !self.timed_out => Ok(value),
            _ => Err(HarnessError::WaitTimeout {
                signal: self.awaited,
                timeout: self.timeout,
            }),
        }
    }
}

/// Deadline-bounded wait over the registered notification subscriptions.
///
/// All subscriptions are drained by a single task, and the handler runs
/// between two polls, so handlers never overlap with each other or with the
/// caller. Only one wait may be active at a time.
pub struct EventLoop {
    subscriptions: Mutex<Vec<NotificationStream>>,
    default_timeout: Duration,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_TIMEOUT)
    }
}

impl EventLoop {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Adds a subscription. Register before triggering the operation whose
    /// notification is awaited, or the notification may be missed.
    pub fn register(&mut self, stream: NotificationStream) {
        self.subscriptions.get_mut().push(stream);
    }

    pub fn subscription_count(&mut self) -> usize {
        self.subscriptions.get_mut().len()
    }

    /// Dispatches notifications to `handler` until it completes or `timeout`
    /// elapses.
    ///
    /// A timeout is not an error: check [`WaitOutcome::timed_out`] (or call
    /// [`WaitOutcome::into_result`]). Errors are a second wait started while
    /// this one is active, a handler error, or a double completion.
    pub async fn run_until<T, F>(&self, timeout: Duration, mut handler: F) -> Result<WaitOutcome<T>>
    where
        F: FnMut(&Notification, &mut Completion<T>) -> Result<()>,
    {
        let mut subscriptions = self
            .subscriptions
            .try_lock()
            .map_err(|_| HarnessError::Usage("another wait is already active"))?;

        let started = Instant::now();
        let deadline = sleep_until(started + timeout);
        tokio::pin!(deadline);

        let mut merged = select_all(subscriptions.iter_mut());
        let mut completion = Completion::new();
        let mut sources_open = true;
        let mut timed_out = false;

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    timed_out = true;
                    break;
                }

                next = merged.next(), if sources_open => match next {
                    Some(notification) => {
                        debug!(
                            "Dispatching {} for {} (event {}, detail {})",
                            notification.signal,
                            notification.path.as_str(),
                            notification.event,
                            notification.detail
                        );
                        handler(&notification, &mut completion)?;
                        if completion.misused {
                            return Err(HarnessError::Usage("wait completed more than once"));
                        }
                        if completion.is_complete() {
                            break;
                        }
                    }
                    None => {
                        // Nothing else can arrive; the deadline decides.
                        debug!("All subscriptions closed, waiting out the deadline");
                        sources_open = false;
                    }
                },
            }
        }

        let elapsed = started.elapsed();
        if timed_out {
            info!("Wait timed out after {:?}", elapsed);
        } else {
            debug!("Wait completed after {:?}", elapsed);
        }

        Ok(WaitOutcome {
            value: completion.value,
            timed_out,
            elapsed,
            timeout,
            awaited: "notification".to_string(),
        })
    }

    /// Waits up to the default timeout for the first notification matching
    /// `filter`.
    pub async fn wait_for(&self, filter: &NotificationFilter) -> Result<WaitOutcome<Notification>> {
        self.wait_for_within(filter, self.default_timeout).await
    }

    pub async fn wait_for_within(
        &self,
        filter: &NotificationFilter,
        timeout: Duration,
    ) -> Result<WaitOutcome<Notification>> {
        let mut outcome = self
            .run_until(timeout, |notification, completion| {
                if filter.matches(notification) {
                    completion.complete(notification.clone())?;
                }
                Ok(())
            })
            .await?;
        outcome.awaited = filter.signal().member().to_string();
        Ok(outcome)
    }
}
