//! Batch runs, retry loops, and cooperative cancellation.
//!
//! Layout attempts are pure and quick individually, but callers sweeping a
//! design space run many of them. The batch surface threads a shared
//! [`CancelFlag`] between attempts so a long sweep can be abandoned from
//! another thread without tearing down anything mid-stage.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use super::{
    config::LayoutConfig,
    error::LayoutError,
    input::{Winding, WindingWindow},
    result::CoilLayout,
    wind,
};

/// A shared flag requesting that in-flight work stop at the next checkpoint.
///
/// Cloning the flag shares the underlying state, so one handle can be kept
/// by the caller while another travels into the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One independent layout problem in a batch.
#[derive(Debug, Clone)]
pub struct LayoutCase {
    pub windings: Vec<Winding>,
    pub window: WindingWindow,
    pub config: LayoutConfig,
}

/// Runs every case in order, checking the flag between cases.
///
/// Cases after a cancellation report [`LayoutError::Cancelled`] rather than
/// being silently skipped, so the output always lines up with the input.
pub fn wind_batch(cases: &[LayoutCase], cancel: &CancelFlag) -> Vec<Result<CoilLayout, LayoutError>> {
    cases
        .iter()
        .map(|case| {
            if cancel.is_cancelled() {
                return Err(LayoutError::Cancelled);
            }
            wind(&case.windings, &case.window, &case.config)
        })
        .collect()
}

/// Repeatedly attempts a layout, letting `policy` revise the configuration
/// after each failure.
///
/// The policy receives the configuration that failed and the error it failed
/// with, and returns the next configuration to try, or `None` to give up.
/// The flag is checked before every attempt.
///
/// # Errors
///
/// Returns the last attempt's error when the policy gives up or
/// `max_attempts` is exhausted, and [`LayoutError::Cancelled`] when the flag
/// is raised.
pub fn wind_with_retry<P>(
    windings: &[Winding],
    window: &WindingWindow,
    config: &LayoutConfig,
    cancel: &CancelFlag,
    max_attempts: usize,
    mut policy: P,
) -> Result<CoilLayout, LayoutError>
where
    P: FnMut(&LayoutConfig, &LayoutError) -> Option<LayoutConfig>,
{
    let mut current = config.clone();
    let mut attempt = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }
        attempt += 1;
        match wind(windings, window, &current) {
            Ok(layout) => return Ok(layout),
            Err(error) => {
                if attempt >= max_attempts {
                    return Err(error);
                }
                match policy(&current, &error) {
                    Some(next) => {
                        log::debug!("layout attempt {attempt} failed ({error}), retrying");
                        current = next;
                    }
                    None => return Err(error),
                }
            }
        }
    }
}
