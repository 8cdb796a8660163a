//! Simulated generation backend.
//!
//! There is no real inference here: a request waits a randomized 1-2 s
//! processing delay and then fails with [`OverloadError`] one time in five.
//! Both the randomness and the sleep are injected so callers can force
//! either outcome and observe the delay deterministically.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::clock::{Sleeper, TokioSleeper};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Message carried by every simulated overload. Clients gate retries on it.
pub const OVERLOAD_MESSAGE: &str = "Model overloaded";

/// Draws strictly below this value fail with [`OverloadError`].
pub const OVERLOAD_PROBABILITY: f64 = 0.2;

/// Shortest simulated processing delay.
pub const MIN_PROCESSING_DELAY_MS: u64 = 1000;

/// Width of the uniform delay window above [`MIN_PROCESSING_DELAY_MS`].
pub const PROCESSING_DELAY_SPREAD_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The simulated backend is overloaded. Transient and safe to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Model overloaded")]
pub struct OverloadError;

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Always returns the same value. Used to force an outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Delay-then-outcome simulation of a generation backend.
///
/// Holds no mutable state; one instance is shared by every request and each
/// call suspends only its own task during the delay.
#[derive(Clone)]
pub struct GenerationSimulator {
    random: Arc<dyn RandomSource>,
    sleeper: Arc<dyn Sleeper>,
}

impl GenerationSimulator {
    pub fn new(random: Arc<dyn RandomSource>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { random, sleeper }
    }

    /// Pick the processing delay for one simulated request.
    ///
    /// Uniform over `[1000ms, 2000ms)`, whole milliseconds.
    pub fn processing_delay(&self) -> Duration {
        let draw = self.random.next_unit();
        let extra = (draw * PROCESSING_DELAY_SPREAD_MS as f64).floor() as u64;
        Duration::from_millis(MIN_PROCESSING_DELAY_MS + extra.min(PROCESSING_DELAY_SPREAD_MS - 1))
    }

    /// Wait out the processing delay, then succeed or fail with
    /// [`OverloadError`].
    ///
    /// Has no side effects besides the wait.
    pub async fn simulate(&self) -> Result<(), OverloadError> {
        let delay = self.processing_delay();
        self.sleeper.sleep(delay).await;

        let draw = self.random.next_unit();
        if draw < OVERLOAD_PROBABILITY {
            tracing::warn!(
                delay_ms = delay.as_millis() as u64,
                draw,
                "Simulated generation overloaded"
            );
            return Err(OverloadError);
        }

        tracing::debug!(
            delay_ms = delay.as_millis() as u64,
            draw,
            "Simulated generation succeeded"
        );
        Ok(())
    }
}

impl Default for GenerationSimulator {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom), Arc::new(TokioSleeper))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
