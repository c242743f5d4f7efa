//! Probabilistic admission control for new markers.
//!
//! Below the soft limit every event is admitted. Between the soft and hard
//! limits the drop probability rises along `load^exponent * max_p`, where
//! `load` is the normalized position between the two limits. At or above
//! the hard limit every event is rejected.

use rand::Rng;

use crate::config::AdmissionConfig;
use crate::diagnostics::DiagnosticSink;

/// Load-shedding gate keyed on the live persistent-dot count.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    soft_limit: u32,
    hard_limit: u32,
    exponent: f64,
    max_drop_probability: f64,
    log_every: u64,
    dropped: u64,
}

impl AdmissionController {
    /// Build a controller from configuration.
    pub const fn new(config: &AdmissionConfig) -> Self {
        Self {
            soft_limit: config.soft_limit,
            hard_limit: config.hard_limit,
            exponent: config.drop_exponent,
            max_drop_probability: config.max_drop_probability,
            log_every: config.log_every,
            dropped: 0,
        }
    }

    /// Probability that an event is rejected at the given live count.
    pub fn drop_probability(&self, live: u32) -> f64 {
        if live < self.soft_limit {
            return 0.0;
        }
        if live >= self.hard_limit {
            return 1.0;
        }
        let over = f64::from(live.saturating_sub(self.soft_limit));
        let span = f64::from(self.hard_limit.saturating_sub(self.soft_limit));
        (over / span).powf(self.exponent) * self.max_drop_probability
    }

    /// Decide whether to materialize an event.
    ///
    /// Every rejection increments the dropped counter; each time the counter
    /// reaches a multiple of `log_every` one throttle warning is emitted.
    pub fn should_admit(
        &mut self,
        live: u32,
        rng: &mut impl Rng,
        sink: &mut impl DiagnosticSink,
    ) -> bool {
        let admit = if live >= self.hard_limit {
            false
        } else if live < self.soft_limit {
            true
        } else {
            rng.random::<f64>() >= self.drop_probability(live)
        };

        if !admit {
            self.dropped = self.dropped.saturating_add(1);
            if self.log_every > 0 && self.dropped % self.log_every == 0 {
                sink.warn(
                    "throttling new markers",
                    &[
                        ("live", live.to_string()),
                        ("dropped", self.dropped.to_string()),
                    ],
                );
            }
        }
        admit
    }

    /// Events rejected so far.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
