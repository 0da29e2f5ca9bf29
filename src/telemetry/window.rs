//! Bounded window of startup-latency samples kept in the external store.
//!
//! The window is a list under a single key. Every record pushes one sample,
//! then reads the length; at or above capacity the whole list is drained and
//! replaced by the integer mean of what was drained.
//!
//! The read-length / pop / push sequence is not atomic. Two processes sharing
//! the key can interleave, so the window may briefly exceed capacity and a
//! compaction may average fewer samples than the length it observed. Compaction
//! only ever averages the samples it actually popped.

use std::num::ParseIntError;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::observability::metrics;
use crate::telemetry::store::{ListStore, StoreError};

/// Window length that triggers compaction unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

/// A startup latency in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LatencySample(pub i64);

impl LatencySample {
    pub fn as_micros(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for LatencySample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed latency sample {value:?} in {key}: {source}")]
    MalformedSample {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl TelemetryError {
    /// Whether startup must abort. Store trouble is only reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelemetryError::MalformedSample { .. })
    }
}

/// What a single record did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Sample appended; the window now holds `len` entries.
    Recorded { sample: LatencySample, len: usize },
    /// Sample appended and the window collapsed to its mean.
    Compacted {
        sample: LatencySample,
        drained: usize,
        mean: LatencySample,
    },
}

/// Where the startup clock starts.
#[derive(Debug, Clone)]
pub struct StartupReference {
    /// Instant the process began starting, used when the store has no reference.
    pub started_at: SystemTime,
    /// Key under which a launcher may have stored its own start instant
    /// as unix microseconds.
    pub reference_key: Option<String>,
}

impl StartupReference {
    pub fn new(started_at: SystemTime) -> Self {
        Self {
            started_at,
            reference_key: None,
        }
    }

    pub fn with_reference_key(mut self, key: impl Into<String>) -> Self {
        self.reference_key = Some(key.into());
        self
    }
}

fn unix_micros(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_micros()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_micros()).map_or(i64::MIN, |us| -us),
    }
}

/// Client view of the latency window living in the store.
pub struct TelemetryWindow {
    store: Arc<dyn ListStore>,
    key: String,
    capacity: usize,
}

impl TelemetryWindow {
    pub fn new(store: Arc<dyn ListStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Measure the startup latency as of `now` and record it.
    pub async fn record_startup(
        &self,
        reference: &StartupReference,
        now: SystemTime,
    ) -> Result<RecordOutcome, TelemetryError> {
        let sample = self.measure(reference, now).await?;
        self.record_and_maybe_compact(sample).await
    }

    async fn measure(
        &self,
        reference: &StartupReference,
        now: SystemTime,
    ) -> Result<LatencySample, TelemetryError> {
        let now_us = unix_micros(now);
        let elapsed = LatencySample(now_us.saturating_sub(unix_micros(reference.started_at)));

        let Some(reference_key) = &reference.reference_key else {
            return Ok(elapsed);
        };

        match self.store.get(reference_key).await? {
            None => {
                tracing::debug!(key = %reference_key, "No stored launch instant, using process start");
                Ok(elapsed)
            }
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(launched_us) => match now_us.checked_sub(launched_us) {
                    Some(delta) => Ok(LatencySample(delta)),
                    None => {
                        tracing::warn!(
                            key = %reference_key,
                            value = launched_us,
                            "Stored launch instant is out of range, using process start"
                        );
                        Ok(elapsed)
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        key = %reference_key,
                        value = %raw,
                        error = %e,
                        "Stored launch instant is not a number, using process start"
                    );
                    Ok(elapsed)
                }
            },
        }
    }

    /// Push `sample`, then compact if the window reached capacity.
    pub async fn record_and_maybe_compact(
        &self,
        sample: LatencySample,
    ) -> Result<RecordOutcome, TelemetryError> {
        self.store.push(&self.key, &sample.to_string()).await?;
        metrics::record_startup_latency(sample.as_micros());
        tracing::info!(key = %self.key, latency_us = sample.as_micros(), "Startup latency recorded");

        let len = self.store.length(&self.key).await?;
        if len < self.capacity {
            return Ok(RecordOutcome::Recorded { sample, len });
        }

        tracing::debug!(key = %self.key, len, capacity = self.capacity, "Compacting latency window");

        let mut total: i128 = 0;
        let mut drained = 0usize;
        for _ in 0..len {
            let Some(raw) = self.store.pop_front(&self.key).await? else {
                // A concurrent peer drained the rest.
                break;
            };
            let value = raw.trim().parse::<i64>().map_err(|source| TelemetryError::MalformedSample {
                key: self.key.clone(),
                value: raw.clone(),
                source,
            })?;
            total += i128::from(value);
            drained += 1;
        }

        if drained == 0 {
            return Ok(RecordOutcome::Recorded { sample, len: 0 });
        }

        let mean = LatencySample((total / drained as i128) as i64);
        self.store.push(&self.key, &mean.to_string()).await?;
        metrics::record_compaction(drained);
        tracing::info!(key = %self.key, drained, mean_us = mean.as_micros(), "Latency window compacted");

        Ok(RecordOutcome::Compacted {
            sample,
            drained,
            mean,
        })
    }
}
