// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Configuration for the sampling layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_sample_interval_ms() -> u64 {
    30_000
}

fn default_max_samples() -> usize {
    10
}

/// Configuration for a [`TapRegistry`](crate::TapRegistry) and the samplers
/// it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Whether output sampling is wired into the engine at all. Off by
    /// default; sampling is an opt-in introspection feature.
    #[serde(default)]
    pub enabled: bool,

    /// Interval between drain ticks in milliseconds. `0` disables the
    /// per-sampler drain threads; samples are then only taken by explicit
    /// [`OutputSampler::sample`](crate::OutputSampler::sample) calls.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Ring buffer capacity per stage output. The oldest sample is evicted
    /// when a new one lands in a full buffer.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_interval_ms: default_sample_interval_ms(),
            max_samples: default_max_samples(),
        }
    }
}

impl TapConfig {
    /// Create an enabled configuration with the given interval and capacity.
    pub fn new(sample_interval_ms: u64, max_samples: usize) -> Self {
        Self {
            enabled: true,
            sample_interval_ms,
            max_samples,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
