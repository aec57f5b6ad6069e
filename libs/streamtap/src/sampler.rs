// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-output sampler: element cell, ring buffer of encoded samples, and an
//! independent periodic drain thread.
//!
//! One sampler exists per (stage id, output index), created once at stage
//! initialization and destroyed only at registry teardown. Each sampler
//! drains on its own cadence so a slow codec on one stage never delays
//! sampling on another.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::cell::ElementCell;
use crate::codec::SampleCodec;
use crate::error::{Result, TapError};

/// State shared between the sampler handle and its drain thread.
struct SamplerShared {
    codec: Arc<dyn SampleCodec>,
    cell: Arc<ElementCell>,
    buffer: Mutex<VecDeque<Bytes>>,
    max_samples: usize,
}

impl SamplerShared {
    /// Drain the cell and append one encoded sample to the ring buffer.
    ///
    /// The encode step runs outside the buffer lock: a slow codec must not
    /// block a concurrent flush, and it never touches the producer path at
    /// all. Returns `Ok(false)` when the cell held no element.
    fn sample(&self) -> Result<bool> {
        let Some(element) = self.cell.take() else {
            return Ok(false);
        };

        // Window-aware codecs get the full envelope; plain codecs get the
        // inner value so they never see envelope bytes they cannot decode.
        let encoded = if self.codec.is_windowed() {
            self.codec.encode_windowed(&element)?
        } else {
            self.codec.encode_value(&element.value)?
        };

        let mut buffer = self.buffer.lock();
        if buffer.len() == self.max_samples {
            buffer.pop_front();
        }
        buffer.push_back(encoded);
        Ok(true)
    }

    fn flush(&self, clear: bool) -> Vec<Bytes> {
        let mut buffer = self.buffer.lock();
        if clear {
            buffer.drain(..).collect()
        } else {
            buffer.iter().cloned().collect()
        }
    }
}

/// Lossy snapshot buffer for one stage output.
///
/// Holds the most recent `max_samples` encoded elements, evicting the
/// single oldest entry per insertion. Samples are taken either by the
/// periodic drain thread or, when the interval is zero, exclusively by
/// explicit [`sample`](OutputSampler::sample) calls.
pub struct OutputSampler {
    shared: Arc<SamplerShared>,
    interval: Duration,
    running: Arc<AtomicBool>,
    stop_tx: Mutex<Option<crossbeam_channel::Sender<()>>>,
    drain_thread: Mutex<Option<JoinHandle<()>>>,
}

impl OutputSampler {
    /// Create a sampler with the given codec, ring capacity, and drain
    /// interval. An interval of zero puts the sampler in manual-trigger
    /// mode.
    ///
    /// # Panics
    ///
    /// Panics if `max_samples` is zero.
    pub fn new(codec: Arc<dyn SampleCodec>, max_samples: usize, interval: Duration) -> Self {
        assert!(
            max_samples >= 1,
            "sample buffer must hold at least 1 entry, got {}",
            max_samples
        );

        Self {
            shared: Arc::new(SamplerShared {
                codec,
                cell: Arc::new(ElementCell::new()),
                buffer: Mutex::new(VecDeque::with_capacity(max_samples)),
                max_samples,
            }),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(None),
            drain_thread: Mutex::new(None),
        }
    }

    /// The write handle consumed by the execution engine's per-element hot
    /// path.
    pub fn element_cell(&self) -> Arc<ElementCell> {
        Arc::clone(&self.shared.cell)
    }

    /// Take one sample now: drain the cell and, if it held an element,
    /// encode and buffer it. No-op returning `Ok(false)` on an empty cell.
    ///
    /// An encode failure is surfaced for this tick only and leaves the
    /// buffer untouched.
    pub fn sample(&self) -> Result<bool> {
        self.shared.sample()
    }

    /// Current buffer contents in insertion order. With `clear` the buffer
    /// is emptied atomically with the read, so no entry is observed twice.
    pub fn flush(&self, clear: bool) -> Vec<Bytes> {
        self.shared.flush(clear)
    }

    /// Start the periodic drain thread. No-op in manual-trigger mode or
    /// when already running.
    pub fn start(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Ok(());
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(()); // Already running
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        let handle = std::thread::Builder::new()
            .name("tap-drain".to_string())
            .spawn(move || {
                tracing::debug!(
                    interval_ms = interval.as_millis() as u64,
                    "output sampler drain thread started"
                );

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                            if !running.load(Ordering::SeqCst) {
                                break;
                            }
                            // A bad element must not kill the sampler; log
                            // and keep ticking.
                            if let Err(e) = shared.sample() {
                                tracing::warn!("dropping sample for this tick: {e}");
                            }
                        }
                        Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!("output sampler drain thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                TapError::Runtime(format!("failed to spawn drain thread: {}", e))
            })?;

        *self.stop_tx.lock() = Some(stop_tx);
        *self.drain_thread.lock() = Some(handle);

        Ok(())
    }

    /// Stop the periodic drain thread and wait for it to exit. Safe to call
    /// from any thread, any number of times, before or after `start`.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return; // Not running
        }

        // Dropping the sender wakes the drain thread out of its wait.
        self.stop_tx.lock().take();
        if let Some(handle) = self.drain_thread.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for OutputSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
