// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Registry mapping stage outputs and shared channels to their samplers.
//!
//! One explicit registry instance is shared by reference between the
//! execution engine (which looks up write handles on the hot path) and the
//! control-plane query path (which aggregates buffered samples per
//! channel). There is no process-wide singleton.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cell::ElementCell;
use crate::codec::SampleCodec;
use crate::config::TapConfig;
use crate::sampler::OutputSampler;

/// One output of a stage: its local tag and the channel it produces to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    pub tag: String,
    pub channel_id: String,
}

/// Ordered output enumeration for one stage. The position of an output in
/// this list at initialization time fixes its output index for the
/// lifetime of the stage's samplers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub outputs: Vec<StageOutput>,
}

impl StageDescriptor {
    pub fn new<'a>(outputs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            outputs: outputs
                .into_iter()
                .map(|(tag, channel_id)| StageOutput {
                    tag: tag.to_string(),
                    channel_id: channel_id.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    by_stage: HashMap<String, Vec<Arc<OutputSampler>>>,
    // A channel fed by multiple stages maps to every one of their samplers,
    // in registration order.
    by_channel: HashMap<String, Vec<Arc<OutputSampler>>>,
}

/// Registry of output samplers, indexed per stage and per channel.
pub struct TapRegistry {
    config: TapConfig,
    inner: Mutex<RegistryInner>,
}

impl TapRegistry {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Build a shared registry if sampling is enabled in `config`, so the
    /// engine only wires the introspection path in when asked to.
    pub fn from_config(config: TapConfig) -> Option<Arc<Self>> {
        config.enabled.then(|| Arc::new(Self::new(config)))
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Create and start one sampler per output of `stage_id`, in descriptor
    /// enumeration order, using `codec_factory` to obtain each channel's
    /// codec. Returns the created samplers in output-index order.
    ///
    /// Must be called at most once per stage id.
    pub fn initialize_samplers<F>(
        &self,
        stage_id: &str,
        descriptor: &StageDescriptor,
        mut codec_factory: F,
    ) -> Vec<Arc<OutputSampler>>
    where
        F: FnMut(&str) -> Arc<dyn SampleCodec>,
    {
        let mut created = Vec::with_capacity(descriptor.outputs.len());
        for output in &descriptor.outputs {
            let codec = codec_factory(&output.channel_id);
            let sampler = Arc::new(OutputSampler::new(
                codec,
                self.config.max_samples,
                self.config.sample_interval(),
            ));
            if let Err(e) = sampler.start() {
                tracing::warn!(
                    "sampler for stage '{stage_id}' output '{}' will not tick: {e}",
                    output.tag
                );
            }
            created.push(sampler);
        }

        let mut inner = self.inner.lock();
        if inner.by_stage.contains_key(stage_id) {
            tracing::warn!("samplers for stage '{stage_id}' initialized more than once");
        }
        inner.by_stage.insert(stage_id.to_string(), created.clone());
        for (output, sampler) in descriptor.outputs.iter().zip(&created) {
            inner
                .by_channel
                .entry(output.channel_id.clone())
                .or_default()
                .push(Arc::clone(sampler));
        }

        created
    }

    /// Write handle for the sampler at (`stage_id`, `index`).
    ///
    /// An unknown stage or out-of-range index is a configuration error, not
    /// a producer error: it is logged and a detached cell is returned whose
    /// writes are silently discarded, so the per-element hot path never
    /// fails or blocks.
    pub fn sampler_for_output(&self, stage_id: &str, index: usize) -> Arc<ElementCell> {
        let inner = self.inner.lock();
        match inner.by_stage.get(stage_id).and_then(|s| s.get(index)) {
            Some(sampler) => sampler.element_cell(),
            None => {
                tracing::warn!(
                    "Out-of-bounds access to sampler for stage '{stage_id}' output {index}; \
                     returning a detached element cell"
                );
                Arc::new(ElementCell::new())
            }
        }
    }

    /// Flush and merge buffered samples per channel id, clearing the
    /// buffers so no sample is reported twice.
    ///
    /// With `channel_ids` the result is filtered to the requested channels.
    /// Channels with no buffered data are absent, including unknown ids.
    /// Samplers sharing a channel are flushed in registration order, but
    /// the flushes are not atomic relative to ongoing production; the
    /// result is a best-effort snapshot.
    pub fn samples(&self, channel_ids: Option<&[&str]>) -> HashMap<String, Vec<Bytes>> {
        // Snapshot the index so flushes run outside the registry lock.
        let snapshot: Vec<(String, Vec<Arc<OutputSampler>>)> = {
            let inner = self.inner.lock();
            inner
                .by_channel
                .iter()
                .filter(|(channel_id, _)| {
                    channel_ids.is_none_or(|ids| ids.contains(&channel_id.as_str()))
                })
                .map(|(channel_id, samplers)| (channel_id.clone(), samplers.clone()))
                .collect()
        };

        let mut result = HashMap::new();
        for (channel_id, samplers) in snapshot {
            let mut merged = Vec::new();
            for sampler in &samplers {
                merged.extend(sampler.flush(true));
            }
            if !merged.is_empty() {
                result.insert(channel_id, merged);
            }
        }
        result
    }

    /// Stop every registered sampler. Idempotent, and safe even for
    /// samplers that never started.
    pub fn stop(&self) {
        let samplers: Vec<Arc<OutputSampler>> = {
            let inner = self.inner.lock();
            inner.by_stage.values().flatten().cloned().collect()
        };
        for sampler in samplers {
            sampler.stop();
        }
    }
}

impl Drop for TapRegistry {
    fn drop(&mut self) {
        self.stop();
    }
}
