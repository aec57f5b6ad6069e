// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end sampling through the public API, with the periodic drain
//! threads running. Waiting for data is the caller's job, so these tests
//! poll with their own deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use streamtap::{
    MsgPackValueCodec, SampleCodec, StageDescriptor, TapConfig, TapRegistry, WindowedElement,
};

fn encode_value(value: impl Into<serde_json::Value>) -> Bytes {
    MsgPackValueCodec.encode_value(&value.into()).unwrap()
}

/// Polls `registry.samples` until every requested channel has data.
fn wait_for_samples(registry: &TapRegistry, channel_ids: &[&str]) -> HashMap<String, Vec<Bytes>> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut collected: HashMap<String, Vec<Bytes>> = HashMap::new();

    loop {
        for (channel_id, samples) in registry.samples(Some(channel_ids)) {
            collected.entry(channel_id).or_default().extend(samples);
        }
        if channel_ids.iter().all(|id| collected.contains_key(*id)) {
            return collected;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting for samples on {channel_ids:?}"
        );
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn periodic_drain_surfaces_hot_path_writes() {
    let registry = TapRegistry::new(TapConfig::new(10, 10));
    registry.initialize_samplers("tokenizer", &StageDescriptor::new([("out", "words")]), |_| {
        Arc::new(MsgPackValueCodec)
    });

    // The engine's per-element hot path: look up the handle once, then
    // overwrite the cell on every emitted element.
    let cell = registry.sampler_for_output("tokenizer", 0);
    cell.write(WindowedElement::global("hello"));

    let samples = wait_for_samples(&registry, &["words"]);
    assert_eq!(samples["words"], vec![encode_value("hello")]);

    registry.stop();
}

#[test]
fn stages_sharing_a_channel_merge_under_one_key() {
    let registry = TapRegistry::new(TapConfig::new(10, 10));
    let descriptor = StageDescriptor::new([("out", "merged")]);
    registry.initialize_samplers("t0", &descriptor, |_| Arc::new(MsgPackValueCodec));
    registry.initialize_samplers("t1", &descriptor, |_| Arc::new(MsgPackValueCodec));

    registry
        .sampler_for_output("t0", 0)
        .write(WindowedElement::global("a"));
    registry
        .sampler_for_output("t1", 0)
        .write(WindowedElement::global("b"));

    let samples = wait_for_samples(&registry, &["merged"]);
    let merged = &samples["merged"];
    assert!(merged.contains(&encode_value("a")));
    assert!(merged.contains(&encode_value("b")));

    registry.stop();
}

#[test]
fn concurrent_production_across_stages_stays_isolated() {
    let registry = Arc::new(TapRegistry::new(TapConfig::new(10, 10)));
    registry.initialize_samplers("t0", &StageDescriptor::new([("out", "c0")]), |_| {
        Arc::new(MsgPackValueCodec)
    });
    registry.initialize_samplers("t1", &StageDescriptor::new([("out", "c1")]), |_| {
        Arc::new(MsgPackValueCodec)
    });

    let writers: Vec<_> = [("t0", "from-t0"), ("t1", "from-t1")]
        .into_iter()
        .map(|(stage, value)| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let cell = registry.sampler_for_output(stage, 0);
                for _ in 0..100 {
                    cell.write(WindowedElement::global(value));
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    let samples = wait_for_samples(&registry, &["c0", "c1"]);
    for writer in writers {
        writer.join().unwrap();
    }

    assert!(samples["c0"].iter().all(|s| *s == encode_value("from-t0")));
    assert!(samples["c1"].iter().all(|s| *s == encode_value("from-t1")));

    registry.stop();
}
