// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Stage-output sampling and runtime introspection for streaming pipelines.
//!
//! This crate provides:
//! - Single-slot element cells written from the per-element hot path
//! - Per-output ring buffers of encoded samples, drained periodically
//! - A tap registry that aggregates samples per output channel for
//!   out-of-band control-plane queries
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use streamtap::{MsgPackValueCodec, StageDescriptor, TapConfig, TapRegistry, WindowedElement};
//!
//! # fn main() -> streamtap::Result<()> {
//! // Interval 0 disables the drain threads; samples are triggered manually.
//! let registry = TapRegistry::new(TapConfig::new(0, 10));
//! let descriptor = StageDescriptor::new([("out", "words")]);
//! let samplers = registry.initialize_samplers("tokenizer", &descriptor, |_| {
//!     Arc::new(MsgPackValueCodec)
//! });
//!
//! // The execution engine writes the latest element through the cell handle.
//! let cell = registry.sampler_for_output("tokenizer", 0);
//! cell.write(WindowedElement::global("hello"));
//! samplers[0].sample()?;
//!
//! let samples = registry.samples(None);
//! assert!(samples.contains_key("words"));
//! # Ok(())
//! # }
//! ```

pub mod cell;
pub mod codec;
pub mod config;
pub mod element;
pub mod error;
pub mod registry;
pub mod sampler;

pub use cell::ElementCell;
pub use codec::{MsgPackValueCodec, SampleCodec, WindowedMsgPackCodec};
pub use config::TapConfig;
pub use element::{WindowSpan, WindowedElement};
pub use error::{Result, TapError};
pub use registry::{StageDescriptor, StageOutput, TapRegistry};
pub use sampler::OutputSampler;
