// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Element envelope types shared between the execution engine and the taps.
//!
//! The engine wraps every emitted value in a [`WindowedElement`] before it
//! reaches an element cell, regardless of which codec is registered for the
//! output channel. Plain codecs see only the inner value; window-aware
//! codecs see the full envelope.

use serde::{Deserialize, Serialize};

/// Half-open event-time window `[start_ns, end_ns)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpan {
    pub start_ns: i64,
    pub end_ns: i64,
}

impl WindowSpan {
    pub fn new(start_ns: i64, end_ns: i64) -> Self {
        Self { start_ns, end_ns }
    }

    /// The window covering the entire timestamp domain.
    pub fn global() -> Self {
        Self {
            start_ns: i64::MIN,
            end_ns: i64::MAX,
        }
    }

    pub fn contains(&self, timestamp_ns: i64) -> bool {
        self.start_ns <= timestamp_ns && timestamp_ns < self.end_ns
    }
}

/// A pipeline element together with its window metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedElement {
    /// Dynamically-typed element payload.
    pub value: serde_json::Value,
    /// Event timestamp in nanoseconds.
    pub timestamp_ns: i64,
    /// Windows this element belongs to. Always non-empty in practice.
    pub windows: Vec<WindowSpan>,
}

impl WindowedElement {
    pub fn new(
        value: impl Into<serde_json::Value>,
        timestamp_ns: i64,
        windows: Vec<WindowSpan>,
    ) -> Self {
        Self {
            value: value.into(),
            timestamp_ns,
            windows,
        }
    }

    /// Wrap a bare value in the global window at timestamp 0.
    pub fn global(value: impl Into<serde_json::Value>) -> Self {
        Self::new(value, 0, vec![WindowSpan::global()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_window_contains_everything() {
        let window = WindowSpan::global();
        assert!(window.contains(i64::MIN));
        assert!(window.contains(0));
        assert!(window.contains(i64::MAX - 1));
    }

    #[test]
    fn test_window_span_is_half_open() {
        let window = WindowSpan::new(0, 1_000);
        assert!(window.contains(0));
        assert!(window.contains(999));
        assert!(!window.contains(1_000));
    }

    #[test]
    fn test_global_wraps_value() {
        let element = WindowedElement::global("hello");
        assert_eq!(element.value, serde_json::Value::from("hello"));
        assert_eq!(element.timestamp_ns, 0);
        assert_eq!(element.windows, vec![WindowSpan::global()]);
    }
}
