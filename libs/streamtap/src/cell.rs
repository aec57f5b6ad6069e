// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-slot hand-off between the producer hot path and a drain thread.
//!
//! The cell holds at most the latest element for one stage output. Writes
//! always overwrite, never block on a full slot, and never fail; there is
//! no backpressure. The only synchronization is a mutex scoped to the slot
//! itself, so the drain side always observes a self-consistent element.
//! The accepted race is a dropped or duplicated snapshot for one tick when
//! a write lands between a drain's read and the producer's next emit,
//! never torn bytes.

use parking_lot::Mutex;

use crate::element::WindowedElement;

/// Latest-element mailbox written by the execution engine.
///
/// A cell returned for an unknown stage or output index is detached: it is
/// owned by no sampler and never drained, so writes are silently discarded
/// and the hot path stays oblivious to the configuration error.
#[derive(Debug, Default)]
pub struct ElementCell {
    slot: Mutex<Option<WindowedElement>>,
}

impl ElementCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with the latest element. Called from arbitrary
    /// engine worker threads.
    pub fn write(&self, element: WindowedElement) {
        *self.slot.lock() = Some(element);
    }

    /// Drain the slot if an element is present, clearing it. Used only by
    /// the owning sampler.
    pub fn take(&self) -> Option<WindowedElement> {
        self.slot.lock().take()
    }

    pub fn has_element(&self) -> bool {
        self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_yields_nothing() {
        let cell = ElementCell::new();
        assert!(!cell.has_element());
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn test_write_overwrites_previous_element() {
        let cell = ElementCell::new();
        cell.write(WindowedElement::global(1));
        cell.write(WindowedElement::global(2));

        assert_eq!(cell.take(), Some(WindowedElement::global(2)));
    }

    #[test]
    fn test_take_clears_the_slot() {
        let cell = ElementCell::new();
        cell.write(WindowedElement::global("a"));

        assert!(cell.take().is_some());
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn test_concurrent_writes_and_drains() {
        use std::sync::Arc;
        use std::thread;

        let cell = Arc::new(ElementCell::new());
        let writer_cell = Arc::clone(&cell);

        let writer = thread::spawn(move || {
            for i in 0..1_000 {
                writer_cell.write(WindowedElement::global(i));
            }
        });

        let drainer = thread::spawn(move || {
            for _ in 0..1_000 {
                let _ = cell.take();
            }
        });

        writer.join().unwrap();
        drainer.join().unwrap();
    }
}
