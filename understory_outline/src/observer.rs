// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscribers to selection and layout events.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::drain::LayoutReport;
use crate::tree::Tree;
use crate::types::NodeId;

/// Receives outline events. Both methods default to doing nothing.
pub trait TreeObserver {
    /// A node's selected flag flipped.
    ///
    /// Delivered synchronously from the mutating call, after the tree has been
    /// updated.
    fn on_node_selected(&mut self, tree: &Tree, node: NodeId, selected: bool) {
        let _ = (tree, node, selected);
    }

    /// A drain ran a full layout pass.
    ///
    /// The tree may be mutated from here; such changes are picked up by the next
    /// drain.
    fn on_tree_layout(&mut self, tree: &mut Tree, report: &LayoutReport) {
        let _ = (tree, report);
    }
}

/// Handle returned by [`Tree::subscribe`](crate::Tree::subscribe).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObserverId(u32);

/// Registered observers, in registration order.
#[derive(Default)]
pub(crate) struct Observers {
    entries: Vec<(ObserverId, Box<dyn TreeObserver>)>,
    next_id: u32,
}

impl core::fmt::Debug for Observers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    pub(crate) fn push(&mut self, observer: Box<dyn TreeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> Option<Box<dyn TreeObserver>> {
        let pos = self.entries.iter().position(|(i, _)| *i == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn TreeObserver>> {
        self.entries.iter_mut().map(|(_, o)| o)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every observer out for a callback. Ids stay unique for observers
    /// that subscribe while the callback runs.
    pub(crate) fn take(&mut self) -> Self {
        let entries = core::mem::take(&mut self.entries);
        Self {
            entries,
            next_id: self.next_id,
        }
    }

    /// Put back observers moved out by [`Observers::take`], keeping any that
    /// subscribed in the meantime after them.
    pub(crate) fn restore(&mut self, mut taken: Self) {
        taken.next_id = self.next_id;
        taken.entries.append(&mut self.entries);
        *self = taken;
    }
}
