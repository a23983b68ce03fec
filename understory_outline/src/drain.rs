// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched processing of pending changes.

use alloc::vec::Vec;

use kurbo::Size;
use smallvec::SmallVec;

use crate::host::{TextMeasure, VisualSink};
use crate::layout::RowPlacement;
use crate::reason::{ChangeReason, Effect};
use crate::tree::Tree;
use crate::types::{DecorationId, NodeId, Side};

/// Summary of a layout pass, also delivered to
/// [`TreeObserver::on_tree_layout`](crate::TreeObserver::on_tree_layout).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutReport {
    /// Union of every change reason consumed by the drain.
    pub reasons: ChangeReason,
    /// Widest row extent and final row cursor (after the last row's spacing),
    /// plus the end offset.
    pub content_size: Size,
    /// Container size after applying the width mode.
    pub container_size: Size,
    /// Number of rows placed.
    pub rows: usize,
}

/// What a call to [`Tree::drain`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrainReport {
    /// Union of every change reason consumed by the drain.
    pub reasons: ChangeReason,
    /// Present when the drain ran a full layout pass.
    pub layout: Option<LayoutReport>,
}

/// What the tree knows about the visuals it asked the sink to create.
#[derive(Clone, Debug)]
pub(crate) struct VisualState {
    pub(crate) placement: RowPlacement,
    pub(crate) hidden: bool,
    pub(crate) icons: SmallVec<[(Side, DecorationId); 4]>,
    /// Layout pass that last placed or hid this row.
    pub(crate) epoch: u64,
}

impl Tree {
    /// Process every change since the previous drain.
    ///
    /// Returns `None` when no drain is armed, or when called from inside a
    /// running drain. Otherwise the pending set is consumed: removed subtrees have
    /// their visuals released, selection-only changes recolor existing rows, and
    /// anything that can change the shape of the outline triggers exactly one full
    /// layout pass, after which layout observers are notified.
    ///
    /// Changes made while the drain runs (for example by a layout observer) are
    /// left for the next drain, which is armed before this call returns.
    pub fn drain<M, V>(&mut self, measure: &mut M, sink: &mut V) -> Option<DrainReport>
    where
        M: TextMeasure + ?Sized,
        V: VisualSink + ?Sized,
    {
        if !self.scheduler.begin() {
            return None;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "outline_drain",
            pending = self.pending.len(),
            retired = self.retired.len()
        )
        .entered();

        let pending = core::mem::take(&mut self.pending);
        let mut reasons = core::mem::take(&mut self.retired_reasons);
        let mut reflow = core::mem::take(&mut self.force_layout);

        for id in core::mem::take(&mut self.retired) {
            reflow = true;
            self.release_visual(id, sink);
        }

        let mut recolor: Vec<NodeId> = Vec::new();
        let mut refresh: Vec<NodeId> = Vec::new();
        for id in pending {
            let Some(node) = self.node_opt_mut(id) else {
                debug_assert!(false, "pending set holds stale node {id:?}");
                #[cfg(feature = "tracing")]
                tracing::warn!(?id, "skipping stale pending node");
                continue;
            };
            let mask = core::mem::take(&mut node.pending);
            reasons |= mask;
            if id == self.root {
                reflow |= mask.needs_reflow();
                continue;
            }
            let effects = self.resolve_effects(id, mask);
            if effects.contains(Effect::REFLOW) {
                reflow = true;
                continue;
            }
            if effects.contains(Effect::RECOLOR) {
                recolor.push(id);
            }
            if effects.contains(Effect::REFRESH_INDICATOR) {
                refresh.push(id);
            }
        }

        let layout = if reflow {
            Some(self.layout_pass(reasons, measure, sink))
        } else {
            for id in recolor {
                self.recolor_visual(id, sink);
            }
            for id in refresh {
                self.refresh_indicator(id, sink);
            }
            None
        };

        if let Some(report) = &layout {
            self.notify_layout(report);
        }
        if self.scheduler.finish() {
            self.fire_defer();
        }
        Some(DrainReport { reasons, layout })
    }

    /// The last placement computed for a node, if it has been laid out.
    pub fn placement(&self, id: NodeId) -> Option<&RowPlacement> {
        if !self.contains(id) {
            return None;
        }
        self.visuals.get(&id).map(|v| &v.placement)
    }

    /// Whether the node's row visual exists but is hidden under a collapsed
    /// ancestor.
    pub fn is_row_hidden(&self, id: NodeId) -> bool {
        self.contains(id) && self.visuals.get(&id).is_some_and(|v| v.hidden)
    }

    /// Content size computed by the last layout pass.
    pub fn content_size(&self) -> Size {
        self.content_size
    }

    /// Container size resolved by the last layout pass.
    pub fn container_size(&self) -> Size {
        self.container_size
    }

    /// Map a node's reasons to the work they need, taking the node's current
    /// state into account.
    fn resolve_effects(&self, id: NodeId, mask: ChangeReason) -> Effect {
        let mut effects = mask.effects();
        let node = self.node(id);
        if !self.visuals.contains_key(&id) {
            // Never placed: only a layout pass can create its visuals.
            effects |= Effect::REFLOW;
        }
        if effects.contains(Effect::REFRESH_INDICATOR) {
            if node.children.is_empty() {
                // Leaves have no indicator to refresh.
                effects.remove(Effect::REFRESH_INDICATOR);
            } else if self.is_row_visible(id) {
                // Showing or hiding children moves every row below.
                effects |= Effect::REFLOW;
            }
        }
        effects
    }

    fn recolor_visual<V: VisualSink + ?Sized>(&mut self, id: NodeId, sink: &mut V) {
        let selected = self.node(id).selected;
        let fill = self.style.plate_fill(selected);
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.placement.selected = selected;
            sink.recolor_row(id, fill, selected);
        }
    }

    fn refresh_indicator<V: VisualSink + ?Sized>(&mut self, id: NodeId, sink: &mut V) {
        let expanded = self.node(id).expanded;
        let Some(placement) = self.visuals.get(&id).map(|v| v.placement) else {
            return;
        };
        if placement.indicator.is_none() {
            return;
        }
        let indicator = self.indicator_visual(
            placement.depth,
            placement.origin.y,
            placement.size.height,
            expanded,
        );
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.placement.indicator = Some(indicator);
        }
        sink.place_indicator(id, &indicator);
    }

    /// Release every visual of a node. No-op for nodes that were never placed.
    pub(crate) fn release_visual<V: VisualSink + ?Sized>(&mut self, id: NodeId, sink: &mut V) {
        if self.visuals.remove(&id).is_some() {
            sink.release_row(id);
        }
    }

    fn notify_layout(&mut self, report: &LayoutReport) {
        if !self.observers.is_empty() {
            self.observers_busy = true;
            let mut observers = self.observers.take();
            for observer in observers.iter_mut() {
                observer.on_tree_layout(self, report);
            }
            self.observers.restore(observers);
            self.observers_busy = false;
        }
        for (node, selected) in core::mem::take(&mut self.queued_selection) {
            self.notify_selected(node, selected);
        }
    }
}
