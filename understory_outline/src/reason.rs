// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change reasons recorded by setters, and the work each one implies at drain time.

bitflags::bitflags! {
    /// Why a node changed since the last drain.
    ///
    /// Every setter on [`Tree`](crate::Tree) ORs exactly one of these into the
    /// node's pending mask. The union over all pending nodes is reported with the
    /// layout pass that consumed them.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ChangeReason: u16 {
        /// The label text changed.
        const NAME          = 1 << 0;
        /// The selected flag flipped.
        const SELECTION     = 1 << 1;
        /// The expanded flag flipped.
        const EXPAND        = 1 << 2;
        /// The node was just created.
        const NEW_TREE      = 1 << 3;
        /// The node (and its subtree) was removed; its visuals must be released.
        const REMOVE_TREE   = 1 << 4;
        /// The node moved to another parent.
        const REPARENT      = 1 << 5;
        /// A child was added to or removed from this node.
        const CHILD_CHANGE  = 1 << 6;
        /// A left or right decoration was added, updated, or removed.
        const CHANGED_ICONS = 1 << 7;
        /// The node's minimum height changed.
        const MIN_HEIGHT    = 1 << 8;
    }
}

bitflags::bitflags! {
    /// Work a set of [`ChangeReason`]s requires during a drain.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Effect: u8 {
        /// Repaint the plate with the selected/unselected fill.
        const RECOLOR           = 1 << 0;
        /// Swap the expand/collapse image of an existing row.
        const REFRESH_INDICATOR = 1 << 1;
        /// Recompute placement of every visible row.
        const REFLOW            = 1 << 2;
        /// Release the visuals of the node and its whole subtree.
        const TEARDOWN          = 1 << 3;
    }
}

/// Reason → effect table.
///
/// `EXPAND` only refreshes the indicator here; the drain upgrades it to a reflow
/// when the node has children, since expanding or collapsing them moves rows.
const EFFECTS: [(ChangeReason, Effect); 9] = [
    (ChangeReason::NAME, Effect::REFLOW),
    (ChangeReason::SELECTION, Effect::RECOLOR),
    (ChangeReason::EXPAND, Effect::REFRESH_INDICATOR),
    (ChangeReason::NEW_TREE, Effect::REFLOW),
    (
        ChangeReason::REMOVE_TREE,
        Effect::TEARDOWN.union(Effect::REFLOW),
    ),
    (ChangeReason::REPARENT, Effect::REFLOW),
    (ChangeReason::CHILD_CHANGE, Effect::REFLOW),
    (ChangeReason::CHANGED_ICONS, Effect::REFLOW),
    (ChangeReason::MIN_HEIGHT, Effect::REFLOW),
];

impl ChangeReason {
    /// Union of the effects of every reason in `self`.
    pub fn effects(self) -> Effect {
        EFFECTS
            .iter()
            .filter(|(reason, _)| self.contains(*reason))
            .fold(Effect::empty(), |acc, (_, effect)| acc | *effect)
    }

    /// Whether any reason in `self` changes the size or shape of the outline.
    pub fn needs_reflow(self) -> bool {
        self.effects().contains(Effect::REFLOW)
    }
}
