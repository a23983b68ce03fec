// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection policy.
//!
//! Every flip of a node's selected flag goes through [`Tree::flip_selected`],
//! which keeps the flag and the tree's selection list in sync, records
//! [`ChangeReason::SELECTION`], and notifies observers before returning.

use crate::error::TreeError;
use crate::reason::ChangeReason;
use crate::tree::Tree;
use crate::types::NodeId;

/// How many nodes may be selected at once.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SelectionMode {
    /// Selecting a node deselects every other node first.
    #[default]
    Single,
    /// Nodes are selected independently.
    Multi,
}

impl Tree {
    /// The selection policy.
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Change the selection policy.
    ///
    /// Switching to [`SelectionMode::Single`] keeps only the most recently
    /// selected node.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
        if mode == SelectionMode::Single
            && let Some(&keep) = self.selection.last()
        {
            self.deselect_all_except(Some(keep));
        }
    }

    /// Selected nodes, oldest selection first.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Whether a node is selected; `false` for stale ids.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.contains(id) && self.node(id).selected
    }

    /// Select or deselect a node under the current policy.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<(), TreeError> {
        if selected {
            self.select(id, false)
        } else {
            self.check(id)?;
            self.flip_selected(id, false);
            Ok(())
        }
    }

    /// Select a node.
    ///
    /// With `clear_previous`, or in [`SelectionMode::Single`], every other node is
    /// deselected first, each with its own notification.
    pub fn select(&mut self, id: NodeId, clear_previous: bool) -> Result<(), TreeError> {
        self.check(id)?;
        if clear_previous || self.selection_mode == SelectionMode::Single {
            self.deselect_all_except(Some(id));
        }
        self.flip_selected(id, true);
        Ok(())
    }

    /// Flip a node's selection and return the new state.
    ///
    /// Turning selection on follows the same rules as [`Tree::select`].
    pub fn toggle_selected(&mut self, id: NodeId, clear_previous: bool) -> Result<bool, TreeError> {
        self.check(id)?;
        if self.node(id).selected {
            if clear_previous {
                self.deselect_all_except(Some(id));
            }
            self.flip_selected(id, false);
            Ok(false)
        } else {
            self.select(id, clear_previous)?;
            Ok(true)
        }
    }

    /// Deselect every node.
    pub fn clear_selection(&mut self) {
        self.deselect_all_except(None);
    }

    fn deselect_all_except(&mut self, keep: Option<NodeId>) {
        let others: alloc::vec::Vec<NodeId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| Some(*id) != keep)
            .collect();
        for id in others {
            self.flip_selected(id, false);
        }
    }

    /// Sole writer of the selected flag.
    pub(crate) fn flip_selected(&mut self, id: NodeId, selected: bool) {
        let n = self.node_mut(id);
        if n.selected == selected {
            return;
        }
        n.selected = selected;
        if selected {
            self.selection.push(id);
        } else {
            self.selection.retain(|s| *s != id);
        }
        self.mark(id, ChangeReason::SELECTION);
        self.notify_selected(id, selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::observer::TreeObserver;

    type Log = Rc<RefCell<Vec<(NodeId, bool)>>>;

    struct Recorder(Log);

    impl TreeObserver for Recorder {
        fn on_node_selected(&mut self, tree: &Tree, node: NodeId, selected: bool) {
            assert_eq!(
                tree.is_selected(node),
                selected,
                "notification is sent after the tree is updated"
            );
            self.0.borrow_mut().push((node, selected));
        }
    }

    fn recorded(tree: &mut Tree) -> Log {
        let log = Log::default();
        tree.subscribe(Recorder(log.clone()));
        log
    }

    #[test]
    fn single_mode_deselects_previous_first() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        let log = recorded(&mut tree);

        tree.select(a, false).unwrap();
        tree.select(b, false).unwrap();
        assert!(!tree.is_selected(a));
        assert!(tree.is_selected(b));
        assert_eq!(tree.selection(), &[b]);
        assert_eq!(
            *log.borrow(),
            vec![(a, true), (a, false), (b, true)],
            "A is deselected before B is selected"
        );
    }

    #[test]
    fn multi_mode_selects_independently() {
        let mut tree = Tree::new();
        tree.set_selection_mode(SelectionMode::Multi);
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        let c = tree.insert(None, "c").unwrap();

        tree.select(a, false).unwrap();
        tree.set_selected(b, true).unwrap();
        assert_eq!(tree.selection(), &[a, b]);

        assert_eq!(tree.toggle_selected(a, false), Ok(false));
        assert_eq!(tree.selection(), &[b]);

        tree.select(c, true).unwrap();
        assert_eq!(tree.selection(), &[c], "clear_previous works in multi mode");
    }

    #[test]
    fn clear_selection_notifies_each_node() {
        let mut tree = Tree::new();
        tree.set_selection_mode(SelectionMode::Multi);
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        tree.select(a, false).unwrap();
        tree.select(b, false).unwrap();
        let log = recorded(&mut tree);

        tree.clear_selection();
        assert!(tree.selection().is_empty());
        assert_eq!(*log.borrow(), vec![(a, false), (b, false)]);
        assert!(
            tree.pending_reasons(a)
                .unwrap()
                .contains(ChangeReason::SELECTION)
        );
    }

    #[test]
    fn redundant_selection_is_silent() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let log = recorded(&mut tree);
        tree.select(a, false).unwrap();
        tree.select(a, false).unwrap();
        tree.set_selected(a, true).unwrap();
        assert_eq!(*log.borrow(), vec![(a, true)]);
    }

    #[test]
    fn switching_to_single_keeps_latest() {
        let mut tree = Tree::new();
        tree.set_selection_mode(SelectionMode::Multi);
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        tree.select(a, false).unwrap();
        tree.select(b, false).unwrap();
        tree.set_selection_mode(SelectionMode::Single);
        assert_eq!(tree.selection(), &[b]);
    }

    #[test]
    fn removal_deselects_whole_subtree() {
        let mut tree = Tree::new();
        tree.set_selection_mode(SelectionMode::Multi);
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(Some(a), "b").unwrap();
        let c = tree.insert(Some(b), "c").unwrap();
        let other = tree.insert(None, "other").unwrap();
        for id in [a, c, other] {
            tree.select(id, false).unwrap();
        }
        let log = recorded(&mut tree);

        tree.remove(a).unwrap();
        assert_eq!(tree.selection(), &[other]);
        assert_eq!(*log.borrow(), vec![(a, false), (c, false)]);
    }

    #[test]
    fn unknown_node_is_rejected_without_side_effects() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        tree.select(a, false).unwrap();
        tree.remove(b).unwrap();
        assert_eq!(tree.select(b, false), Err(TreeError::UnknownNode));
        assert_eq!(tree.selection(), &[a], "failed select keeps selection");
    }
}
