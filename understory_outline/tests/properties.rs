// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for the outline.
//!
//! 1. Arbitrary edit sequences never produce a cycle.
//! 2. Every live node has exactly one parent slot (single ownership).
//! 3. Edits before a drain are reported as one union in one layout pass.
//! 4. A drain clears every pending mask; a second drain does nothing.
//! 5. Shown rows are stacked top to bottom in display order.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Size;
use proptest::prelude::*;
use understory_outline::{
    ChangeReason, LabelStyle, LayoutReport, NodeId, SelectionMode, Tree, TreeObserver,
};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Insert(Option<usize>),
    Reparent(usize, Option<usize>),
    Remove(usize),
    Rename(usize),
    Toggle(usize),
    Select(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::option::of(any::<usize>()).prop_map(Op::Insert),
        2 => (any::<usize>(), proptest::option::of(any::<usize>()))
            .prop_map(|(n, p)| Op::Reparent(n, p)),
        1 => any::<usize>().prop_map(Op::Remove),
        2 => any::<usize>().prop_map(Op::Rename),
        2 => any::<usize>().prop_map(Op::Toggle),
        2 => any::<usize>().prop_map(Op::Select),
    ]
}

/// Non-structural edits only.
fn state_op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<usize>().prop_map(Op::Rename),
        any::<usize>().prop_map(Op::Toggle),
        any::<usize>().prop_map(Op::Select),
    ]
}

fn measure(text: &str, _: &LabelStyle) -> Size {
    Size::new(7.0 * text.len() as f64, 18.0)
}

fn pick(live: &[NodeId], i: usize) -> Option<NodeId> {
    (!live.is_empty()).then(|| live[i % live.len()])
}

/// Apply one edit. Rejections (cycles) are expected and ignored.
fn apply(tree: &mut Tree, live: &mut Vec<NodeId>, op: &Op, counter: &mut u32) {
    *counter += 1;
    match *op {
        Op::Insert(parent) => {
            let parent = parent.and_then(|p| pick(live, p));
            let id = tree.insert(parent, format!("n{counter}")).unwrap();
            live.push(id);
        }
        Op::Reparent(node, parent) => {
            if let Some(node) = pick(live, node) {
                let _ = tree.reparent(node, parent.and_then(|p| pick(live, p)));
            }
        }
        Op::Remove(node) => {
            if let Some(node) = pick(live, node) {
                tree.remove(node).unwrap();
                live.retain(|id| tree.contains(*id));
            }
        }
        Op::Rename(node) => {
            if let Some(node) = pick(live, node) {
                tree.set_label(node, format!("r{counter}")).unwrap();
            }
        }
        Op::Toggle(node) => {
            if let Some(node) = pick(live, node) {
                tree.toggle_expanded(node).unwrap();
            }
        }
        Op::Select(node) => {
            if let Some(node) = pick(live, node) {
                tree.toggle_selected(node, false).unwrap();
            }
        }
    }
}

fn build(ops: &[Op]) -> (Tree, Vec<NodeId>) {
    let mut tree = Tree::new();
    tree.set_selection_mode(SelectionMode::Multi);
    let mut live = Vec::new();
    let mut counter = 0;
    for op in ops {
        apply(&mut tree, &mut live, op, &mut counter);
    }
    (tree, live)
}

#[derive(Default)]
struct LayoutLog(Rc<RefCell<Vec<LayoutReport>>>);

impl TreeObserver for LayoutLog {
    fn on_tree_layout(&mut self, _: &mut Tree, report: &LayoutReport) {
        self.0.borrow_mut().push(*report);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Structure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn no_cycles(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let (tree, live) = build(&ops);
        for &id in &live {
            let mut steps = 0;
            let mut current = tree.parent_of(id);
            while let Some(p) = current {
                prop_assert_ne!(p, id, "{:?} is its own ancestor", id);
                steps += 1;
                prop_assert!(steps <= live.len(), "parent chain of {:?} does not end", id);
                current = tree.parent_of(p);
            }
            prop_assert!(tree.is_in_tree(id));
        }
    }

    #[test]
    fn single_ownership(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let (tree, live) = build(&ops);
        prop_assert_eq!(tree.len(), live.len());
        let mut owned: Vec<NodeId> = tree.roots().to_vec();
        for &id in &live {
            for &child in tree.children_of(id) {
                prop_assert_eq!(tree.parent_of(child), Some(id));
                owned.push(child);
            }
        }
        for &root in tree.roots() {
            prop_assert_eq!(tree.parent_of(root), None);
        }
        prop_assert_eq!(owned.len(), live.len(), "each live node is listed exactly once");
        for &id in &live {
            prop_assert_eq!(owned.iter().filter(|o| **o == id).count(), 1);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Drain
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn edits_coalesce_into_one_pass(
        setup in proptest::collection::vec(op_strategy(), 1..40),
        edits in proptest::collection::vec(state_op_strategy(), 1..30),
    ) {
        let (mut tree, mut live) = build(&setup);
        tree.drain(&mut measure, &mut ());
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.subscribe(LayoutLog(log.clone()));

        let mut counter = 1000;
        for op in &edits {
            apply(&mut tree, &mut live, op, &mut counter);
        }
        let expected = live
            .iter()
            .filter_map(|id| tree.pending_reasons(*id))
            .fold(ChangeReason::empty(), |acc, r| acc | r);

        match tree.drain(&mut measure, &mut ()) {
            Some(report) => {
                prop_assert_eq!(report.reasons, expected);
                let log = log.borrow();
                prop_assert!(log.len() <= 1, "at most one layout pass per drain");
                if let Some(layout) = log.first() {
                    prop_assert_eq!(layout.reasons, expected);
                }
            }
            None => prop_assert!(live.is_empty()),
        }
    }

    #[test]
    fn drain_is_idempotent(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let (mut tree, live) = build(&ops);
        tree.drain(&mut measure, &mut ());
        for &id in &live {
            prop_assert_eq!(tree.pending_reasons(id), Some(ChangeReason::empty()));
        }
        prop_assert!(!tree.needs_drain());
        prop_assert!(tree.drain(&mut measure, &mut ()).is_none());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Layout
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn shown_rows_stack_downwards(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let (mut tree, live) = build(&ops);
        tree.drain(&mut measure, &mut ());

        let rows = tree.visible_rows();
        let mut previous_bottom = 0.0;
        for &id in &rows {
            let placement = tree.placement(id);
            prop_assert!(placement.is_some(), "shown row {:?} has no placement", id);
            let placement = placement.unwrap();
            prop_assert!(!tree.is_row_hidden(id));
            prop_assert!(placement.origin.y <= previous_bottom);
            previous_bottom = placement.origin.y - placement.size.height;
        }
        for &id in &live {
            if !tree.is_row_visible(id) && tree.placement(id).is_some() {
                prop_assert!(tree.is_row_hidden(id), "{:?} is placed under a collapsed node", id);
            }
        }
        prop_assert!(tree.content_size().height >= -previous_bottom);
    }
}
