// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, state setters, queries.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::Size;
use smallvec::SmallVec;

use crate::drain::VisualState;
use crate::error::TreeError;
use crate::observer::{ObserverId, Observers, TreeObserver};
use crate::reason::ChangeReason;
use crate::schedule::{Defer, ScheduleStatus, Scheduler};
use crate::selection::SelectionMode;
use crate::style::TreeStyle;
use crate::types::{Decoration, DecorationId, NodeId, Side, TreeId};

/// A hierarchy of labeled, selectable, expandable rows.
///
/// Nodes live in a slot arena and are addressed by generational [`NodeId`]s.
/// Every setter records *why* the node changed as a [`ChangeReason`] and arms a
/// drain; nothing is laid out until the host calls [`Tree::drain`], which folds
/// every change since the previous drain into at most one layout pass.
///
/// ## Example
///
/// ```rust
/// use kurbo::Size;
/// use understory_outline::{LabelStyle, Tree};
///
/// let mut tree = Tree::new();
/// let docs = tree.insert(None, "docs").unwrap();
/// let readme = tree.insert(Some(docs), "README.md").unwrap();
/// assert_eq!(tree.parent_of(readme), Some(docs));
/// assert_eq!(tree.roots(), &[docs]);
///
/// // Nothing is laid out until the drain runs.
/// assert!(tree.placement(readme).is_none());
/// let mut measure = |text: &str, _: &LabelStyle| Size::new(8.0 * text.len() as f64, 16.0);
/// let report = tree.drain(&mut measure, &mut ()).unwrap();
/// assert!(report.layout.is_some());
/// assert!(tree.placement(readme).is_some());
/// ```
pub struct Tree {
    id: TreeId,
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Implicit, never-rendered parent of every top-level node.
    pub(crate) root: NodeId,
    /// Nodes with a non-empty pending mask, in the order they became dirty.
    pub(crate) pending: Vec<NodeId>,
    /// Removed nodes whose visuals still have to be released.
    pub(crate) retired: Vec<NodeId>,
    pub(crate) retired_reasons: ChangeReason,
    /// Style or container changes that need a layout pass without any dirty node.
    pub(crate) force_layout: bool,
    pub(crate) selection: Vec<NodeId>,
    pub(crate) selection_mode: SelectionMode,
    pub(crate) style: TreeStyle,
    pub(crate) container_width: f64,
    pub(crate) parent_width: f64,
    pub(crate) scheduler: Scheduler,
    defer: Option<Box<dyn Defer>>,
    pub(crate) observers: Observers,
    /// Set while layout observers hold the tree; selection events queue up meanwhile.
    pub(crate) observers_busy: bool,
    pub(crate) queued_selection: Vec<(NodeId, bool)>,
    pub(crate) visuals: HashMap<NodeId, VisualState>,
    pub(crate) epoch: u64,
    pub(crate) content_size: Size,
    pub(crate) container_size: Size,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("pending", &self.pending.len())
            .field("selected", &self.selection.len())
            .field("scheduler", &self.scheduler)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    /// `None` only for the implicit root.
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) label: String,
    pub(crate) selected: bool,
    pub(crate) expanded: bool,
    pub(crate) min_height: f64,
    pub(crate) left: SmallVec<[Decoration; 2]>,
    pub(crate) right: SmallVec<[Decoration; 2]>,
    pub(crate) pending: ChangeReason,
}

impl Node {
    fn new(generation: u32, label: String) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            label,
            selected: false,
            expanded: true,
            min_height: 0.0,
            left: SmallVec::new(),
            right: SmallVec::new(),
            pending: ChangeReason::empty(),
        }
    }

    pub(crate) fn decorations(&self, side: Side) -> &[Decoration] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn decorations_mut(&mut self, side: Side) -> &mut SmallVec<[Decoration; 2]> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl Tree {
    /// Create an empty tree with the default [`TreeStyle`].
    pub fn new() -> Self {
        Self::with_style(TreeStyle::default())
    }

    /// Create an empty tree with the given style.
    pub fn with_style(style: TreeStyle) -> Self {
        let id = TreeId::fresh();
        Self {
            id,
            nodes: alloc::vec![Some(Node::new(1, String::new()))],
            generations: alloc::vec![1],
            free_list: Vec::new(),
            root: NodeId::new(id, 0, 1),
            pending: Vec::new(),
            retired: Vec::new(),
            retired_reasons: ChangeReason::empty(),
            force_layout: false,
            selection: Vec::new(),
            selection_mode: SelectionMode::default(),
            style,
            container_width: 0.0,
            parent_width: 0.0,
            scheduler: Scheduler::default(),
            defer: None,
            observers: Observers::default(),
            observers_busy: false,
            queued_selection: Vec::new(),
            visuals: HashMap::new(),
            epoch: 0,
            content_size: Size::ZERO,
            container_size: Size::ZERO,
        }
    }

    /// Identifier of this tree.
    pub fn id(&self) -> TreeId {
        self.id
    }

    // --- structure ---

    /// Insert a new node labeled `label` as the last child of `parent`, or as the
    /// last top-level node if `parent` is `None`.
    ///
    /// The node starts expanded and unselected. It is laid out on the next drain.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        label: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let parent = match parent {
            Some(p) => {
                self.check(p)?;
                p
            }
            None => self.root,
        };
        let label = label.into();
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx] + 1;
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, label));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, label)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(self.id, idx, generation);
        self.link_parent(id, parent);
        self.mark(id, ChangeReason::NEW_TREE);
        self.mark(parent, ChangeReason::CHILD_CHANGE);
        Ok(id)
    }

    /// Move `id` to the end of `new_parent`'s children, or to the end of the
    /// top-level nodes if `new_parent` is `None`.
    ///
    /// Rejected with [`TreeError::Cycle`] if `new_parent` is `id` or one of its
    /// descendants.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), TreeError> {
        self.check(id)?;
        let target = match new_parent {
            Some(p) => {
                self.check(p)?;
                p
            }
            None => self.root,
        };
        if self.is_ancestor_or_self(id, target) {
            #[cfg(feature = "tracing")]
            tracing::debug!(?id, ?target, "rejected reparent that would create a cycle");
            return Err(TreeError::Cycle);
        }
        if let Some(old) = self.node(id).parent {
            self.unlink_parent(id, old);
            self.mark(old, ChangeReason::CHILD_CHANGE);
            self.mark(id, ChangeReason::REPARENT);
        }
        self.link_parent(id, target);
        self.mark(target, ChangeReason::CHILD_CHANGE);
        Ok(())
    }

    /// Remove a node and its whole subtree.
    ///
    /// Removed nodes leave the selection immediately (each one notifying
    /// observers), their identifiers become stale, and their visuals are released
    /// on the next drain.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
            self.mark(parent, ChangeReason::CHILD_CHANGE);
        }
        let mut deselected = Vec::new();
        let mut dropped_pending: HashSet<NodeId> = HashSet::new();
        let mut stack = alloc::vec![id];
        while let Some(current) = stack.pop() {
            let node = self.nodes[current.idx()]
                .take()
                .expect("subtree links point at live nodes");
            stack.extend(node.children.iter().rev().copied());
            if !node.pending.is_empty() {
                dropped_pending.insert(current);
            }
            if node.selected {
                deselected.push(current);
            }
            self.retired.push(current);
            self.retired_reasons |=
                node.pending | ChangeReason::REMOVE_TREE | ChangeReason::REPARENT;
            // A slot whose generation is exhausted is never reused, so identifiers
            // are never reissued.
            if self.generations[current.idx()] < u32::MAX {
                self.free_list.push(current.idx());
            }
        }
        if !dropped_pending.is_empty() {
            self.pending.retain(|p| !dropped_pending.contains(p));
        }
        if !deselected.is_empty() {
            let gone: HashSet<NodeId> = deselected.iter().copied().collect();
            self.selection.retain(|s| !gone.contains(s));
        }
        self.request_update();
        for node in deselected {
            self.notify_selected(node, false);
        }
        Ok(())
    }

    // --- setters ---

    /// Change the label of a node.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), TreeError> {
        self.check(id)?;
        let label = label.into();
        let n = self.node_mut(id);
        if n.label != label {
            n.label = label;
            self.mark(id, ChangeReason::NAME);
        }
        Ok(())
    }

    /// Expand or collapse a node.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<(), TreeError> {
        self.check(id)?;
        let n = self.node_mut(id);
        if n.expanded != expanded {
            n.expanded = expanded;
            self.mark(id, ChangeReason::EXPAND);
        }
        Ok(())
    }

    /// Flip the expanded state of a node and return the new state.
    ///
    /// This is what an expand/collapse indicator click should call.
    pub fn toggle_expanded(&mut self, id: NodeId) -> Result<bool, TreeError> {
        self.check(id)?;
        let expanded = !self.node(id).expanded;
        self.set_expanded(id, expanded)?;
        Ok(expanded)
    }

    /// Expand every ancestor of `id` so that its row becomes visible.
    pub fn expand_to(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        let mut current = self.node(id).parent;
        while let Some(p) = current
            && p != self.root
        {
            self.set_expanded(p, true)?;
            current = self.node(p).parent;
        }
        Ok(())
    }

    /// Expand every node.
    pub fn expand_all(&mut self) {
        self.set_all_expanded(true);
    }

    /// Collapse every node.
    pub fn collapse_all(&mut self) {
        self.set_all_expanded(false);
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        let mut stack: Vec<NodeId> = self.node(self.root).children.clone();
        while let Some(id) = stack.pop() {
            stack.extend_from_slice(&self.node(id).children);
            let n = self.node_mut(id);
            if n.expanded != expanded {
                n.expanded = expanded;
                self.mark(id, ChangeReason::EXPAND);
            }
        }
    }

    /// Set the floor on a node's row height.
    pub fn set_min_height(&mut self, id: NodeId, min_height: f64) -> Result<(), TreeError> {
        self.check(id)?;
        let n = self.node_mut(id);
        if n.min_height != min_height {
            n.min_height = min_height;
            self.mark(id, ChangeReason::MIN_HEIGHT);
        }
        Ok(())
    }

    /// Add a decoration, or update the one with the same id in place.
    pub fn set_decoration(
        &mut self,
        id: NodeId,
        side: Side,
        decoration: Decoration,
    ) -> Result<(), TreeError> {
        self.check(id)?;
        let list = self.node_mut(id).decorations_mut(side);
        match list.iter_mut().find(|d| d.id == decoration.id) {
            Some(existing) if *existing == decoration => return Ok(()),
            Some(existing) => *existing = decoration,
            None => list.push(decoration),
        }
        self.mark(id, ChangeReason::CHANGED_ICONS);
        Ok(())
    }

    /// Remove a decoration. Returns whether it existed.
    pub fn remove_decoration(
        &mut self,
        id: NodeId,
        side: Side,
        decoration: DecorationId,
    ) -> Result<bool, TreeError> {
        self.check(id)?;
        let list = self.node_mut(id).decorations_mut(side);
        let Some(pos) = list.iter().position(|d| d.id == decoration) else {
            return Ok(false);
        };
        list.remove(pos);
        self.mark(id, ChangeReason::CHANGED_ICONS);
        Ok(true)
    }

    /// Remove every decoration on one side of a node.
    pub fn clear_decorations(&mut self, id: NodeId, side: Side) -> Result<(), TreeError> {
        self.check(id)?;
        let list = self.node_mut(id).decorations_mut(side);
        if !list.is_empty() {
            list.clear();
            self.mark(id, ChangeReason::CHANGED_ICONS);
        }
        Ok(())
    }

    // --- configuration ---

    /// The current style.
    pub fn style(&self) -> &TreeStyle {
        &self.style
    }

    /// Replace the style. Every row is laid out again on the next drain.
    pub fn set_style(&mut self, style: TreeStyle) {
        if self.style != style {
            self.style = style;
            self.force_layout = true;
            self.request_update();
        }
    }

    /// Tell the tree the current width of its container and of the container's
    /// parent. These feed [`WidthMode::Leave`](crate::WidthMode::Leave),
    /// [`WidthMode::StretchToParent`](crate::WidthMode::StretchToParent), and
    /// [`PlateWidth::StretchToEdge`](crate::PlateWidth::StretchToEdge).
    pub fn set_container_widths(&mut self, container: f64, parent: f64) {
        if self.container_width != container || self.parent_width != parent {
            self.container_width = container;
            self.parent_width = parent;
            self.force_layout = true;
            self.request_update();
        }
    }

    // --- scheduling and observers ---

    /// Install the host's deferral hook, invoked each time a drain becomes newly
    /// armed.
    pub fn set_defer(&mut self, defer: impl Defer + 'static) {
        self.defer = Some(Box::new(defer));
    }

    /// Arm a drain for the end of the current update cycle.
    ///
    /// Setters call this themselves; hosts only need it to force a drain.
    pub fn request_update(&mut self) -> ScheduleStatus {
        let status = self.scheduler.request();
        match status {
            ScheduleStatus::Scheduled if !self.scheduler.is_draining() => self.fire_defer(),
            ScheduleStatus::Scheduled => {}
            ScheduleStatus::AlreadyScheduled => {
                #[cfg(feature = "tracing")]
                tracing::trace!("drain already scheduled");
            }
        }
        status
    }

    /// Whether a drain is armed.
    pub fn needs_drain(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub(crate) fn fire_defer(&mut self) {
        if let Some(defer) = self.defer.as_mut() {
            defer.defer();
        }
    }

    /// Register an observer. Observers are called in registration order.
    pub fn subscribe(&mut self, observer: impl TreeObserver + 'static) -> ObserverId {
        self.observers.push(Box::new(observer))
    }

    /// Unregister an observer and hand it back.
    ///
    /// Observers are detached from the tree while they are being notified, so an
    /// observer cannot unsubscribe itself from inside a callback.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn TreeObserver>> {
        self.observers.remove(id)
    }

    pub(crate) fn notify_selected(&mut self, node: NodeId, selected: bool) {
        if self.observers_busy {
            self.queued_selection.push((node, selected));
            return;
        }
        if self.observers.is_empty() {
            return;
        }
        let mut observers = self.observers.take();
        for observer in observers.iter_mut() {
            observer.on_node_selected(self, node, selected);
        }
        self.observers.restore(observers);
    }

    // --- queries ---

    /// Returns true if `id` refers to a live node of this tree.
    ///
    /// A `NodeId` is considered live if it was minted by this tree, its slot
    /// exists, and its generation matches the current generation stored in that
    /// slot.
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.id
            && id != self.root
            && self
                .nodes
                .get(id.idx())
                .and_then(|n| n.as_ref())
                .is_some_and(|n| n.generation == id.generation)
    }

    /// Returns true if `id` is live and attached under this tree's root.
    pub fn is_in_tree(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current == self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count() - 1
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    /// Top-level nodes, in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.node(self.root).children
    }

    /// Returns the parent of a node, or `None` for top-level nodes and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        self.node(id).parent.filter(|p| *p != self.root)
    }

    /// Get the children of a node in display order, or an empty slice if the node
    /// is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        if !self.contains(id) {
            return &[];
        }
        &self.node(id).children
    }

    /// Returns true if the node has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children_of(id).is_empty()
    }

    /// Nesting depth of a node; top-level nodes are at depth 0.
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(p) = current
            && p != self.root
        {
            depth += 1;
            current = self.node(p).parent;
        }
        Some(depth)
    }

    /// Label of a node.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.contains(id).then(|| self.node(id).label.as_str())
    }

    /// Whether a node is expanded; `false` for stale ids.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.contains(id) && self.node(id).expanded
    }

    /// Floor on a node's row height.
    pub fn min_height(&self, id: NodeId) -> Option<f64> {
        self.contains(id).then(|| self.node(id).min_height)
    }

    /// Decorations on one side of a node, in display order.
    pub fn decorations(&self, id: NodeId, side: Side) -> &[Decoration] {
        if !self.contains(id) {
            return &[];
        }
        self.node(id).decorations(side)
    }

    /// Reasons recorded for a node since the last drain.
    pub fn pending_reasons(&self, id: NodeId) -> Option<ChangeReason> {
        self.contains(id).then(|| self.node(id).pending)
    }

    /// Returns true if every ancestor of the node is expanded.
    pub fn is_row_visible(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = self.node(id).parent;
        while let Some(p) = current
            && p != self.root
        {
            let n = self.node(p);
            if !n.expanded {
                return false;
            }
            current = n.parent;
        }
        true
    }

    /// Every row currently shown, in display order.
    pub fn visible_rows(&self) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack: Vec<NodeId> = self.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            rows.push(id);
            let node = self.node(id);
            if node.expanded {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        rows
    }

    /// Get the row displayed after `current`, skipping collapsed subtrees.
    ///
    /// Returns `None` at the last row or if `current` is stale. Each step locates
    /// `current` among its siblings; walk the whole list with [`Tree::visible_rows`].
    pub fn next_visible(&self, current: NodeId) -> Option<NodeId> {
        if !self.contains(current) {
            return None;
        }
        self.next_in_order(current)
    }

    /// Get the row displayed before `current`, skipping collapsed subtrees.
    ///
    /// Returns `None` at the first row or if `current` is stale.
    pub fn prev_visible(&self, current: NodeId) -> Option<NodeId> {
        if !self.contains(current) {
            return None;
        }
        if let Some(prev_sibling) = self.prev_sibling(current) {
            return Some(self.last_visible_in(prev_sibling));
        }
        self.parent_of(current)
    }

    // --- internals ---

    /// Validate that `id` is a live node of this tree.
    pub(crate) fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if id.tree != self.id {
            #[cfg(feature = "tracing")]
            tracing::debug!(?id, "rejected node from another tree");
            return Err(TreeError::ForeignNode);
        }
        if !self.contains(id) {
            #[cfg(feature = "tracing")]
            tracing::debug!(?id, "rejected stale node");
            return Err(TreeError::UnknownNode);
        }
        Ok(())
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.generation {
            return None;
        }
        Some(n)
    }

    /// Record `reason` on a node and arm a drain.
    pub(crate) fn mark(&mut self, id: NodeId, reason: ChangeReason) {
        let n = self.node_mut(id);
        let was_clean = n.pending.is_empty();
        n.pending |= reason;
        if was_clean {
            self.pending.push(id);
        }
        self.request_update();
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    fn next_in_order(&self, current: NodeId) -> Option<NodeId> {
        let node = self.node(current);
        if node.expanded
            && let Some(&first_child) = node.children.first()
        {
            return Some(first_child);
        }

        let mut node = current;
        while let Some(parent) = self.node(node).parent {
            if let Some(next_sibling) = self.next_sibling(node) {
                return Some(next_sibling);
            }
            if parent == self.root {
                break;
            }
            node = parent;
        }
        None
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        pos.checked_sub(1).and_then(|p| siblings.get(p).copied())
    }

    fn last_visible_in(&self, mut node: NodeId) -> NodeId {
        loop {
            let n = self.node(node);
            match n.children.last() {
                Some(&last) if n.expanded => node = last,
                _ => return node,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;
    use kurbo::Size;

    use crate::types::ImageRef;

    fn icon(id: u64) -> Decoration {
        Decoration::new(DecorationId(id), ImageRef::new(id, Size::new(8.0, 8.0)))
    }

    #[test]
    fn insert_links_parent_and_children() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(Some(a), "b").unwrap();
        let c = tree.insert(Some(a), "c").unwrap();
        assert_eq!(tree.roots(), &[a]);
        assert_eq!(tree.children_of(a), &[b, c]);
        assert_eq!(tree.parent_of(b), Some(a));
        assert_eq!(tree.parent_of(a), None, "top-level nodes report no parent");
        assert_eq!(tree.len(), 3);
        assert!(tree.is_expanded(a), "nodes start expanded");
        assert!(!tree.is_selected(a), "nodes start unselected");
        assert_eq!(
            tree.pending_reasons(b),
            Some(ChangeReason::NEW_TREE),
            "new node records its creation"
        );
        assert_eq!(
            tree.pending_reasons(a),
            Some(ChangeReason::NEW_TREE | ChangeReason::CHILD_CHANGE)
        );
    }

    #[test]
    fn reparent_moves_node_and_marks_both_parents() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        let c = tree.insert(Some(a), "c").unwrap();
        tree.pending.clear();
        for id in [a, b, c] {
            tree.node_mut(id).pending = ChangeReason::empty();
        }

        tree.reparent(c, Some(b)).unwrap();
        assert!(tree.children_of(a).is_empty());
        assert_eq!(tree.children_of(b), &[c]);
        assert_eq!(tree.parent_of(c), Some(b));
        assert_eq!(tree.pending_reasons(a), Some(ChangeReason::CHILD_CHANGE));
        assert_eq!(tree.pending_reasons(b), Some(ChangeReason::CHILD_CHANGE));
        assert_eq!(tree.pending_reasons(c), Some(ChangeReason::REPARENT));

        tree.reparent(c, None).unwrap();
        assert_eq!(tree.roots(), &[a, b, c], "None moves to the top level");
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(Some(a), "b").unwrap();
        let c = tree.insert(Some(b), "c").unwrap();

        assert_eq!(tree.reparent(a, Some(c)), Err(TreeError::Cycle));
        assert_eq!(tree.reparent(a, Some(a)), Err(TreeError::Cycle));
        assert_eq!(tree.parent_of(b), Some(a), "rejected move leaves tree intact");
        assert_eq!(tree.children_of(b), &[c]);
        assert_eq!(tree.roots(), &[a]);
    }

    #[test]
    fn foreign_and_stale_ids_are_rejected() {
        let mut tree = Tree::new();
        let mut other = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let foreign = other.insert(None, "x").unwrap();

        assert_eq!(tree.reparent(a, Some(foreign)), Err(TreeError::ForeignNode));
        assert_eq!(tree.insert(Some(foreign), "y"), Err(TreeError::ForeignNode));
        assert_eq!(tree.set_label(foreign, "z"), Err(TreeError::ForeignNode));
        assert!(!tree.contains(foreign));
        assert_eq!(tree.roots(), &[a]);

        tree.remove(a).unwrap();
        assert_eq!(tree.set_label(a, "again"), Err(TreeError::UnknownNode));
        assert_eq!(tree.remove(a), Err(TreeError::UnknownNode));
        assert!(tree.children_of(a).is_empty());
        assert_eq!(tree.label(a), None);
    }

    #[test]
    fn remove_cascades_and_retires_subtree() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(Some(a), "b").unwrap();
        let c = tree.insert(Some(a), "c").unwrap();
        let d = tree.insert(Some(b), "d").unwrap();
        let keep = tree.insert(None, "keep").unwrap();

        tree.remove(a).unwrap();
        for id in [a, b, c, d] {
            assert!(!tree.contains(id), "removed subtree must be stale");
            assert!(tree.retired.contains(&id), "removed node awaits teardown");
            assert!(!tree.pending.contains(&id), "stale ids never stay pending");
        }
        assert_eq!(tree.roots(), &[keep]);
        assert_eq!(tree.len(), 1);
        assert!(
            tree.retired_reasons
                .contains(ChangeReason::REMOVE_TREE | ChangeReason::REPARENT)
        );
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        tree.remove(a).unwrap();
        let b = tree.insert(None, "b").unwrap();
        assert!(tree.contains(b));
        assert!(!tree.contains(a));
        if a.idx == b.idx {
            assert!(b.generation > a.generation, "generation must increase on reuse");
        }
    }

    #[test]
    fn setters_only_mark_real_changes() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        tree.node_mut(a).pending = ChangeReason::empty();

        tree.set_label(a, "a").unwrap();
        tree.set_expanded(a, true).unwrap();
        tree.set_min_height(a, 0.0).unwrap();
        tree.clear_decorations(a, Side::Left).unwrap();
        assert_eq!(tree.pending_reasons(a), Some(ChangeReason::empty()));

        tree.set_label(a, "renamed").unwrap();
        tree.set_min_height(a, 24.0).unwrap();
        assert_eq!(
            tree.pending_reasons(a),
            Some(ChangeReason::NAME | ChangeReason::MIN_HEIGHT)
        );
        assert_eq!(tree.label(a), Some("renamed"));
        assert_eq!(tree.min_height(a), Some(24.0));
    }

    #[test]
    fn decorations_update_in_place_by_id() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        tree.set_decoration(a, Side::Left, icon(1)).unwrap();
        tree.set_decoration(a, Side::Left, icon(2)).unwrap();
        tree.set_decoration(a, Side::Right, icon(3)).unwrap();
        tree.set_decoration(a, Side::Left, icon(1).with_scale(2.0))
            .unwrap();

        let left = tree.decorations(a, Side::Left);
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].id, DecorationId(1), "update keeps position");
        assert_eq!(left[0].scale, 2.0);
        assert_eq!(tree.decorations(a, Side::Right).len(), 1);

        assert_eq!(tree.remove_decoration(a, Side::Left, DecorationId(1)), Ok(true));
        assert_eq!(tree.remove_decoration(a, Side::Left, DecorationId(1)), Ok(false));
        assert_eq!(tree.decorations(a, Side::Left)[0].id, DecorationId(2));
        assert!(
            tree.pending_reasons(a)
                .unwrap()
                .contains(ChangeReason::CHANGED_ICONS)
        );
    }

    #[test]
    fn visible_traversal_skips_collapsed_subtrees() {
        let mut tree = Tree::new();
        // a -> [c -> [e], d], b
        let a = tree.insert(None, "a").unwrap();
        let b = tree.insert(None, "b").unwrap();
        let c = tree.insert(Some(a), "c").unwrap();
        let d = tree.insert(Some(a), "d").unwrap();
        let e = tree.insert(Some(c), "e").unwrap();

        assert_eq!(tree.visible_rows(), vec![a, c, e, d, b]);
        assert_eq!(tree.next_visible(e), Some(d));
        assert_eq!(tree.prev_visible(d), Some(e));
        assert_eq!(tree.prev_visible(b), Some(d));
        assert_eq!(tree.prev_visible(a), None);
        assert_eq!(tree.next_visible(b), None);

        tree.set_expanded(c, false).unwrap();
        assert_eq!(tree.visible_rows(), vec![a, c, d, b]);
        assert!(!tree.is_row_visible(e));
        assert_eq!(tree.next_visible(c), Some(d));

        tree.collapse_all();
        assert_eq!(tree.visible_rows(), vec![a, b]);
        tree.expand_to(e).unwrap();
        assert!(tree.is_row_visible(e));
        assert_eq!(tree.depth_of(e), Some(2));
    }

    #[test]
    fn removing_a_wide_subtree_clears_pending_and_selection() {
        let mut tree = Tree::new();
        tree.set_selection_mode(crate::SelectionMode::Multi);
        let keep = tree.insert(None, "keep").unwrap();
        let wide = tree.insert(None, "wide").unwrap();
        let children: Vec<NodeId> = (0..20_000)
            .map(|i| tree.insert(Some(wide), alloc::format!("c{i}")).unwrap())
            .collect();
        for &c in children.iter().step_by(1000) {
            tree.select(c, false).unwrap();
        }
        tree.select(keep, false).unwrap();

        tree.remove(wide).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.selection(), &[keep]);
        assert!(tree.pending.contains(&keep));
        assert!(
            tree.pending.iter().all(|p| *p == tree.root || tree.contains(*p)),
            "only live nodes stay pending"
        );
        assert!(children.iter().all(|c| !tree.contains(*c)));
    }

    #[test]
    fn visible_rows_match_stepwise_traversal_on_wide_levels() {
        let mut tree = Tree::new();
        let a = tree.insert(None, "a").unwrap();
        for i in 0..200 {
            let c = tree.insert(Some(a), alloc::format!("c{i}")).unwrap();
            if i % 3 == 0 {
                tree.insert(Some(c), "leaf").unwrap();
            }
            if i % 7 == 0 {
                tree.set_expanded(c, false).unwrap();
            }
        }
        tree.insert(None, "z").unwrap();

        let rows = tree.visible_rows();
        let mut stepped = vec![a];
        while let Some(next) = tree.next_visible(*stepped.last().unwrap()) {
            stepped.push(next);
        }
        assert_eq!(rows, stepped);
        for pair in rows.windows(2) {
            assert_eq!(tree.prev_visible(pair[1]), Some(pair[0]));
        }
    }

    #[test]
    fn requests_coalesce_and_fire_defer_once() {
        let mut tree = Tree::new();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        tree.set_defer(move || counter.set(counter.get() + 1));

        let a = tree.insert(None, "a").unwrap();
        tree.set_label(a, "b").unwrap();
        tree.set_expanded(a, false).unwrap();
        assert_eq!(fired.get(), 1, "many edits arm a single drain");
        assert_eq!(tree.request_update(), ScheduleStatus::AlreadyScheduled);
        assert!(tree.needs_drain());
    }

    #[test]
    fn observers_get_unique_ids() {
        struct Nop;
        impl TreeObserver for Nop {}

        let mut tree = Tree::new();
        let first = tree.subscribe(Nop);
        let second = tree.subscribe(Nop);
        assert_ne!(first, second);
        assert!(tree.unsubscribe(first).is_some());
        assert!(tree.unsubscribe(first).is_none());
        let third = tree.subscribe(Nop);
        assert_ne!(third, second);
    }
}
