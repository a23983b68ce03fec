// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_outline --heading-base-level=0

//! Understory Outline: a tree view model with batched, dirty-flag driven row layout.
//!
//! Understory Outline is the model half of a tree widget (file browsers, scene outliners,
//! settings panels): a hierarchy of labeled, selectable, expandable rows with optional
//! leading and trailing decorations.
//!
//! - Maintains the hierarchy in a generational slot arena with cycle-free reparenting and
//!   cascading removal.
//! - Records *why* each node changed as a [`ChangeReason`] bitmask.
//! - Folds every mutation of one update cycle into a single [`Tree::drain`], which runs at
//!   most one full layout pass and takes cheap paths (recolor, indicator swap) when it can.
//! - Places rows deterministically from depth, label metrics, decorations, and the
//!   [`TreeStyle`].
//!
//! ## Not a renderer
//!
//! The outline never draws and never measures text itself. The host supplies a
//! [`TextMeasure`] for labels and a [`VisualSink`] that receives create/update/hide/release
//! calls for plates, labels, indicators, and decorations. Placement is a single fixed
//! top-to-bottom, depth-indented algorithm; it is not a general layout system.
//!
//! ## Update cycle
//!
//! Setters return immediately after recording a reason and arming the scheduler. The
//! first arming of a cycle invokes the host's [`Defer`] hook (see [`Tree::set_defer`]);
//! the host then calls [`Tree::drain`] once its current batch of work is done.
//! Selection observers ([`TreeObserver::on_node_selected`]) are notified synchronously
//! from the setter; layout observers ([`TreeObserver::on_tree_layout`]) once per layout
//! pass, with the union of every reason that pass consumed.
//!
//! ## Coordinates
//!
//! Positions are relative to the container's top-left corner with the y axis pointing
//! up, so rows sit at negative y. Every `origin` is the top-left corner of its item.
//!
//! ## API overview
//!
//! - [`Tree`]: the hierarchy, its setters, queries, and the drain.
//! - [`NodeId`]: generational handle of a node, tagged with the [`TreeId`] that minted it.
//! - [`TreeStyle`]: layout and appearance configuration.
//! - [`RowPlacement`]: computed geometry of a row, via [`Tree::placement`].
//! - [`SelectionMode`]: single or multiple selection.
//! - [`TreeError`]: why a structural or state operation was rejected.
//!
//! This crate is `no_std` and uses `alloc`. Enable the `tracing` feature for spans around
//! drains and layout passes.

#![no_std]

extern crate alloc;

mod drain;
mod error;
mod host;
mod layout;
mod observer;
mod reason;
mod schedule;
mod selection;
mod style;
mod tree;
mod types;

pub use drain::{DrainReport, LayoutReport};
pub use error::TreeError;
pub use host::{
    ContainerVisual, IconVisual, IndicatorVisual, RowVisual, TextMeasure, VisualSink,
};
pub use layout::RowPlacement;
pub use observer::{ObserverId, TreeObserver};
pub use reason::{ChangeReason, Effect};
pub use schedule::{Defer, ScheduleStatus};
pub use selection::SelectionMode;
pub use style::{Background, LabelStyle, PlateWidth, TreeStyle, WidthMode};
pub use tree::Tree;
pub use types::{ActionId, Color, Decoration, DecorationId, FontId, ImageRef, NodeId, Side, TreeId};
