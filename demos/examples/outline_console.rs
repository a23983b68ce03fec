// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive an outline against a console "renderer".
//!
//! This example shows how to:
//! - build a small file-browser hierarchy with decorations,
//! - hook the tree's deferral callback into a host's "run after this cycle" queue,
//! - drain once per cycle and watch which visual calls each edit produces.
//!
//! Run:
//! - `cargo run -p understory_outline_demos --example outline_console`
//!
//! Drain and layout spans are printed as they close.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Insets, Size, Vec2};
use tracing_subscriber::fmt::format::FmtSpan;
use understory_outline::{
    Color, Decoration, DecorationId, DrainReport, IconVisual, ImageRef, IndicatorVisual,
    LabelStyle, LayoutReport, NodeId, RowVisual, Side, Tree, TreeObserver, TreeStyle, VisualSink,
};

/// Prints every visual call instead of drawing.
struct ConsoleSink;

impl VisualSink for ConsoleSink {
    fn place_row(&mut self, node: NodeId, row: &RowVisual<'_>) {
        println!(
            "  place  {node:?} {:>12} at ({:>5.1}, {:>6.1}) size {:.0}x{:.0}{}",
            row.label,
            row.origin.x,
            row.origin.y,
            row.size.width,
            row.size.height,
            if row.selected { " [selected]" } else { "" },
        );
    }

    fn recolor_row(&mut self, node: NodeId, fill: Color, selected: bool) {
        println!("  recolor {node:?} selected={selected} fill={fill:?}");
    }

    fn set_row_hidden(&mut self, node: NodeId, hidden: bool) {
        println!("  {} {node:?}", if hidden { "hide  " } else { "show  " });
    }

    fn release_row(&mut self, node: NodeId) {
        println!("  release {node:?}");
    }

    fn place_indicator(&mut self, node: NodeId, indicator: &IndicatorVisual) {
        println!(
            "  indicator {node:?} {} at ({:.1}, {:.1})",
            if indicator.expanded { "[-]" } else { "[+]" },
            indicator.origin.x,
            indicator.origin.y,
        );
    }

    fn release_indicator(&mut self, node: NodeId) {
        println!("  release indicator {node:?}");
    }

    fn place_icon(&mut self, node: NodeId, icon: &IconVisual) {
        println!(
            "  icon {node:?} {:?} {:?} at ({:.1}, {:.1})",
            icon.side, icon.id, icon.origin.x, icon.origin.y
        );
    }

    fn release_icon(&mut self, node: NodeId, side: Side, id: DecorationId) {
        println!("  release icon {node:?} {side:?} {id:?}");
    }
}

/// Logs selection and layout events.
struct Printer;

impl TreeObserver for Printer {
    fn on_node_selected(&mut self, tree: &Tree, node: NodeId, selected: bool) {
        println!(
            "  event: {:?} {}",
            tree.label(node).unwrap_or("?"),
            if selected { "selected" } else { "deselected" }
        );
    }

    fn on_tree_layout(&mut self, _: &mut Tree, report: &LayoutReport) {
        println!(
            "  event: layout of {} rows, content {:.0}x{:.0}, reasons {:?}",
            report.rows, report.content_size.width, report.content_size.height, report.reasons
        );
    }
}

/// Monospace text: 7 units per character, 16 units high.
fn measure(text: &str, style: &LabelStyle) -> Size {
    let scale = style.size / 14.0;
    Size::new(7.0 * scale * text.chars().count() as f64, 16.0 * scale)
}

/// Run the drain if the tree asked for one this cycle.
fn end_of_cycle(title: &str, tree: &mut Tree, pending: &Cell<bool>) -> Option<DrainReport> {
    println!("{title}");
    if !pending.replace(false) {
        println!("  (nothing scheduled)");
        return None;
    }
    tree.drain(&mut measure, &mut ConsoleSink)
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let style = TreeStyle::default()
        .with_indent(16.0)
        .with_offsets(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0))
        .with_padding(Insets::new(4.0, 2.0, 4.0, 2.0))
        .with_row_spacing(2.0)
        .with_indicators(
            ImageRef::new(1, Size::new(10.0, 10.0)),
            ImageRef::new(2, Size::new(10.0, 10.0)),
        );
    let mut tree = Tree::with_style(style);

    let pending = Rc::new(Cell::new(false));
    let flag = pending.clone();
    tree.set_defer(move || flag.set(true));
    tree.subscribe(Printer);

    let folder = ImageRef::new(10, Size::new(12.0, 12.0));
    let modified = ImageRef::new(11, Size::new(8.0, 8.0));

    let src = tree.insert(None, "src").unwrap();
    let lib = tree.insert(Some(src), "lib.rs").unwrap();
    let tree_rs = tree.insert(Some(src), "tree.rs").unwrap();
    let tests = tree.insert(None, "tests").unwrap();
    let props = tree.insert(Some(tests), "properties.rs").unwrap();
    tree.set_decoration(src, Side::Left, Decoration::new(DecorationId(1), folder))
        .unwrap();
    tree.set_decoration(tests, Side::Left, Decoration::new(DecorationId(1), folder))
        .unwrap();
    end_of_cycle("cycle 1: initial build", &mut tree, &pending);

    tree.select(lib, false).unwrap();
    tree.select(tree_rs, false).unwrap();
    end_of_cycle("cycle 2: selection only", &mut tree, &pending);

    tree.set_label(lib, "lib.rs (edited)").unwrap();
    tree.set_decoration(lib, Side::Right, Decoration::new(DecorationId(2), modified))
        .unwrap();
    tree.set_expanded(tests, false).unwrap();
    end_of_cycle("cycle 3: three edits, one layout", &mut tree, &pending);

    tree.reparent(props, Some(src)).unwrap();
    tree.remove(tests).unwrap();
    end_of_cycle("cycle 4: move then remove", &mut tree, &pending);

    end_of_cycle("cycle 5: idle", &mut tree, &pending);

    println!("final placements:");
    for id in tree.visible_rows() {
        if let Some(p) = tree.placement(id) {
            println!(
                "  {:<18} depth {} origin ({:.1}, {:.1}) size {:.0}x{:.0}",
                tree.label(id).unwrap_or("?"),
                p.depth,
                p.origin.x,
                p.origin.y,
                p.size.width,
                p.size.height
            );
        }
    }
    let size = tree.container_size();
    println!("container {:.0}x{:.0}", size.width, size.height);
}
