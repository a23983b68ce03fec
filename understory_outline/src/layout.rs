// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full layout pass.
//!
//! Rows are placed top to bottom in display order. Each row's body sits to the
//! right of an indicator column as wide as the widest expand/collapse image; the
//! column itself starts at the row's indent. The pass runs in two phases: the
//! first measures every shown row and finds the content extent, the second
//! resolves the container width (which plate stretching depends on) and emits
//! visuals.

use alloc::vec::Vec;

use kurbo::{Point, Size};
use smallvec::SmallVec;

use crate::drain::{LayoutReport, VisualState};
use crate::host::{
    ContainerVisual, IconVisual, IndicatorVisual, RowVisual, TextMeasure, VisualSink,
};
use crate::reason::ChangeReason;
use crate::style::{PlateWidth, WidthMode};
use crate::tree::Tree;
use crate::types::{Decoration, DecorationId, NodeId, Side};

/// Where a row ended up after the last layout pass.
///
/// Coordinates are relative to the container's top-left corner with the y axis
/// up, so `origin.y` is zero or negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RowPlacement {
    /// Top-left corner of the plate.
    pub origin: Point,
    /// Plate size, after stretching.
    pub size: Size,
    /// Nesting depth; top-level rows are at depth 0.
    pub depth: usize,
    /// Top-left corner of the label.
    pub label_origin: Point,
    /// Measured label size.
    pub label_size: Size,
    /// Expand/collapse indicator, for rows with children.
    pub indicator: Option<IndicatorVisual>,
    /// Selection state the plate was last painted with.
    pub selected: bool,
}

impl RowPlacement {
    /// The plate as a rectangle in y-down terms (`y0` is the top edge negated).
    pub fn plate_rect(&self) -> kurbo::Rect {
        kurbo::Rect::from_origin_size(Point::new(self.origin.x, -self.origin.y), self.size)
    }
}

/// First-phase result for one shown row.
struct RowPlan {
    id: NodeId,
    depth: usize,
    /// Top edge (y up).
    top: f64,
    /// Left edge of the plate.
    x: f64,
    /// Content width before stretching.
    width: f64,
    height: f64,
    label_size: Size,
    /// Left strip width including the gap before the label.
    left_strip: f64,
}

impl Tree {
    /// Place every shown row, hide rows under collapsed nodes, and release rows of
    /// nodes that are no longer shown or no longer exist.
    pub(crate) fn layout_pass<M, V>(
        &mut self,
        reasons: ChangeReason,
        measure: &mut M,
        sink: &mut V,
    ) -> LayoutReport
    where
        M: TextMeasure + ?Sized,
        V: VisualSink + ?Sized,
    {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!("outline_layout", rows = tracing::field::Empty).entered();

        self.epoch += 1;
        let epoch = self.epoch;
        let style = &self.style;
        let column = style.indicator_column();

        // Phase 1: measure and stack.
        let mut plans: Vec<RowPlan> = Vec::new();
        let mut collapsed: Vec<NodeId> = Vec::new();
        let mut cursor = style.start_offset.y;
        let mut extent = style.start_offset.x;
        let mut stack: Vec<(NodeId, usize)> = self.roots().iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            if depth > 0 {
                cursor += style.child_gap;
            }
            let label_size = measure.measure(&node.label, &style.label);
            let left_strip = self.strip_width(node.decorations(Side::Left));
            let right_strip = self.strip_width(node.decorations(Side::Right));
            // Insets carry both horizontal margins; a symmetric style sets x0 == x1.
            let pad = style.padding;
            let width = style
                .min_row_size
                .width
                .max(pad.x0 + left_strip + label_size.width + right_strip + pad.x1);
            let mut height = node
                .min_height
                .max(style.min_row_size.height)
                .max(pad.y0 + label_size.height + pad.y1);
            for d in node.left.iter().chain(node.right.iter()) {
                height = height.max(d.size().height);
            }
            let has_children = !node.children.is_empty();
            if has_children {
                height = height.max(self.indicator_size(node.expanded).height);
            }
            #[allow(
                clippy::cast_precision_loss,
                reason = "Depths stay far below f64's exact integer range."
            )]
            let x = style.start_offset.x + depth as f64 * style.indent + column + style.plate_margin;

            // Stretched plates do not widen the content: the extent follows the
            // natural width in every plate mode.
            extent = extent.max(x + width);
            plans.push(RowPlan {
                id,
                depth,
                top: -cursor,
                x,
                width,
                height,
                label_size,
                left_strip,
            });
            cursor += height + style.row_spacing;

            if has_children {
                if node.expanded {
                    stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
                } else {
                    collapsed.push(id);
                }
            }
        }

        // Phase 2: resolve widths and emit.
        let content_size = Size::new(extent + style.end_offset.x, cursor + style.end_offset.y);
        let container_width = match style.width_mode {
            WidthMode::Fit => content_size.width,
            WidthMode::Leave => self.container_width,
            WidthMode::StretchToParent => self.parent_width,
        };
        let container_size = Size::new(container_width, content_size.height);
        let edge = container_width - style.end_offset.x;

        let mut visuals = core::mem::take(&mut self.visuals);
        for id in collapsed {
            self.hide_descendants(id, epoch, &mut visuals, sink);
        }
        for plan in &plans {
            let width = match self.style.plate_width {
                PlateWidth::Fit => plan.width,
                PlateWidth::StretchToEdge => plan.width.max(edge - plan.x),
            };
            self.emit_row(plan, width, epoch, &mut visuals, sink);
        }
        visuals.retain(|id, visual| {
            if visual.epoch == epoch {
                true
            } else {
                sink.release_row(*id);
                false
            }
        });
        self.visuals = visuals;

        sink.resize_container(&ContainerVisual {
            size: container_size,
            background: self.style.background,
            background_color: self.style.background_color,
        });
        self.content_size = content_size;
        self.container_size = container_size;

        #[cfg(feature = "tracing")]
        span.record("rows", plans.len());
        LayoutReport {
            reasons,
            content_size,
            container_size,
            rows: plans.len(),
        }
    }

    /// Width of a decoration strip, including the gap to the label.
    fn strip_width(&self, decorations: &[Decoration]) -> f64 {
        if decorations.is_empty() {
            return 0.0;
        }
        #[allow(
            clippy::cast_precision_loss,
            reason = "Decoration counts are tiny."
        )]
        let gaps = (decorations.len() - 1) as f64 * self.style.icon_spacing;
        decorations.iter().map(|d| d.size().width).sum::<f64>() + gaps + self.style.label_gap
    }

    fn indicator_size(&self, expanded: bool) -> Size {
        let image = if expanded {
            self.style.collapse_image
        } else {
            self.style.expand_image
        };
        image.map_or(Size::ZERO, |img| img.size * self.style.indicator_scale)
    }

    /// Indicator of a row at `depth` whose plate has the given top and height,
    /// centered in the indicator column.
    pub(crate) fn indicator_visual(
        &self,
        depth: usize,
        top: f64,
        height: f64,
        expanded: bool,
    ) -> IndicatorVisual {
        let image = if expanded {
            self.style.collapse_image
        } else {
            self.style.expand_image
        };
        let size = self.indicator_size(expanded);
        #[allow(
            clippy::cast_precision_loss,
            reason = "Depths stay far below f64's exact integer range."
        )]
        let column_x = self.style.start_offset.x + depth as f64 * self.style.indent;
        IndicatorVisual {
            origin: Point::new(
                column_x + (self.style.indicator_column() - size.width) / 2.0,
                top - (height - size.height) / 2.0,
            ),
            size,
            image,
            expanded,
        }
    }

    fn emit_row<V: VisualSink + ?Sized>(
        &self,
        plan: &RowPlan,
        width: f64,
        epoch: u64,
        visuals: &mut hashbrown::HashMap<NodeId, VisualState>,
        sink: &mut V,
    ) {
        let node = self.node(plan.id);
        let style = &self.style;
        let pad = style.padding;
        let center = |h: f64| plan.top - (plan.height - h) / 2.0;

        let label_origin = Point::new(plan.x + pad.x0 + plan.left_strip, center(plan.label_size.height));
        let indicator = (!node.children.is_empty())
            .then(|| self.indicator_visual(plan.depth, plan.top, plan.height, node.expanded));
        let placement = RowPlacement {
            origin: Point::new(plan.x, plan.top),
            size: Size::new(width, plan.height),
            depth: plan.depth,
            label_origin,
            label_size: plan.label_size,
            indicator,
            selected: node.selected,
        };

        let previous = visuals.get_mut(&plan.id);
        let had_indicator = previous
            .as_ref()
            .is_some_and(|v| v.placement.indicator.is_some());
        if let Some(visual) = &previous
            && visual.hidden
        {
            sink.set_row_hidden(plan.id, false);
        }
        let old_icons = previous.map(|v| core::mem::take(&mut v.icons)).unwrap_or_default();

        sink.place_row(
            plan.id,
            &RowVisual {
                origin: placement.origin,
                size: placement.size,
                plate_image: style.plate_image,
                fill: style.plate_fill(node.selected),
                selected: node.selected,
                label: &node.label,
                label_origin,
                label_size: plan.label_size,
                label_style: &style.label,
            },
        );

        match &indicator {
            Some(indicator) => sink.place_indicator(plan.id, indicator),
            None if had_indicator => sink.release_indicator(plan.id),
            None => {}
        }

        let mut icons: SmallVec<[(Side, DecorationId); 4]> = SmallVec::new();
        let mut left = plan.x + pad.x0;
        for d in &node.left {
            let size = d.size();
            sink.place_icon(plan.id, &icon_visual(d, Side::Left, Point::new(left, center(size.height))));
            icons.push((Side::Left, d.id));
            left += size.width + style.icon_spacing;
        }
        let mut right = plan.x + width - pad.x1;
        for d in &node.right {
            let size = d.size();
            right -= size.width;
            sink.place_icon(plan.id, &icon_visual(d, Side::Right, Point::new(right, center(size.height))));
            icons.push((Side::Right, d.id));
            right -= style.icon_spacing;
        }
        for (side, id) in old_icons {
            if !icons.contains(&(side, id)) {
                sink.release_icon(plan.id, side, id);
            }
        }

        visuals.insert(
            plan.id,
            VisualState {
                placement,
                hidden: false,
                icons,
                epoch,
            },
        );
    }

    /// Hide the rows of every descendant of a collapsed node, keeping their state.
    fn hide_descendants<V: VisualSink + ?Sized>(
        &self,
        id: NodeId,
        epoch: u64,
        visuals: &mut hashbrown::HashMap<NodeId, VisualState>,
        sink: &mut V,
    ) {
        let mut stack: Vec<NodeId> = self.node(id).children.clone();
        while let Some(current) = stack.pop() {
            stack.extend_from_slice(&self.node(current).children);
            if let Some(visual) = visuals.get_mut(&current) {
                if !visual.hidden {
                    visual.hidden = true;
                    sink.set_row_hidden(current, true);
                }
                visual.epoch = epoch;
            }
        }
    }
}

fn icon_visual(decoration: &Decoration, side: Side, origin: Point) -> IconVisual {
    IconVisual {
        id: decoration.id,
        side,
        image: decoration.image,
        origin,
        size: decoration.size(),
        action: decoration.action,
    }
}
