// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interfaces the host implements: text measurement and visual reconciliation.
//!
//! The outline never draws. During a drain it tells a [`VisualSink`] which rows,
//! indicators, and decorations exist and where they go. All positions are in the
//! container's coordinate space (origin at its top-left corner, y axis up); an
//! `origin` is always the top-left corner of the item.

use kurbo::{Point, Size};

use crate::style::{Background, LabelStyle};
use crate::types::{ActionId, Color, DecorationId, ImageRef, NodeId, Side};

/// Measures label text.
pub trait TextMeasure {
    /// Preferred size of `text` in `style`, with unconstrained wrapping.
    fn measure(&mut self, text: &str, style: &LabelStyle) -> Size;
}

impl<F> TextMeasure for F
where
    F: FnMut(&str, &LabelStyle) -> Size,
{
    fn measure(&mut self, text: &str, style: &LabelStyle) -> Size {
        self(text, style)
    }
}

/// Plate and label of one row.
#[derive(Clone, Debug)]
pub struct RowVisual<'a> {
    /// Top-left corner of the plate.
    pub origin: Point,
    /// Size of the plate.
    pub size: Size,
    /// Plate image, if configured.
    pub plate_image: Option<ImageRef>,
    /// Plate fill for the current selection state.
    pub fill: Color,
    /// Whether the node is selected.
    pub selected: bool,
    /// Label text.
    pub label: &'a str,
    /// Top-left corner of the label.
    pub label_origin: Point,
    /// Measured label size.
    pub label_size: Size,
    /// Label appearance.
    pub label_style: &'a LabelStyle,
}

/// Expand/collapse indicator of a row with children.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndicatorVisual {
    /// Top-left corner.
    pub origin: Point,
    /// Size.
    pub size: Size,
    /// Image for the current state (`None` when no image is configured).
    pub image: Option<ImageRef>,
    /// Whether the node is expanded. Clicking the indicator should call
    /// [`Tree::toggle_expanded`](crate::Tree::toggle_expanded).
    pub expanded: bool,
}

/// A decoration placed beside a label.
#[derive(Clone, Debug, PartialEq)]
pub struct IconVisual {
    /// Decoration identifier.
    pub id: DecorationId,
    /// Strip the decoration belongs to.
    pub side: Side,
    /// Image to draw.
    pub image: ImageRef,
    /// Top-left corner.
    pub origin: Point,
    /// Scaled size.
    pub size: Size,
    /// Click action, if any.
    pub action: Option<ActionId>,
}

/// The container that holds every row.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerVisual {
    /// Resolved container size.
    pub size: Size,
    /// Background policy.
    pub background: Background,
    /// Background fill, meaningful for [`Background::Filled`].
    pub background_color: Color,
}

/// Creates, updates, hides, and destroys the visuals of an outline.
///
/// `place_*` calls create the visual if the sink has not seen it yet and update it
/// otherwise. `release_*` calls destroy it. Hiding keeps the visual alive.
pub trait VisualSink {
    /// Create or update the plate and label of `node`.
    fn place_row(&mut self, node: NodeId, row: &RowVisual<'_>);

    /// Repaint an existing plate after its selection state changed.
    fn recolor_row(&mut self, node: NodeId, fill: Color, selected: bool);

    /// Show or hide the row of `node` (plate, label, indicator, and decorations).
    fn set_row_hidden(&mut self, node: NodeId, hidden: bool);

    /// Destroy the row of `node` and everything attached to it.
    fn release_row(&mut self, node: NodeId);

    /// Create or update the expand/collapse indicator of `node`.
    fn place_indicator(&mut self, node: NodeId, indicator: &IndicatorVisual);

    /// Destroy the indicator of `node`.
    fn release_indicator(&mut self, node: NodeId);

    /// Create or update a decoration of `node`.
    fn place_icon(&mut self, node: NodeId, icon: &IconVisual);

    /// Destroy one decoration of `node`.
    fn release_icon(&mut self, node: NodeId, side: Side, id: DecorationId);

    /// Resize the container after a layout pass.
    fn resize_container(&mut self, container: &ContainerVisual) {
        let _ = container;
    }
}

/// Headless sink: lays out without producing visuals.
impl VisualSink for () {
    fn place_row(&mut self, _: NodeId, _: &RowVisual<'_>) {}
    fn recolor_row(&mut self, _: NodeId, _: Color, _: bool) {}
    fn set_row_hidden(&mut self, _: NodeId, _: bool) {}
    fn release_row(&mut self, _: NodeId) {}
    fn place_indicator(&mut self, _: NodeId, _: &IndicatorVisual) {}
    fn release_indicator(&mut self, _: NodeId) {}
    fn place_icon(&mut self, _: NodeId, _: &IconVisual) {}
    fn release_icon(&mut self, _: NodeId, _: Side, _: DecorationId) {}
}
