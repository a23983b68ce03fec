// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout and appearance configuration.

use kurbo::{Insets, Size, Vec2};

use crate::types::{Color, FontId, ImageRef};

/// How the outline container's width is chosen after a layout pass.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum WidthMode {
    /// Size the container to the widest row plus the end offset.
    #[default]
    Fit,
    /// Keep the container's current width; only its height tracks the content.
    Leave,
    /// Match the width of the container's parent.
    StretchToParent,
}

/// How each row's plate width is chosen.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PlateWidth {
    /// Use the width the row's content needs.
    #[default]
    Fit,
    /// Extend every plate to the container's trailing edge (minus the end offset).
    StretchToEdge,
}

/// What the container's background does.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Background {
    /// No background.
    Empty,
    /// Fill with [`TreeStyle::background_color`].
    Filled,
    /// Leave whatever the host has configured untouched.
    #[default]
    Unchanged,
}

/// Text appearance of row labels.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
    /// Font handle understood by the host.
    pub font: FontId,
    /// Font size.
    pub size: f64,
    /// Text color.
    pub color: Color,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: FontId::default(),
            size: 14.0,
            color: Color::BLACK,
        }
    }
}

/// Configuration of an outline.
///
/// Positions produced by the layout are relative to the container's top-left
/// corner with the y axis pointing up, so rows sit at negative y.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeStyle {
    /// Image drawn behind each row, if any.
    pub plate_image: Option<ImageRef>,
    /// Fill of an unselected plate.
    pub plate_color: Color,
    /// Fill of a selected plate.
    pub selected_plate_color: Color,
    /// Indicator shown on a collapsed node with children.
    pub expand_image: Option<ImageRef>,
    /// Indicator shown on an expanded node with children.
    pub collapse_image: Option<ImageRef>,
    /// Scale applied to both indicator images.
    pub indicator_scale: f64,
    /// Smallest size a plate may have.
    pub min_row_size: Size,
    /// Space between a plate's edges and its content.
    pub padding: Insets,
    /// Horizontal gap between the indicator column and the plate.
    pub plate_margin: f64,
    /// Vertical gap inserted before each child row.
    pub child_gap: f64,
    /// Vertical gap after every row.
    pub row_spacing: f64,
    /// Horizontal indent added per nesting level.
    pub indent: f64,
    /// Offset of the first row from the container's top-left corner.
    pub start_offset: Vec2,
    /// Margin added beyond the rightmost and bottommost row.
    pub end_offset: Vec2,
    /// Gap between adjacent decorations on the same side.
    pub icon_spacing: f64,
    /// Gap between a decoration strip and the label.
    pub label_gap: f64,
    /// Label text appearance.
    pub label: LabelStyle,
    /// Container width policy.
    pub width_mode: WidthMode,
    /// Plate width policy.
    pub plate_width: PlateWidth,
    /// Container background policy.
    pub background: Background,
    /// Fill used when `background` is [`Background::Filled`].
    pub background_color: Color,
}

impl Default for TreeStyle {
    fn default() -> Self {
        Self {
            plate_image: None,
            plate_color: Color::WHITE,
            selected_plate_color: Color::rgba(0x33, 0x99, 0xff, 0xff),
            expand_image: None,
            collapse_image: None,
            indicator_scale: 1.0,
            min_row_size: Size::ZERO,
            padding: Insets::ZERO,
            plate_margin: 0.0,
            child_gap: 0.0,
            row_spacing: 0.0,
            indent: 20.0,
            start_offset: Vec2::ZERO,
            end_offset: Vec2::ZERO,
            icon_spacing: 2.0,
            label_gap: 4.0,
            label: LabelStyle::default(),
            width_mode: WidthMode::default(),
            plate_width: PlateWidth::default(),
            background: Background::default(),
            background_color: Color::TRANSPARENT,
        }
    }
}

impl TreeStyle {
    /// Set the indent step.
    #[must_use]
    pub fn with_indent(mut self, indent: f64) -> Self {
        self.indent = indent;
        self
    }

    /// Set the start and end offsets.
    #[must_use]
    pub fn with_offsets(mut self, start: Vec2, end: Vec2) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    /// Set the plate padding.
    #[must_use]
    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    /// Set the vertical gap after every row.
    #[must_use]
    pub fn with_row_spacing(mut self, spacing: f64) -> Self {
        self.row_spacing = spacing;
        self
    }

    /// Set the minimum plate size.
    #[must_use]
    pub fn with_min_row_size(mut self, size: Size) -> Self {
        self.min_row_size = size;
        self
    }

    /// Set the expand and collapse indicator images.
    #[must_use]
    pub fn with_indicators(mut self, expand: ImageRef, collapse: ImageRef) -> Self {
        self.expand_image = Some(expand);
        self.collapse_image = Some(collapse);
        self
    }

    /// Set the container width policy.
    #[must_use]
    pub fn with_width_mode(mut self, mode: WidthMode) -> Self {
        self.width_mode = mode;
        self
    }

    /// Set the plate width policy.
    #[must_use]
    pub fn with_plate_width(mut self, mode: PlateWidth) -> Self {
        self.plate_width = mode;
        self
    }

    /// Set the container background policy and color.
    #[must_use]
    pub fn with_background(mut self, background: Background, color: Color) -> Self {
        self.background = background;
        self.background_color = color;
        self
    }

    /// Width of the indicator column: the wider of the two indicator images.
    pub fn indicator_column(&self) -> f64 {
        [self.expand_image, self.collapse_image]
            .iter()
            .flatten()
            .map(|img| img.size.width * self.indicator_scale)
            .fold(0.0, f64::max)
    }

    /// Fill for a plate in the given selection state.
    pub fn plate_fill(&self, selected: bool) -> Color {
        if selected {
            self.selected_plate_color
        } else {
            self.plate_color
        }
    }
}
