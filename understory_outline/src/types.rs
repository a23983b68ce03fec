// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the outline: identifiers, decorations, and asset handles.

use core::sync::atomic::{AtomicU32, Ordering};

use kurbo::Size;

/// Identifier of a [`Tree`](crate::Tree) instance.
///
/// Drawn from a process-wide counter, so two trees never share an identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TreeId(pub(crate) u32);

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

impl TreeId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifier for a node in an outline (generational).
///
/// The identifier also records the tree that minted it. Handing a node from one
/// tree to another tree's operations is rejected with
/// [`TreeError::ForeignNode`](crate::TreeError::ForeignNode).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId {
    pub(crate) tree: TreeId,
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(tree: TreeId, idx: u32, generation: u32) -> Self {
        Self {
            tree,
            idx,
            generation,
        }
    }

    pub(crate) const fn idx(self) -> usize {
        self.idx as usize
    }

    /// The tree this identifier was minted by.
    pub const fn tree(self) -> TreeId {
        self.tree
    }
}

/// Caller-chosen identifier of a decoration, unique within one side of one node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct DecorationId(pub u64);

/// Opaque action handle attached to a clickable decoration.
///
/// The outline never interprets it; the host maps it to behavior when the
/// decoration is clicked.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub u64);

/// Opaque font handle resolved by the host's text measurer and renderer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct FontId(pub u32);

/// Reference to an image asset owned by the host, together with its natural size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageRef {
    /// Host-side key of the image.
    pub key: u64,
    /// Natural size of the image in layout units.
    pub size: Size,
}

impl ImageRef {
    /// Create a reference to image `key` with the given natural size.
    pub const fn new(key: u64, size: Size) -> Self {
        Self { key, size }
    }
}

/// 8-bit RGBA color.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    /// Create a color from its components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Which strip of a row a decoration lives in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// Before the label.
    Left,
    /// After the label.
    Right,
}

/// A small image shown beside a node's label.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoration {
    /// Identifier, unique within its side of the node.
    pub id: DecorationId,
    /// Image to draw.
    pub image: ImageRef,
    /// Uniform scale applied to the image's natural size.
    pub scale: f64,
    /// Action reported when the decoration is clicked, if it is clickable.
    pub action: Option<ActionId>,
}

impl Decoration {
    /// A non-clickable decoration at scale 1.
    pub fn new(id: DecorationId, image: ImageRef) -> Self {
        Self {
            id,
            image,
            scale: 1.0,
            action: None,
        }
    }

    /// Set the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Make the decoration clickable.
    #[must_use]
    pub fn with_action(mut self, action: ActionId) -> Self {
        self.action = Some(action);
        self
    }

    /// Laid-out size of the decoration.
    pub fn size(&self) -> Size {
        self.image.size * self.scale
    }
}
