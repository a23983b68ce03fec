// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by structural and state-mutating operations.

use core::fmt;

/// Why an operation on a [`Tree`](crate::Tree) was rejected.
///
/// A rejected operation never mutates the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TreeError {
    /// The identifier is stale or was never issued by this tree.
    UnknownNode,
    /// The identifier was minted by a different tree.
    ForeignNode,
    /// The new parent is the node itself or one of its descendants.
    Cycle,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode => f.write_str("node is not part of this tree"),
            Self::ForeignNode => f.write_str("node belongs to a different tree"),
            Self::Cycle => f.write_str("node cannot become its own ancestor"),
        }
    }
}

impl core::error::Error for TreeError {}
