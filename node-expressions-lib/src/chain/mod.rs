//! Doubly-linked node chains with cursor-based traversal and mutation.
//!
//! Nodes live in a [`NodeArena`](node::NodeArena) and refer to each other through
//! [`NodeId`](node::NodeId) handles. Cursors ([`NodeIterator`](iterator::NodeIterator)
//! and [`NodeListIterator`](list_iterator::NodeListIterator)) do not own a chain;
//! they borrow whatever holds it through the [`Headed`] trait, so that removing the
//! first node through a cursor moves the holder's head along with it.
//!
//! A cursor holds a mutable borrow of its head holder, which means at most one
//! mutating cursor can be active on a chain at a time.

pub mod collection;
pub mod iterator;
pub mod list_iterator;
pub mod node;

use crate::chain::node::{NodeArena, NodeId};
use thiserror::Error;

/// Something that owns a chain of nodes and knows which node comes first.
pub trait Headed {
    type Item;

    fn head(&self) -> Option<NodeId>;
    fn set_head(&mut self, head: Option<NodeId>);
    fn nodes(&self) -> &NodeArena<Self::Item>;
    fn nodes_mut(&mut self) -> &mut NodeArena<Self::Item>;

    /// Number of nodes from the head to the end of the chain.
    fn chain_length(&self) -> Result<usize, ChainError> {
        match self.head() {
            Some(head) => self.nodes().next_length(head),
            None => Ok(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("node {0:?} is not part of this arena")]
    UnknownNode(NodeId),
    #[error("node {0:?} is already linked into a chain")]
    AlreadyLinked(NodeId),
    #[error("node {0:?} cannot be linked to itself")]
    SelfLink(NodeId),
    #[error("index {index} is out of range for a chain of length {length}")]
    OutOfRange { index: usize, length: usize },
    #[error("{0} requires a preceding call to next or previous")]
    InvalidOperationState(&'static str),
    #[error("no more elements in this direction")]
    ExhaustedIteration,
}
