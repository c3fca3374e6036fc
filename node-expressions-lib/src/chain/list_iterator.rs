use crate::chain::node::NodeId;
use crate::chain::{ChainError, Headed};
use log::trace;

/// Which way the cursor moved on its last positioning call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// A bidirectional cursor over the chain of a [`Headed`] holder.
///
/// The cursor always sits between two elements: `next_index` is the index of the
/// element a call to `next` would return, and equals the chain length once the
/// cursor is past the last element. Besides reading, it can add an element at its
/// position and replace or remove the element it returned last.
pub struct NodeListIterator<'a, H: Headed> {
    holder: &'a mut H,
    next: Option<NodeId>,
    last_returned: Option<NodeId>,
    tail: Option<NodeId>,
    size: usize,
    next_index: usize,
    direction: Direction,
}

impl<'a, H: Headed> NodeListIterator<'a, H> {
    pub fn new(holder: &'a mut H, index: usize) -> Result<Self, ChainError> {
        let size = holder.chain_length()?;
        if index > size {
            return Err(ChainError::OutOfRange {
                index,
                length: size,
            });
        }
        let tail = holder.nodes().successors(holder.head()).last();
        let mut iterator = NodeListIterator {
            holder,
            next: None,
            last_returned: None,
            tail,
            size,
            next_index: index,
            direction: Direction::Forward,
        };
        iterator.next = if index == size {
            None
        } else {
            iterator.node(index)
        };
        Ok(iterator)
    }

    /// Locates the node at `index`, walking from whichever end is closer.
    fn node(&self, index: usize) -> Option<NodeId> {
        let nodes = self.holder.nodes();
        if index < self.size / 2 {
            nodes.successors(self.holder.head()).nth(index)
        } else {
            nodes.predecessors(self.tail).nth(self.size - 1 - index)
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn has_next(&self) -> bool {
        self.next_index < self.size
    }

    pub fn has_previous(&self) -> bool {
        self.next_index > 0
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Index of the element a call to `previous` would return, if any.
    pub fn previous_index(&self) -> Option<usize> {
        self.next_index.checked_sub(1)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&H::Item, ChainError> {
        if !self.has_next() {
            return Err(ChainError::ExhaustedIteration);
        }
        let current = self.next.ok_or(ChainError::ExhaustedIteration)?;
        self.next = self.holder.nodes().next(current)?;
        self.next_index += 1;
        self.last_returned = Some(current);
        self.direction = Direction::Forward;
        self.holder.nodes().value(current)
    }

    pub fn previous(&mut self) -> Result<&H::Item, ChainError> {
        if !self.has_previous() {
            return Err(ChainError::ExhaustedIteration);
        }
        let current = match self.next {
            Some(next) => self.holder.nodes().previous(next)?,
            None => self.tail,
        }
        .ok_or(ChainError::ExhaustedIteration)?;
        self.next = Some(current);
        self.next_index -= 1;
        self.last_returned = Some(current);
        self.direction = Direction::Backward;
        self.holder.nodes().value(current)
    }

    /// Inserts `value` right before the element `next` would return, or at the end
    /// if the cursor is exhausted. A following `previous` returns the new element.
    pub fn add(&mut self, value: H::Item) -> Result<(), ChainError> {
        let nodes = self.holder.nodes_mut();
        let added = nodes.insert(value);
        match self.next {
            Some(next) => {
                let was_head = nodes.previous(next)?.is_none();
                nodes.insert_previous(next, added)?;
                if was_head {
                    self.holder.set_head(Some(added));
                }
            }
            None => {
                match self.tail {
                    Some(tail) => nodes.insert_next(tail, added)?,
                    None => self.holder.set_head(Some(added)),
                }
                self.tail = Some(added);
            }
        }
        trace!("Added node {:?} at index {}", added, self.next_index);
        self.size += 1;
        self.next_index += 1;
        self.last_returned = None;
        Ok(())
    }

    /// Replaces the element returned last by splicing a new node in its place.
    ///
    /// Returns the value that was replaced.
    pub fn set(&mut self, value: H::Item) -> Result<H::Item, ChainError> {
        let replaced = self
            .last_returned
            .ok_or(ChainError::InvalidOperationState("set"))?;
        let nodes = self.holder.nodes_mut();
        let previous = nodes.previous(replaced)?;
        let next = nodes.next(replaced)?;
        let old_value = nodes.take(replaced)?;
        let replacement = nodes.link_new(value, previous, next)?;

        if previous.is_none() {
            self.holder.set_head(Some(replacement));
        }
        if next.is_none() {
            self.tail = Some(replacement);
        }
        if self.next == Some(replaced) {
            self.next = Some(replacement);
        }
        self.last_returned = Some(replacement);
        Ok(old_value)
    }

    /// Removes the element returned by the last call to `next` or `previous`.
    pub fn remove(&mut self) -> Result<H::Item, ChainError> {
        let removed = self
            .last_returned
            .take()
            .ok_or(ChainError::InvalidOperationState("remove"))?;
        let nodes = self.holder.nodes();
        let previous = nodes.previous(removed)?;
        let next = nodes.next(removed)?;

        if previous.is_none() {
            self.holder.set_head(next);
        }
        if next.is_none() {
            self.tail = previous;
        }
        match self.direction {
            Direction::Forward => self.next_index -= 1,
            Direction::Backward => self.next = next,
        }
        self.size -= 1;
        trace!("Removing node {:?}, cursor now at {}", removed, self.next_index);
        self.holder.nodes_mut().take(removed)
    }
}
