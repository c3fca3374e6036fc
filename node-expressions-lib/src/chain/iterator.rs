use crate::chain::node::NodeId;
use crate::chain::{ChainError, Headed};
use log::trace;

/// A forward cursor over the chain of a [`Headed`] holder.
///
/// Besides reading values, the cursor can remove the value it returned last. Removing
/// the first node of the chain moves the holder's head to its successor.
pub struct NodeIterator<'a, H: Headed> {
    holder: &'a mut H,
    next: Option<NodeId>,
    last_returned: Option<NodeId>,
}

impl<'a, H: Headed> NodeIterator<'a, H> {
    /// Creates a cursor whose first call to `next` yields the element at `index`.
    ///
    /// `index` may equal the chain length, in which case the cursor starts exhausted.
    pub fn new(holder: &'a mut H, index: usize) -> Result<Self, ChainError> {
        let length = holder.chain_length()?;
        if index > length {
            return Err(ChainError::OutOfRange { index, length });
        }
        let next = holder.nodes().successors(holder.head()).nth(index);
        Ok(NodeIterator {
            holder,
            next,
            last_returned: None,
        })
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&H::Item, ChainError> {
        let current = self.next.ok_or(ChainError::ExhaustedIteration)?;
        self.next = self.holder.nodes().next(current)?;
        self.last_returned = Some(current);
        self.holder.nodes().value(current)
    }

    /// Removes the element returned by the last call to `next`.
    pub fn remove(&mut self) -> Result<H::Item, ChainError> {
        let removed = self
            .last_returned
            .take()
            .ok_or(ChainError::InvalidOperationState("remove"))?;
        let nodes = self.holder.nodes();
        if nodes.previous(removed)?.is_none() {
            let successor = nodes.next(removed)?;
            self.holder.set_head(successor);
        }
        trace!("Removing node {:?} through a forward cursor", removed);
        self.holder.nodes_mut().take(removed)
    }
}
