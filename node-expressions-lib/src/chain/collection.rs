use crate::chain::iterator::NodeIterator;
use crate::chain::list_iterator::NodeListIterator;
use crate::chain::node::{NodeArena, NodeId};
use crate::chain::{ChainError, Headed};
use itertools::Itertools;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;

/// An ordered collection backed by a single chain of nodes.
///
/// # Examples
///
/// ```
/// use node_expressions::chain::collection::NodeCollection;
///
/// let mut words: NodeCollection<&str> = ["b", "c"].into_iter().collect();
/// words.insert(0, "a").unwrap();
///
/// let mut cursor = words.list_iter(1).unwrap();
/// cursor.next().unwrap();
/// cursor.remove().unwrap();
///
/// assert_eq!(words.iter().copied().collect::<Vec<_>>(), vec!["a", "c"]);
/// ```
#[derive(Clone)]
pub struct NodeCollection<E> {
    nodes: NodeArena<E>,
    head: Option<NodeId>,
}

impl<E> Default for NodeCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Headed for NodeCollection<E> {
    type Item = E;

    fn head(&self) -> Option<NodeId> {
        self.head
    }

    fn set_head(&mut self, head: Option<NodeId>) {
        self.head = head;
    }

    fn nodes(&self) -> &NodeArena<E> {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut NodeArena<E> {
        &mut self.nodes
    }
}

impl<E> NodeCollection<E> {
    pub fn new() -> Self {
        NodeCollection {
            nodes: NodeArena::new(),
            head: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.successors(self.head).count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Adds `value` after the last element.
    pub fn append(&mut self, value: E) {
        let tail = self.nodes.successors(self.head).last();
        let added = self.nodes.insert(value);
        match tail {
            Some(_) => self.nodes.link(tail, Some(added)),
            None => self.head = Some(added),
        }
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.iter().nth(index)
    }

    /// Inserts `value` so that it ends up at `index`.
    pub fn insert(&mut self, index: usize, value: E) -> Result<(), ChainError> {
        self.list_iter(index)?.add(value)
    }

    /// Removes and returns the element at `index`, which must be below `len()`.
    pub fn remove(&mut self, index: usize) -> Result<E, ChainError> {
        let length = self.len();
        if index >= length {
            return Err(ChainError::OutOfRange { index, length });
        }
        let mut cursor = self.node_iter(index)?;
        cursor.next()?;
        cursor.remove()
    }

    pub fn clear(&mut self) {
        self.nodes = NodeArena::new();
        self.head = None;
    }

    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.nodes.successors(self.head).last(),
            remaining: self.len(),
        }
    }

    /// A forward cursor positioned before the element at `index`.
    pub fn node_iter(&mut self, index: usize) -> Result<NodeIterator<'_, Self>, ChainError> {
        NodeIterator::new(self, index)
    }

    /// A bidirectional cursor positioned before the element at `index`.
    pub fn list_iter(&mut self, index: usize) -> Result<NodeListIterator<'_, Self>, ChainError> {
        NodeListIterator::new(self, index)
    }
}

/// Read-only, double-ended iterator over the values of a [`NodeCollection`].
pub struct Iter<'a, E> {
    nodes: &'a NodeArena<E>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.front?;
        self.front = self.nodes.next(current).ok().flatten();
        self.remaining -= 1;
        self.nodes.value(current).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, E> DoubleEndedIterator for Iter<'a, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.back?;
        self.back = self.nodes.previous(current).ok().flatten();
        self.remaining -= 1;
        self.nodes.value(current).ok()
    }
}

impl<'a, E> ExactSizeIterator for Iter<'a, E> {}

impl<'a, E> FusedIterator for Iter<'a, E> {}

impl<'a, E> IntoIterator for &'a NodeCollection<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E> FromIterator<E> for NodeCollection<E> {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        let mut collection = NodeCollection::new();
        collection.extend(iter);
        collection
    }
}

impl<E> Extend<E> for NodeCollection<E> {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        let mut tail = self.nodes.successors(self.head).last();
        for value in iter {
            let added = self.nodes.insert(value);
            match tail {
                Some(_) => self.nodes.link(tail, Some(added)),
                None => self.head = Some(added),
            }
            tail = Some(added);
        }
    }
}

impl<E: PartialEq> PartialEq for NodeCollection<E> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<E: Eq> Eq for NodeCollection<E> {}

impl<E: Hash> Hash for NodeCollection<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        self.iter().for_each(|value| value.hash(state));
    }
}

impl<E: Debug> Debug for NodeCollection<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E: Display> Display for NodeCollection<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().join(", "))
    }
}
