use crate::chain::ChainError;

/// Handle to a node stored in a [`NodeArena`].
///
/// Handles carry the generation of the slot they were issued for, so a handle to a
/// node that has since been taken out of the arena never resolves to whatever node
/// reuses the slot later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node<E> {
    value: E,
    previous: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot<E> {
    generation: u32,
    node: Option<Node<E>>,
}

/// Storage for doubly-linked nodes.
///
/// Links are plain handles, so a chain has no single owner: any node reachable
/// through `previous`/`next` belongs to it. Every linking operation keeps the links
/// reciprocal, meaning `a.next == b` implies `b.previous == a`.
#[derive(Debug, Clone)]
pub struct NodeArena<E> {
    slots: Vec<Slot<E>>,
    free: Vec<usize>,
    live: usize,
}

impl<E> Default for NodeArena<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> NodeArena<E> {
    pub fn new() -> Self {
        NodeArena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of live nodes, linked or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Stores a new node without any neighbours.
    pub fn insert(&mut self, value: E) -> NodeId {
        let node = Node {
            value,
            previous: None,
            next: None,
        };
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Stores a new node and links it to the given neighbours right away.
    ///
    /// Linking follows [`NodeArena::set_previous`] and [`NodeArena::set_next`]: only the
    /// side of each neighbour that faces the new node is updated.
    ///
    /// # Examples
    ///
    /// ```
    /// use node_expressions::chain::node::NodeArena;
    /// # use node_expressions::chain::ChainError;
    ///
    /// # fn main() -> Result<(), ChainError> {
    /// let mut nodes = NodeArena::new();
    /// let first = nodes.insert(1);
    /// let second = nodes.link_new(2, Some(first), None)?;
    ///
    /// assert_eq!(nodes.next(first)?, Some(second));
    /// assert_eq!(nodes.previous(second)?, Some(first));
    /// # Ok(()) }
    /// ```
    pub fn link_new(
        &mut self,
        value: E,
        previous: Option<NodeId>,
        next: Option<NodeId>,
    ) -> Result<NodeId, ChainError> {
        for neighbour in previous.iter().chain(next.iter()) {
            self.node(*neighbour)?;
        }
        let id = self.insert(value);
        self.set_previous(id, previous)?;
        self.set_next(id, next)?;
        Ok(id)
    }

    /// Unlinks the node from its neighbours and frees its slot.
    pub fn take(&mut self, id: NodeId) -> Result<E, ChainError> {
        self.remove(id)?;
        let slot = &mut self.slots[id.index];
        let node = slot.node.take().ok_or(ChainError::UnknownNode(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Ok(node.value)
    }

    pub fn value(&self, id: NodeId) -> Result<&E, ChainError> {
        Ok(&self.node(id)?.value)
    }

    pub fn previous(&self, id: NodeId) -> Result<Option<NodeId>, ChainError> {
        Ok(self.node(id)?.previous)
    }

    pub fn next(&self, id: NodeId) -> Result<Option<NodeId>, ChainError> {
        Ok(self.node(id)?.next)
    }

    /// Points `id` back at `previous`, and `previous` forward at `id`.
    ///
    /// The far side of `previous` is left untouched.
    pub fn set_previous(&mut self, id: NodeId, previous: Option<NodeId>) -> Result<(), ChainError> {
        self.node(id)?;
        if let Some(previous) = previous {
            self.check_distinct(id, previous)?;
            self.node_mut(previous)?.next = Some(id);
        }
        self.node_mut(id)?.previous = previous;
        Ok(())
    }

    /// Points `id` forward at `next`, and `next` back at `id`.
    ///
    /// The far side of `next` is left untouched.
    pub fn set_next(&mut self, id: NodeId, next: Option<NodeId>) -> Result<(), ChainError> {
        self.node(id)?;
        if let Some(next) = next {
            self.check_distinct(id, next)?;
            self.node_mut(next)?.previous = Some(id);
        }
        self.node_mut(id)?.next = next;
        Ok(())
    }

    /// Splices the detached node `new` in between `id` and its current successor.
    pub fn insert_next(&mut self, id: NodeId, new: NodeId) -> Result<(), ChainError> {
        let old_next = self.node(id)?.next;
        self.check_insertable(id, new)?;
        self.link(Some(new), old_next);
        self.link(Some(id), Some(new));
        Ok(())
    }

    /// Splices the detached node `new` in between `id` and its current predecessor.
    pub fn insert_previous(&mut self, id: NodeId, new: NodeId) -> Result<(), ChainError> {
        let old_previous = self.node(id)?.previous;
        self.check_insertable(id, new)?;
        self.link(old_previous, Some(new));
        self.link(Some(new), Some(id));
        Ok(())
    }

    /// Unlinks the successor of `id`, if there is one, and returns it.
    pub fn remove_next(&mut self, id: NodeId) -> Result<Option<NodeId>, ChainError> {
        let next = self.node(id)?.next;
        if let Some(next) = next {
            self.remove(next)?;
        }
        Ok(next)
    }

    /// Unlinks the predecessor of `id`, if there is one, and returns it.
    pub fn remove_previous(&mut self, id: NodeId) -> Result<Option<NodeId>, ChainError> {
        let previous = self.node(id)?.previous;
        if let Some(previous) = previous {
            self.remove(previous)?;
        }
        Ok(previous)
    }

    /// Splices `id` out from between its neighbours and clears its own links.
    ///
    /// The node stays in the arena; use [`NodeArena::take`] to free it as well.
    pub fn remove(&mut self, id: NodeId) -> Result<(), ChainError> {
        let node = self.node(id)?;
        let (previous, next) = (node.previous, node.next);
        if let Some(previous) = previous {
            self.node_mut(previous)?.next = next;
        }
        if let Some(next) = next {
            self.node_mut(next)?.previous = previous;
        }
        let node = self.node_mut(id)?;
        node.previous = None;
        node.next = None;
        Ok(())
    }

    /// True when a neighbour of `id` does not point back at it.
    pub fn is_dangling(&self, id: NodeId) -> Result<bool, ChainError> {
        let node = self.node(id)?;
        let previous_dangles = match node.previous {
            Some(previous) => self.node(previous).map_or(true, |p| p.next != Some(id)),
            None => false,
        };
        let next_dangles = match node.next {
            Some(next) => self.node(next).map_or(true, |n| n.previous != Some(id)),
            None => false,
        };
        Ok(previous_dangles || next_dangles)
    }

    /// All live nodes whose links are not reciprocal.
    pub fn dangling_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids()
            .filter(move |id| self.is_dangling(*id).unwrap_or(true))
    }

    /// Counts the nodes from `id` (inclusive) to the end of the chain.
    pub fn next_length(&self, id: NodeId) -> Result<usize, ChainError> {
        self.count_along(id, |node| node.next)
    }

    /// Counts the nodes from `id` (inclusive) to the start of the chain.
    pub fn previous_length(&self, id: NodeId) -> Result<usize, ChainError> {
        self.count_along(id, |node| node.previous)
    }

    /// Nodes are equal when they carry equal values and sit between the very same
    /// neighbours.
    pub fn nodes_equal(&self, a: NodeId, b: NodeId) -> Result<bool, ChainError>
    where
        E: PartialEq,
    {
        let (a, b) = (self.node(a)?, self.node(b)?);
        Ok(a.value == b.value && a.previous == b.previous && a.next == b.next)
    }

    /// Follows `next` links from `start`.
    pub fn successors(&self, start: Option<NodeId>) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(start, move |id| self.node(*id).ok().and_then(|n| n.next))
    }

    /// Follows `previous` links from `start`.
    pub fn predecessors(&self, start: Option<NodeId>) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(start, move |id| {
            self.node(*id).ok().and_then(|n| n.previous)
        })
    }

    /// Joins two (possibly absent) nodes so that `previous.next == next` and
    /// `next.previous == previous`. Callers have already validated both handles.
    pub(super) fn link(&mut self, previous: Option<NodeId>, next: Option<NodeId>) {
        if let Some(node) = previous.and_then(|id| self.node_mut(id).ok()) {
            node.next = next;
        }
        if let Some(node) = next.and_then(|id| self.node_mut(id).ok()) {
            node.previous = previous;
        }
    }

    fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|_| NodeId {
                index,
                generation: slot.generation,
            })
        })
    }

    fn count_along(
        &self,
        id: NodeId,
        step: impl Fn(&Node<E>) -> Option<NodeId>,
    ) -> Result<usize, ChainError> {
        let mut count = 0;
        let mut current = Some(id);
        while let Some(id) = current {
            current = step(self.node(id)?);
            count += 1;
        }
        Ok(count)
    }

    fn check_distinct(&self, id: NodeId, other: NodeId) -> Result<(), ChainError> {
        if id == other {
            return Err(ChainError::SelfLink(id));
        }
        self.node(other)?;
        Ok(())
    }

    fn check_insertable(&self, id: NodeId, new: NodeId) -> Result<(), ChainError> {
        self.check_distinct(id, new)?;
        let node = self.node(new)?;
        if node.previous.is_some() || node.next.is_some() {
            return Err(ChainError::AlreadyLinked(new));
        }
        Ok(())
    }

    fn node(&self, id: NodeId) -> Result<&Node<E>, ChainError> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(ChainError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<E>, ChainError> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(ChainError::UnknownNode(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_chain(values: &[i32]) -> (NodeArena<i32>, Vec<NodeId>) {
        let mut nodes = NodeArena::new();
        let mut ids: Vec<NodeId> = Vec::new();
        for value in values {
            let id = nodes.link_new(*value, ids.last().copied(), None).unwrap();
            ids.push(id);
        }
        (nodes, ids)
    }

    fn values(nodes: &NodeArena<i32>, start: NodeId) -> Vec<i32> {
        nodes
            .successors(Some(start))
            .map(|id| *nodes.value(id).unwrap())
            .collect()
    }

    #[test]
    fn link_new_wires_both_neighbours_reciprocally() {
        let mut nodes = NodeArena::new();
        let first = nodes.insert(1);
        let third = nodes.insert(3);

        let second = nodes.link_new(2, Some(first), Some(third)).unwrap();

        assert_eq!(nodes.next(first).unwrap(), Some(second));
        assert_eq!(nodes.previous(third).unwrap(), Some(second));
        assert_eq!(nodes.dangling_nodes().count(), 0);
    }

    #[test]
    fn set_next_only_patches_the_facing_side() {
        let (mut nodes, ids) = create_chain(&[1, 2, 3]);

        nodes.set_next(ids[0], Some(ids[2])).unwrap();

        assert_eq!(nodes.previous(ids[2]).unwrap(), Some(ids[0]));
        // The skipped node still believes it sits between the other two.
        assert_eq!(nodes.next(ids[1]).unwrap(), Some(ids[2]));
        assert!(nodes.is_dangling(ids[1]).unwrap());
    }

    #[test]
    fn set_previous_to_self_is_rejected() {
        let (mut nodes, ids) = create_chain(&[1]);

        let error = nodes.set_previous(ids[0], Some(ids[0])).unwrap_err();

        assert_eq!(error, ChainError::SelfLink(ids[0]));
    }

    #[test]
    fn insert_next_splices_between_node_and_successor() {
        let (mut nodes, ids) = create_chain(&[1, 3]);
        let two = nodes.insert(2);

        nodes.insert_next(ids[0], two).unwrap();

        assert_eq!(values(&nodes, ids[0]), vec![1, 2, 3]);
        assert_eq!(nodes.dangling_nodes().count(), 0);
    }

    #[test]
    fn insert_previous_splices_between_node_and_predecessor() {
        let (mut nodes, ids) = create_chain(&[1, 3]);
        let two = nodes.insert(2);

        nodes.insert_previous(ids[1], two).unwrap();

        assert_eq!(values(&nodes, ids[0]), vec![1, 2, 3]);
        assert_eq!(nodes.dangling_nodes().count(), 0);
    }

    #[test]
    fn inserting_an_already_linked_node_fails() {
        let (mut nodes, ids) = create_chain(&[1, 2, 3]);

        let error = nodes.insert_next(ids[0], ids[2]).unwrap_err();

        assert_eq!(error, ChainError::AlreadyLinked(ids[2]));
        assert_eq!(values(&nodes, ids[0]), vec![1, 2, 3]);
    }

    #[test]
    fn remove_next_on_last_node_is_a_no_op() {
        let (mut nodes, ids) = create_chain(&[1, 2]);

        let removed = nodes.remove_next(ids[1]).unwrap();

        assert_eq!(removed, None);
        assert_eq!(values(&nodes, ids[0]), vec![1, 2]);
    }

    #[test]
    fn remove_previous_unlinks_predecessor() {
        let (mut nodes, ids) = create_chain(&[1, 2, 3]);

        let removed = nodes.remove_previous(ids[2]).unwrap();

        assert_eq!(removed, Some(ids[1]));
        assert_eq!(values(&nodes, ids[0]), vec![1, 3]);
        assert_eq!(nodes.next(ids[1]).unwrap(), None);
        assert_eq!(nodes.previous(ids[1]).unwrap(), None);
    }

    #[test]
    fn removed_node_is_not_dangling_and_not_referenced() {
        for length in 1..5 {
            let values: Vec<i32> = (0..length).collect();
            for position in 0..values.len() {
                let (mut nodes, ids) = create_chain(&values);
                let removed = ids[position];

                nodes.remove(removed).unwrap();

                assert!(!nodes.is_dangling(removed).unwrap());
                for id in ids.iter().filter(|id| **id != removed) {
                    assert_ne!(nodes.next(*id).unwrap(), Some(removed));
                    assert_ne!(nodes.previous(*id).unwrap(), Some(removed));
                }
                assert_eq!(nodes.dangling_nodes().count(), 0);
            }
        }
    }

    #[test]
    fn lengths_count_inclusive_in_each_direction() {
        let (nodes, ids) = create_chain(&[1, 2, 3, 4]);

        assert_eq!(nodes.next_length(ids[1]).unwrap(), 3);
        assert_eq!(nodes.previous_length(ids[1]).unwrap(), 2);
        assert_eq!(nodes.next_length(ids[3]).unwrap(), 1);
    }

    #[test]
    fn equality_depends_on_position_not_only_value() {
        let (mut nodes, ids) = create_chain(&[7, 7]);
        let lone = nodes.insert(7);
        let other_lone = nodes.insert(7);

        assert!(!nodes.nodes_equal(ids[0], ids[1]).unwrap());
        assert!(nodes.nodes_equal(lone, other_lone).unwrap());
    }

    #[test]
    fn taken_node_handle_becomes_unknown() {
        let (mut nodes, ids) = create_chain(&[1, 2, 3]);

        let value = nodes.take(ids[1]).unwrap();
        let reused = nodes.insert(9);

        assert_eq!(value, 2);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.value(ids[1]).unwrap_err(), ChainError::UnknownNode(ids[1]));
        assert_eq!(*nodes.value(reused).unwrap(), 9);
        assert_eq!(values(&nodes, ids[0]), vec![1, 3]);
    }

    #[test]
    fn predecessors_walk_backwards() {
        let (nodes, ids) = create_chain(&[1, 2, 3]);

        let walked: Vec<NodeId> = nodes.predecessors(Some(ids[2])).collect();

        assert_eq!(walked, vec![ids[2], ids[1], ids[0]]);
    }
}
