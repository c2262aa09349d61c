//! Doubly linked list stored in a slot arena.
//!
//! Nodes live in a `Vec<Option<Node<T>>>` and refer to each other through
//! [`SlotId`] indices, so there are no owning pointers and no reference
//! cycles. Freed slots go on a free list and are reused by later inserts.
//!
//! ```text
//!   slots: [ Some(B) | None | Some(A) | Some(C) ]      free: [1]
//!
//!   head ─► [2:A] ◄──► [0:B] ◄──► [3:C] ◄── tail
//! ```
//!
//! Every operation is O(1) except iteration and [`OrderedList::clear`].
//! The caches in this crate treat the head as the "most valuable" end and
//! the tail as the eviction end.

/// Stable handle to a node in an [`OrderedList`].
///
/// A handle stays valid until its node is removed; after that the slot may be
/// reused for an unrelated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Arena-backed doubly linked list with O(1) relinking.
///
/// # Examples
///
/// ```
/// use evicta_core::OrderedList;
///
/// let mut list = OrderedList::new();
/// let a = list.push_back("a");
/// let b = list.push_back("b");
/// let c = list.push_back("c");
///
/// list.move_to_front(c);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["c", "a", "b"]);
///
/// list.move_before(b, a);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["c", "b", "a"]);
///
/// assert_eq!(list.pop_back(), Some("a"));
/// assert_eq!(list.len(), 2);
/// ```
#[derive(Debug)]
pub struct OrderedList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    len: usize,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> OrderedList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.node_mut(id).map(|node| &mut node.value)
    }

    /// Returns the neighbour of `id` towards the head.
    pub fn prev_id(&self, id: SlotId) -> Option<SlotId> {
        self.node(id).and_then(|node| node.prev)
    }

    /// Returns the neighbour of `id` towards the tail.
    pub fn next_id(&self, id: SlotId) -> Option<SlotId> {
        self.node(id).and_then(|node| node.next)
    }

    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.alloc(value);
        self.link_before(id, self.head);
        id
    }

    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.alloc(value);
        self.link_before(id, None);
        id
    }

    /// Inserts `value` directly ahead of `anchor` (on the head side).
    ///
    /// A stale `anchor` degrades to `push_back`.
    pub fn insert_before(&mut self, anchor: SlotId, value: T) -> SlotId {
        let anchor = self.node(anchor).map(|_| anchor);
        let id = self.alloc(value);
        self.link_before(id, anchor);
        id
    }

    /// Unlinks `id` and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.unlink(id)?;
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(node.value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.head?;
        self.remove(id)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Moves `id` to the head. Returns `false` if `id` is not in the list.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(id);
            self.link_before(id, self.head);
        }
        true
    }

    /// Moves `id` so that it sits directly ahead of `anchor`.
    ///
    /// Returns `false` if either handle is stale or they are the same node.
    pub fn move_before(&mut self, id: SlotId, anchor: SlotId) -> bool {
        if id == anchor || self.node(id).is_none() || self.node(anchor).is_none() {
            return false;
        }
        if self.next_id(id) != Some(anchor) {
            self.unlink(id);
            self.link_before(id, Some(anchor));
        }
        true
    }

    /// Removes every node and releases the arena slots.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
        self.head = None;
        self.tail = None;
    }

    /// Iterates values from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
            forward: true,
        }
    }

    /// Iterates values from tail to head.
    pub fn iter_rev(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.tail,
            forward: false,
        }
    }

    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<T>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    fn alloc(&mut self, value: T) -> SlotId {
        let node = Node {
            value,
            prev: None,
            next: None,
        };
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            SlotId(idx)
        } else {
            self.slots.push(Some(node));
            SlotId(self.slots.len() - 1)
        }
    }

    /// Links a detached node ahead of `anchor`, or at the tail when `anchor`
    /// is `None`.
    fn link_before(&mut self, id: SlotId, anchor: Option<SlotId>) {
        let prev = match anchor {
            Some(anchor) => self.node(anchor).and_then(|node| node.prev),
            None => self.tail,
        };

        if let Some(node) = self.node_mut(id) {
            node.prev = prev;
            node.next = anchor;
        }

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }

        match anchor {
            Some(anchor) => {
                if let Some(node) = self.node_mut(anchor) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.node(id)?;
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
        Some(())
    }

    /// Walks the list and asserts that the links agree with `len`.
    #[cfg(test)]
    pub(crate) fn debug_validate(&self) {
        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;

        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                panic!("linked node {:?} missing from arena", id);
            };
            assert_eq!(node.prev, prev, "broken back link at {:?}", id);
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len, "cycle detected");
        }

        assert_eq!(self.tail, prev);
        assert_eq!(count, self.len);
        assert_eq!(self.slots.len() - self.free.len(), self.len);
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the values of an [`OrderedList`].
pub struct Iter<'a, T> {
    list: &'a OrderedList<T>,
    current: Option<SlotId>,
    forward: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.node(id)?;
        self.current = if self.forward { node.next } else { node.prev };
        Some(&node.value)
    }
}
