//! Bucketed priority queue for small non-negative integer priorities.
//!
//! Used as the frontier of every grid search: pathfinding, visibility and the
//! generator's land-growth flood fill. Each bucket is a singly linked list of
//! entry ids. The links live in an arena indexed by id (the cell index), so
//! enqueueing never allocates a node and cells carry no queue state.
//!
//! Dequeue order is non-decreasing as long as callers never lower a priority
//! below the current minimum watermark.

const NONE: usize = usize::MAX;

#[derive(Clone, Debug, Default)]
pub struct PriorityBucketQueue {
    /// Head of the list for each priority, `NONE` if empty.
    buckets: Vec<usize>,
    /// `next[id]` is the next id with the same priority.
    next: Vec<usize>,
    count: usize,
    /// Lowest bucket that may be non-empty.
    minimum: usize,
}

impl PriorityBucketQueue {
    /// Create a queue for ids in `0..capacity`. Larger ids grow the arena.
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: Vec::new(),
            next: vec![NONE; capacity],
            count: 0,
            minimum: usize::MAX,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Push `id` onto the head of the bucket for `priority`.
    pub fn enqueue(&mut self, id: usize, priority: usize) {
        self.count += 1;
        self.push(id, priority);
    }

    /// Pop an id with the lowest priority, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<usize> {
        while self.minimum < self.buckets.len() {
            let head = self.buckets[self.minimum];
            if head != NONE {
                self.buckets[self.minimum] = self.next[head];
                self.next[head] = NONE;
                self.count -= 1;
                return Some(head);
            }
            self.minimum += 1;
        }
        None
    }

    /// Move `id` from the bucket for `old_priority` to the one for
    /// `new_priority`. Does nothing if `id` is not in the old bucket.
    pub fn change_priority(&mut self, id: usize, old_priority: usize, new_priority: usize) {
        let Some(&head) = self.buckets.get(old_priority) else {
            return;
        };
        if head == NONE {
            return;
        }

        if head == id {
            self.buckets[old_priority] = self.next[id];
        } else {
            let mut current = head;
            loop {
                let next = self.next[current];
                if next == NONE {
                    return;
                }
                if next == id {
                    self.next[current] = self.next[id];
                    break;
                }
                current = next;
            }
        }

        self.next[id] = NONE;
        self.push(id, new_priority);
    }

    /// Empty the queue. Buckets are reset in place; arena links of entries that
    /// were still queued are reset so ids can be reused.
    pub fn clear(&mut self) {
        for head in self.buckets.iter_mut() {
            let mut current = *head;
            while current != NONE {
                let next = self.next[current];
                self.next[current] = NONE;
                current = next;
            }
            *head = NONE;
        }
        self.count = 0;
        self.minimum = usize::MAX;
    }

    fn push(&mut self, id: usize, priority: usize) {
        if id >= self.next.len() {
            self.next.resize(id + 1, NONE);
        }
        if priority >= self.buckets.len() {
            self.buckets.resize(priority + 1, NONE);
        }
        if priority < self.minimum {
            self.minimum = priority;
        }
        self.next[id] = self.buckets[priority];
        self.buckets[priority] = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequeues_in_priority_order() {
        let mut queue = PriorityBucketQueue::new(8);
        for (id, priority) in [5, 2, 8, 2, 1].into_iter().enumerate() {
            queue.enqueue(id, priority);
        }
        assert_eq!(queue.len(), 5);

        let priorities = [5, 2, 8, 2, 1];
        let mut order = Vec::new();
        while let Some(id) = queue.dequeue() {
            order.push(priorities[id]);
        }
        assert_eq!(order, vec![1, 2, 2, 5, 8]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_dequeue_returns_none() {
        let mut queue = PriorityBucketQueue::new(0);
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_change_priority_moves_entry_earlier() {
        let mut queue = PriorityBucketQueue::new(4);
        queue.enqueue(0, 3);
        queue.enqueue(1, 6);
        queue.enqueue(2, 6);
        queue.change_priority(1, 6, 2);
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(0));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_change_priority_unlinks_middle_of_bucket() {
        let mut queue = PriorityBucketQueue::new(4);
        queue.enqueue(0, 4);
        queue.enqueue(1, 4);
        queue.enqueue(2, 4);
        // bucket 4 is 2 -> 1 -> 0
        queue.change_priority(1, 4, 0);
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), Some(0));
    }

    #[test]
    fn test_clear_resets_watermark() {
        let mut queue = PriorityBucketQueue::new(4);
        queue.enqueue(0, 5);
        queue.enqueue(1, 7);
        assert_eq!(queue.dequeue(), Some(0));
        queue.clear();
        assert!(queue.is_empty());

        queue.enqueue(1, 1);
        queue.enqueue(3, 0);
        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), Some(1));
    }

    #[test]
    fn test_grows_for_large_ids() {
        let mut queue = PriorityBucketQueue::new(1);
        queue.enqueue(40, 2);
        assert_eq!(queue.dequeue(), Some(40));
    }
}
