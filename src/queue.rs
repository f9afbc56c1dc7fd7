use std::collections::VecDeque;
use std::sync::Mutex;

/// Fixed-capacity, insertion-ordered queue with a drop-oldest overflow policy.
///
/// The queue is the only structure shared between the stream processor and the
/// host: the processor pushes while the host drains. Both operations take the
/// internal lock, so a slow consumer can never grow the queue past capacity.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
}

impl<T> BoundedQueue<T> {
    /// # Panics
    /// If `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        BoundedQueue {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an item, evicting the oldest if the queue is full.
    pub fn push(&self, item: T) {
        let mut items = self.items.lock().expect("queue lock poisoned");
        if items.len() == self.capacity {
            items.pop_front();
        }
        items.push_back(item);
    }

    /// Remove and return all queued items in arrival order.
    #[must_use]
    pub fn drain(&self) -> Vec<T> {
        let mut items = self.items.lock().expect("queue lock poisoned");
        items.drain(..).collect()
    }

    pub fn clear(&self) {
        self.items.lock().expect("queue lock poisoned").clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().expect("queue lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
