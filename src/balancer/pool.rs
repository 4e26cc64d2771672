//! Priority-ordered backend pool.

use std::collections::BinaryHeap;

use crate::balancer::entry::BackendEntry;

/// A binary min-heap of backend entries keyed by ascending priority.
///
/// The pool defines, within one selection round, the order in which
/// backends are offered a chance at admission. Ties between equal
/// priorities are broken arbitrarily by heap mechanics. Size only
/// grows, through `Balancer::add`; selection rounds pop entries and
/// reinsert every one of them, leaving membership unchanged.
#[derive(Debug, Default)]
pub(crate) struct PriorityPool {
    heap: BinaryHeap<BackendEntry>,
}

impl PriorityPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: BackendEntry) {
        self.heap.push(entry);
    }

    /// Extract the entry with the lowest priority value.
    pub(crate) fn pop(&mut self) -> Option<BackendEntry> {
        self.heap.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::entry::BackendLimits;
    use crate::handler::{Handler, HandlerFn};
    use axum::body::Body;
    use axum::http::{Request, Response};
    use std::sync::Arc;
    use std::time::Instant;

    fn entry(name: &str, priority: i64) -> BackendEntry {
        let handler: Arc<dyn Handler> = Arc::new(HandlerFn::new(|_req: Request<Body>| async {
            Response::new(Body::empty())
        }));
        BackendEntry::new(
            name,
            handler,
            BackendLimits {
                priority: Some(priority),
                ..Default::default()
            },
            Instant::now(),
        )
        .expect("entry")
    }

    #[test]
    fn pops_in_ascending_priority_order() {
        let mut pool = PriorityPool::new();
        pool.push(entry("c", 3));
        pool.push(entry("a", 1));
        pool.push(entry("b", 2));

        assert_eq!(pool.pop().map(|e| e.name().to_owned()).as_deref(), Some("a"));
        assert_eq!(pool.pop().map(|e| e.name().to_owned()).as_deref(), Some("b"));
        assert_eq!(pool.pop().map(|e| e.name().to_owned()).as_deref(), Some("c"));
        assert!(pool.pop().is_none());
    }

    #[test]
    fn reinsertion_restores_size_and_order() {
        let mut pool = PriorityPool::new();
        pool.push(entry("b", 2));
        pool.push(entry("a", 1));

        let first = pool.pop().expect("entry");
        let second = pool.pop().expect("entry");
        assert!(pool.is_empty());

        pool.push(first);
        pool.push(second);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.pop().map(|e| e.name().to_owned()).as_deref(), Some("a"));
    }

    #[test]
    fn equal_priorities_all_come_out() {
        let mut pool = PriorityPool::new();
        pool.push(entry("x", 1));
        pool.push(entry("y", 1));

        let mut names = vec![
            pool.pop().expect("entry").name().to_owned(),
            pool.pop().expect("entry").name().to_owned(),
        ];
        names.sort();
        assert_eq!(names, ["x", "y"]);
    }
}
