use crate::types::CallId;

/// Hands out request-scoped call ids: `c0`, `c1`, `c2`, ...
///
/// Each request builder owns its own allocator, so uniqueness never needs
/// coordination across threads or batches.
#[derive(Debug, Default)]
pub struct CallIdAllocator {
    next: u64,
}

impl CallIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. Never repeats for the lifetime of the allocator.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> CallId {
        let id = CallId::new(format!("c{}", self.next));
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_sequential() {
        let mut allocator = CallIdAllocator::new();
        assert_eq!(allocator.next().as_str(), "c0");
        assert_eq!(allocator.next().as_str(), "c1");
        assert_eq!(allocator.next().as_str(), "c2");
    }

    #[test]
    fn test_ids_never_repeat() {
        let mut allocator = CallIdAllocator::new();
        let ids: HashSet<CallId> = (0..1000).map(|_| allocator.next()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_allocators_are_independent() {
        let mut first = CallIdAllocator::new();
        let mut second = CallIdAllocator::new();
        first.next();
        assert_eq!(second.next().as_str(), "c0");
    }
}
