//! Register allocation.
//!
//! A [`RegisterAllocator`] hands out indices from a fixed-size pool. Allocation
//! is monotonic: indices are never freed or reused within one session, and a
//! request that does not fit leaves the pool untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

use crate::error::{IrError, IrResult};
use crate::qubit::{ClbitId, QubitId};

/// Which register an index lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterKind {
    /// The qubit register.
    Quantum,
    /// The classical-bit register.
    Classical,
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterKind::Quantum => write!(f, "qubit"),
            RegisterKind::Classical => write!(f, "classical bit"),
        }
    }
}

/// An identifier type that can be handed out by a [`RegisterAllocator`].
pub trait RegisterIndex: Copy + From<u32> {
    /// The register this index type addresses.
    const KIND: RegisterKind;

    /// Raw index value.
    fn raw(self) -> u32;
}

impl RegisterIndex for QubitId {
    const KIND: RegisterKind = RegisterKind::Quantum;

    fn raw(self) -> u32 {
        self.0
    }
}

impl RegisterIndex for ClbitId {
    const KIND: RegisterKind = RegisterKind::Classical;

    fn raw(self) -> u32 {
        self.0
    }
}

/// Monotonic allocator over a fixed pool of indices.
#[derive(Debug, Clone)]
pub struct RegisterAllocator<T> {
    capacity: u32,
    allocated: u32,
    _marker: PhantomData<T>,
}

impl<T: RegisterIndex> RegisterAllocator<T> {
    /// Create an allocator over `capacity` slots, none allocated yet.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            allocated: 0,
            _marker: PhantomData,
        }
    }

    /// Create an allocator whose whole pool is already handed out.
    pub fn fully_allocated(capacity: u32) -> Self {
        Self {
            capacity,
            allocated: capacity,
            _marker: PhantomData,
        }
    }

    /// Allocate `count` fresh indices.
    ///
    /// Fails with [`IrError::CapacityExceeded`] when fewer than `count`
    /// slots remain; in that case nothing is allocated.
    pub fn allocate(&mut self, count: u32) -> IrResult<Vec<T>> {
        let available = self.remaining();
        if count > available {
            return Err(IrError::CapacityExceeded {
                kind: T::KIND,
                requested: count,
                available,
            });
        }

        let start = self.allocated;
        self.allocated += count;
        Ok((start..self.allocated).map(T::from).collect())
    }

    /// Check whether `id` has been handed out.
    #[inline]
    pub fn contains(&self, id: T) -> bool {
        id.raw() < self.allocated
    }

    /// Pool size.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of indices handed out so far.
    pub fn allocated(&self) -> u32 {
        self.allocated
    }

    /// Number of indices still available.
    pub fn remaining(&self) -> u32 {
        self.capacity - self.allocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_allocate_sequential() {
        let mut alloc = RegisterAllocator::<QubitId>::new(24);
        let first = alloc.allocate(2).unwrap();
        let second = alloc.allocate(3).unwrap();

        assert_eq!(first, vec![QubitId(0), QubitId(1)]);
        assert_eq!(second, vec![QubitId(2), QubitId(3), QubitId(4)]);
        assert_eq!(alloc.remaining(), 19);
        assert!(alloc.contains(QubitId(4)));
        assert!(!alloc.contains(QubitId(5)));
    }

    #[test]
    fn test_capacity_exceeded_allocates_nothing() {
        let mut alloc = RegisterAllocator::<ClbitId>::new(24);
        alloc.allocate(20).unwrap();

        let err = alloc.allocate(5).unwrap_err();
        assert!(matches!(
            err,
            IrError::CapacityExceeded {
                kind: RegisterKind::Classical,
                requested: 5,
                available: 4,
            }
        ));
        assert_eq!(alloc.allocated(), 20);

        // The remaining slots are still usable after the failure.
        assert_eq!(alloc.allocate(4).unwrap().len(), 4);
    }

    #[test]
    fn test_over_pool_size() {
        let mut alloc = RegisterAllocator::<QubitId>::new(72);
        assert!(alloc.allocate(73).is_err());
        assert_eq!(alloc.allocated(), 0);
    }

    #[test]
    fn test_zero_allocation() {
        let mut alloc = RegisterAllocator::<QubitId>::new(0);
        assert!(alloc.allocate(0).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_allocations_are_distinct(
            capacity in 0u32..100,
            requests in proptest::collection::vec(0u32..30, 0..10),
        ) {
            let mut alloc = RegisterAllocator::<QubitId>::new(capacity);
            let mut seen = std::collections::BTreeSet::new();

            for count in requests {
                let before = alloc.allocated();
                match alloc.allocate(count) {
                    Ok(ids) => {
                        prop_assert_eq!(ids.len() as u32, count);
                        for id in ids {
                            prop_assert!(id.0 < capacity);
                            prop_assert!(seen.insert(id));
                        }
                    }
                    Err(_) => prop_assert_eq!(alloc.allocated(), before),
                }
            }
        }
    }
}
