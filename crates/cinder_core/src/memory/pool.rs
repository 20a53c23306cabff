//! # Pool Allocator
//!
//! Fixed-capacity slot allocator with generational handles.

/// Handle to an allocated object in a pool.
///
/// The handle is split into two parts:
/// - `index`: slot position in the pool
/// - `generation`: bumped every time the slot is freed, for detecting stale handles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Null/invalid handle. Never resolves.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Creates a handle from raw parts.
    #[inline]
    #[must_use]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Checks if this handle is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// One pool slot: the current occupant (if any) and its generation.
#[derive(Debug)]
struct Entry<T> {
    value: Option<T>,
    generation: u32,
}

/// A pool allocator with a fixed number of slots.
///
/// Objects can be allocated and freed individually. Handles carry the
/// slot's generation, so a handle to a freed object never resolves to the
/// object that later reuses the slot.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is owned by a single frame loop.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: PoolAllocator<Particle> = PoolAllocator::new(10_000);
///
/// let handle = pool.allocate(Particle::default()).unwrap();
/// pool.free(handle);
/// assert!(pool.get(handle).is_none()); // stale
/// ```
#[derive(Debug)]
pub struct PoolAllocator<T> {
    /// The storage array.
    storage: Box<[Entry<T>]>,
    /// Free list - indices of available slots.
    free_list: Vec<u32>,
    /// Number of allocated objects.
    allocated_count: usize,
}

impl<T> PoolAllocator<T> {
    /// Creates a new pool with the specified capacity.
    ///
    /// All slots are pre-allocated upfront.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or does not fit in a `u32` index.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity < u32::MAX as usize,
            "Capacity must be less than u32::MAX"
        );

        let storage: Vec<Entry<T>> = (0..capacity)
            .map(|_| Entry {
                value: None,
                generation: 0,
            })
            .collect();

        // Reversed so that slot 0 is handed out first
        let free_list: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            storage: storage.into_boxed_slice(),
            free_list,
            allocated_count: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of currently allocated objects.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.allocated_count
    }

    /// Allocates a slot and stores the object.
    ///
    /// # Returns
    ///
    /// A handle to the allocated object, or None if the pool is full.
    pub fn allocate(&mut self, value: T) -> Option<PoolHandle> {
        let index = self.free_list.pop()?;
        let entry = &mut self.storage[index as usize];

        entry.value = Some(value);
        self.allocated_count += 1;

        Some(PoolHandle::from_parts(index, entry.generation))
    }

    /// Frees an allocated object and invalidates every handle to it.
    ///
    /// # Returns
    ///
    /// The freed object, or None if the handle was null, stale or already freed.
    pub fn free(&mut self, handle: PoolHandle) -> Option<T> {
        let entry = self.storage.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }

        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.allocated_count -= 1;

        Some(value)
    }

    /// Returns true if the handle refers to a live object.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to an allocated object.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        let entry = self.storage.get(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.value.as_ref()
    }

    /// Gets a mutable reference to an allocated object.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let entry = self.storage.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.value.as_mut()
    }

    /// Frees every allocation, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        for entry in self.storage.iter_mut() {
            if entry.value.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
            }
        }
        self.free_list.clear();
        self.free_list.extend((0..self.storage.len() as u32).rev());
        self.allocated_count = 0;
    }

    /// Iterates over all allocated objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.storage.iter().enumerate().filter_map(|(index, entry)| {
            entry
                .value
                .as_ref()
                .map(|v| (PoolHandle::from_parts(index as u32, entry.generation), v))
        })
    }

    /// Iterates mutably over all allocated objects in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.storage.iter_mut().enumerate().filter_map(|(index, entry)| {
            let generation = entry.generation;
            entry
                .value
                .as_mut()
                .map(|v| (PoolHandle::from_parts(index as u32, generation), v))
        })
    }
}
