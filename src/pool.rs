use std::fmt;
use std::mem;
use std::num::NonZero;
use std::ptr::NonNull;

use lock_api::Mutex;

use crate::builder::SlabPoolBuilder;
use crate::config::PoolConfig;
use crate::free_list::FreeList;
use crate::kind::PoolKind;
use crate::layout::SlabLayout;
use crate::ownership::{Ownership, PoolPtr};
use crate::slab::{Slab, SlabHeader};

/// A fixed-class object pool.
///
/// The pool requests large regions from the host allocator (slabs), carves them into cells
/// sized for exactly one `C::Item`, and dispenses cells as constructed objects wrapped in
/// the configured pointer type. Freed cells return through an intrusive free list and are
/// reused, most recently freed first.
///
/// An allocation is served from, in order: the free list, the active slab's never-used
/// cells, or a freshly created slab. Each step is O(1); only slab creation calls the host
/// allocator, and the number of slabs is capped at `max_slabs`. Once the cap is reached and
/// no cell is free, [`allocate`][Self::allocate] returns `None`.
///
/// Slabs are owned exclusively by the pool and are only released when the pool is dropped;
/// the pool never returns an empty slab to the host mid-life. Dropping the pool while
/// dispensed objects are still live is a programmer error, detected in debug builds.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, SlabPool, Unique};
///
/// struct Buffer {
///     origin: PoolOrigin<BufferPool>,
///     bytes: [u8; 64],
/// }
///
/// struct BufferPool;
///
/// impl PoolConfig for BufferPool {
///     type Item = Buffer;
///     type Ownership = Unique;
///     type Lock = MutexLock;
///     type Kind = Instanced;
/// }
///
/// // SAFETY: `origin` is the field embedded in this buffer.
/// unsafe impl SlabItem<BufferPool> for Buffer {
///     fn origin(&self) -> &PoolOrigin<BufferPool> {
///         &self.origin
///     }
/// }
///
/// let pool = SlabPool::<BufferPool>::new(NonZero::new(2).unwrap());
///
/// let buffer = pool
///     .allocate(Buffer {
///         origin: PoolOrigin::new(),
///         bytes: [0; 64],
///     })
///     .unwrap();
///
/// assert_eq!(buffer.bytes.len(), 64);
/// ```
pub struct SlabPool<C: PoolConfig> {
    state: Mutex<C::Lock, PoolState>,
    max_slabs: NonZero<usize>,
}

/// Everything the lock guards.
struct PoolState {
    /// Head of the slab list. The most recently created slab is the active one; older
    /// slabs are never rescanned for unused cells.
    slabs: Option<NonNull<SlabHeader>>,

    free: FreeList,

    slab_count: usize,
}

impl<C: PoolConfig> SlabPool<C> {
    /// Number of cells each slab yields for this configuration.
    pub const SLAB_CAPACITY: usize = SlabLayout::<C>::CAPACITY;

    /// Starts building a pool.
    #[must_use]
    pub fn builder() -> SlabPoolBuilder<C> {
        SlabPoolBuilder::new()
    }

    /// Creates a pool allowed to own at most `max_slabs` slabs, creating none up front.
    ///
    /// Use [`builder()`][Self::builder] to also pre-create the first slab.
    #[must_use]
    pub fn new(max_slabs: NonZero<usize>) -> Self {
        Self::builder().max_slabs(max_slabs).build()
    }

    pub(crate) fn new_inner(max_slabs: NonZero<usize>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                slabs: None,
                free: FreeList::new(),
                slab_count: 0,
            }),
            max_slabs,
        }
    }

    /// The maximum number of slabs this pool may own.
    #[must_use]
    pub fn max_slabs(&self) -> NonZero<usize> {
        self.max_slabs
    }

    /// The number of slabs the pool currently owns. Never decreases before the pool drops.
    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.state.lock().slab_count
    }

    /// Moves `value` into a cell and dispenses it as the configured pointer type.
    ///
    /// Returns `None` (dropping `value`) when the pool is exhausted: the slab ceiling is
    /// reached, the active slab is fully carved, no freed cell is available, or the host
    /// allocator refuses a new slab. Exhaustion creates no partial state; a single release
    /// makes the next allocation succeed again.
    pub fn allocate(&self, value: C::Item) -> Option<PoolPtr<'_, C>> {
        self.allocate_with(move || value)
    }

    /// Like [`allocate`][Self::allocate], but constructs the item in place from a closure.
    ///
    /// The closure only runs once a cell has been secured, and it runs outside the pool
    /// lock, so it may itself allocate from this pool or any other without deadlocking.
    /// If it unwinds, the cell goes straight back on the free list before the panic
    /// continues.
    pub fn allocate_with<F>(&self, make: F) -> Option<PoolPtr<'_, C>>
    where
        F: FnOnce() -> C::Item,
    {
        let cell = self.acquire_cell()?;

        let rollback = ReleaseOnUnwind { pool: self, cell };
        let value = make();
        mem::forget(rollback);

        let item = cell.cast::<C::Item>();

        // SAFETY: the cell is unclaimed storage, sized and aligned for C::Item.
        unsafe { item.as_ptr().write(value) };

        // SAFETY: just initialized above.
        let item_ref = unsafe { item.as_ref() };
        <C::Kind as PoolKind<C>>::bind(item_ref, self);

        // SAFETY: the item is live, bound to this pool, and dispensed exactly once.
        Some(unsafe { <C::Ownership as Ownership<C>>::wrap(item, self) })
    }

    /// Secures one cell: free list first, then the active slab, then a new slab.
    pub(crate) fn acquire_cell(&self) -> Option<NonNull<u8>> {
        let mut state = self.state.lock();

        // Most recently freed first: the cheapest path and the warmest memory.
        if let Some(cell) = state.free.pop() {
            return Some(cell);
        }

        // Then the active slab's never-used cells. Older slabs are not rescanned; capacity
        // they still had when they were displaced comes back only through the free list.
        if let Some(head) = state.slabs {
            if let Some(cell) = Slab::<C>::from_raw(head).carve() {
                return Some(cell);
            }
        }

        // Finally a fresh slab, if the ceiling allows and the host cooperates. This is the
        // only step that calls out of the pool while the lock is held.
        if state.slab_count < self.max_slabs.get() {
            if let Some(slab) = Slab::<C>::allocate(state.slabs) {
                state.slabs = Some(slab.raw());
                state.slab_count += 1;
                return slab.carve();
            }
        }

        None
    }

    /// Puts a cell back into circulation. The object's destructor has already run.
    pub(crate) fn release_cell(&self, cell: NonNull<u8>) {
        let mut state = self.state.lock();

        // SAFETY: callers pass a cell this pool dispensed whose object lifetime has ended;
        // from here on it is free-list storage.
        unsafe { state.free.push(cell) };

        #[cfg(debug_assertions)]
        state.free.integrity_check();
    }
}

impl<C: PoolConfig> Drop for SlabPool<C> {
    fn drop(&mut self) {
        let state = self.state.get_mut();

        let mut carved = 0;
        let mut cursor = state.slabs.take();

        while let Some(header) = cursor {
            let slab = Slab::<C>::from_raw(header);
            cursor = slab.next();
            carved += slab.carved();

            // SAFETY: handles cannot outlive the pool, so no cell is live; the free-list
            // nodes inside the region die with it, which is why the free list itself is
            // never unlinked.
            unsafe { slab.release_region() };
        }

        // Everything ever carved must have come back.
        #[cfg(debug_assertions)]
        assert_eq!(
            state.free.len(),
            carved,
            "pool dropped while dispensed objects were still live"
        );

        let _ = carved;
    }
}

impl<C: PoolConfig> fmt::Debug for SlabPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabPool")
            .field("max_slabs", &self.max_slabs)
            .field("slab_count", &self.slab_count())
            .field("slab_capacity", &Self::SLAB_CAPACITY)
            .finish_non_exhaustive()
    }
}

// SAFETY: the pool exclusively owns its slabs and free list; the state is plain memory
// bookkeeping. Live items are owned by handles, but their storage moves with the pool, so
// sending the pool requires the item type to be sendable.
unsafe impl<C: PoolConfig> Send for SlabPool<C> where C::Item: Send {}

// SAFETY: concurrent acquire and release are serialized by the lock. The no-op lock kind
// is `!Sync` and therefore excluded by the `C::Lock: Sync` bound.
unsafe impl<C: PoolConfig> Sync for SlabPool<C>
where
    C::Item: Send,
    C::Lock: Sync,
{
}

/// Returns the freshly acquired cell if the item constructor unwinds.
struct ReleaseOnUnwind<'pool, C: PoolConfig> {
    pool: &'pool SlabPool<C>,
    cell: NonNull<u8>,
}

impl<C: PoolConfig> Drop for ReleaseOnUnwind<'_, C> {
    fn drop(&mut self) {
        self.pool.release_cell(self.cell);
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use new_zealand::nz;

    use super::*;
    use crate::kind::{Instanced, PoolOrigin, SlabItem};
    use crate::lock::MutexLock;
    use crate::ownership::Unique;

    struct Record {
        origin: PoolOrigin<RecordPool>,
        value: u32,
    }

    impl Record {
        fn new(value: u32) -> Self {
            Self {
                origin: PoolOrigin::new(),
                value,
            }
        }
    }

    struct RecordPool;

    impl PoolConfig for RecordPool {
        type Item = Record;
        type Ownership = Unique;
        type Lock = MutexLock;
        type Kind = Instanced;

        const SLAB_BYTES: usize = 512;
    }

    // SAFETY: `origin` is the field embedded in this record.
    unsafe impl SlabItem<RecordPool> for Record {
        fn origin(&self) -> &PoolOrigin<RecordPool> {
            &self.origin
        }
    }

    #[test]
    fn smoke_test() {
        let pool = SlabPool::<RecordPool>::new(nz!(2));

        assert_eq!(pool.max_slabs(), NonZero::new(2).unwrap());
        assert_eq!(pool.slab_count(), 0);

        let a = pool.allocate(Record::new(1)).unwrap();
        let b = pool.allocate(Record::new(2)).unwrap();

        assert_eq!(pool.slab_count(), 1);
        assert_eq!(a.value, 1);
        assert_eq!(b.value, 2);

        drop(a);
        drop(b);
    }

    #[test]
    fn acquire_prefers_free_list_over_bump() {
        let pool = SlabPool::<RecordPool>::new(nz!(1));

        let cell_a = pool.acquire_cell().unwrap();
        let cell_b = pool.acquire_cell().unwrap();
        assert_ne!(cell_a, cell_b);

        pool.release_cell(cell_a);

        // The freed cell comes back before any further bump allocation.
        assert_eq!(pool.acquire_cell(), Some(cell_a));

        pool.release_cell(cell_a);
        pool.release_cell(cell_b);
    }

    #[test]
    fn allocate_with_runs_the_closure_once_a_cell_is_secured() {
        let pool = SlabPool::<RecordPool>::new(nz!(1));

        let mut ran = false;
        let record = pool
            .allocate_with(|| {
                ran = true;
                Record::new(9)
            })
            .unwrap();

        assert!(ran);
        assert_eq!(record.value, 9);
    }

    #[test]
    fn exhausted_pool_does_not_run_the_closure() {
        let pool = SlabPool::<RecordPool>::new(nz!(1));

        let mut live = Vec::new();
        for i in 0..SlabPool::<RecordPool>::SLAB_CAPACITY {
            live.push(pool.allocate(Record::new(i as u32)).unwrap());
        }

        let mut ran = false;
        let refused = pool.allocate_with(|| {
            ran = true;
            Record::new(0)
        });

        assert!(refused.is_none());
        assert!(!ran);
    }

    #[test]
    fn debug_output_names_the_limits() {
        let pool = SlabPool::<RecordPool>::new(nz!(2));

        let rendered = format!("{pool:?}");
        assert!(rendered.contains("max_slabs"));
        assert!(rendered.contains("slab_capacity"));
    }
}
