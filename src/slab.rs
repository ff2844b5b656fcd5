use std::alloc::{alloc, dealloc};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::config::PoolConfig;
use crate::layout::SlabLayout;

/// Bookkeeping at the start of every slab region.
///
/// The cells follow the header at [`SlabLayout::CELLS_OFFSET`].
pub(crate) struct SlabHeader {
    /// Link to the next (older) slab in the pool's slab list.
    next: Option<NonNull<SlabHeader>>,

    /// Count of cells already handed out of this slab, in bump order.
    ///
    /// Monotonically non-decreasing for the slab's lifetime. The slab knows nothing about
    /// which of those cells are live and which are on the pool's free list.
    next_unused: usize,
}

/// Handle to one slab region: a header followed by `SlabLayout::<C>::CAPACITY` cells.
///
/// This is a plain copyable pointer wrapper; the region itself is owned by the pool, and
/// all access is serialized by the pool's lock.
pub(crate) struct Slab<C: PoolConfig> {
    header: NonNull<SlabHeader>,
    _config: PhantomData<fn() -> C>,
}

impl<C: PoolConfig> Clone for Slab<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: PoolConfig> Copy for Slab<C> {}

impl<C: PoolConfig> Slab<C> {
    /// Requests a fresh region from the host allocator and initializes its header.
    ///
    /// `next` becomes the new slab's link, so pushing the result onto the front of the
    /// pool's slab list is a single pointer store. Returns `None` if the host allocator
    /// refuses, which callers treat exactly like pool exhaustion.
    pub(crate) fn allocate(next: Option<NonNull<SlabHeader>>) -> Option<Self> {
        let layout = SlabLayout::<C>::region_layout();

        // SAFETY: the region layout is never zero-sized; a configuration without room for
        // the header and one cell is rejected when the pool is built.
        let region = unsafe { alloc(layout) };
        let header = NonNull::new(region)?.cast::<SlabHeader>();

        // SAFETY: freshly allocated and aligned for the header per REGION_ALIGN.
        unsafe {
            header.as_ptr().write(SlabHeader {
                next,
                next_unused: 0,
            });
        }

        Some(Self {
            header,
            _config: PhantomData,
        })
    }

    pub(crate) fn from_raw(header: NonNull<SlabHeader>) -> Self {
        Self {
            header,
            _config: PhantomData,
        }
    }

    pub(crate) fn raw(self) -> NonNull<SlabHeader> {
        self.header
    }

    pub(crate) fn next(self) -> Option<NonNull<SlabHeader>> {
        // SAFETY: the header stays valid for the region's lifetime.
        unsafe { (*self.header.as_ptr()).next }
    }

    /// Count of cells handed out of this slab so far.
    pub(crate) fn carved(self) -> usize {
        // SAFETY: the header stays valid for the region's lifetime.
        unsafe { (*self.header.as_ptr()).next_unused }
    }

    /// Returns the address of the next never-used cell and advances the bump index, or
    /// `None` once every cell has been handed out.
    pub(crate) fn carve(self) -> Option<NonNull<u8>> {
        // SAFETY: the header stays valid for the region's lifetime, and the pool's lock
        // serializes all header access. The reference covers only the header bytes, never
        // the cells.
        let header = unsafe { &mut *self.header.as_ptr() };

        if header.next_unused == SlabLayout::<C>::CAPACITY {
            return None;
        }

        let index = header.next_unused;
        header.next_unused += 1;

        let offset = SlabLayout::<C>::CELLS_OFFSET + index * SlabLayout::<C>::CELL_SIZE;

        // SAFETY: index < CAPACITY, so the cell lies entirely within the region.
        let cell = unsafe { self.header.as_ptr().cast::<u8>().add(offset) };

        // SAFETY: derived by in-bounds offset from a non-null region pointer.
        Some(unsafe { NonNull::new_unchecked(cell) })
    }

    /// Releases the slab region back to the host allocator.
    ///
    /// # Safety
    ///
    /// No live object may remain in any of the slab's cells, and neither this handle nor
    /// any pointer into the region (including free-list nodes stored in its cells) may be
    /// used afterwards.
    pub(crate) unsafe fn release_region(self) {
        // SAFETY: the region was allocated in allocate() with this exact layout.
        unsafe { dealloc(self.header.as_ptr().cast(), SlabLayout::<C>::region_layout()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Instanced, PoolOrigin, SlabItem};
    use crate::lock::MutexLock;
    use crate::ownership::Unique;

    struct Payload {
        origin: PoolOrigin<PayloadPool>,
        _value: u64,
    }

    struct PayloadPool;

    impl PoolConfig for PayloadPool {
        type Item = Payload;
        type Ownership = Unique;
        type Lock = MutexLock;
        type Kind = Instanced;

        const SLAB_BYTES: usize = 256;
    }

    // SAFETY: `origin` is the field embedded in this item.
    unsafe impl SlabItem<PayloadPool> for Payload {
        fn origin(&self) -> &PoolOrigin<PayloadPool> {
            &self.origin
        }
    }

    #[test]
    fn carve_walks_the_whole_slab_once() {
        let slab = Slab::<PayloadPool>::allocate(None).unwrap();
        let capacity = SlabLayout::<PayloadPool>::CAPACITY;

        let mut cells = Vec::new();
        for expected in 0..capacity {
            assert_eq!(slab.carved(), expected);
            cells.push(slab.carve().unwrap());
        }

        assert_eq!(slab.carved(), capacity);
        assert!(slab.carve().is_none());
        assert_eq!(slab.carved(), capacity, "a refused carve must not advance");

        // Every cell is distinct, aligned, and exactly one stride apart.
        for (index, cell) in cells.iter().enumerate() {
            assert_eq!(cell.as_ptr() as usize % SlabLayout::<PayloadPool>::CELL_ALIGN, 0);

            if index > 0 {
                let previous = cells[index - 1].as_ptr() as usize;
                assert_eq!(
                    cell.as_ptr() as usize - previous,
                    SlabLayout::<PayloadPool>::CELL_SIZE
                );
            }
        }

        // SAFETY: nothing was constructed in the cells.
        unsafe { slab.release_region() };
    }

    #[test]
    fn slabs_link_through_their_headers() {
        let first = Slab::<PayloadPool>::allocate(None).unwrap();
        let second = Slab::<PayloadPool>::allocate(Some(first.raw())).unwrap();

        assert_eq!(second.next(), Some(first.raw()));
        assert!(first.next().is_none());

        // SAFETY: nothing was constructed in the cells.
        unsafe {
            second.release_region();
            first.release_region();
        }
    }
}
