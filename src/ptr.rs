use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::config::PoolConfig;
use crate::kind::PoolKind;
use crate::pool::SlabPool;

/// Copyable raw handle to a pool-dispensed object.
///
/// The raw mode gives up automatic recycling: copies may be passed around freely, access
/// goes through `unsafe` accessors, and exactly one copy must eventually call
/// [`destroy`][Self::destroy] to run the destructor and return the cell to its pool. The
/// `'pool` lifetime still ties every copy to the dispensing pool, so a handle can never
/// outlive the memory it points into.
pub struct SlabPtr<'pool, C: PoolConfig> {
    item: NonNull<C::Item>,
    _pool: PhantomData<&'pool SlabPool<C>>,
}

impl<'pool, C: PoolConfig> SlabPtr<'pool, C> {
    pub(crate) fn new(item: NonNull<C::Item>) -> Self {
        Self {
            item,
            _pool: PhantomData,
        }
    }

    /// The address of the item.
    #[must_use]
    pub fn as_ptr(self) -> *mut C::Item {
        self.item.as_ptr()
    }

    /// The address of the item as a [`NonNull`].
    #[must_use]
    pub fn as_non_null(self) -> NonNull<C::Item> {
        self.item
    }

    /// Borrows the item.
    ///
    /// # Safety
    ///
    /// The item must still be live (not yet destroyed), and no exclusive reference to it
    /// may exist for `'a`.
    #[must_use]
    pub unsafe fn as_ref<'a>(&self) -> &'a C::Item {
        // SAFETY: forwarded to the caller.
        unsafe { self.item.as_ref() }
    }

    /// Borrows the item exclusively.
    ///
    /// # Safety
    ///
    /// The item must still be live (not yet destroyed), and no other reference to it may
    /// exist for `'a`.
    #[must_use]
    pub unsafe fn as_mut<'a>(&mut self) -> &'a mut C::Item {
        // SAFETY: forwarded to the caller.
        unsafe { self.item.as_mut() }
    }

    /// Runs the item's destructor and returns its cell to the pool that dispensed it.
    ///
    /// # Safety
    ///
    /// The item must still be live. At most one copy of the handle may ever call this, and
    /// no copy may be used in any way afterwards.
    pub unsafe fn destroy(self) {
        // SAFETY: the item is live and was bound to its pool when it was dispensed.
        let pool = unsafe { <C::Kind as PoolKind<C>>::origin_pool(self.item.as_ref()) };

        // SAFETY: per the caller this is the one destruction of this item; afterwards the
        // storage is dead and returns to the pool that carved it.
        unsafe {
            ptr::drop_in_place(self.item.as_ptr());
            pool.as_ref().release_cell(self.item.cast());
        }
    }
}

impl<C: PoolConfig> Clone for SlabPtr<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: PoolConfig> Copy for SlabPtr<'_, C> {}

impl<C: PoolConfig> fmt::Debug for SlabPtr<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlabPtr").field(&self.item).finish()
    }
}

// SAFETY: the handle is address-only; every dereference and the destruction are unsafe
// operations whose callers vouch for exclusivity. Crossing threads additionally requires
// the item to tolerate it and the destruction path to go through a real (`Sync`) lock.
unsafe impl<C: PoolConfig> Send for SlabPtr<'_, C>
where
    C::Item: Send + Sync,
    C::Lock: Sync,
{
}

// SAFETY: see the Send impl above.
unsafe impl<C: PoolConfig> Sync for SlabPtr<'_, C>
where
    C::Item: Send + Sync,
    C::Lock: Sync,
{
}
