use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use crate::config::PoolConfig;
use crate::kind::PoolKind;
use crate::pool::SlabPool;
use crate::refcount::RefCounted;

/// Shared handle to a pool-dispensed object.
///
/// The reference count lives inside the item (see [`RefCounted`]), so the handle itself is
/// one pointer wide. Cloning bumps the count; the drop that takes it to zero runs the
/// item's destructor and returns the cell to the pool that dispensed it.
///
/// Unlike [`SlabBox`][crate::SlabBox], a shared handle only ever hands out `&C::Item`.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use slab_pool::{
///     Instanced, MutexLock, PoolConfig, PoolOrigin, RefCount, RefCounted, Shared, SlabArc,
///     SlabItem, SlabPool,
/// };
///
/// struct Config {
///     origin: PoolOrigin<ConfigPool>,
///     refs: RefCount,
///     retries: u32,
/// }
///
/// struct ConfigPool;
///
/// impl PoolConfig for ConfigPool {
///     type Item = Config;
///     type Ownership = Shared;
///     type Lock = MutexLock;
///     type Kind = Instanced;
/// }
///
/// // SAFETY: `origin` is the field embedded in this config.
/// unsafe impl SlabItem<ConfigPool> for Config {
///     fn origin(&self) -> &PoolOrigin<ConfigPool> {
///         &self.origin
///     }
/// }
///
/// // SAFETY: `refs` is the freshly constructed counter embedded in this config.
/// unsafe impl RefCounted for Config {
///     fn ref_count(&self) -> &RefCount {
///         &self.refs
///     }
/// }
///
/// let pool = SlabPool::<ConfigPool>::new(NonZero::new(1).unwrap());
///
/// let config = pool
///     .allocate(Config {
///         origin: PoolOrigin::new(),
///         refs: RefCount::new(),
///         retries: 3,
///     })
///     .unwrap();
///
/// let alias = config.clone();
/// assert_eq!(SlabArc::ref_count(&config), 2);
/// assert_eq!(alias.retries, 3);
///
/// drop(config);
/// drop(alias); // Last one out destroys the item and recycles its cell.
/// ```
pub struct SlabArc<'pool, C: PoolConfig>
where
    C::Item: RefCounted,
{
    item: NonNull<C::Item>,
    _pool: PhantomData<&'pool SlabPool<C>>,
}

impl<'pool, C: PoolConfig> SlabArc<'pool, C>
where
    C::Item: RefCounted,
{
    /// Wraps a freshly dispensed item whose embedded count is already one.
    pub(crate) fn adopt(item: NonNull<C::Item>) -> Self {
        Self {
            item,
            _pool: PhantomData,
        }
    }

    /// The address of the shared item.
    ///
    /// An associated function so it cannot collide with a method on the item itself.
    #[must_use]
    pub fn as_ptr(this: &Self) -> *const C::Item {
        this.item.as_ptr()
    }

    /// The number of handles currently sharing the item. A snapshot, like
    /// [`Arc::strong_count`][std::sync::Arc::strong_count].
    #[must_use]
    pub fn ref_count(this: &Self) -> usize {
        (**this).ref_count().count()
    }
}

impl<C: PoolConfig> Clone for SlabArc<'_, C>
where
    C::Item: RefCounted,
{
    fn clone(&self) -> Self {
        (**self).ref_count().retain();

        Self {
            item: self.item,
            _pool: PhantomData,
        }
    }
}

impl<C: PoolConfig> Deref for SlabArc<'_, C>
where
    C::Item: RefCounted,
{
    type Target = C::Item;

    fn deref(&self) -> &C::Item {
        // SAFETY: the item stays live while any handle holds a reference on its count.
        unsafe { self.item.as_ref() }
    }
}

impl<C: PoolConfig> Drop for SlabArc<'_, C>
where
    C::Item: RefCounted,
{
    fn drop(&mut self) {
        if !(**self).ref_count().release() {
            return;
        }

        // We took the count to zero; the item is ours alone now. Locate home first, then
        // destroy, then recycle, the same teardown SlabBox performs.
        // SAFETY: the item is live and was bound to its pool when it was dispensed.
        let pool = unsafe { <C::Kind as PoolKind<C>>::origin_pool(self.item.as_ref()) };

        // SAFETY: no other handle remains; after drop_in_place the storage is dead and
        // returns to the pool that carved it. The pool outlives this handle by construction.
        unsafe {
            ptr::drop_in_place(self.item.as_ptr());
            pool.as_ref().release_cell(self.item.cast());
        }
    }
}

impl<C: PoolConfig> fmt::Debug for SlabArc<'_, C>
where
    C::Item: RefCounted + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlabArc").field(&**self).finish()
    }
}

// SAFETY: Arc-style bounds. Any handle may turn out to be the last one and destroy the item
// on its thread (Send), and handles on different threads reach the same item concurrently
// (Sync), so both require `C::Item: Send + Sync`. The final release goes through the pool's
// lock, which must be a real (`Sync`) one.
unsafe impl<C: PoolConfig> Send for SlabArc<'_, C>
where
    C::Item: RefCounted + Send + Sync,
    C::Lock: Sync,
{
}

// SAFETY: see the Send impl above.
unsafe impl<C: PoolConfig> Sync for SlabArc<'_, C>
where
    C::Item: RefCounted + Send + Sync,
    C::Lock: Sync,
{
}
