use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::config::PoolConfig;
use crate::kind::PoolKind;
use crate::pool::SlabPool;

/// Move-only owner of a pool-dispensed object.
///
/// Dropping the box runs the object's destructor and returns its cell to the free list of
/// the pool that dispensed it. The object finds its own way home, so the box is just one
/// pointer wide. The `'pool` lifetime ties the box to its pool: the borrow checker will not
/// let the pool drop while any box from it is alive.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, SlabPool, Unique};
///
/// struct Job {
///     origin: PoolOrigin<JobPool>,
///     priority: u8,
/// }
///
/// struct JobPool;
///
/// impl PoolConfig for JobPool {
///     type Item = Job;
///     type Ownership = Unique;
///     type Lock = MutexLock;
///     type Kind = Instanced;
/// }
///
/// // SAFETY: `origin` is the field embedded in this job.
/// unsafe impl SlabItem<JobPool> for Job {
///     fn origin(&self) -> &PoolOrigin<JobPool> {
///         &self.origin
///     }
/// }
///
/// let pool = SlabPool::<JobPool>::new(NonZero::new(1).unwrap());
///
/// let mut job = pool
///     .allocate(Job {
///         origin: PoolOrigin::new(),
///         priority: 3,
///     })
///     .unwrap();
///
/// job.priority = 5;
/// assert_eq!(job.priority, 5);
/// // End of scope: the job is destroyed and its cell recycled.
/// ```
pub struct SlabBox<'pool, C: PoolConfig> {
    item: NonNull<C::Item>,
    _pool: PhantomData<&'pool SlabPool<C>>,
}

impl<'pool, C: PoolConfig> SlabBox<'pool, C> {
    pub(crate) fn new(item: NonNull<C::Item>) -> Self {
        Self {
            item,
            _pool: PhantomData,
        }
    }

    /// The address of the boxed item.
    ///
    /// An associated function so it cannot collide with a method on the item itself.
    #[must_use]
    pub fn as_ptr(this: &Self) -> *const C::Item {
        this.item.as_ptr()
    }
}

impl<C: PoolConfig> Deref for SlabBox<'_, C> {
    type Target = C::Item;

    fn deref(&self) -> &C::Item {
        // SAFETY: the box owns the item exclusively until it drops.
        unsafe { self.item.as_ref() }
    }
}

impl<C: PoolConfig> DerefMut for SlabBox<'_, C> {
    fn deref_mut(&mut self) -> &mut C::Item {
        // SAFETY: the box owns the item exclusively until it drops.
        unsafe { self.item.as_mut() }
    }
}

impl<C: PoolConfig> AsRef<C::Item> for SlabBox<'_, C> {
    fn as_ref(&self) -> &C::Item {
        self
    }
}

impl<C: PoolConfig> AsMut<C::Item> for SlabBox<'_, C> {
    fn as_mut(&mut self) -> &mut C::Item {
        self
    }
}

impl<C: PoolConfig> Drop for SlabBox<'_, C> {
    fn drop(&mut self) {
        // Locate home first; the origin field must not be read after the destructor has
        // conceptually ended the item's lifetime.
        // SAFETY: the item is live and was bound to its pool when it was dispensed.
        let pool = unsafe { <C::Kind as PoolKind<C>>::origin_pool(self.item.as_ref()) };

        // SAFETY: we own the item; after drop_in_place its storage is dead and returns to
        // the pool that carved it. The pool outlives this handle by construction.
        unsafe {
            ptr::drop_in_place(self.item.as_ptr());
            pool.as_ref().release_cell(self.item.cast());
        }
    }
}

impl<C: PoolConfig> fmt::Debug for SlabBox<'_, C>
where
    C::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlabBox").field(&**self).finish()
    }
}

// SAFETY: the box is the sole owner of the item, so sending it sends the item; dropping it
// on another thread releases the cell through the pool's lock, which requires a real
// (`Sync`) lock kind.
unsafe impl<C: PoolConfig> Send for SlabBox<'_, C>
where
    C::Item: Send,
    C::Lock: Sync,
{
}

// SAFETY: a shared box only hands out `&C::Item`.
unsafe impl<C: PoolConfig> Sync for SlabBox<'_, C> where C::Item: Sync {}
