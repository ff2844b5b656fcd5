use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::config::PoolConfig;
use crate::pool::SlabPool;
use crate::sealed::Sealed;
use crate::static_pool::StaticPool;

/// Contract every pooled item type satisfies.
///
/// The item embeds its origin storage ([`PoolOrigin`] for instanced configurations, the
/// zero-sized [`NoOrigin`] for static ones) and exposes it here so that dispensed handles
/// can find their way back to the right pool when they are dropped.
///
/// # Safety
///
/// `origin` must return a reference to the origin field embedded in `*self`, and nothing
/// other than the pool may write to that field. Returning any other object's field routes
/// freed cells to the wrong pool.
///
/// # Examples
///
/// ```
/// use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, Raw, SlabItem};
///
/// struct Packet {
///     origin: PoolOrigin<PacketPool>,
///     length: u16,
/// }
///
/// struct PacketPool;
///
/// impl PoolConfig for PacketPool {
///     type Item = Packet;
///     type Ownership = Raw;
///     type Lock = MutexLock;
///     type Kind = Instanced;
/// }
///
/// // SAFETY: `origin` is the field embedded in this packet.
/// unsafe impl SlabItem<PacketPool> for Packet {
///     fn origin(&self) -> &PoolOrigin<PacketPool> {
///         &self.origin
///     }
/// }
/// ```
pub unsafe trait SlabItem<C: PoolConfig>: Sized {
    /// The origin storage embedded in this item.
    fn origin(&self) -> &<C::Kind as PoolKind<C>>::Origin;
}

/// Selects how a dispensed object finds its way home: via a per-item back-reference
/// ([`Instanced`]) or via the configuration type itself ([`Static`]).
///
/// This trait is sealed; the two kinds above are the only implementations.
pub trait PoolKind<C: PoolConfig>: Sealed {
    /// Per-item origin storage embedded in every item of this kind.
    type Origin;

    /// Records the owning pool on a freshly constructed item.
    #[doc(hidden)]
    fn bind(item: &C::Item, pool: &SlabPool<C>);

    /// Locates the pool that dispensed `item`.
    ///
    /// # Safety
    ///
    /// `item` must be live and must have been dispensed by a pool of this configuration,
    /// and that pool must still be alive.
    #[doc(hidden)]
    unsafe fn origin_pool(item: &C::Item) -> NonNull<SlabPool<C>>;
}

/// Marker for pools that are ordinary runtime values, each with its own slab quota.
///
/// Every item dispensed by an instanced pool carries a one-pointer back-reference to its
/// pool, supplied by the [`PoolOrigin`] field the item embeds.
#[derive(Debug)]
pub struct Instanced;

impl Sealed for Instanced {}

impl<C> PoolKind<C> for Instanced
where
    C: PoolConfig<Kind = Instanced>,
{
    type Origin = PoolOrigin<C>;

    fn bind(item: &C::Item, pool: &SlabPool<C>) {
        item.origin().bind(pool);
    }

    unsafe fn origin_pool(item: &C::Item) -> NonNull<SlabPool<C>> {
        // SAFETY: forwarded from the caller; the item was bound when dispensed.
        unsafe { item.origin().get() }
    }
}

/// Marker for pools that exist once per configuration type, process-wide.
///
/// Items of static pools carry no back-reference at all, because the pool is reachable
/// from the configuration type alone; the embedded [`NoOrigin`] field is zero-sized.
/// Declare the pool's storage with [`declare_static_pool!`][crate::declare_static_pool].
#[derive(Debug)]
pub struct Static;

impl Sealed for Static {}

impl<C> PoolKind<C> for Static
where
    C: StaticPool,
{
    type Origin = NoOrigin<C>;

    fn bind(_item: &C::Item, _pool: &SlabPool<C>) {}

    unsafe fn origin_pool(_item: &C::Item) -> NonNull<SlabPool<C>> {
        NonNull::from(C::pool())
    }
}

/// Back-reference from an item to the instanced pool that dispensed it.
///
/// Embed one of these in every item of an [`Instanced`] configuration and expose it via
/// [`SlabItem::origin`]. The pool writes it exactly once, immediately after constructing
/// the item; it is not otherwise mutable. It is valid for as long as the item is live,
/// because a pool always outlives its cells.
pub struct PoolOrigin<C: PoolConfig> {
    pool: AtomicPtr<SlabPool<C>>,
}

impl<C: PoolConfig> PoolOrigin<C> {
    /// Creates unbound origin storage. The pool binds it when the item is dispensed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub(crate) fn bind(&self, pool: &SlabPool<C>) {
        // Release pairs with the Acquire in get(): whoever observes the item observes its
        // origin too, even if the handle crosses threads.
        self.pool
            .store(ptr::from_ref(pool).cast_mut(), Ordering::Release);
    }

    /// # Safety
    ///
    /// The item holding this field must have been dispensed (and therefore bound) by a
    /// pool that is still alive.
    pub(crate) unsafe fn get(&self) -> NonNull<SlabPool<C>> {
        let pool = self.pool.load(Ordering::Acquire);

        debug_assert!(
            !pool.is_null(),
            "item has no originating pool (constructed outside a pool?)"
        );

        // SAFETY: the pool stored a non-null pointer to itself when it dispensed the item.
        unsafe { NonNull::new_unchecked(pool) }
    }
}

impl<C: PoolConfig> Default for PoolOrigin<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PoolConfig> fmt::Debug for PoolOrigin<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolOrigin").finish_non_exhaustive()
    }
}

/// Zero-sized stand-in for [`PoolOrigin`] in items of [`Static`] configurations.
///
/// Static pools are located by type, so the per-item back-reference is elided entirely;
/// embedding this field adds nothing to the item's size.
pub struct NoOrigin<C: PoolConfig>(PhantomData<fn() -> C>);

impl<C: PoolConfig> NoOrigin<C> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: PoolConfig> Default for NoOrigin<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PoolConfig> fmt::Debug for NoOrigin<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoOrigin").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_storage_is_one_pointer() {
        struct Anything {
            origin: PoolOrigin<AnythingPool>,
        }

        struct AnythingPool;

        impl PoolConfig for AnythingPool {
            type Item = Anything;
            type Ownership = crate::ownership::Unique;
            type Lock = crate::lock::MutexLock;
            type Kind = Instanced;
        }

        // SAFETY: `origin` is the field embedded in this item.
        unsafe impl SlabItem<AnythingPool> for Anything {
            fn origin(&self) -> &PoolOrigin<AnythingPool> {
                &self.origin
            }
        }

        assert_eq!(
            size_of::<PoolOrigin<AnythingPool>>(),
            size_of::<*mut ()>()
        );
        assert_eq!(size_of::<NoOrigin<AnythingPool>>(), 0);
    }
}
