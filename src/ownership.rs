use std::ptr::NonNull;

use crate::arc::SlabArc;
use crate::boxed::SlabBox;
use crate::config::PoolConfig;
use crate::pool::SlabPool;
use crate::ptr::SlabPtr;
use crate::refcount::RefCounted;
use crate::sealed::Sealed;

/// The pointer type dispensed by pools of configuration `C`.
pub type PoolPtr<'pool, C> = <<C as PoolConfig>::Ownership as Ownership<C>>::Ptr<'pool>;

/// Maps an ownership marker to the pointer type a pool dispenses and to the way a freshly
/// constructed item is wrapped into it.
///
/// Choosing between the three markers costs nothing at runtime; the adapter is resolved
/// entirely at compile time. This trait is sealed; [`Raw`], [`Unique`], and [`Shared`] are
/// the only implementations.
pub trait Ownership<C: PoolConfig>: Sealed {
    /// The caller-facing pointer type, branded with the dispensing pool's lifetime so no
    /// handle can outlive its pool.
    type Ptr<'pool>
    where
        C: 'pool;

    /// Wraps a freshly constructed item into the dispensed pointer type.
    ///
    /// # Safety
    ///
    /// `item` must point at a live item that `pool` just dispensed, already bound to its
    /// origin, and not yet wrapped in any other handle.
    #[doc(hidden)]
    unsafe fn wrap<'pool>(item: NonNull<C::Item>, pool: &'pool SlabPool<C>) -> Self::Ptr<'pool>;
}

/// Dispenses [`SlabPtr`]: a copyable raw handle.
///
/// Destruction is the caller's responsibility, via [`SlabPtr::destroy`]. Losing every copy
/// of the handle without destroying it leaks the cell until the pool is dropped (and trips
/// the teardown leak check in debug builds).
#[derive(Debug)]
pub struct Raw;

impl Sealed for Raw {}

impl<C: PoolConfig> Ownership<C> for Raw {
    type Ptr<'pool>
        = SlabPtr<'pool, C>
    where
        C: 'pool;

    unsafe fn wrap<'pool>(item: NonNull<C::Item>, _pool: &'pool SlabPool<C>) -> SlabPtr<'pool, C> {
        SlabPtr::new(item)
    }
}

/// Dispenses [`SlabBox`]: a move-only owner whose drop destroys the item and recycles its
/// cell.
#[derive(Debug)]
pub struct Unique;

impl Sealed for Unique {}

impl<C: PoolConfig> Ownership<C> for Unique {
    type Ptr<'pool>
        = SlabBox<'pool, C>
    where
        C: 'pool;

    unsafe fn wrap<'pool>(item: NonNull<C::Item>, _pool: &'pool SlabPool<C>) -> SlabBox<'pool, C> {
        SlabBox::new(item)
    }
}

/// Dispenses [`SlabArc`]: a cloneable shared handle over an item-embedded reference count.
///
/// Requires the item to embed a [`RefCount`][crate::RefCount] and implement [`RefCounted`].
/// The freshly dispensed handle adopts the item at a count of one; the last handle dropped
/// destroys the item and recycles its cell.
#[derive(Debug)]
pub struct Shared;

impl Sealed for Shared {}

impl<C: PoolConfig> Ownership<C> for Shared
where
    C::Item: RefCounted,
{
    type Ptr<'pool>
        = SlabArc<'pool, C>
    where
        C: 'pool;

    unsafe fn wrap<'pool>(item: NonNull<C::Item>, _pool: &'pool SlabPool<C>) -> SlabArc<'pool, C> {
        SlabArc::adopt(item)
    }
}
