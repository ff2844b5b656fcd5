use lock_api::RawMutex;

use crate::kind::{PoolKind, SlabItem};
use crate::ownership::Ownership;

/// Default size in bytes of each slab region: 16 KiB.
pub const DEFAULT_SLAB_BYTES: usize = 16 * 1024;

/// Compile-time configuration record for a [`SlabPool`][crate::SlabPool].
///
/// A configuration is an empty marker type; everything it decides is resolved before the
/// first allocation:
///
/// - [`Item`][Self::Item]: the one type of object the pool dispenses
/// - [`Ownership`][Self::Ownership]: [`Raw`][crate::Raw], [`Unique`][crate::Unique], or
///   [`Shared`][crate::Shared] dispensed pointers
/// - [`Lock`][Self::Lock]: [`MutexLock`][crate::MutexLock] for shared pools or
///   [`NoLock`][crate::NoLock] for single-threaded pools
/// - [`Kind`][Self::Kind]: [`Instanced`][crate::Instanced] pools are runtime values, each
///   with its own quota; [`Static`][crate::Static] pools exist once per configuration type,
///   process-wide
/// - [`SLAB_BYTES`][Self::SLAB_BYTES]: the slab region size, 16 KiB unless overridden
///
/// The slab size must leave room for the slab header and at least one cell; configurations
/// that do not are rejected when the pool is built, at compile time.
///
/// # Examples
///
/// ```
/// use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, Unique};
///
/// struct Request {
///     origin: PoolOrigin<RequestPool>,
///     sequence: u64,
/// }
///
/// struct RequestPool;
///
/// impl PoolConfig for RequestPool {
///     type Item = Request;
///     type Ownership = Unique;
///     type Lock = MutexLock;
///     type Kind = Instanced;
///
///     // 4 KiB slabs instead of the 16 KiB default.
///     const SLAB_BYTES: usize = 4 * 1024;
/// }
///
/// // SAFETY: `origin` is the field embedded in this request.
/// unsafe impl SlabItem<RequestPool> for Request {
///     fn origin(&self) -> &PoolOrigin<RequestPool> {
///         &self.origin
///     }
/// }
/// ```
pub trait PoolConfig: Sized + 'static {
    /// The type of object dispensed by pools of this configuration.
    ///
    /// The item embeds its origin storage and exposes it via [`SlabItem`].
    type Item: SlabItem<Self>;

    /// The ownership semantics of dispensed pointers.
    type Ownership: Ownership<Self>;

    /// The synchronization primitive guarding the pool state.
    ///
    /// The lock is held for the whole of every acquire or release, including the host
    /// allocator call when a new slab is created. Item constructors and destructors never
    /// run under it.
    type Lock: RawMutex;

    /// Whether pools of this configuration are runtime values or a process-wide singleton.
    type Kind: PoolKind<Self>;

    /// Size in bytes of each slab region.
    const SLAB_BYTES: usize = DEFAULT_SLAB_BYTES;
}
