//! A typed slab allocator: fixed-class object pools with O(1) recycling.
//!
//! This crate provides [`SlabPool`], an object pool for a single configured type. The pool
//! allocates large, uniformly aligned memory regions (slabs, 16 KiB by default), carves them
//! into cells just big enough for one object, and dispenses cells as constructed objects.
//! Freed cells are recycled through an intrusive free list stored inside the cells themselves,
//! so allocation and release are O(1) apart from the occasional slab creation.
//!
//! # Key Features
//!
//! - **One type per pool**: the object type, slab size, lock kind, and dispensed pointer kind
//!   are all fixed at compile time through a [`PoolConfig`] implementation
//! - **Three ownership modes**: copyable raw handles ([`SlabPtr`]), move-only owners
//!   ([`SlabBox`]), and reference-counted shared handles ([`SlabArc`])
//! - **Bounded footprint**: each pool has a slab ceiling; memory use never exceeds
//!   `max_slabs * SLAB_BYTES` and exhaustion is reported as `None`, never a panic
//! - **Instanced or static pools**: pools can be ordinary values, each with its own quota,
//!   or process-wide singletons declared once per type with [`declare_static_pool!`]
//! - **Lock choice**: a real mutex for shared pools or a no-op lock ([`NoLock`]) for
//!   single-threaded use, selected at compile time with no other semantic change
//! - **Automatic homing**: dropping an owning or last shared handle destroys the object and
//!   returns its cell to the pool it came from, even across pools of the same configuration
//!
//! # Choosing a configuration
//!
//! A configuration is an empty type implementing [`PoolConfig`]. The pooled type embeds a
//! [`PoolOrigin`] field (instanced pools) or a zero-sized [`NoOrigin`] field (static pools)
//! and implements [`SlabItem`] to expose it. Shared-handle pools additionally embed a
//! [`RefCount`] and implement [`RefCounted`].
//!
//! # Examples
//!
//! ```
//! use std::num::NonZero;
//!
//! use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, SlabPool, Unique};
//!
//! struct Session {
//!     origin: PoolOrigin<SessionPool>,
//!     id: u32,
//! }
//!
//! struct SessionPool;
//!
//! impl PoolConfig for SessionPool {
//!     type Item = Session;
//!     type Ownership = Unique;
//!     type Lock = MutexLock;
//!     type Kind = Instanced;
//! }
//!
//! // SAFETY: `origin` is the field embedded in this session.
//! unsafe impl SlabItem<SessionPool> for Session {
//!     fn origin(&self) -> &PoolOrigin<SessionPool> {
//!         &self.origin
//!     }
//! }
//!
//! let pool = SlabPool::<SessionPool>::new(NonZero::new(4).unwrap());
//!
//! let session = pool
//!     .allocate(Session {
//!         origin: PoolOrigin::new(),
//!         id: 7,
//!     })
//!     .unwrap();
//! assert_eq!(session.id, 7);
//!
//! // Dropping the handle destroys the session and recycles its cell.
//! drop(session);
//! ```
//!
//! # Memory behavior
//!
//! Slabs are created on demand and owned exclusively by their pool. A slab is never returned
//! to the host allocator before the pool itself is dropped; capacity left stranded in a
//! non-active slab comes back into circulation only through the free list. Freed cells are
//! reused in LIFO order.

mod arc;
mod boxed;
mod builder;
mod config;
mod free_list;
mod kind;
mod layout;
mod lock;
mod ownership;
mod pool;
mod ptr;
mod refcount;
mod slab;
mod static_pool;

pub use arc::SlabArc;
pub use boxed::SlabBox;
pub use builder::SlabPoolBuilder;
pub use config::{DEFAULT_SLAB_BYTES, PoolConfig};
pub use kind::{Instanced, NoOrigin, PoolKind, PoolOrigin, SlabItem, Static};
pub use lock::{MutexLock, NoLock};
pub use ownership::{Ownership, PoolPtr, Raw, Shared, Unique};
pub use pool::SlabPool;
pub use ptr::SlabPtr;
pub use refcount::{RefCount, RefCounted};
pub use static_pool::StaticPool;

mod sealed {
    pub trait Sealed {}
}
