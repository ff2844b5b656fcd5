use std::num::NonZero;

use crate::config::PoolConfig;
use crate::kind::Static;
use crate::ownership::PoolPtr;
use crate::pool::SlabPool;

/// A process-wide pool, one per configuration type.
///
/// Static pools trade flexibility for footprint: exactly one pool exists for the
/// configuration, so items need no per-object back-reference (they embed the zero-sized
/// [`NoOrigin`][crate::NoOrigin] instead of a [`PoolOrigin`][crate::PoolOrigin]), and
/// allocation is a type-level operation; callers never hold a pool value. Everything else
/// behaves exactly like an instanced pool.
///
/// Do not implement this trait by hand; declare the pool's storage once with
/// [`declare_static_pool!`][crate::declare_static_pool], which implements it for you.
///
/// Because the storage is a process-wide singleton it must be `Sync`, which is why a static
/// pool requires a real lock kind: a [`NoLock`][crate::NoLock] static pool does not compile.
pub trait StaticPool: PoolConfig<Kind = Static> {
    /// The process-wide pool for this configuration.
    fn pool() -> &'static SlabPool<Self>;

    /// Type-level counterpart of [`SlabPool::allocate`].
    fn allocate(value: Self::Item) -> Option<PoolPtr<'static, Self>> {
        Self::pool().allocate(value)
    }

    /// Type-level counterpart of [`SlabPool::allocate_with`].
    fn allocate_with<F>(make: F) -> Option<PoolPtr<'static, Self>>
    where
        F: FnOnce() -> Self::Item,
    {
        Self::pool().allocate_with(make)
    }

    /// Type-level counterpart of [`SlabPool::max_slabs`].
    fn max_slabs() -> NonZero<usize> {
        Self::pool().max_slabs()
    }
}

/// Declares the storage for a [`StaticPool`] configuration.
///
/// The pool is created lazily, on first use, with the given slab ceiling and (optionally)
/// pre-allocation, and lives for the rest of the process.
///
/// # Examples
///
/// ```
/// use slab_pool::{
///     MutexLock, NoOrigin, PoolConfig, SlabItem, Static, StaticPool, Unique,
///     declare_static_pool,
/// };
///
/// struct Timer {
///     origin: NoOrigin<TimerPool>,
///     deadline: u64,
/// }
///
/// struct TimerPool;
///
/// impl PoolConfig for TimerPool {
///     type Item = Timer;
///     type Ownership = Unique;
///     type Lock = MutexLock;
///     type Kind = Static;
/// }
///
/// // SAFETY: `origin` is the field embedded in this timer.
/// unsafe impl SlabItem<TimerPool> for Timer {
///     fn origin(&self) -> &NoOrigin<TimerPool> {
///         &self.origin
///     }
/// }
///
/// declare_static_pool!(TimerPool, max_slabs = 8);
///
/// let timer = TimerPool::allocate(Timer {
///     origin: NoOrigin::new(),
///     deadline: 123,
/// })
/// .unwrap();
///
/// assert_eq!(timer.deadline, 123);
/// ```
#[macro_export]
macro_rules! declare_static_pool {
    ($config:ty, max_slabs = $max:expr) => {
        $crate::declare_static_pool!($config, max_slabs = $max, preallocate = false);
    };

    ($config:ty, max_slabs = $max:expr, preallocate = $preallocate:expr) => {
        impl $crate::StaticPool for $config {
            fn pool() -> &'static $crate::SlabPool<$config> {
                static POOL: ::std::sync::LazyLock<$crate::SlabPool<$config>> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::SlabPool::<$config>::builder()
                            .max_slabs(
                                ::std::num::NonZero::new($max)
                                    .expect("max_slabs must be non-zero"),
                            )
                            .preallocate($preallocate)
                            .build()
                    });

                &POOL
            }
        }
    };
}
