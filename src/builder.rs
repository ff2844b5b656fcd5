use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::config::PoolConfig;
use crate::layout::SlabLayout;
use crate::pool::SlabPool;

/// Builder for an instanced [`SlabPool`].
///
/// The slab ceiling is mandatory; pre-allocation is optional.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, SlabPool, Unique};
///
/// struct Frame {
///     origin: PoolOrigin<FramePool>,
///     sequence: u64,
/// }
///
/// struct FramePool;
///
/// impl PoolConfig for FramePool {
///     type Item = Frame;
///     type Ownership = Unique;
///     type Lock = MutexLock;
///     type Kind = Instanced;
/// }
///
/// // SAFETY: `origin` is the field embedded in this frame.
/// unsafe impl SlabItem<FramePool> for Frame {
///     fn origin(&self) -> &PoolOrigin<FramePool> {
///         &self.origin
///     }
/// }
///
/// let pool = SlabPool::<FramePool>::builder()
///     .max_slabs(NonZero::new(1).unwrap())
///     .preallocate(true)
///     .build();
///
/// // The first slab already exists, so no allocation ever touches the host
/// // allocator: with a ceiling of one slab, every operation is O(1).
/// assert_eq!(pool.slab_count(), 1);
/// ```
#[must_use]
pub struct SlabPoolBuilder<C: PoolConfig> {
    max_slabs: Option<NonZero<usize>>,
    preallocate: bool,
    _config: PhantomData<fn() -> C>,
}

impl<C: PoolConfig> SlabPoolBuilder<C> {
    pub(crate) fn new() -> Self {
        Self {
            max_slabs: None,
            preallocate: false,
            _config: PhantomData,
        }
    }

    /// Sets the maximum number of slabs the pool may ever own.
    ///
    /// Total memory is bounded by `max_slabs * C::SLAB_BYTES`.
    pub fn max_slabs(mut self, max_slabs: NonZero<usize>) -> Self {
        self.max_slabs = Some(max_slabs);
        self
    }

    /// Whether to create the first slab during construction (default: `false`).
    ///
    /// Combined with a ceiling of one slab, pre-allocation guarantees that no later
    /// allocation touches the host allocator. A pre-allocation that the host refuses is
    /// ignored; the pool simply starts empty.
    pub fn preallocate(mut self, preallocate: bool) -> Self {
        self.preallocate = preallocate;
        self
    }

    /// Builds the pool.
    ///
    /// # Panics
    ///
    /// Panics if [`max_slabs`](Self::max_slabs) was never set.
    #[must_use]
    pub fn build(self) -> SlabPool<C> {
        const {
            assert!(
                SlabLayout::<C>::CAPACITY >= 1,
                "PoolConfig::SLAB_BYTES is too small to hold the slab header and one cell"
            );
        }

        let max_slabs = self
            .max_slabs
            .expect("max_slabs must be set before calling build()");

        let pool = SlabPool::new_inner(max_slabs);

        if self.preallocate {
            // Carving one cell forces the first slab into existence; the cell itself goes
            // straight onto the free list.
            if let Some(cell) = pool.acquire_cell() {
                pool.release_cell(cell);
            }
        }

        pool
    }
}

impl<C: PoolConfig> fmt::Debug for SlabPoolBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabPoolBuilder")
            .field("max_slabs", &self.max_slabs)
            .field("preallocate", &self.preallocate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::kind::{Instanced, PoolOrigin, SlabItem};
    use crate::lock::MutexLock;
    use crate::ownership::Unique;

    struct Token {
        origin: PoolOrigin<TokenPool>,
        _value: u64,
    }

    struct TokenPool;

    impl PoolConfig for TokenPool {
        type Item = Token;
        type Ownership = Unique;
        type Lock = MutexLock;
        type Kind = Instanced;
    }

    // SAFETY: `origin` is the field embedded in this token.
    unsafe impl SlabItem<TokenPool> for Token {
        fn origin(&self) -> &PoolOrigin<TokenPool> {
            &self.origin
        }
    }

    #[test]
    fn defaults_create_no_slab() {
        let pool = SlabPool::<TokenPool>::builder().max_slabs(nz!(4)).build();

        assert_eq!(pool.slab_count(), 0);
        assert_eq!(pool.max_slabs(), nz!(4));
    }

    #[test]
    fn preallocate_creates_the_first_slab() {
        let pool = SlabPool::<TokenPool>::builder()
            .max_slabs(nz!(4))
            .preallocate(true)
            .build();

        assert_eq!(pool.slab_count(), 1);
    }

    #[test]
    #[should_panic]
    fn build_without_max_slabs_panics() {
        drop(SlabPool::<TokenPool>::builder().build());
    }
}
