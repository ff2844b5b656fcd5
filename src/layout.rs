use std::alloc::Layout;
use std::marker::PhantomData;

use crate::config::PoolConfig;
use crate::free_list::FreeCell;
use crate::slab::SlabHeader;

/// Precalculates the factors of a slab region's layout for one configuration.
///
/// A slab region is `C::SLAB_BYTES` long and starts with a [`SlabHeader`], followed by an
/// array of cells. Every cell is big enough and aligned enough to hold either one `C::Item`
/// or one [`FreeCell`], whichever is larger, because the same storage alternates between the
/// two over its lifetime.
///
/// Everything here is a compile-time constant; a configuration whose slab cannot hold at
/// least one cell fails to build.
pub(crate) struct SlabLayout<C: PoolConfig>(PhantomData<fn() -> C>);

impl<C: PoolConfig> SlabLayout<C> {
    /// Alignment of a single cell.
    pub(crate) const CELL_ALIGN: usize = max(align_of::<C::Item>(), align_of::<FreeCell>());

    /// Size of a single cell, padded so consecutive cells stay aligned.
    pub(crate) const CELL_SIZE: usize = round_up(
        max(size_of::<C::Item>(), size_of::<FreeCell>()),
        Self::CELL_ALIGN,
    );

    /// Byte offset from the start of the region to the first cell.
    pub(crate) const CELLS_OFFSET: usize = round_up(size_of::<SlabHeader>(), Self::CELL_ALIGN);

    /// Number of cells each slab yields. Zero means the configuration is invalid.
    pub(crate) const CAPACITY: usize =
        C::SLAB_BYTES.saturating_sub(Self::CELLS_OFFSET) / Self::CELL_SIZE;

    /// Alignment of the whole region: the header and every cell must land aligned.
    pub(crate) const REGION_ALIGN: usize = max(Self::CELL_ALIGN, align_of::<SlabHeader>());

    /// The layout handed to the host allocator for one slab region.
    #[must_use]
    pub(crate) fn region_layout() -> Layout {
        Layout::from_size_align(C::SLAB_BYTES, Self::REGION_ALIGN)
            .expect("slab size and alignment always form a representable layout")
    }
}

const fn max(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

/// Rounds `value` up to the next multiple of `align`, which must be a power of two.
const fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
