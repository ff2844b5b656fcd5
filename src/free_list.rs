use std::ptr::NonNull;

/// The node written into a cell while it sits on the free list.
///
/// Cells are sized and aligned to hold one of these or one item, whichever is larger, so a
/// freed cell can always be reinterpreted as a node in place.
pub(crate) struct FreeCell {
    next: Option<NonNull<FreeCell>>,
}

/// Intrusive LIFO list of freed cells.
///
/// The list owns no storage of its own: each node lives inside the cell it represents, and
/// the cells live inside slab regions owned by the pool. The list is therefore deliberately
/// not unlinked at pool teardown; its nodes die with the slabs.
pub(crate) struct FreeList {
    head: Option<NonNull<FreeCell>>,

    /// Count of cells currently on the list, maintained for the teardown leak check.
    #[cfg(debug_assertions)]
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self {
            head: None,
            #[cfg(debug_assertions)]
            len: 0,
        }
    }

    /// Writes a free-list node into `cell` and links it at the head.
    ///
    /// # Safety
    ///
    /// `cell` must be dead storage (no live object), sized and aligned for a [`FreeCell`],
    /// valid until the list or the owning slab is torn down, and not already on the list.
    pub(crate) unsafe fn push(&mut self, cell: NonNull<u8>) {
        let node = cell.cast::<FreeCell>();

        // SAFETY: per the caller, the cell is dead storage with room for a node.
        unsafe { node.as_ptr().write(FreeCell { next: self.head }) };

        self.head = Some(node);

        #[cfg(debug_assertions)]
        {
            self.len += 1;
        }
    }

    /// Unlinks and returns the most recently pushed cell, if any.
    ///
    /// The node's bytes are left in place; the caller will overwrite them with an object.
    pub(crate) fn pop(&mut self) -> Option<NonNull<u8>> {
        let node = self.head?;

        // SAFETY: nodes reachable from the head were written by push() and their cells are
        // still valid.
        self.head = unsafe { (*node.as_ptr()).next };

        #[cfg(debug_assertions)]
        {
            self.len -= 1;
        }

        Some(node.cast::<u8>())
    }

    /// Count of cells currently on the list.
    #[cfg(debug_assertions)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Walks the list and verifies it against the tracked length.
    ///
    /// Catches the classic misuse where a cell is freed twice: the second push links the
    /// node to itself or an earlier copy, which shows up here as a cycle (the walk exceeds
    /// the tracked length).
    #[cfg(debug_assertions)]
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub(crate) fn integrity_check(&self) {
        let mut walked = 0;
        let mut cursor = self.head;

        while let Some(node) = cursor {
            walked += 1;
            assert!(
                walked <= self.len,
                "free list walk exceeded its tracked length of {} (cell freed twice?)",
                self.len
            );

            // SAFETY: nodes reachable from the head were written by push() and their cells
            // are still valid.
            cursor = unsafe { (*node.as_ptr()).next };
        }

        assert_eq!(
            walked, self.len,
            "free list walk ended short of its tracked length"
        );
    }
}
