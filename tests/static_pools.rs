//! Static pools: one process-wide pool per configuration type, no per-item
//! back-reference, type-level allocation.

use slab_pool::{
    MutexLock, NoOrigin, PoolConfig, RefCount, RefCounted, Shared, SlabArc, SlabBox, SlabItem,
    SlabPool, Static, StaticPool, Unique, declare_static_pool,
};

struct Event {
    origin: NoOrigin<EventPool>,
    code: u32,
}

impl Event {
    fn new(code: u32) -> Self {
        Self {
            origin: NoOrigin::new(),
            code,
        }
    }
}

struct EventPool;

impl PoolConfig for EventPool {
    type Item = Event;
    type Ownership = Unique;
    type Lock = MutexLock;
    type Kind = Static;

    const SLAB_BYTES: usize = 512;
}

// SAFETY: `origin` is the field embedded in this event.
unsafe impl SlabItem<EventPool> for Event {
    fn origin(&self) -> &NoOrigin<EventPool> {
        &self.origin
    }
}

declare_static_pool!(EventPool, max_slabs = 2);

#[test]
fn items_of_static_pools_carry_no_back_reference() {
    // The origin field is zero-sized; the item is just its payload (padded).
    assert_eq!(size_of::<Event>(), size_of::<u32>());
}

#[test]
fn type_level_allocation_round_trips() {
    assert_eq!(EventPool::max_slabs().get(), 2);

    let event = EventPool::allocate(Event::new(42)).unwrap();
    assert_eq!(event.code, 42);

    let address = SlabBox::as_ptr(&event);
    drop(event);

    // The cell routed back to the one process-wide pool.
    let recycled = EventPool::allocate_with(|| Event::new(43)).unwrap();
    assert_eq!(SlabBox::as_ptr(&recycled), address);
    assert_eq!(recycled.code, 43);
}

#[test]
fn preallocated_static_pool_starts_with_its_slab() {
    struct Sample {
        origin: NoOrigin<SamplePool>,
        _value: u64,
    }

    struct SamplePool;

    impl PoolConfig for SamplePool {
        type Item = Sample;
        type Ownership = Unique;
        type Lock = MutexLock;
        type Kind = Static;

        const SLAB_BYTES: usize = 512;
    }

    // SAFETY: `origin` is the field embedded in this sample.
    unsafe impl SlabItem<SamplePool> for Sample {
        fn origin(&self) -> &NoOrigin<SamplePool> {
            &self.origin
        }
    }

    declare_static_pool!(SamplePool, max_slabs = 1, preallocate = true);

    assert_eq!(SamplePool::pool().slab_count(), 1);

    // With one pre-created slab, the full capacity is dispensable without ever touching
    // the host allocator again.
    let mut batch = Vec::new();
    for value in 0..SlabPool::<SamplePool>::SLAB_CAPACITY {
        batch.push(
            SamplePool::allocate(Sample {
                origin: NoOrigin::new(),
                _value: value as u64,
            })
            .unwrap(),
        );
    }

    assert!(SamplePool::allocate_with(|| Sample {
        origin: NoOrigin::new(),
        _value: 0,
    })
    .is_none());
    assert_eq!(SamplePool::pool().slab_count(), 1);

    drop(batch);
}

#[test]
fn shared_handles_from_a_static_pool() {
    struct Topic {
        origin: NoOrigin<TopicPool>,
        refs: RefCount,
        subscribers: u32,
    }

    struct TopicPool;

    impl PoolConfig for TopicPool {
        type Item = Topic;
        type Ownership = Shared;
        type Lock = MutexLock;
        type Kind = Static;

        const SLAB_BYTES: usize = 512;
    }

    // SAFETY: `origin` is the field embedded in this topic.
    unsafe impl SlabItem<TopicPool> for Topic {
        fn origin(&self) -> &NoOrigin<TopicPool> {
            &self.origin
        }
    }

    // SAFETY: `refs` is the freshly constructed counter embedded in this topic.
    unsafe impl RefCounted for Topic {
        fn ref_count(&self) -> &RefCount {
            &self.refs
        }
    }

    declare_static_pool!(TopicPool, max_slabs = 1);

    let topic = TopicPool::allocate(Topic {
        origin: NoOrigin::new(),
        refs: RefCount::new(),
        subscribers: 9,
    })
    .unwrap();

    let alias = topic.clone();
    assert_eq!(SlabArc::ref_count(&topic), 2);
    assert_eq!(alias.subscribers, 9);

    drop(topic);
    drop(alias);
}
