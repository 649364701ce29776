//! The public allocator surface: construction, `allocate`/`deallocate`,
//! the quadrant split and recursive merge that back them, and the
//! leak-checking wrapper.

use std::marker::PhantomData;

use allocator_api2::alloc::{Allocator, Global};
use tracing::{debug, error, trace};

use crate::directory::{child_slot, quadrants, ChildSlot, Region, RegionDirectory};
use crate::index::FreeIndex;
use crate::point::{Extent, Point};

/// A two-dimensional rectangular space allocator over a fixed `W × H`
/// canvas. See the crate docs for the algorithm; this type is the
/// public surface over it.
///
/// Generic over the memory allocator backing the region directory's
/// internal storage, defaulting to the global allocator.
#[derive(Debug)]
pub struct Allocator2D<A: Allocator + Clone = Global> {
    extent: Extent,
    remain_area: u64,
    fragment_threshold: u64,
    directory: RegionDirectory<A>,
    free_index: FreeIndex,
}

impl Allocator2D<Global> {
    /// Creates a fresh allocator over a `extent.x × extent.y` canvas,
    /// with one idle root region covering the whole of it.
    ///
    /// Panics if either dimension is zero.
    pub fn new(extent: Extent) -> Self {
        Self::new_in(extent, Global)
    }
}

impl<A: Allocator + Clone> Allocator2D<A> {
    /// As [`Allocator2D::new`], but with an explicit memory allocator
    /// for the region directory's internal storage.
    pub fn new_in(extent: Extent, alloc: A) -> Self {
        assert!(
            extent.x > 0 && extent.y > 0,
            "canvas extent must be non-zero in both dimensions, got {extent:?}"
        );

        let mut allocator = Self {
            extent,
            remain_area: extent.area(),
            fragment_threshold: extent.area() / 8,
            directory: RegionDirectory::new_in(alloc),
            free_index: FreeIndex::new(),
        };
        allocator.add_leaf(Point::ORIGIN, Point::ORIGIN, extent);
        allocator
    }

    /// The canvas extent this allocator was constructed with.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The current sum of idle-leaf area.
    pub fn remain_area(&self) -> u64 {
        self.remain_area
    }

    fn is_fragment(&self, extent: Extent) -> bool {
        extent.area() < self.fragment_threshold
    }

    fn add_leaf(&mut self, parent: Point, src: Point, dst: Point) {
        let region = Region::leaf(parent, src, dst);
        let is_fragment = self.is_fragment(dst - src);
        self.directory.insert(region);
        self.free_index.insert(src, dst - src, is_fragment);
    }

    /// Attempts to place a `want.x × want.y` rectangle, returning the
    /// origin of a new captured region on success.
    ///
    /// Returns `None` (without side effects) if `want` has zero area,
    /// exceeds the canvas extent, exceeds the remaining idle area, or
    /// no idle region large enough exists.
    pub fn allocate(&mut self, want: Extent) -> Option<Point> {
        if want.area() == 0 {
            trace!(?want, "rejecting zero-area allocation");
            return None;
        }
        if want.beyond(self.extent) {
            trace!(?want, canvas = ?self.extent, "rejecting oversize allocation");
            return None;
        }
        if want.area() > self.remain_area {
            trace!(?want, remain_area = self.remain_area, "rejecting allocation: not enough remaining area");
            return None;
        }

        let origin = self.free_index.find_fit(want.x, want.y)?;
        self.split(origin, want);
        self.remain_area -= want.area();
        debug!(?origin, ?want, remain_area = self.remain_area, "allocated");
        Some(origin)
    }

    /// Splits the idle leaf at `origin` to carve out a `want`-sized
    /// captured corner, spawning up to three new idle leaf siblings.
    /// See spec §4.2.
    fn split(&mut self, origin: Point, want: Extent) {
        let mut region = *self
            .directory
            .get(&origin)
            .unwrap_or_else(|| unreachable!("find_fit returned an origin absent from the directory"));
        debug_assert!(region.idle, "split target must be idle");
        debug_assert!(region.is_leaf(), "only idle leaves are ever selected by find_fit");

        let split_point = region.bot_lft + want;
        debug_assert!(
            split_point.x <= region.top_rit.x && split_point.y <= region.top_rit.y,
            "requested extent must fit inside the chosen region"
        );

        let region_extent = region.extent();
        self.free_index.remove(region.bot_lft, region_extent, self.is_fragment(region_extent));

        for (src, dst) in quadrants(region.bot_lft, split_point, region.top_rit) {
            if (dst - src).area() > 0 {
                self.add_leaf(region.bot_lft, src, dst);
            }
        }

        region.split = split_point;
        region.idle = false;
        self.directory.insert(region);
        self.mark_captured(region);
    }

    /// Flips the idle flag this region occupies in its parent, if any.
    fn mark_captured(&mut self, region: Region) {
        if region.is_root() {
            return;
        }
        let parent = self
            .directory
            .get_mut(&region.parent)
            .unwrap_or_else(|| unreachable!("region's recorded parent is absent from the directory"));
        match child_slot(parent.bot_lft, region.bot_lft) {
            ChildSlot::TopLeft => parent.idle_top_lft = false,
            ChildSlot::TopRight => parent.idle_top_rit = false,
            ChildSlot::BottomRight => parent.idle_bot_rit = false,
        }
    }

    /// Frees the region at `origin`, returning `false` if it is not a
    /// current directory key (never allocated, or already freed).
    pub fn deallocate(&mut self, origin: Point) -> bool {
        let Some(region) = self.directory.get(&origin).copied() else {
            trace!(?origin, "deallocate of unknown origin");
            return false;
        };
        // A region whose own slot is already idle is not a live
        // allocation, even though its directory entry persists (merges
        // never remove the merged-into region itself, only its three
        // children). Freeing it again must be a no-op failure, not a
        // second reclaim of its area.
        if region.idle {
            trace!(?origin, "deallocate of an already-idle region");
            return false;
        }

        let freed = region.captured_extent().area();
        self.mark_idle(origin);
        self.remain_area += freed;
        debug!(?origin, freed, remain_area = self.remain_area, "deallocated");
        true
    }

    /// Marks the region at `origin` idle and merges it upward as far as
    /// possible, re-indexing each region that folds back into a leaf
    /// along the way (a later merge in the same walk may remove it
    /// again, via `collapse_children`, if it gets folded further).
    /// See spec §4.3.
    fn mark_idle(&mut self, origin: Point) {
        let mut region = self
            .directory
            .get(&origin)
            .copied()
            .unwrap_or_else(|| unreachable!("mark_idle called on an absent origin"));
        debug_assert!(!region.idle, "mark_idle must only be called on a captured region");
        region.idle = true;
        self.directory.insert(region);

        let mut current = region;
        loop {
            if !(current.idle && current.is_split_idle()) {
                break;
            }

            self.collapse_children(&mut current);
            self.directory.insert(current);
            // `current` just folded back into a leaf. Index it now: if a
            // further merge at the parent level subsumes it, that merge's
            // own `collapse_children` call removes it again, the same way
            // a region that never merges further stays indexed below.
            self.free_index.insert(current.bot_lft, current.extent(), self.is_fragment(current.extent()));

            if current.is_root() {
                return;
            }

            let parent_origin = current.parent;
            {
                let parent = self
                    .directory
                    .get_mut(&parent_origin)
                    .unwrap_or_else(|| unreachable!("merged region's recorded parent is absent"));
                match child_slot(parent.bot_lft, current.bot_lft) {
                    ChildSlot::TopLeft => parent.idle_top_lft = true,
                    ChildSlot::TopRight => parent.idle_top_rit = true,
                    ChildSlot::BottomRight => parent.idle_bot_rit = true,
                }
            }
            current = self
                .directory
                .get(&parent_origin)
                .copied()
                .unwrap_or_else(|| unreachable!("parent region vanished mid-merge"));
        }
    }

    /// Tears down `region`'s three children (deleting them from the
    /// directory and free index) and resets `region` back to a leaf.
    /// Called only when `region` and all three of its children are
    /// idle.
    fn collapse_children(&mut self, region: &mut Region) {
        for (src, dst) in quadrants(region.bot_lft, region.split, region.top_rit) {
            if (dst - src).area() > 0 {
                let child = self.directory.remove(src);
                self.free_index.remove(child.bot_lft, child.extent(), self.is_fragment(child.extent()));
            }
        }
        region.split = region.top_rit;
    }
}

/// Configurable response to a [`CheckedAllocator2D`] detecting a leak at
/// drop time.
pub trait LeakAction {
    /// Called with the canvas area and the (non-matching) remaining
    /// area when a checked allocator is dropped with outstanding
    /// allocations.
    fn on_leak(extent_area: u64, remain_area: u64);
}

/// Default [`LeakAction`]: logs and panics.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicOnLeak;

impl LeakAction for PanicOnLeak {
    fn on_leak(extent_area: u64, remain_area: u64) {
        error!(extent_area, remain_area, "Allocator2D leaked");
        panic!("Allocator2D leaked: {remain_area} of {extent_area} units still marked allocated");
    }
}

/// Wraps [`Allocator2D`] and asserts, at drop time, that
/// `remain_area() == extent area` — i.e. that every allocation made
/// through it was freed. The leak response is pluggable via `L`.
#[derive(Debug)]
pub struct CheckedAllocator2D<A: Allocator + Clone = Global, L: LeakAction = PanicOnLeak> {
    inner: Allocator2D<A>,
    _leak_action: PhantomData<L>,
}

impl CheckedAllocator2D<Global, PanicOnLeak> {
    pub fn new(extent: Extent) -> Self {
        Self::new_in(extent, Global)
    }
}

impl<A: Allocator + Clone, L: LeakAction> CheckedAllocator2D<A, L> {
    pub fn new_in(extent: Extent, alloc: A) -> Self {
        Self {
            inner: Allocator2D::new_in(extent, alloc),
            _leak_action: PhantomData,
        }
    }

    pub fn allocate(&mut self, want: Extent) -> Option<Point> {
        self.inner.allocate(want)
    }

    pub fn deallocate(&mut self, origin: Point) -> bool {
        self.inner.deallocate(origin)
    }

    pub fn extent(&self) -> Extent {
        self.inner.extent()
    }

    pub fn remain_area(&self) -> u64 {
        self.inner.remain_area()
    }
}

impl<A: Allocator + Clone, L: LeakAction> Drop for CheckedAllocator2D<A, L> {
    fn drop(&mut self) {
        let extent_area = self.inner.extent().area();
        let remain_area = self.inner.remain_area();
        if remain_area != extent_area {
            L::on_leak(extent_area, remain_area);
        }
    }
}
