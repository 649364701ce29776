//! The region directory: a map from a region's lower-left origin to its
//! split-point record, plus the bookkeeping that identifies which of a
//! parent's three spawned quadrants a given child occupies.

use allocator_api2::alloc::{Allocator, Global};
use hashbrown::HashMap;

use crate::point::Point;

/// An axis-aligned rectangle inside the canvas, idle or captured,
/// identified by its lower-left origin (`bot_lft`, also the directory
/// key that addresses it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub bot_lft: Point,
    pub top_rit: Point,
    /// Origin of the region this one was split out of. Equal to
    /// `bot_lft` iff this region is the root (the whole canvas).
    pub parent: Point,
    /// The split point inside this region. Equal to `top_rit` iff the
    /// region is a leaf (not yet subdivided).
    pub split: Point,
    /// Whether this region itself (its captured `[bot_lft, split]`
    /// sub-rectangle) is currently free.
    pub idle: bool,
    pub idle_top_lft: bool,
    pub idle_top_rit: bool,
    pub idle_bot_rit: bool,
}

impl Region {
    /// A freshly carved, unsplit, idle region.
    pub fn leaf(parent: Point, bot_lft: Point, top_rit: Point) -> Self {
        Self {
            bot_lft,
            top_rit,
            parent,
            split: top_rit,
            idle: true,
            idle_top_lft: true,
            idle_top_rit: true,
            idle_bot_rit: true,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.split == self.top_rit
    }

    pub fn is_root(&self) -> bool {
        self.parent == self.bot_lft
    }

    /// True iff every one of the three children spawned by this
    /// region's split is idle, making the whole region a merge
    /// candidate once `idle` is also true.
    pub fn is_split_idle(&self) -> bool {
        self.idle_top_lft && self.idle_top_rit && self.idle_bot_rit
    }

    /// Full extent of the region, including any subdivided children.
    pub fn extent(&self) -> Point {
        self.top_rit - self.bot_lft
    }

    /// Extent of just the captured `[bot_lft, split]` sub-rectangle.
    pub fn captured_extent(&self) -> Point {
        self.split - self.bot_lft
    }
}

/// Which of a parent's three spawned quadrants a child occupies, decided
/// purely by coordinate coincidence between the child's origin and the
/// parent's origin (spec §4.3's child-identification rule). The
/// bottom-left quadrant has no child region: it is the parent's own
/// captured sub-rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    TopLeft,
    TopRight,
    BottomRight,
}

/// Identifies which quadrant of `parent_origin` the region rooted at
/// `child_origin` occupies.
pub fn child_slot(parent_origin: Point, child_origin: Point) -> ChildSlot {
    if parent_origin.x == child_origin.x {
        ChildSlot::TopLeft
    } else if parent_origin.y == child_origin.y {
        ChildSlot::BottomRight
    } else {
        ChildSlot::TopRight
    }
}

/// Given a region's `bot_lft`, `split` and `top_rit`, the three
/// quadrants carved out by the split: bottom-right, top-right,
/// top-left, in that order. Shared by both the split-on-allocate path
/// (which creates these as new leaves) and the merge-on-deallocate path
/// (which tears them back down).
pub fn quadrants(bot_lft: Point, split: Point, top_rit: Point) -> [(Point, Point); 3] {
    let bottom_right = (Point::new(split.x, bot_lft.y), Point::new(top_rit.x, split.y));
    let top_right = (split, top_rit);
    let top_left = (Point::new(bot_lft.x, split.y), Point::new(split.x, top_rit.y));
    [bottom_right, top_right, top_left]
}

/// The origin-to-region-record map. Generic over the memory allocator
/// used for its backing storage; the allocator instance is owned and
/// must outlive the map.
#[derive(Debug)]
pub struct RegionDirectory<A: Allocator + Clone = Global> {
    regions: HashMap<Point, Region, hashbrown::DefaultHashBuilder, A>,
}

impl RegionDirectory<Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<A: Allocator + Clone> RegionDirectory<A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            regions: HashMap::with_hasher_in(Default::default(), alloc),
        }
    }

    pub fn get(&self, origin: &Point) -> Option<&Region> {
        self.regions.get(origin)
    }

    pub fn get_mut(&mut self, origin: &Point) -> Option<&mut Region> {
        self.regions.get_mut(origin)
    }

    /// Inserts or overwrites the record for `region.bot_lft`.
    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.bot_lft, region);
    }

    /// Removes the record at `origin`. Removing an origin that is not
    /// present is a programming error: the caller is expected to have
    /// checked the directory first, or to know the key exists because
    /// it was only just created.
    pub fn remove(&mut self, origin: Point) -> Region {
        self.regions
            .remove(&origin)
            .unwrap_or_else(|| unreachable!("directory missing region at {origin:?}"))
    }

    pub fn contains(&self, origin: &Point) -> bool {
        self.regions.contains_key(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_slot_identifies_each_quadrant() {
        let parent = Point::new(10, 10);
        // top-left child shares the parent's x coordinate.
        assert_eq!(child_slot(parent, Point::new(10, 20)), ChildSlot::TopLeft);
        // bottom-right child shares the parent's y coordinate.
        assert_eq!(child_slot(parent, Point::new(20, 10)), ChildSlot::BottomRight);
        // top-right child shares neither.
        assert_eq!(child_slot(parent, Point::new(20, 20)), ChildSlot::TopRight);
    }

    #[test]
    fn quadrants_tile_the_region_minus_the_captured_corner() {
        let bot_lft = Point::new(0, 0);
        let split = Point::new(4, 6);
        let top_rit = Point::new(10, 10);
        let [br, tr, tl] = quadrants(bot_lft, split, top_rit);
        assert_eq!(br, (Point::new(4, 0), Point::new(10, 6)));
        assert_eq!(tr, (Point::new(4, 6), Point::new(10, 10)));
        assert_eq!(tl, (Point::new(0, 6), Point::new(4, 10)));
    }

    #[test]
    fn leaf_region_has_all_idle_flags_set() {
        let region = Region::leaf(Point::ORIGIN, Point::ORIGIN, Point::new(8, 8));
        assert!(region.is_leaf());
        assert!(region.is_root());
        assert!(region.is_split_idle());
    }

    #[test]
    fn directory_round_trips_a_region() {
        let mut directory = RegionDirectory::new();
        let region = Region::leaf(Point::ORIGIN, Point::ORIGIN, Point::new(4, 4));
        directory.insert(region);
        assert_eq!(directory.get(&Point::ORIGIN), Some(&region));
        assert_eq!(directory.remove(Point::ORIGIN), region);
        assert!(!directory.contains(&Point::ORIGIN));
    }
}
