//! The free-region index: two size-bucketed pools (large / fragment),
//! each holding a pair of dual-keyed maps so idle leaves can be found by
//! probing either the width or the height axis first.

use std::collections::BTreeMap;

use crate::point::Point;

/// One dimension's ordering of a pool: outer key is the primary
/// dimension, inner key the secondary one, and the leaf value is the
/// set of idle-leaf origins sharing that `(outer, inner)` size — the
/// idiomatic stand-in for the C++ original's ordered multimap, which
/// has no direct equivalent in `std`.
type SizeMap = BTreeMap<u32, BTreeMap<u32, Vec<Point>>>;

fn insert_into(map: &mut SizeMap, outer: u32, inner: u32, origin: Point) {
    map.entry(outer).or_default().entry(inner).or_default().push(origin);
}

/// Removes `origin` from the `(outer, inner)` bucket if present. A miss is
/// not a bug here: a region re-indexed partway through an upward merge
/// chain (see `mark_idle`) may later be folded into its parent and
/// removed again by that parent's own `collapse_children` call, or may
/// simply never have reached this bucket in the first place. Mirrors the
/// original `erase`, which is a silent no-op on a miss.
fn remove_from(map: &mut SizeMap, outer: u32, inner: u32, origin: Point) {
    let Some(inner_map) = map.get_mut(&outer) else {
        return;
    };
    let Some(origins) = inner_map.get_mut(&inner) else {
        return;
    };
    let Some(position) = origins.iter().position(|&candidate| candidate == origin) else {
        return;
    };
    origins.remove(position);

    if origins.is_empty() {
        inner_map.remove(&inner);
    }
    if inner_map.is_empty() {
        map.remove(&outer);
    }
}

fn first_at_least(map: &BTreeMap<u32, Vec<Point>>, key: u32) -> Option<Point> {
    map.range(key..).next().and_then(|(_, origins)| origins.first().copied())
}

/// A single pool: idle leaves indexed both width-primary (`xy`) and
/// height-primary (`yx`). Insert and remove always touch both maps in
/// lock step, funneled through this type so that invariant can't be
/// broken by a caller updating only one side.
#[derive(Debug, Default)]
struct PairedIndex {
    xy: SizeMap,
    yx: SizeMap,
}

impl PairedIndex {
    fn insert(&mut self, origin: Point, extent: Point) {
        insert_into(&mut self.xy, extent.x, extent.y, origin);
        insert_into(&mut self.yx, extent.y, extent.x, origin);
    }

    fn remove(&mut self, origin: Point, extent: Point) {
        remove_from(&mut self.xy, extent.x, extent.y, origin);
        remove_from(&mut self.yx, extent.y, extent.x, origin);
    }

    /// Races an X-cursor (width-primary) against a Y-cursor
    /// (height-primary), advancing whichever is still live by one
    /// outer bucket at a time, per spec §4.1. This is the "try X, then
    /// try Y, then step both, repeat" interleaving rather than a
    /// strict alternation or smaller-bucket-first policy; both would be
    /// equally correct, but this is the one pinned by the scenario
    /// tests.
    fn find_fit(&self, w: u32, h: u32) -> Option<Point> {
        let mut x_outer = self.xy.range(w..);
        let mut y_outer = self.yx.range(h..);
        let mut x_cursor = x_outer.next();
        let mut y_cursor = y_outer.next();

        loop {
            if x_cursor.is_none() && y_cursor.is_none() {
                return None;
            }

            if let Some((_, inner)) = x_cursor {
                if let Some(origin) = first_at_least(inner, h) {
                    return Some(origin);
                }
                x_cursor = x_outer.next();
            }

            if let Some((_, inner)) = y_cursor {
                if let Some(origin) = first_at_least(inner, w) {
                    return Some(origin);
                }
                y_cursor = y_outer.next();
            }
        }
    }
}

/// The two pools together: fragment (area below threshold) searched
/// first to prefer filling small gaps, then large.
#[derive(Debug, Default)]
pub struct FreeIndex {
    large: PairedIndex,
    fragment: PairedIndex,
}

impl FreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, origin: Point, extent: Point, is_fragment: bool) {
        if is_fragment {
            self.fragment.insert(origin, extent);
        } else {
            self.large.insert(origin, extent);
        }
    }

    pub fn remove(&mut self, origin: Point, extent: Point, is_fragment: bool) {
        if is_fragment {
            self.fragment.remove(origin, extent);
        } else {
            self.large.remove(origin, extent);
        }
    }

    pub fn find_fit(&self, w: u32, h: u32) -> Option<Point> {
        self.fragment.find_fit(w, h).or_else(|| self.large.find_fit(w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_fit_returns_none_on_empty_index() {
        let index = FreeIndex::new();
        assert_eq!(index.find_fit(4, 4), None);
    }

    #[test]
    fn find_fit_finds_exact_and_larger_regions() {
        let mut index = FreeIndex::new();
        index.insert(Point::new(0, 0), Point::new(4, 4), true);
        index.insert(Point::new(100, 100), Point::new(8, 8), false);

        assert_eq!(index.find_fit(4, 4), Some(Point::new(0, 0)));
        assert_eq!(index.find_fit(8, 8), Some(Point::new(100, 100)));
        assert_eq!(index.find_fit(9, 9), None);
    }

    #[test]
    fn find_fit_finds_tall_thin_region_via_y_cursor() {
        // A 2x20 region would be missed by a width-only scan that
        // starts past narrower-but-shorter buckets; the height-primary
        // cursor should still find it.
        let mut index = FreeIndex::new();
        index.insert(Point::new(0, 0), Point::new(2, 20), false);
        assert_eq!(index.find_fit(2, 15), Some(Point::new(0, 0)));
    }

    #[test]
    fn remove_then_find_fit_misses_the_removed_region() {
        let mut index = FreeIndex::new();
        let origin = Point::new(5, 5);
        let extent = Point::new(4, 4);
        index.insert(origin, extent, true);
        index.remove(origin, extent, true);
        assert_eq!(index.find_fit(4, 4), None);
    }

    #[test]
    fn fragment_pool_is_preferred_over_large_pool() {
        let mut index = FreeIndex::new();
        index.insert(Point::new(0, 0), Point::new(4, 4), false);
        index.insert(Point::new(50, 50), Point::new(4, 4), true);
        assert_eq!(index.find_fit(4, 4), Some(Point::new(50, 50)));
    }
}
