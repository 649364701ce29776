//! A two-dimensional rectangular space allocator.
//!
//! Given a fixed `width × height` canvas, [`Allocator2D`] services a
//! stream of `allocate(w, h)` / `deallocate(origin)` requests, handing
//! back the lower-left origin of a non-overlapping `w × h` sub-rectangle
//! and reclaiming space on free — including coalescing with previously
//! freed neighbours, so that once every live allocation is freed the
//! canvas is again allocatable as a single whole-canvas block.
//!
//! # Crate Layout
//!
//! - [`point`] — the 2D integer vector type used for both origins and
//!   extents.
//! - [`directory`] — the region record and the origin-to-region
//!   directory it lives in.
//! - [`index`] — the size-bucketed, dual-keyed free-region index that
//!   backs the placement search.
//! - [`allocator`] — [`Allocator2D`] itself: construction, the
//!   quadrant split on allocate, the recursive merge on deallocate, and
//!   the leak-checking [`CheckedAllocator2D`] wrapper.
//!
//! # Example
//!
//! ```rust
//! use allocator2d::{Allocator2D, Point};
//!
//! let mut canvas = Allocator2D::new(Point::new(256, 256));
//! let origin = canvas.allocate(Point::new(32, 64)).unwrap();
//! assert_eq!(origin, Point::new(0, 0));
//! assert!(canvas.deallocate(origin));
//! assert_eq!(canvas.remain_area(), 256 * 256);
//! ```
//!
//! # Non-goals
//!
//! This allocator does not rotate rectangles, does not relocate live
//! allocations (no compaction), is not thread-safe, and makes no claim
//! of optimal packing — it is a heuristic bin-packer, not an optimiser.
//! Callers needing concurrent access must serialize calls to one
//! allocator instance themselves.

pub mod allocator;
pub mod directory;
pub mod index;
pub mod point;

pub use allocator::{Allocator2D, CheckedAllocator2D, LeakAction, PanicOnLeak};
pub use allocator_api2::alloc::Global;
pub use point::{Extent, Point};
