//! Tiled spatial index with toroidal wrap.
//!
//! Divides the field into a fixed grid of buckets and stores elements by
//! value in the bucket their position falls into. Neighbourhood queries
//! visit every bucket intersecting the query square; callers re-test the
//! precise distance. Tile coordinates wrap, so queries across a field edge
//! behave like any other query.

use crate::util::vec2::Vec2;

/// Anything stored in a [`SpatialMap`] exposes a position.
pub trait SpatialEntry {
    fn position(&self) -> Vec2;
}

/// Uniform bucket grid over a `W x H` field with wrapped tile coordinates.
///
/// Buckets are recomputed on insert only; an element that moves must be
/// re-inserted (the segment index is rebuilt every frame, the food index
/// holds immobile items).
pub struct SpatialMap<T> {
    tiles_x: usize,
    tiles_y: usize,
    tile_size_x: f32,
    tile_size_y: f32,
    tiles: Vec<Vec<T>>,
}

impl<T: SpatialEntry> SpatialMap<T> {
    pub fn new(
        field_size_x: f32,
        field_size_y: f32,
        tiles_x: usize,
        tiles_y: usize,
        reserve_per_tile: usize,
    ) -> Self {
        let mut tiles = Vec::with_capacity(tiles_x * tiles_y);
        for _ in 0..tiles_x * tiles_y {
            tiles.push(Vec::with_capacity(reserve_per_tile));
        }
        Self {
            tiles_x,
            tiles_y,
            tile_size_x: field_size_x / tiles_x as f32,
            tile_size_y: field_size_y / tiles_y as f32,
            tiles,
        }
    }

    /// Number of stored elements across all buckets.
    pub fn len(&self) -> usize {
        self.tiles.iter().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(|t| t.is_empty())
    }

    /// Place an element in the bucket for its position. Out-of-range
    /// positions wrap modulo the grid dimensions.
    pub fn insert(&mut self, element: T) {
        let idx = self.tile_index_for(element.position());
        self.tiles[idx].push(element);
    }

    /// Empty all buckets, keeping their capacity.
    pub fn clear(&mut self) {
        for tile in &mut self.tiles {
            tile.clear();
        }
    }

    /// Remove every element matching the predicate. Order among the
    /// remaining elements is preserved.
    pub fn erase_if(&mut self, mut predicate: impl FnMut(&T) -> bool) {
        for tile in &mut self.tiles {
            tile.retain(|e| !predicate(e));
        }
    }

    /// Iterate all elements, buckets in row-major order, insertion order
    /// within a bucket.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tiles.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.tiles.iter_mut().flatten()
    }

    /// Lazy view over every element whose bucket intersects the axis-aligned
    /// square of side `2 * radius` around `center`.
    ///
    /// The view may include elements outside the query radius; callers must
    /// re-test the precise distance. Each matching bucket is visited exactly
    /// once even when the square wraps across a field edge. Iteration is
    /// bucket-major, insertion order within a bucket.
    pub fn region(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &T> {
        let (x0, nx) = tile_span(center.x - radius, center.x + radius, self.tile_size_x, self.tiles_x);
        let (y0, ny) = tile_span(center.y - radius, center.y + radius, self.tile_size_y, self.tiles_y);
        let tiles_x = self.tiles_x;
        let tiles_y = self.tiles_y;

        (0..ny).flat_map(move |dy| {
            let ty = wrap_tile(y0 + dy as i64, tiles_y);
            (0..nx).flat_map(move |dx| {
                let tx = wrap_tile(x0 + dx as i64, tiles_x);
                self.tiles[ty * tiles_x + tx].iter()
            })
        })
    }

    /// Visit every element in the region mutably. Same bucket coverage and
    /// order as [`Self::region`].
    pub fn for_each_region_mut(&mut self, center: Vec2, radius: f32, mut f: impl FnMut(&mut T)) {
        let (x0, nx) = tile_span(center.x - radius, center.x + radius, self.tile_size_x, self.tiles_x);
        let (y0, ny) = tile_span(center.y - radius, center.y + radius, self.tile_size_y, self.tiles_y);

        for dy in 0..ny {
            let ty = wrap_tile(y0 + dy as i64, self.tiles_y);
            for dx in 0..nx {
                let tx = wrap_tile(x0 + dx as i64, self.tiles_x);
                for element in self.tiles[ty * self.tiles_x + tx].iter_mut() {
                    f(element);
                }
            }
        }
    }

    fn tile_index_for(&self, position: Vec2) -> usize {
        let tx = wrap_tile((position.x / self.tile_size_x).floor() as i64, self.tiles_x);
        let ty = wrap_tile((position.y / self.tile_size_y).floor() as i64, self.tiles_y);
        ty * self.tiles_x + tx
    }
}

/// First tile touching `lo` and the number of tiles up to the one touching
/// `hi`, inclusive, clamped so a wrapping span never visits a tile twice.
#[inline]
fn tile_span(lo: f32, hi: f32, tile_size: f32, count: usize) -> (i64, usize) {
    let first = (lo / tile_size).floor() as i64;
    let last = (hi / tile_size).floor() as i64;
    let span = last.saturating_sub(first).saturating_add(1).max(1) as usize;
    (first, span.min(count))
}

#[inline]
fn wrap_tile(tile: i64, count: usize) -> usize {
    tile.rem_euclid(count as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Marker {
        pos: Vec2,
        tag: u32,
    }

    impl SpatialEntry for Marker {
        fn position(&self) -> Vec2 {
            self.pos
        }
    }

    fn marker(x: f32, y: f32, tag: u32) -> Marker {
        Marker {
            pos: Vec2::new(x, y),
            tag,
        }
    }

    fn map() -> SpatialMap<Marker> {
        // 100x100 field, 10x10 tiles of 10 units
        SpatialMap::new(100.0, 100.0, 10, 10, 4)
    }

    #[test]
    fn test_insert_and_len() {
        let mut m = map();
        assert!(m.is_empty());
        m.insert(marker(5.0, 5.0, 1));
        m.insert(marker(95.0, 95.0, 2));
        assert_eq!(m.len(), 2);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_region_finds_inserted_element() {
        let mut m = map();
        m.insert(marker(42.0, 17.0, 7));
        let hits: Vec<_> = m.region(Vec2::new(40.0, 15.0), 5.0).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tag, 7);
    }

    #[test]
    fn test_region_may_overapproximate() {
        let mut m = map();
        // same bucket as the query center, but further than the radius
        m.insert(marker(19.9, 19.9, 1));
        let hits: Vec<_> = m.region(Vec2::new(11.0, 11.0), 2.0).collect();
        assert_eq!(hits.len(), 1, "bucket-level query includes the whole bucket");
    }

    #[test]
    fn test_region_wraps_across_edges() {
        let mut m = map();
        m.insert(marker(99.0, 50.0, 1));
        m.insert(marker(1.0, 50.0, 2));
        let tags: Vec<u32> = m.region(Vec2::new(0.0, 50.0), 3.0).map(|e| e.tag).collect();
        assert!(tags.contains(&1));
        assert!(tags.contains(&2));
    }

    #[test]
    fn test_region_wraps_corner() {
        let mut m = map();
        m.insert(marker(99.5, 99.5, 1));
        let hits: Vec<_> = m.region(Vec2::new(0.5, 0.5), 2.0).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_region_endpoints_inclusive() {
        let mut m = map();
        // 30.0 is exactly on the boundary of tile 3
        m.insert(marker(30.0, 50.0, 1));
        let hits: Vec<_> = m.region(Vec2::new(25.0, 50.0), 5.0).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_region_covering_whole_field_visits_each_bucket_once() {
        let mut m = map();
        for i in 0..10 {
            m.insert(marker(i as f32 * 10.0 + 5.0, 5.0, i));
        }
        // radius larger than the field: the span must clamp to the tile count
        let hits: Vec<_> = m.region(Vec2::new(50.0, 50.0), 500.0).collect();
        assert_eq!(hits.len(), 10, "no element may be reported twice");
    }

    #[test]
    fn test_erase_if_preserves_order() {
        let mut m = map();
        m.insert(marker(5.0, 5.0, 1));
        m.insert(marker(6.0, 5.0, 2));
        m.insert(marker(7.0, 5.0, 3));
        m.insert(marker(8.0, 5.0, 4));
        m.erase_if(|e| e.tag % 2 == 0);
        let tags: Vec<u32> = m.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![1, 3]);
    }

    #[test]
    fn test_clear() {
        let mut m = map();
        m.insert(marker(5.0, 5.0, 1));
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.region(Vec2::new(5.0, 5.0), 10.0).count(), 0);
    }

    #[test]
    fn test_full_iteration_is_row_major() {
        let mut m = map();
        m.insert(marker(95.0, 95.0, 3)); // last tile
        m.insert(marker(5.0, 5.0, 1)); // first tile
        m.insert(marker(55.0, 5.0, 2)); // first row, later column
        let tags: Vec<u32> = m.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_out_of_range_positions_wrap() {
        let mut m = map();
        m.insert(marker(-5.0, 205.0, 1));
        // -5 wraps to tile of 95, 205 wraps to tile of 5
        let hits: Vec<_> = m.region(Vec2::new(95.0, 5.0), 1.0).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_for_each_region_mut() {
        let mut m = map();
        m.insert(marker(10.0, 10.0, 0));
        m.insert(marker(12.0, 10.0, 0));
        m.insert(marker(80.0, 80.0, 0));
        m.for_each_region_mut(Vec2::new(11.0, 10.0), 4.0, |e| e.tag += 1);
        let bumped = m.iter().filter(|e| e.tag == 1).count();
        assert_eq!(bumped, 2);
    }

    #[test]
    fn test_insertion_order_within_bucket() {
        let mut m = map();
        for tag in 0..5 {
            m.insert(marker(5.0, 5.0, tag));
        }
        let tags: Vec<u32> = m.region(Vec2::new(5.0, 5.0), 1.0).map(|e| e.tag).collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4]);
    }
}
