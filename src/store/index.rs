use geo::{BoundingRect, Distance, Euclidean, Geometry, Intersects, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a geometry by index.
#[derive(Debug, Clone)]
struct BoundingBox {
    idx: usize, // Index of corresponding geometry in geoms
    bbox: Rect<f64>,
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// An R-tree over a layer's geometries for proximity queries.
///
/// Null and empty geometries are skipped at build time; they can never
/// satisfy a distance predicate.
#[derive(Debug)]
pub struct SpatialIndex {
    geoms: Vec<Geometry<f64>>,
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    pub fn build(geoms: &[Option<Geometry<f64>>]) -> Self {
        let geoms: Vec<Geometry<f64>> = geoms.iter().flatten().cloned().collect();
        let boxes = geoms
            .iter()
            .enumerate()
            .filter_map(|(idx, geom)| {
                geom.bounding_rect().map(|bbox| BoundingBox { idx, bbox })
            })
            .collect();
        Self { rtree: RTree::bulk_load(boxes), geoms }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.geoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geoms.is_empty()
    }

    /// Count indexed geometries within `dist` of `geom`, visiting at most
    /// enough candidates to reach `stop_at` when one is given.
    pub fn count_within(
        &self,
        geom: &Geometry<f64>,
        dist: f64,
        stop_at: Option<usize>,
    ) -> usize {
        let Some(bbox) = geom.bounding_rect() else {
            return 0;
        };
        let envelope = AABB::from_corners(
            [bbox.min().x - dist, bbox.min().y - dist],
            [bbox.max().x + dist, bbox.max().y + dist],
        );
        let mut count = 0;
        for entry in self.rtree.locate_in_envelope_intersecting(&envelope) {
            let other = &self.geoms[entry.idx];
            if geom.intersects(other) || Euclidean.distance(geom, other) <= dist {
                count += 1;
                if stop_at.is_some_and(|limit| count >= limit) {
                    break;
                }
            }
        }
        count
    }

    /// Whether at least `min_count` indexed geometries lie within `dist`
    /// of `geom`.
    pub fn at_least(&self, geom: &Geometry<f64>, dist: f64, min_count: usize) -> bool {
        if min_count == 0 {
            return true;
        }
        self.count_within(geom, dist, Some(min_count)) >= min_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    fn square(x: f64, y: f64, side: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
            (x: x, y: y),
        ])
    }

    #[test]
    fn counts_geometries_within_distance() {
        let index = SpatialIndex::build(&[
            Some(Geometry::Point(point!(x: 0.0, y: 0.0))),
            Some(Geometry::Point(point!(x: 10.0, y: 0.0))),
            Some(Geometry::Point(point!(x: 100.0, y: 0.0))),
            None,
        ]);
        let query = Geometry::Point(point!(x: 1.0, y: 0.0));
        assert_eq!(index.count_within(&query, 15.0, None), 2);
        assert_eq!(index.count_within(&query, 0.5, None), 0);
    }

    #[test]
    fn intersecting_geometries_are_within_any_distance() {
        let index = SpatialIndex::build(&[Some(square(0.0, 0.0, 10.0))]);
        let query = Geometry::Point(point!(x: 5.0, y: 5.0));
        assert!(index.at_least(&query, 0.0, 1));
    }

    #[test]
    fn at_least_respects_the_minimum_count() {
        let index = SpatialIndex::build(&[
            Some(Geometry::Point(point!(x: 0.0, y: 0.0))),
            Some(Geometry::Point(point!(x: 5.0, y: 0.0))),
        ]);
        let query = Geometry::Point(point!(x: 0.0, y: 1.0));
        assert!(index.at_least(&query, 10.0, 2));
        assert!(!index.at_least(&query, 10.0, 3));
        assert!(index.at_least(&query, 10.0, 0));
    }

    #[test]
    fn empty_index_matches_nothing() {
        let index = SpatialIndex::build(&[]);
        assert!(index.is_empty());
        let query = Geometry::Point(point!(x: 0.0, y: 0.0));
        assert_eq!(index.count_within(&query, 1e9, None), 0);
    }
}
