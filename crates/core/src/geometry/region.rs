//! Planar regions and the boolean algebra the cover engine needs
//!
//! A [`Region`] is a set of disjoint polygons. Intersection and union go
//! through `geo`'s `BooleanOps`; every result is passed through sliver
//! suppression so that near-zero pieces left behind by clipping against a
//! tangent boundary never reach area sums.

use crate::core_types::SquareFeet;
use geo::{Area, BooleanOps, MultiPolygon, Polygon};

/// A possibly empty, possibly multi-part planar region
#[derive(Debug, Clone, PartialEq)]
pub struct Region(MultiPolygon<f64>);

impl Region {
    /// The empty region
    pub fn empty() -> Self {
        Region(MultiPolygon::new(Vec::new()))
    }

    /// Region made of a single polygon
    ///
    /// A polygon with an empty exterior ring gives the empty region.
    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        if polygon.exterior().0.is_empty() {
            return Self::empty();
        }
        Region(MultiPolygon::new(vec![polygon]))
    }

    /// Wrap an existing multipolygon as-is
    pub fn from_multi_polygon(polygons: MultiPolygon<f64>) -> Self {
        Region(polygons)
    }

    /// True when the region has no polygons
    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    /// Number of disjoint parts
    pub fn part_count(&self) -> usize {
        self.0 .0.len()
    }

    /// Component polygons
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.0 .0
    }

    /// Borrow the underlying multipolygon
    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    /// Unwrap into the underlying multipolygon
    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        self.0
    }

    /// Total area of all parts
    pub fn area(&self) -> SquareFeet {
        SquareFeet::from(self.0.unsigned_area())
    }

    /// Part of `self` that also lies in `other`
    pub fn intersection(&self, other: &Region, sliver_tolerance: SquareFeet) -> Region {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        Region(self.0.intersection(&other.0)).without_slivers(sliver_tolerance)
    }

    /// Points in either region
    pub fn union(&self, other: &Region, sliver_tolerance: SquareFeet) -> Region {
        if self.is_empty() {
            return other.clone().without_slivers(sliver_tolerance);
        }
        if other.is_empty() {
            return self.clone().without_slivers(sliver_tolerance);
        }
        Region(self.0.union(&other.0)).without_slivers(sliver_tolerance)
    }

    /// Union of any number of regions, overlaps counted once
    ///
    /// Merges pairwise in rounds so that each boolean operation sees
    /// operands of similar size.
    pub fn dissolve(regions: &[Region], sliver_tolerance: SquareFeet) -> Region {
        let mut layer: Vec<Region> = regions
            .iter()
            .filter(|r| !r.is_empty())
            .cloned()
            .collect();

        match layer.len() {
            0 => return Self::empty(),
            1 => return layer.swap_remove(0),
            _ => {}
        }

        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut iter = layer.into_iter();
            while let Some(a) = iter.next() {
                match iter.next() {
                    Some(b) => next.push(a.union(&b, sliver_tolerance)),
                    None => next.push(a),
                }
            }
            layer = next;
        }

        layer.pop().unwrap_or_default()
    }

    /// Drop parts whose area is below `tolerance`
    ///
    /// Parts with a non-finite area are kept so that the caller sees the
    /// bad value instead of a silently shrunken region.
    pub fn without_slivers(self, tolerance: SquareFeet) -> Region {
        let tol = tolerance.value();
        if tol <= 0.0 {
            return self;
        }
        let kept: Vec<Polygon<f64>> = self
            .0
             .0
            .into_iter()
            .filter(|p| {
                let a = p.unsigned_area();
                !a.is_finite() || a >= tol
            })
            .collect();
        Region(MultiPolygon::new(kept))
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Polygon<f64>> for Region {
    fn from(polygon: Polygon<f64>) -> Self {
        Region::from_polygon(polygon)
    }
}
