//! Geodesy helpers shared by the dwell detector and batch trace extraction

use crate::graph::{NodeId, NodeType, PlatialGraph};
use crate::model::GeoPoint;

/// Running mean of the samples assigned to a stay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    point: GeoPoint,
    samples: usize,
}

impl Centroid {
    pub fn new(first: GeoPoint) -> Self {
        Self {
            point: first,
            samples: 1,
        }
    }

    pub fn push(&mut self, sample: GeoPoint) {
        self.samples += 1;
        let n = self.samples as f64;
        self.point.lat += (sample.lat - self.point.lat) / n;
        self.point.lon += (sample.lon - self.point.lon) / n;
    }

    pub fn point(&self) -> GeoPoint {
        self.point
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        self.point.distance_m(other)
    }
}

/// The extent nearest to `point` among those covering it.
///
/// Point extents cover within `radius_m`; areas cover by bounding-box
/// containment. Ties go to the earliest inserted extent.
pub fn nearest_covering_extent(graph: &PlatialGraph, point: &GeoPoint, radius_m: f64) -> Option<NodeId> {
    graph
        .nodes(Some(NodeType::SpatialExtent), None)
        .filter_map(|n| n.as_extent().map(|e| (n, e)))
        .filter(|(_, e)| e.covers(point, radius_m))
        .map(|(n, e)| (n, e.centroid().map_or(f64::INFINITY, |c| c.distance_m(point))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n.id.clone())
}
