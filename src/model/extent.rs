//! SpatialExtent: a weakly semanticised spatial support
//!
//! Geometry is stored, not computed on. The only spatial operations are a
//! centroid, a coarse bounding box and great-circle distance between points.

use crate::graph::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine distance in metres
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Axis-aligned bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat) && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

/// Spatial support of an extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Geometry {
    Point(GeoPoint),
    BoundingBox(Bounds),
    Polygon { ring: Vec<GeoPoint> },
}

impl Geometry {
    /// Point itself, box center, or vertex mean of a polygon ring
    pub fn centroid(&self) -> Option<GeoPoint> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::BoundingBox(b) => Some(b.center()),
            Geometry::Polygon { ring } if !ring.is_empty() => {
                let n = ring.len() as f64;
                let lat = ring.iter().map(|p| p.lat).sum::<f64>() / n;
                let lon = ring.iter().map(|p| p.lon).sum::<f64>() / n;
                Some(GeoPoint::new(lat, lon))
            }
            Geometry::Polygon { .. } => None,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Geometry::Point(p) => Some(Bounds {
                min_lat: p.lat,
                min_lon: p.lon,
                max_lat: p.lat,
                max_lon: p.lon,
            }),
            Geometry::BoundingBox(b) => Some(*b),
            Geometry::Polygon { ring } => {
                let first = ring.first()?;
                let init = Bounds {
                    min_lat: first.lat,
                    min_lon: first.lon,
                    max_lat: first.lat,
                    max_lon: first.lon,
                };
                Some(ring.iter().fold(init, |b, p| Bounds {
                    min_lat: b.min_lat.min(p.lat),
                    min_lon: b.min_lon.min(p.lon),
                    max_lat: b.max_lat.max(p.lat),
                    max_lon: b.max_lon.max(p.lon),
                }))
            }
        }
    }
}

/// A spatial extent with weak semantic hints (never a hard category)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Loose classification such as "area", "path" or "point"
    #[serde(default)]
    pub extent_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub semantic_hints: BTreeMap<String, PropertyValue>,
}

impl SpatialExtent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extent_type: "area".to_string(),
            ..Default::default()
        }
    }

    pub fn point(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Some(Geometry::Point(GeoPoint::new(lat, lon))),
            extent_type: "point".to_string(),
            semantic_hints: BTreeMap::new(),
        }
    }

    pub fn from_bounds(bounds: Bounds, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Some(Geometry::BoundingBox(bounds)),
            extent_type: "area".to_string(),
            semantic_hints: BTreeMap::new(),
        }
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.semantic_hints.insert(key.into(), value);
        self
    }

    pub fn hint(&self, key: &str) -> Option<&PropertyValue> {
        self.semantic_hints.get(key)
    }

    /// The `type` hint if it is a string, else the loose extent type
    pub fn kind_label(&self) -> &str {
        match self.semantic_hints.get("type") {
            Some(PropertyValue::String(s)) => s,
            _ => &self.extent_type,
        }
    }

    pub fn centroid(&self) -> Option<GeoPoint> {
        self.geometry.as_ref().and_then(Geometry::centroid)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry.as_ref().and_then(Geometry::bounds)
    }

    /// Whether `point` falls within this extent: inside the bounding box of an
    /// area, or within `radius_m` of a point extent.
    pub fn covers(&self, point: &GeoPoint, radius_m: f64) -> bool {
        match &self.geometry {
            Some(Geometry::Point(p)) => p.distance_m(point) <= radius_m,
            Some(g) => g.bounds().is_some_and(|b| b.contains(point)),
            None => false,
        }
    }
}
