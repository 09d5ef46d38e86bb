//! Route geometry: polylines and aim-point resolution.
//!
//! The acquisition engine never owns route geometry. It reads ordered
//! vertex lists supplied by the route-target index ([`TargetIndex`]) and uses
//! them to decide which way a camera at a given coordinate should face.

mod targets;

pub use targets::{TargetEntry, TargetIndex, TARGET_FILE_NAME};

use crate::coord::Coordinate;

/// An ordered sequence of vertices describing a travel path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePolyline {
    vertices: Vec<Coordinate>,
}

impl RoutePolyline {
    /// Creates a polyline from vertices in travel order.
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    /// Vertices in travel order.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the polyline has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl FromIterator<Coordinate> for RoutePolyline {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Finds the vertex that follows the one nearest to `point`.
///
/// Distance is squared planar distance in degree space, which is an adequate
/// approximation over the length of a road segment. The first minimum in scan
/// order wins ties.
///
/// Returns `None` when the route has fewer than two vertices or when the
/// nearest vertex is the last one (there is nothing further along the route).
pub fn next_waypoint(point: &Coordinate, route: &RoutePolyline) -> Option<Coordinate> {
    let vertices = route.vertices();
    if vertices.len() < 2 {
        return None;
    }

    let mut nearest = 0;
    let mut min_dist = f64::INFINITY;
    for (i, vertex) in vertices.iter().enumerate() {
        let d_lat = vertex.lat() - point.lat();
        let d_lng = vertex.lng() - point.lng();
        let dist = d_lat * d_lat + d_lng * d_lng;
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }

    vertices.get(nearest + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_two_vertex_route_from_start() {
        let route = RoutePolyline::new(vec![coord(35.0, 139.0), coord(35.001, 139.001)]);
        let aim = next_waypoint(&coord(35.0, 139.0), &route);
        assert_eq!(aim, Some(coord(35.001, 139.001)));
    }

    #[test]
    fn test_query_at_last_vertex_has_no_aim_point() {
        let route = RoutePolyline::new(vec![coord(35.0, 139.0), coord(35.001, 139.001)]);
        assert_eq!(next_waypoint(&coord(35.001, 139.001), &route), None);
    }

    #[test]
    fn test_short_routes_have_no_aim_point() {
        let p = coord(35.0, 139.0);
        assert_eq!(next_waypoint(&p, &RoutePolyline::default()), None);
        assert_eq!(next_waypoint(&p, &RoutePolyline::new(vec![p])), None);
    }

    #[test]
    fn test_nearest_vertex_selects_following_vertex() {
        let route: RoutePolyline = [
            coord(35.000, 139.000),
            coord(35.001, 139.000),
            coord(35.002, 139.000),
            coord(35.003, 139.000),
        ]
        .into_iter()
        .collect();

        // Closest to index 1
        let aim = next_waypoint(&coord(35.0011, 139.0001), &route);
        assert_eq!(aim, Some(coord(35.002, 139.000)));
    }

    #[test]
    fn test_ties_resolve_to_first_vertex_in_scan_order() {
        // Query is exactly equidistant from index 0 and index 2
        let route = RoutePolyline::new(vec![
            coord(10.0, 139.0),
            coord(20.0, 139.0),
            coord(11.0, 139.0),
            coord(30.0, 139.0),
        ]);
        let aim = next_waypoint(&coord(10.5, 139.0), &route);
        assert_eq!(aim, Some(coord(20.0, 139.0)));
    }
}
