//! Route assembly: turn a finalized path trace into the waypoint
//! sequence and aggregate safety metric handed to the directions
//! provider.

use geo::{LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::json;

use super::dijkstra::PathTrace;
use crate::MAX_WAYPOINTS;
use crate::model::{RouteMode, StreetGraph};

/// A single routing request, already parsed by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest {
    pub start: Point<f64>,
    pub end: Point<f64>,
    pub mode: RouteMode,
    /// Snapping radius around each endpoint, meters
    pub snap_radius_m: f64,
}

impl RouteRequest {
    pub fn new(start_lat: f64, start_lon: f64, end_lat: f64, end_lon: f64) -> Self {
        Self {
            start: Point::new(start_lon, start_lat),
            end: Point::new(end_lon, end_lat),
            mode: RouteMode::default(),
            snap_radius_m: crate::DEFAULT_SNAP_RADIUS_M,
        }
    }

    pub fn with_mode(mut self, mode: RouteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_snap_radius(mut self, radius_m: f64) -> Self {
        self.snap_radius_m = radius_m;
        self
    }
}

/// Finished route: capped waypoint sequence plus aggregate metrics.
///
/// `safety_score` is the length-weighted mean of the normalized risk of
/// every traversed segment, in `[0, 1]` with lower meaning safer. The
/// weighting keeps a long safe detour from scoring worse than a short
/// risky hop.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub waypoints: Vec<Point<f64>>,
    pub safety_score: f64,
    pub distance_meters: f64,
}

impl RouteResult {
    /// GeoJSON rendition: one LineString feature through the waypoints
    /// with the aggregate metrics as properties.
    pub fn to_geojson(&self) -> FeatureCollection {
        let line: LineString<f64> = self.waypoints.iter().map(|p| (p.x(), p.y())).collect();

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new((&line).into()),
            "properties": {
                "safety_score": self.safety_score,
                "distance_meters": self.distance_meters,
            }
        });

        FeatureCollection {
            features: vec![Feature::from_json_value(value).unwrap()],
            bbox: None,
            foreign_members: None,
        }
    }
}

/// Build the final [`RouteResult`] from a finalized trace.
///
/// The sequence always starts and ends exactly at the raw request
/// coordinates; the snapped entry/exit nodes sit next to them unless
/// they coincide. Sequences longer than [`MAX_WAYPOINTS`] are
/// subsampled by uniform stride with first and last always retained.
pub(crate) fn assemble(
    graph: &StreetGraph,
    trace: &PathTrace,
    request: &RouteRequest,
) -> RouteResult {
    let mut waypoints = Vec::with_capacity(trace.nodes.len() + 2);
    waypoints.push(request.start);
    waypoints.extend(trace.nodes.iter().map(|&idx| graph.node(idx).geometry));
    waypoints.push(request.end);
    waypoints.dedup();

    let waypoints = cap_waypoints(waypoints, MAX_WAYPOINTS);

    let (weighted_risk, total_length) = trace
        .edges
        .iter()
        .map(|&idx| graph.edge(idx))
        .fold((0.0, 0.0), |(risk, length), edge| {
            (
                risk + edge.normalized_safety * edge.length_m,
                length + edge.length_m,
            )
        });
    let safety_score = if total_length > 0.0 {
        weighted_risk / total_length
    } else {
        0.0
    };

    RouteResult {
        waypoints,
        safety_score,
        distance_meters: trace.distance_m,
    }
}

/// Uniform stride subsample: index `round(i * step)` for `i` in
/// `0..max`, `step = (n-1)/(max-1)`. Keeps the exact first and last
/// points and spaces the interior evenly over the original sequence.
fn cap_waypoints(waypoints: Vec<Point<f64>>, max: usize) -> Vec<Point<f64>> {
    let n = waypoints.len();
    if n <= max {
        return waypoints;
    }

    let step = (n - 1) as f64 / (max - 1) as f64;
    (0..max)
        .map(|i| waypoints[((i as f64) * step).round() as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Point<f64>> {
        (0..n).map(|i| Point::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn short_sequences_pass_through() {
        let original = points(10);
        assert_eq!(cap_waypoints(original.clone(), MAX_WAYPOINTS), original);
    }

    #[test]
    fn long_sequences_cap_at_the_limit_keeping_endpoints() {
        let original = points(100);
        let capped = cap_waypoints(original.clone(), MAX_WAYPOINTS);

        assert_eq!(capped.len(), MAX_WAYPOINTS);
        assert_eq!(capped[0], original[0]);
        assert_eq!(capped[MAX_WAYPOINTS - 1], original[99]);

        // Interior points stay in original order and are evenly strided.
        let xs: Vec<f64> = capped.iter().map(|p| p.x()).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn exact_boundary_is_untouched() {
        let original = points(MAX_WAYPOINTS);
        assert_eq!(cap_waypoints(original.clone(), MAX_WAYPOINTS), original);
    }

    #[test]
    fn geojson_rendition_carries_metrics() {
        let result = RouteResult {
            waypoints: points(3),
            safety_score: 0.25,
            distance_meters: 500.0,
        };
        let collection = result.to_geojson();
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["safety_score"], 0.25);
        assert_eq!(properties["distance_meters"], 500.0);
    }
}
