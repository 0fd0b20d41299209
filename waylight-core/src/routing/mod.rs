//! Safety-weighted path search and route assembly.

pub(crate) mod dijkstra;
mod route;

pub use route::{RouteRequest, RouteResult};

use log::debug;

use crate::Error;
use crate::loading::RoutingData;

/// Compute a walking route between the request endpoints.
///
/// Pipeline: coordinate validation, walkability gate, snapping, path
/// search, waypoint assembly. Pure with respect to `data`: any number
/// of requests may run concurrently against one snapshot.
///
/// # Errors
///
/// - `Error::InvalidCoordinates` for non-finite or out-of-range input,
///   rejected before any graph work
/// - `Error::NonWalkableEndpoint` when either endpoint's grid cell is
///   outside the walkable area
/// - `Error::NoStreetNearby` when no graph node lies within the snap
///   radius of an endpoint
/// - `Error::NoSafeRouteFound` when the search frontier exhausts before
///   reaching the target
pub fn find_route(data: &RoutingData, request: &RouteRequest) -> Result<RouteResult, Error> {
    validate_coordinate("start", request.start.y(), request.start.x())?;
    validate_coordinate("end", request.end.y(), request.end.x())?;

    for point in [request.start, request.end] {
        if !data.walkable.contains(point.y(), point.x()) {
            return Err(Error::NonWalkableEndpoint {
                lat: point.y(),
                lon: point.x(),
            });
        }
    }

    let (start_node, start_offset) = data
        .graph
        .nearest_node_within(request.start, request.snap_radius_m)
        .ok_or(Error::NoStreetNearby)?;
    let (end_node, end_offset) = data
        .graph
        .nearest_node_within(request.end, request.snap_radius_m)
        .ok_or(Error::NoStreetNearby)?;

    debug!(
        "Snapped endpoints: start {start_offset:.1} m, end {end_offset:.1} m from request"
    );

    let trace = dijkstra::shortest_path(&data.graph, start_node, end_node, request.mode)
        .ok_or(Error::NoSafeRouteFound)?;

    Ok(route::assemble(&data.graph, &trace, request))
}

fn validate_coordinate(label: &str, lat: f64, lon: f64) -> Result<(), Error> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(Error::InvalidCoordinates(format!(
            "{label} coordinate is not a finite number"
        )));
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidCoordinates(format!(
            "{label} coordinate ({lat}, {lon}) is out of range"
        )));
    }
    Ok(())
}
