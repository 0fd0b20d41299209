use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load street graph: {0}")]
    GraphLoad(String),
    #[error("Point ({lat}, {lon}) is outside the walkable area")]
    NonWalkableEndpoint { lat: f64, lon: f64 },
    #[error("Too far from a walkable street")]
    NoStreetNearby,
    #[error("No walkable route between these points")]
    NoSafeRouteFound,
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
