//! Street network components - nodes, edges and their identifiers

use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::{COORD_QUANTIZATION, SAFETY_WEIGHT};

/// Stable node identifier, derived deterministically from coordinates.
///
/// Latitude and longitude are quantized to [`COORD_QUANTIZATION`] steps
/// and the two signed steps packed into one `u64`, so segment endpoints
/// within the tolerance of the same physical point share one node and
/// floating-point drift cannot silently split an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn from_coords(lat: f64, lon: f64) -> Self {
        let qlat = (lat / COORD_QUANTIZATION).round() as i32;
        let qlon = (lon / COORD_QUANTIZATION).round() as i32;
        Self((u64::from(qlat as u32) << 32) | u64::from(qlon as u32))
    }
}

/// Stable edge identifier from the persisted asset (or assigned
/// sequentially when building from a segment collection). The grid
/// index dedups query results by this, never by reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// Street graph node (intersection or segment endpoint)
#[derive(Debug, Clone)]
pub struct StreetNode {
    pub id: NodeId,
    /// Node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
///
/// Logically undirected: traversal costs the same in both directions.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub id: EdgeId,
    /// Segment length in meters
    pub length_m: f64,
    /// Raw risk score from the offline ETL (higher = riskier)
    pub safety_score: f64,
    /// Risk min-max normalized to [0, 1] over the loaded edge set
    pub normalized_safety: f64,
    /// Blended traversal cost, precomputed at load
    pub weight: f64,
    pub name: Option<String>,
    /// Segment geometry for viewport display and centroid bucketing
    pub geometry: LineString<f64>,
}

impl StreetEdge {
    /// Blended cost: strictly increasing in both length and risk, so the
    /// search can never prefer a longer, riskier edge over a shorter,
    /// safer one.
    pub fn blended_weight(length_m: f64, normalized_safety: f64) -> f64 {
        length_m * (1.0 + SAFETY_WEIGHT * normalized_safety)
    }

    /// Arithmetic mean of the geometry's coordinate sequence. Determines
    /// which grid cell the segment is bucketed into.
    pub fn centroid(&self) -> Coord<f64> {
        let coords = &self.geometry.0;
        let n = coords.len() as f64;
        let sum = coords
            .iter()
            .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| Coord {
                x: acc.x + c.x,
                y: acc.y + c.y,
            });
        Coord {
            x: sum.x / n,
            y: sum.y / n,
        }
    }
}

/// Which cost the path search optimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Pure distance
    #[default]
    Shortest,
    /// Distance blended with risk exposure
    Safest,
}

impl RouteMode {
    pub fn edge_cost(self, edge: &StreetEdge) -> f64 {
        match self {
            Self::Shortest => edge.length_m,
            Self::Safest => edge.weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_identity_merges_within_tolerance() {
        let a = NodeId::from_coords(38.90720, -77.03690);
        // Half a quantization step of drift still lands on the same node.
        let b = NodeId::from_coords(38.90720 + COORD_QUANTIZATION * 0.4, -77.03690);
        assert_eq!(a, b);

        let c = NodeId::from_coords(38.90720 + COORD_QUANTIZATION * 3.0, -77.03690);
        assert_ne!(a, c);
    }

    #[test]
    fn node_identity_distinguishes_hemispheres() {
        assert_ne!(
            NodeId::from_coords(38.9, -77.0),
            NodeId::from_coords(-38.9, 77.0)
        );
    }

    #[test]
    fn blended_weight_increases_with_risk_and_length() {
        let base = StreetEdge::blended_weight(100.0, 0.0);
        assert!(StreetEdge::blended_weight(100.0, 0.5) > base);
        assert!(StreetEdge::blended_weight(101.0, 0.0) > base);
        // Zero risk degenerates to plain length.
        assert_eq!(base, 100.0);
    }
}
