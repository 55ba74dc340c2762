use crate::location::*;
use crate::terrain::*;
use serde::{Deserialize, Serialize};

/// What a point of interest represents.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum PoiKind {
    /// A harvestable resource node.
    Resource,
    /// The object that establishes ownership of the region.
    ClaimAnchor,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub kind: PoiKind,
    pub location: Location,
}

impl PointOfInterest {
    pub fn new(kind: PoiKind, location: Location) -> Self {
        PointOfInterest { kind, location }
    }

    pub fn resource(x: u8, y: u8) -> Self {
        PointOfInterest::new(PoiKind::Resource, Location::from_xy(x, y))
    }

    pub fn claim_anchor(x: u8, y: u8) -> Self {
        PointOfInterest::new(PoiKind::ClaimAnchor, Location::from_xy(x, y))
    }
}

/// Trait for providing room data to the planner.
/// Implementations exist for both in-game use and offline (test) use.
pub trait PlannerRoomDataSource {
    /// Terrain of the region, or `None` while it is not observable.
    fn get_terrain(&self) -> Option<&FastRoomTerrain>;

    /// Resource nodes and the claim anchor, in a stable order.
    fn get_points_of_interest(&self) -> &[PointOfInterest];
}

/// Owned room data for offline planning and tests.
#[derive(Clone)]
pub struct StaticRoomData {
    terrain: Option<FastRoomTerrain>,
    points: Vec<PointOfInterest>,
}

impl StaticRoomData {
    pub fn new(terrain: FastRoomTerrain, points: Vec<PointOfInterest>) -> Self {
        StaticRoomData {
            terrain: Some(terrain),
            points,
        }
    }

    /// A region whose terrain is currently not observable.
    pub fn unobserved(points: Vec<PointOfInterest>) -> Self {
        StaticRoomData {
            terrain: None,
            points,
        }
    }
}

impl PlannerRoomDataSource for StaticRoomData {
    fn get_terrain(&self) -> Option<&FastRoomTerrain> {
        self.terrain.as_ref()
    }

    fn get_points_of_interest(&self) -> &[PointOfInterest] {
        &self.points
    }
}
