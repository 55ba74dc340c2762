use crate::exits::*;
use crate::hub::*;
use crate::location::*;
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

use screeps::constants::StructureType;

/// Schema version written with every persisted plan.
pub const PLAN_VERSION: u32 = 1;

/// What a road route connects to the hub.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum RouteKind {
    Exit(ExitDirection),
    ClaimAnchor,
    Resource,
}

impl RouteKind {
    /// Routes that end in a container next to their origin.
    pub fn has_access_container(self) -> bool {
        matches!(self, RouteKind::ClaimAnchor | RouteKind::Resource)
    }
}

/// A routed road from a point of interest to the hub's entrance ring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadPath {
    pub kind: RouteKind,
    pub origin: Location,
    /// Container tile directly next to the origin, if the route has one.
    #[serde(default)]
    pub access: Option<Location>,
    /// Road tiles ordered from the origin towards the hub.
    pub tiles: Vec<Location>,
    #[serde(default)]
    pub unreachable: bool,
}

impl RoadPath {
    pub fn unreachable(kind: RouteKind, origin: Location) -> Self {
        RoadPath {
            kind,
            origin,
            access: None,
            tiles: Vec::new(),
            unreachable: true,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum SlotKind {
    Core,
    Storage,
    Link,
    Terminal,
    Container,
}

impl SlotKind {
    pub fn structure_type(self) -> StructureType {
        match self {
            SlotKind::Core => StructureType::Spawn,
            SlotKind::Storage => StructureType::Storage,
            SlotKind::Link => StructureType::Link,
            SlotKind::Terminal => StructureType::Terminal,
            SlotKind::Container => StructureType::Container,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct FacilitySlot {
    pub kind: SlotKind,
    pub location: Location,
}

/// One tile of the perimeter ring.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct DefenseSlot {
    pub location: Location,
    /// `Rampart` where a road crosses the ring, `Wall` elsewhere.
    pub structure_type: StructureType,
}

/// The persisted layout of one region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub version: u32,
    pub hub: Location,
    pub exit_segments: Vec<ExitSegment>,
    pub road_paths: Vec<RoadPath>,
    pub facility_slots: Vec<FacilitySlot>,
    #[serde(default)]
    pub perimeter: Vec<DefenseSlot>,
    /// Set when the flood fill ran out of tiles before every quota was met.
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default)]
    pub terrain_fingerprint: u64,
}

impl Plan {
    pub fn entrance_ring(&self) -> Vec<Location> {
        entrance_ring(self.hub)
    }

    /// Every road tile in route order followed by the entrance ring, without duplicates.
    pub fn road_tiles(&self) -> Vec<Location> {
        let mut seen = FnvHashSet::default();
        self.road_paths
            .iter()
            .flat_map(|p| p.tiles.iter().copied())
            .chain(self.entrance_ring())
            .filter(|l| seen.insert(*l))
            .collect()
    }

    pub fn slots_of(&self, kind: SlotKind) -> Vec<Location> {
        self.facility_slots
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.location)
            .collect()
    }

    pub fn storage(&self) -> Option<Location> {
        self.slots_of(SlotKind::Storage).first().copied()
    }

    pub fn unreachable_origins(&self) -> Vec<Location> {
        self.road_paths
            .iter()
            .filter(|p| p.unreachable)
            .map(|p| p.origin)
            .collect()
    }

    pub fn has_defense_at(&self, location: Location, structure_type: StructureType) -> bool {
        self.perimeter
            .iter()
            .any(|d| d.location == location && d.structure_type == structure_type)
    }
}
