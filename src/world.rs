//! Read-only view of the live region.
//!
//! The scheduler never touches the game API. The caller provides a snapshot
//! of built structures, outstanding construction orders and the global
//! construction quota through [`WorldView`], and executes whatever the
//! scheduler hands back.

use crate::location::*;
use serde::{Deserialize, Serialize};

use screeps::constants::StructureType;

/// A structure that currently exists in the region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStructure {
    pub location: Location,
    pub structure_type: StructureType,
    pub hits: u32,
    /// Whether the structure belongs to us. Foreign structures cannot be
    /// destroyed outright and have to be worked down.
    pub owned: bool,
}

impl LiveStructure {
    pub fn new(location: Location, structure_type: StructureType, hits: u32) -> Self {
        LiveStructure {
            location,
            structure_type,
            hits,
            owned: true,
        }
    }

    pub fn foreign(mut self) -> Self {
        self.owned = false;
        self
    }
}

/// A construction order the executor has placed but that is not built yet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub location: Location,
    pub structure_type: StructureType,
}

/// Global cap on outstanding construction orders, shared by every region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ConstructionQuota {
    pub used: u32,
    pub max: u32,
}

impl ConstructionQuota {
    pub fn headroom(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

pub trait WorldView {
    /// Progression level of the region, gating which build phases are allowed.
    fn capability_tier(&self) -> u8;

    fn structures_at(&self, location: Location) -> Vec<LiveStructure>;

    fn pending_construction_at(&self, location: Location) -> Option<PendingOrder>;

    fn live_structures(&self) -> Vec<LiveStructure>;

    fn construction_quota(&self) -> ConstructionQuota;
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum DismantleMethod {
    /// Owned structure, removable immediately.
    Destroy,
    /// Foreign structure, has to be worked down.
    Dismantle,
    /// Pending order of the wrong type.
    CancelOrder,
}

/// One item of the dismantle worklist.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct DismantleEntry {
    pub location: Location,
    pub structure_type: StructureType,
    pub method: DismantleMethod,
}

/// Anything in the region that can be cleared off a tile.
pub trait Dismantlable {
    fn location(&self) -> Location;

    fn structure_type(&self) -> StructureType;

    /// How to clear it, or `None` if it cannot be cleared at all.
    fn dismantle_method(&self) -> Option<DismantleMethod>;

    fn dismantle_entry(&self) -> Option<DismantleEntry> {
        self.dismantle_method().map(|method| DismantleEntry {
            location: self.location(),
            structure_type: self.structure_type(),
            method,
        })
    }
}

impl Dismantlable for LiveStructure {
    fn location(&self) -> Location {
        self.location
    }

    fn structure_type(&self) -> StructureType {
        self.structure_type
    }

    fn dismantle_method(&self) -> Option<DismantleMethod> {
        match self.structure_type {
            // The region's ownership anchor cannot be removed.
            StructureType::Controller => None,
            _ if self.owned => Some(DismantleMethod::Destroy),
            _ => Some(DismantleMethod::Dismantle),
        }
    }
}

impl Dismantlable for PendingOrder {
    fn location(&self) -> Location {
        self.location
    }

    fn structure_type(&self) -> StructureType {
        self.structure_type
    }

    fn dismantle_method(&self) -> Option<DismantleMethod> {
        Some(DismantleMethod::CancelOrder)
    }
}

/// Whether `existing` can stay on a tile where `planned` is going.
pub fn can_coexist(existing: StructureType, planned: StructureType) -> bool {
    if existing == planned {
        return true;
    }
    match (existing, planned) {
        (StructureType::Rampart, _) | (_, StructureType::Rampart) => true,
        (StructureType::Road, StructureType::Wall) | (StructureType::Wall, StructureType::Road) => {
            false
        }
        (StructureType::Road, _) | (_, StructureType::Road) => true,
        _ => false,
    }
}

/// Owned snapshot of a region for offline use and tests.
#[derive(Clone, Debug, Default)]
pub struct SnapshotWorld {
    pub tier: u8,
    pub structures: Vec<LiveStructure>,
    pub pending: Vec<PendingOrder>,
    pub quota: ConstructionQuota,
}

impl SnapshotWorld {
    pub fn new(tier: u8, quota_max: u32) -> Self {
        SnapshotWorld {
            tier,
            structures: Vec::new(),
            pending: Vec::new(),
            quota: ConstructionQuota {
                used: 0,
                max: quota_max,
            },
        }
    }

    pub fn add_structure(&mut self, structure: LiveStructure) {
        self.structures.push(structure);
    }

    /// Place an order the way an executor would, consuming quota.
    pub fn add_pending(&mut self, location: Location, structure_type: StructureType) {
        self.pending.push(PendingOrder {
            location,
            structure_type,
        });
        self.quota.used += 1;
    }

    /// Turn every pending order into a built structure, releasing quota.
    pub fn complete_pending(&mut self, hits: u32) {
        for order in self.pending.drain(..) {
            self.structures
                .push(LiveStructure::new(order.location, order.structure_type, hits));
            self.quota.used = self.quota.used.saturating_sub(1);
        }
    }

    /// Remove every structure and order at `location` of the given type.
    pub fn clear(&mut self, location: Location, structure_type: StructureType) {
        self.structures
            .retain(|s| !(s.location == location && s.structure_type == structure_type));
        let before = self.pending.len();
        self.pending
            .retain(|o| !(o.location == location && o.structure_type == structure_type));
        let removed = (before - self.pending.len()) as u32;
        self.quota.used = self.quota.used.saturating_sub(removed);
    }
}

impl WorldView for SnapshotWorld {
    fn capability_tier(&self) -> u8 {
        self.tier
    }

    fn structures_at(&self, location: Location) -> Vec<LiveStructure> {
        self.structures
            .iter()
            .filter(|s| s.location == location)
            .cloned()
            .collect()
    }

    fn pending_construction_at(&self, location: Location) -> Option<PendingOrder> {
        self.pending.iter().find(|o| o.location == location).copied()
    }

    fn live_structures(&self) -> Vec<LiveStructure> {
        self.structures.clone()
    }

    fn construction_quota(&self) -> ConstructionQuota {
        self.quota
    }
}
