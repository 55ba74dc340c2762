//! Facility placement by flood fill outward from the hub.
//!
//! Quotas are consumed strictly in order. The first core takes a hub
//! diagonal when one can serve it, the remaining cores are found by a
//! breadth-first fill over buildable tiles, and the fixed-purpose slots take
//! the diagonals left over. Every placement is committed to the shared
//! `LayoutGrid` immediately, so it constrains every later candidate.

use crate::constants::*;
use crate::distance::*;
use crate::hub::*;
use crate::layout::*;
use crate::location::*;
use crate::plan::*;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Slots on the hub diagonals not taken by the first core, in diagonal order.
pub const FIXED_SLOTS: [SlotKind; 3] = [SlotKind::Storage, SlotKind::Link, SlotKind::Terminal];

/// The ordered quota queue.
pub fn facility_quotas() -> VecDeque<SlotKind> {
    std::iter::repeat(SlotKind::Core)
        .take(CORE_SLOT_QUOTA)
        .chain(FIXED_SLOTS)
        .collect()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FacilityPlacement {
    pub slots: Vec<FacilitySlot>,
    /// True when some quota could not be met.
    pub incomplete: bool,
}

/// Tiles the flood fill may enter.
fn is_fill_tile(
    loc: Location,
    terrain: &FastRoomTerrain,
    fields: &DistanceFields,
    grid: &LayoutGrid,
) -> bool {
    !terrain.is_wall_at(loc)
        && fields.wall_at(loc) >= FACILITY_MIN_WALL_DISTANCE
        && fields.edge_at(loc) >= FACILITY_MIN_EDGE_DISTANCE
        && !matches!(
            grid.occupancy_at(loc),
            Occupancy::Facility | Occupancy::Blocked
        )
}

/// All four orthogonal neighbours open for access roads.
fn has_core_access(loc: Location, terrain: &FastRoomTerrain, grid: &LayoutGrid) -> bool {
    NEIGHBORS_4.iter().all(|&(dx, dy)| {
        loc.checked_add(dx, dy).map_or(false, |n| {
            !terrain.is_wall_at(n)
                && matches!(grid.occupancy_at(n), Occupancy::Free | Occupancy::Road)
        })
    })
}

fn is_reserved_tile(loc: Location, terrain: &FastRoomTerrain, grid: &LayoutGrid) -> bool {
    grid.occupancy_at(loc) == Occupancy::Reserved && !terrain.is_wall_at(loc)
}

/// A flood-filled core needs its own tile free, access on every side, and
/// its distance from other cores.
fn is_core_site(
    loc: Location,
    terrain: &FastRoomTerrain,
    grid: &LayoutGrid,
    cores: &[Location],
) -> bool {
    grid.is_free(loc)
        && has_core_access(loc, terrain, grid)
        && cores.iter().all(|c| c.distance_to(loc) >= CORE_SLOT_SPACING)
}

fn commit_core(loc: Location, grid: &mut LayoutGrid) {
    grid.commit_facility(loc);
    for &(dx, dy) in &NEIGHBORS_4 {
        if let Some(n) = loc.checked_add(dx, dy) {
            grid.reserve_access(n);
        }
    }
}

pub fn place_facilities(
    hub: Location,
    terrain: &FastRoomTerrain,
    fields: &DistanceFields,
    grid: &mut LayoutGrid,
) -> FacilityPlacement {
    let mut quotas = facility_quotas();
    let mut placement = FacilityPlacement::default();
    let mut cores: Vec<Location> = Vec::new();
    let mut diagonals = reserved_diagonals(hub);

    // First core on the hub block.
    let hub_core = diagonals
        .iter()
        .position(|&loc| is_reserved_tile(loc, terrain, grid) && has_core_access(loc, terrain, grid));
    if let Some(index) = hub_core {
        let loc = diagonals.remove(index);
        commit_core(loc, grid);
        cores.push(loc);
        placement.slots.push(FacilitySlot {
            kind: SlotKind::Core,
            location: loc,
        });
        quotas.pop_front();
    }

    let mut visited = RoomDataArray::new(false);
    let mut queue = VecDeque::new();
    visited.set_at(hub, true);
    queue.push_back(hub);

    while let Some(loc) = queue.pop_front() {
        if quotas.front() != Some(&SlotKind::Core) {
            break;
        }

        if is_core_site(loc, terrain, grid, &cores) {
            commit_core(loc, grid);
            cores.push(loc);
            placement.slots.push(FacilitySlot {
                kind: SlotKind::Core,
                location: loc,
            });
            quotas.pop_front();
            continue;
        }

        for &(dx, dy) in &NEIGHBORS_8 {
            if let Some(n) = loc.checked_add(dx, dy) {
                if !visited.at(n) && is_fill_tile(n, terrain, fields, grid) {
                    visited.set_at(n, true);
                    queue.push_back(n);
                }
            }
        }
    }

    while quotas.front() == Some(&SlotKind::Core) {
        quotas.pop_front();
        placement.incomplete = true;
    }
    if placement.incomplete {
        warn!(
            "Flood fill exhausted with {} of {} core slots placed",
            cores.len(),
            CORE_SLOT_QUOTA
        );
    }

    let mut diagonals = diagonals.into_iter();
    while let Some(kind) = quotas.pop_front() {
        match diagonals.find(|&loc| is_reserved_tile(loc, terrain, grid)) {
            Some(loc) => {
                grid.commit_facility(loc);
                placement.slots.push(FacilitySlot {
                    kind,
                    location: loc,
                });
            }
            None => {
                warn!("No reserved hub tile left for {:?}", kind);
                placement.incomplete = true;
            }
        }
    }

    placement
}
