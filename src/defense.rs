//! Perimeter ring: walls along a fixed contour of the edge-distance field.
//!
//! Every walkable tile at exactly `PERIMETER_EDGE_DISTANCE` tiles' walk from
//! an exit gets a defensive structure. Where a planned road crosses the ring
//! the tile gets a rampart so friendly traffic keeps flowing, elsewhere a
//! wall.

use crate::constants::*;
use crate::distance::*;
use crate::layout::*;
use crate::location::*;
use crate::plan::*;
use crate::terrain::*;
use log::*;

use screeps::constants::StructureType;

pub fn place_perimeter(
    terrain: &FastRoomTerrain,
    fields: &DistanceFields,
    grid: &LayoutGrid,
) -> Vec<DefenseSlot> {
    let ring: Vec<DefenseSlot> = region_tiles()
        .filter(|&loc| {
            !loc.is_boundary()
                && !terrain.is_wall_at(loc)
                && fields.edge_at(loc) == PERIMETER_EDGE_DISTANCE
        })
        .filter_map(|loc| {
            let structure_type = match grid.occupancy_at(loc) {
                Occupancy::Road => StructureType::Rampart,
                Occupancy::Free | Occupancy::Access => StructureType::Wall,
                Occupancy::Facility | Occupancy::Reserved | Occupancy::Blocked => return None,
            };
            Some(DefenseSlot {
                location: loc,
                structure_type,
            })
        })
        .collect();

    debug!(
        "Perimeter ring has {} tiles ({} ramparts)",
        ring.len(),
        ring.iter()
            .filter(|d| d.structure_type == StructureType::Rampart)
            .count()
    );

    ring
}
