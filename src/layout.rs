//! Shared working grids for routing and placement.
//!
//! `costs` is the road cost grid handed to path search. `occupancy` records
//! what each tile has been committed to, and is what placement predicates
//! read. Both are updated together so every commit affects later steps.

use crate::constants::*;
use crate::distance::*;
use crate::hub::*;
use crate::location::*;
use crate::room_data::*;
use crate::terrain::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Occupancy {
    Free,
    Road,
    /// Kept clear next to a facility so an access road can be added later.
    Access,
    Facility,
    /// Pre-reserved hub block tile for a fixed-purpose slot.
    Reserved,
    /// Hub tile, points of interest.
    Blocked,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutGrid {
    pub costs: RoomDataArray<u8>,
    pub occupancy: RoomDataArray<Occupancy>,
}

impl LayoutGrid {
    /// Base grid: terrain-derived costs plus the hub block and points of interest.
    pub fn new(
        terrain: &FastRoomTerrain,
        fields: &DistanceFields,
        hub: Location,
        points: &[PointOfInterest],
    ) -> Self {
        let mut grid = LayoutGrid {
            costs: RoomDataArray::new(COST_IMPASSABLE),
            occupancy: RoomDataArray::new(Occupancy::Free),
        };

        for loc in region_tiles() {
            grid.costs.set_at(loc, base_cost(loc, terrain, fields));
        }

        for point in points {
            grid.mark(point.location, Occupancy::Blocked, COST_IMPASSABLE);
        }

        grid.mark(hub, Occupancy::Blocked, COST_IMPASSABLE);
        for loc in reserved_diagonals(hub) {
            grid.mark(loc, Occupancy::Reserved, COST_IMPASSABLE);
        }
        for loc in entrance_ring(hub) {
            grid.commit_road(loc);
        }

        grid
    }

    fn mark(&mut self, loc: Location, occupancy: Occupancy, cost: u8) {
        self.occupancy.set_at(loc, occupancy);
        self.costs.set_at(loc, cost);
    }

    pub fn occupancy_at(&self, loc: Location) -> Occupancy {
        self.occupancy.at(loc)
    }

    pub fn cost_at(&self, loc: Location) -> u8 {
        self.costs.at(loc)
    }

    pub fn is_road(&self, loc: Location) -> bool {
        self.occupancy_at(loc) == Occupancy::Road
    }

    pub fn is_free(&self, loc: Location) -> bool {
        self.occupancy_at(loc) == Occupancy::Free
    }

    /// Later routes prefer committed roads, merging into shared trunks.
    pub fn commit_road(&mut self, loc: Location) {
        self.mark(loc, Occupancy::Road, COST_ROAD);
    }

    pub fn commit_facility(&mut self, loc: Location) {
        self.mark(loc, Occupancy::Facility, COST_IMPASSABLE);
    }

    /// Keep a free tile clear for a future access road. Other states are left alone.
    pub fn reserve_access(&mut self, loc: Location) {
        if self.is_free(loc) {
            self.occupancy.set_at(loc, Occupancy::Access);
        }
    }
}

/// Terrain-derived road cost. Plain and swamp cost the same since roads
/// equalize terrain; tiles hugging walls or exits cost more.
pub fn base_cost(loc: Location, terrain: &FastRoomTerrain, fields: &DistanceFields) -> u8 {
    if terrain.is_wall_at(loc) || loc.is_boundary() {
        COST_IMPASSABLE
    } else if fields.edge_at(loc) <= NEAR_EXIT_DEPTH {
        COST_NEAR_EXIT
    } else if fields.wall_at(loc) <= NEAR_WALL_DEPTH {
        COST_NEAR_WALL
    } else {
        COST_OPEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_for(terrain: &FastRoomTerrain, hub: Location) -> LayoutGrid {
        let fields = DistanceFields::build(terrain);
        LayoutGrid::new(terrain, &fields, hub, &[PointOfInterest::resource(10, 10)])
    }

    #[test]
    fn hub_block_is_laid_out() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let hub = Location::from_xy(25, 25);
        let grid = grid_for(&terrain, hub);

        assert_eq!(grid.occupancy_at(hub), Occupancy::Blocked);
        for loc in entrance_ring(hub) {
            assert!(grid.is_road(loc));
            assert_eq!(grid.cost_at(loc), COST_ROAD);
        }
        for loc in reserved_diagonals(hub) {
            assert_eq!(grid.occupancy_at(loc), Occupancy::Reserved);
            assert_eq!(grid.cost_at(loc), COST_IMPASSABLE);
        }
        assert_eq!(grid.occupancy_at(Location::from_xy(10, 10)), Occupancy::Blocked);
    }

    #[test]
    fn costs_penalize_walls_and_exits_but_not_swamp() {
        let terrain = FastRoomTerrain::from_fn(|x, y| match (x, y) {
            (30, 30) => TerrainTile::Wall,
            (20, 20) => TerrainTile::Swamp,
            _ => TerrainTile::Plain,
        });
        let grid = grid_for(&terrain, Location::from_xy(25, 15));

        assert_eq!(grid.cost_at(Location::from_xy(30, 30)), COST_IMPASSABLE);
        assert_eq!(grid.cost_at(Location::from_xy(31, 31)), COST_NEAR_WALL);
        assert_eq!(grid.cost_at(Location::from_xy(20, 20)), COST_OPEN);
        assert_eq!(grid.cost_at(Location::from_xy(21, 20)), COST_OPEN);
        assert_eq!(grid.cost_at(Location::from_xy(2, 20)), COST_NEAR_EXIT);
        assert_eq!(grid.cost_at(Location::from_xy(0, 20)), COST_IMPASSABLE);
    }

    #[test]
    fn access_reservation_only_claims_free_tiles() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let hub = Location::from_xy(25, 25);
        let mut grid = grid_for(&terrain, hub);

        let ring_tile = entrance_ring(hub)[0];
        grid.reserve_access(ring_tile);
        assert!(grid.is_road(ring_tile));

        let open = Location::from_xy(30, 30);
        grid.reserve_access(open);
        assert_eq!(grid.occupancy_at(open), Occupancy::Access);
    }
}
