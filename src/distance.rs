//! Wall-distance and edge-distance fields.
//!
//! Both fields are multi-source Chebyshev BFS transforms over the region.
//! The wall field is seeded at every wall tile and spreads across the whole
//! grid, so an open tile's value is its exact Chebyshev distance to the
//! nearest wall. The edge field is seeded at every walkable boundary tile and
//! only spreads through walkable tiles, so walls and enclosed pockets keep
//! the `DISTANCE_UNREACHABLE` sentinel.

use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub type DistanceField = RoomDataArray<u8>;

/// The pair of distance fields every later planning step reads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceFields {
    pub wall: DistanceField,
    pub edge: DistanceField,
}

impl DistanceFields {
    pub fn build(terrain: &FastRoomTerrain) -> Self {
        DistanceFields {
            wall: wall_distance_field(terrain),
            edge: edge_distance_field(terrain),
        }
    }

    pub fn wall_at(&self, loc: Location) -> u8 {
        self.wall.at(loc)
    }

    pub fn edge_at(&self, loc: Location) -> u8 {
        self.edge.at(loc)
    }

    /// True when neither field holds a single finite value.
    pub fn is_degenerate(&self) -> bool {
        self.wall.iter().all(|(_, d)| *d == DISTANCE_UNREACHABLE)
            && self.edge.iter().all(|(_, d)| *d == DISTANCE_UNREACHABLE)
    }
}

/// Chebyshev distance from every tile to the nearest wall.
pub fn wall_distance_field(terrain: &FastRoomTerrain) -> DistanceField {
    if !terrain.has_walkable_tile() {
        return RoomDataArray::new(DISTANCE_UNREACHABLE);
    }

    let seeds: Vec<Location> = region_tiles().filter(|l| terrain.is_wall_at(*l)).collect();

    multi_source_bfs(&seeds, |_| true)
}

/// Walking distance (8-neighbourhood) from every walkable tile to the nearest
/// walkable boundary tile.
pub fn edge_distance_field(terrain: &FastRoomTerrain) -> DistanceField {
    if !terrain.has_walkable_tile() {
        return RoomDataArray::new(DISTANCE_UNREACHABLE);
    }

    let seeds: Vec<Location> = region_tiles()
        .filter(|l| l.is_boundary() && !terrain.is_wall_at(*l))
        .collect();

    multi_source_bfs(&seeds, |l| !terrain.is_wall_at(l))
}

/// Every tile of the region in row-major order.
pub fn region_tiles() -> impl Iterator<Item = Location> {
    (0..ROOM_HEIGHT).flat_map(|y| (0..ROOM_WIDTH).map(move |x| Location::from_xy(x, y)))
}

fn multi_source_bfs<F>(seeds: &[Location], passable: F) -> DistanceField
where
    F: Fn(Location) -> bool,
{
    let mut field = RoomDataArray::new(DISTANCE_UNREACHABLE);
    let mut queue = VecDeque::with_capacity(seeds.len());

    for seed in seeds {
        field.set_at(*seed, 0);
        queue.push_back(*seed);
    }

    while let Some(loc) = queue.pop_front() {
        let next = field.at(loc).saturating_add(1).min(DISTANCE_UNREACHABLE - 1);
        for &(dx, dy) in &NEIGHBORS_8 {
            if let Some(n) = loc.checked_add(dx, dy) {
                if field.at(n) == DISTANCE_UNREACHABLE && passable(n) {
                    field.set_at(n, next);
                    queue.push_back(n);
                }
            }
        }
    }

    field
}
