//! Exit topology: contiguous open runs along the region boundary.

use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use serde::{Deserialize, Serialize};

/// Boundary edge an exit segment lies on. Declaration order is the scan and
/// routing order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ExitDirection {
    Top,
    Right,
    Bottom,
    Left,
}

impl ExitDirection {
    pub const ALL: [ExitDirection; 4] = [
        ExitDirection::Top,
        ExitDirection::Right,
        ExitDirection::Bottom,
        ExitDirection::Left,
    ];

    /// Tiles of this edge, in scan order.
    fn edge_tiles(self) -> Vec<Location> {
        match self {
            ExitDirection::Top => (0..ROOM_WIDTH).map(|x| Location::from_xy(x, 0)).collect(),
            ExitDirection::Right => (0..ROOM_HEIGHT)
                .map(|y| Location::from_xy(ROOM_WIDTH - 1, y))
                .collect(),
            ExitDirection::Bottom => (0..ROOM_WIDTH)
                .map(|x| Location::from_xy(x, ROOM_HEIGHT - 1))
                .collect(),
            ExitDirection::Left => (0..ROOM_HEIGHT).map(|y| Location::from_xy(0, y)).collect(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExitSegment {
    pub direction: ExitDirection,
    pub start: Location,
    pub end: Location,
    pub midpoint: Location,
}

impl ExitSegment {
    fn from_run(direction: ExitDirection, start: Location, end: Location) -> Self {
        let midpoint = Location::from_xy(
            rounded_mean(start.x(), end.x()),
            rounded_mean(start.y(), end.y()),
        );
        ExitSegment {
            direction,
            start,
            end,
            midpoint,
        }
    }

    /// Number of tiles in the run.
    pub fn width(&self) -> usize {
        self.start.distance_to(self.end) as usize + 1
    }
}

/// Average of two coordinates, rounding halves up.
fn rounded_mean(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) / 2) as u8
}

/// Scan the four edges (top, right, bottom, left) for maximal runs of
/// non-wall tiles. Corner tiles belong to both of their edges.
pub fn find_exit_segments(terrain: &FastRoomTerrain) -> Vec<ExitSegment> {
    let mut segments = Vec::new();

    for direction in ExitDirection::ALL {
        let mut run: Option<(Location, Location)> = None;
        for tile in direction.edge_tiles() {
            if terrain.is_wall_at(tile) {
                if let Some((start, end)) = run.take() {
                    segments.push(ExitSegment::from_run(direction, start, end));
                }
            } else {
                run = match run {
                    Some((start, _)) => Some((start, tile)),
                    None => Some((tile, tile)),
                };
            }
        }
        if let Some((start, end)) = run {
            segments.push(ExitSegment::from_run(direction, start, end));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_region_has_one_segment_per_edge() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let segments = find_exit_segments(&terrain);
        let directions: Vec<ExitDirection> = segments.iter().map(|s| s.direction).collect();
        assert_eq!(directions, ExitDirection::ALL.to_vec());
        assert_eq!(segments[0].midpoint, Location::from_xy(25, 0));
        assert_eq!(segments[1].midpoint, Location::from_xy(49, 25));
        assert_eq!(segments[2].midpoint, Location::from_xy(25, 49));
        assert_eq!(segments[3].midpoint, Location::from_xy(0, 25));
        assert_eq!(segments[0].width(), 50);
    }

    #[test]
    fn splits_runs_at_walls() {
        let terrain = FastRoomTerrain::from_fn(|x, y| {
            let open_top = y == 0 && ((5..=9).contains(&x) || (20..=21).contains(&x));
            if open_top || (y > 0 && y < 49 && x > 0 && x < 49) {
                TerrainTile::Plain
            } else {
                TerrainTile::Wall
            }
        });
        let segments = find_exit_segments(&terrain);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, Location::from_xy(5, 0));
        assert_eq!(segments[0].end, Location::from_xy(9, 0));
        assert_eq!(segments[0].midpoint, Location::from_xy(7, 0));
        assert_eq!(segments[1].midpoint, Location::from_xy(21, 0));
        assert!(segments.iter().all(|s| s.direction == ExitDirection::Top));
    }

    #[test]
    fn sealed_region_has_no_exits() {
        let terrain = FastRoomTerrain::from_fn(|x, y| {
            if x == 0 || y == 0 || x == 49 || y == 49 {
                TerrainTile::Wall
            } else {
                TerrainTile::Plain
            }
        });
        assert!(find_exit_segments(&terrain).is_empty());
    }
}
