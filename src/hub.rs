//! Hub selection and the fixed 3x3 hub block around it.

use crate::constants::*;
use crate::distance::*;
use crate::exits::*;
use crate::location::*;
use crate::room_data::*;
use crate::terrain::*;
use log::*;

/// Rough centre of the exits as an exact rational point: `(sum_x, sum_y, n)`.
/// Regions without exits use the geometric centre.
pub fn rough_center(segments: &[ExitSegment]) -> (i64, i64, i64) {
    if segments.is_empty() {
        return ((ROOM_WIDTH / 2) as i64, (ROOM_HEIGHT / 2) as i64, 1);
    }

    let sum_x = segments.iter().map(|s| s.midpoint.x() as i64).sum();
    let sum_y = segments.iter().map(|s| s.midpoint.y() as i64).sum();
    (sum_x, sum_y, segments.len() as i64)
}

/// Walkable, far enough from walls and from every exit.
pub fn meets_distance_thresholds(loc: Location, terrain: &FastRoomTerrain, fields: &DistanceFields) -> bool {
    !terrain.is_wall_at(loc)
        && fields.wall_at(loc) >= HUB_MIN_WALL_DISTANCE
        && fields.edge_at(loc) > HUB_MIN_EDGE_DISTANCE
}

/// Leaves room for a point of interest's own access tiles.
pub fn clears_points_of_interest(loc: Location, points: &[PointOfInterest]) -> bool {
    points
        .iter()
        .all(|p| p.location.distance_to(loc) > HUB_POI_CLEARANCE)
}

/// True when `loc` satisfies every hub requirement.
pub fn is_hub_candidate(
    loc: Location,
    terrain: &FastRoomTerrain,
    fields: &DistanceFields,
    points: &[PointOfInterest],
) -> bool {
    meets_distance_thresholds(loc, terrain, fields) && clears_points_of_interest(loc, points)
}

/// Pick the candidate tile closest to the rough centre of the exits.
/// Ties go to the first tile in row-major order.
pub fn select_hub(
    terrain: &FastRoomTerrain,
    fields: &DistanceFields,
    segments: &[ExitSegment],
    points: &[PointOfInterest],
) -> Option<Location> {
    let (sum_x, sum_y, n) = rough_center(segments);

    let mut best: Option<(i64, Location)> = None;
    for loc in region_tiles() {
        if !is_hub_candidate(loc, terrain, fields, points) {
            continue;
        }
        let dx = n * loc.x() as i64 - sum_x;
        let dy = n * loc.y() as i64 - sum_y;
        let score = dx * dx + dy * dy;
        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, loc));
        }
    }

    match best {
        Some((_, hub)) => {
            debug!("Selected hub at ({}, {})", hub.x(), hub.y());
            Some(hub)
        }
        None => {
            let crowded = region_tiles()
                .filter(|&loc| meets_distance_thresholds(loc, terrain, fields))
                .count();
            if crowded > 0 {
                warn!(
                    "{} tiles meet the hub distance thresholds but all lie within {} of a point of interest",
                    crowded, HUB_POI_CLEARANCE
                );
            } else {
                debug!("No tile satisfies the hub distance thresholds");
            }
            None
        }
    }
}

/// The hub's four orthogonal neighbours. Every road ends on one of them.
pub fn entrance_ring(hub: Location) -> Vec<Location> {
    NEIGHBORS_4
        .iter()
        .filter_map(|&(dx, dy)| hub.checked_add(dx, dy))
        .collect()
}

/// The hub's diagonal neighbours (NW, NE, SE, SW), reserved for fixed-purpose slots.
pub fn reserved_diagonals(hub: Location) -> Vec<Location> {
    DIAGONALS
        .iter()
        .filter_map(|&(dx, dy)| hub.checked_add(dx, dy))
        .collect()
}
