//! Road routing from every point of interest to the hub.
//!
//! Routes are computed one at a time over the shared cost grid in
//! `LayoutGrid`. Each committed route lowers the cost of its tiles, so later
//! routes merge onto earlier ones and form shared trunks. Routing order is
//! therefore part of the output and is fixed: exits (by direction, then
//! discovery order), then the claim anchor, then resources in input order.

use crate::constants::*;
use crate::error::PlannerError;
use crate::exits::*;
use crate::hub::*;
use crate::layout::*;
use crate::location::*;
use crate::plan::*;
use crate::room_data::*;
use crate::terrain::*;
use log::*;
use pathfinding::directed::astar::astar;
use serde::{Deserialize, Serialize};

/// Pathfinding service used by the router. The caller owns the cost grid;
/// `COST_IMPASSABLE` tiles must never be entered.
pub trait PathSearch {
    /// Shortest path from `from` to any of `goals`, including both endpoints.
    fn search(
        &self,
        from: Location,
        goals: &[Location],
        costs: &RoomDataArray<u8>,
    ) -> Option<Vec<Location>>;
}

/// Default A* search over the 8-neighbourhood.
pub struct AStarPathSearch;

impl PathSearch for AStarPathSearch {
    fn search(
        &self,
        from: Location,
        goals: &[Location],
        costs: &RoomDataArray<u8>,
    ) -> Option<Vec<Location>> {
        if goals.is_empty() {
            return None;
        }

        astar(
            &from,
            |&loc| {
                NEIGHBORS_8
                    .iter()
                    .filter_map(move |&(dx, dy)| {
                        let next = loc.checked_add(dx, dy)?;
                        let cost = costs.at(next);
                        if cost == COST_IMPASSABLE {
                            None
                        } else {
                            Some((next, cost as u32))
                        }
                    })
                    .collect::<Vec<_>>()
            },
            // Committed roads are the cheapest step, so this never overestimates.
            |&loc| {
                goals
                    .iter()
                    .map(|g| g.distance_to(loc) as u32 * COST_ROAD as u32)
                    .min()
                    .unwrap_or(0)
            },
            |loc| goals.contains(loc),
        )
        .map(|(path, _cost)| path)
    }
}

/// One point to connect to the hub.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct RouteTarget {
    pub kind: RouteKind,
    pub origin: Location,
}

/// All route targets in routing order.
pub fn route_targets(segments: &[ExitSegment], points: &[PointOfInterest]) -> Vec<RouteTarget> {
    let mut exits: Vec<(usize, &ExitSegment)> = segments.iter().enumerate().collect();
    exits.sort_by_key(|(discovery, s)| (s.direction, *discovery));

    let exit_targets = exits.into_iter().map(|(_, s)| RouteTarget {
        kind: RouteKind::Exit(s.direction),
        origin: s.midpoint,
    });

    let anchors = points
        .iter()
        .filter(|p| p.kind == PoiKind::ClaimAnchor)
        .map(|p| RouteTarget {
            kind: RouteKind::ClaimAnchor,
            origin: p.location,
        });

    let resources = points
        .iter()
        .filter(|p| p.kind == PoiKind::Resource)
        .map(|p| RouteTarget {
            kind: RouteKind::Resource,
            origin: p.location,
        });

    exit_targets.chain(anchors).chain(resources).collect()
}

/// Route a single target to the hub's entrance ring and commit the result
/// into `grid`. Unreachable targets are flagged rather than failing the plan.
pub fn route_target(
    target: RouteTarget,
    hub: Location,
    grid: &mut LayoutGrid,
    search: &dyn PathSearch,
) -> RoadPath {
    let ring = entrance_ring(hub);

    let path = match search.search(target.origin, &ring, &grid.costs) {
        Some(path) => path,
        None => {
            warn!("{}", PlannerError::UnreachablePointOfInterest(target.origin));
            return RoadPath::unreachable(target.kind, target.origin);
        }
    };

    let mut steps = path.into_iter().skip(1).peekable();

    // The container sits on the first step off the origin, unless that step
    // already belongs to an earlier route's road.
    let access = if target.kind.has_access_container() {
        match steps.peek() {
            Some(first) if grid.is_free(*first) => steps.next(),
            _ => None,
        }
    } else {
        None
    };

    let tiles: Vec<Location> = steps.collect();

    if let Some(access) = access {
        grid.commit_facility(access);
    }
    for tile in &tiles {
        grid.commit_road(*tile);
    }

    trace!(
        "Routed {:?} from ({}, {}) with {} road tiles",
        target.kind,
        target.origin.x(),
        target.origin.y(),
        tiles.len()
    );

    RoadPath {
        kind: target.kind,
        origin: target.origin,
        access,
        tiles,
        unreachable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::*;

    fn open_grid(hub: Location, points: &[PointOfInterest]) -> (FastRoomTerrain, LayoutGrid) {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let fields = DistanceFields::build(&terrain);
        let grid = LayoutGrid::new(&terrain, &fields, hub, points);
        (terrain, grid)
    }

    #[test]
    fn targets_are_ordered_exits_anchor_resources() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let segments = find_exit_segments(&terrain);
        let points = [
            PointOfInterest::resource(10, 10),
            PointOfInterest::claim_anchor(30, 30),
            PointOfInterest::resource(40, 12),
        ];
        let targets = route_targets(&segments, &points);
        let kinds: Vec<RouteKind> = targets.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RouteKind::Exit(ExitDirection::Top),
                RouteKind::Exit(ExitDirection::Right),
                RouteKind::Exit(ExitDirection::Bottom),
                RouteKind::Exit(ExitDirection::Left),
                RouteKind::ClaimAnchor,
                RouteKind::Resource,
                RouteKind::Resource,
            ]
        );
        assert_eq!(targets[5].origin, Location::from_xy(10, 10));
        assert_eq!(targets[6].origin, Location::from_xy(40, 12));
    }

    #[test]
    fn resource_route_reaches_ring_with_container() {
        let hub = Location::from_xy(25, 25);
        let points = [PointOfInterest::resource(10, 10)];
        let (_, mut grid) = open_grid(hub, &points);

        let path = route_target(
            RouteTarget {
                kind: RouteKind::Resource,
                origin: points[0].location,
            },
            hub,
            &mut grid,
            &AStarPathSearch,
        );

        assert!(!path.unreachable);
        let access = path.access.unwrap();
        assert_eq!(access.distance_to(points[0].location), 1);
        assert_eq!(grid.occupancy_at(access), Occupancy::Facility);
        assert!(entrance_ring(hub).contains(path.tiles.last().unwrap()));
        assert!(path.tiles.iter().all(|t| grid.is_road(*t)));
        assert!(!path.tiles.contains(&access));
        for pair in path.tiles.windows(2) {
            assert_eq!(pair[0].distance_to(pair[1]), 1);
        }
    }

    #[test]
    fn later_routes_merge_into_existing_roads() {
        let hub = Location::from_xy(25, 25);
        let points = [
            PointOfInterest::resource(10, 25),
            PointOfInterest::resource(10, 23),
        ];
        let (_, mut grid) = open_grid(hub, &points);

        let first = route_target(
            RouteTarget {
                kind: RouteKind::Resource,
                origin: points[0].location,
            },
            hub,
            &mut grid,
            &AStarPathSearch,
        );
        let second = route_target(
            RouteTarget {
                kind: RouteKind::Resource,
                origin: points[1].location,
            },
            hub,
            &mut grid,
            &AStarPathSearch,
        );

        let shared = second
            .tiles
            .iter()
            .filter(|t| first.tiles.contains(t))
            .count();
        assert!(shared > second.tiles.len() / 2);
    }

    #[test]
    fn enclosed_point_is_flagged_unreachable() {
        let hub = Location::from_xy(25, 25);
        let terrain = FastRoomTerrain::from_fn(|x, y| {
            let around = Location::from_xy(x, y).distance_to(Location::from_xy(8, 8)) == 2;
            if around {
                TerrainTile::Wall
            } else {
                TerrainTile::Plain
            }
        });
        let fields = DistanceFields::build(&terrain);
        let points = [PointOfInterest::resource(8, 8)];
        let mut grid = LayoutGrid::new(&terrain, &fields, hub, &points);

        let path = route_target(
            RouteTarget {
                kind: RouteKind::Resource,
                origin: points[0].location,
            },
            hub,
            &mut grid,
            &AStarPathSearch,
        );
        assert!(path.unreachable);
        assert!(path.tiles.is_empty());
        assert_eq!(path.access, None);
    }

    #[test]
    fn exit_routes_have_no_container() {
        let hub = Location::from_xy(25, 25);
        let (_, mut grid) = open_grid(hub, &[]);
        let path = route_target(
            RouteTarget {
                kind: RouteKind::Exit(ExitDirection::Top),
                origin: Location::from_xy(25, 0),
            },
            hub,
            &mut grid,
            &AStarPathSearch,
        );
        assert_eq!(path.access, None);
        assert!(path.tiles.iter().all(|t| !t.is_boundary()));
        assert_eq!(path.tiles.last(), Some(&Location::from_xy(25, 24)));
    }
}
