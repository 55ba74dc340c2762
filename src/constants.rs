pub const ROOM_WIDTH: u8 = 50;
pub const ROOM_HEIGHT: u8 = 50;

/// Number of tiles in a region.
pub const ROOM_AREA: usize = ROOM_WIDTH as usize * ROOM_HEIGHT as usize;

/// Sentinel distance for walls and tiles no seed can reach.
pub const DISTANCE_UNREACHABLE: u8 = 255;

// Hub selection.
pub const HUB_MIN_WALL_DISTANCE: u8 = 4;
/// The hub's edge-distance must be strictly greater than this.
pub const HUB_MIN_EDGE_DISTANCE: u8 = 8;
/// The hub must be further than this (Chebyshev) from any resource or claim anchor.
pub const HUB_POI_CLEARANCE: u8 = 3;

// Road cost grid.
pub const COST_IMPASSABLE: u8 = 255;
pub const COST_ROAD: u8 = 1;
pub const COST_OPEN: u8 = 2;
pub const COST_NEAR_WALL: u8 = 4;
pub const COST_NEAR_EXIT: u8 = 6;
/// Tiles with wall-distance up to this value pay `COST_NEAR_WALL`.
pub const NEAR_WALL_DEPTH: u8 = 1;
/// Tiles with edge-distance up to this value pay `COST_NEAR_EXIT`.
pub const NEAR_EXIT_DEPTH: u8 = 3;

// Facility flood fill.
pub const FACILITY_MIN_WALL_DISTANCE: u8 = 1;
pub const FACILITY_MIN_EDGE_DISTANCE: u8 = 5;
pub const CORE_SLOT_QUOTA: usize = 3;
/// Minimum Chebyshev distance between two core slots.
pub const CORE_SLOT_SPACING: u8 = 5;

// Perimeter.
pub const PERIMETER_EDGE_DISTANCE: u8 = 3;

// Scheduler.
pub const MAX_REQUESTS_PER_INVOCATION: usize = 5;
pub const MAX_DISMANTLES_PER_INVOCATION: usize = 5;
/// Invocations after which an unacknowledged request is forgotten and re-issued.
pub const REQUEST_RETRY_INVOCATIONS: u32 = 25;

/// Minimum capability tier of each construction phase, in phase order.
pub const PHASE_MIN_TIERS: [u8; 6] = [1, 2, 3, 4, 5, 5];

/// Hit points perimeter defenses are maintained at for a given capability tier.
/// Returns 0 when defenses are not yet worth building.
pub fn defense_hits_target(tier: u8) -> u32 {
    match tier {
        0..=4 => 0,
        5 => 300_000,
        6 => 1_000_000,
        7 => 3_000_000,
        _ => 10_000_000,
    }
}
