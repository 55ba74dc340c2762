//! Phase-ordered construction scheduling against a live region.
//!
//! Every invocation scans the phases in order and works only on the first
//! one that is not yet realized. A position counts as realized when a
//! matching structure is built, the world holds a matching pending order, or
//! this scheduler has issued a request the world has not acknowledged yet.
//! Issued requests are remembered in `SchedulerState`, which the caller
//! persists, so re-running without a world change issues nothing new.

use crate::constants::*;
use crate::location::*;
use crate::pipeline::CpuBudget;
use crate::plan::*;
use crate::world::*;
use fnv::FnvHashSet;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};

use screeps::constants::StructureType;

/// Schema version of the persisted scheduler state.
pub const SCHEDULER_STATE_VERSION: u32 = 1;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Phase {
    ResourceAccess,
    AnchorAccess,
    RoadNetwork,
    CentralStorage,
    PerimeterDefense,
    Decommission,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::ResourceAccess,
        Phase::AnchorAccess,
        Phase::RoadNetwork,
        Phase::CentralStorage,
        Phase::PerimeterDefense,
        Phase::Decommission,
    ];

    pub fn min_tier(self) -> u8 {
        PHASE_MIN_TIERS[self as usize]
    }
}

/// Scheduler caps, overridable per region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub max_requests_per_invocation: usize,
    pub max_dismantles_per_invocation: usize,
    pub request_retry_invocations: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_requests_per_invocation: MAX_REQUESTS_PER_INVOCATION,
            max_dismantles_per_invocation: MAX_DISMANTLES_PER_INVOCATION,
            request_retry_invocations: REQUEST_RETRY_INVOCATIONS,
        }
    }
}

/// A structure the plan wants at a location.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct PlannedPosition {
    pub location: Location,
    pub structure_type: StructureType,
}

impl PlannedPosition {
    fn new(location: Location, structure_type: StructureType) -> Self {
        PlannedPosition {
            location,
            structure_type,
        }
    }
}

/// Order for the executor to place a construction order.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConstructionRequest {
    pub location: Location,
    pub structure_type: StructureType,
    pub phase: Phase,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct IssuedRequest {
    pub location: Location,
    pub structure_type: StructureType,
    pub phase: Phase,
    pub issued_at: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub invocation: u32,
    #[serde(default)]
    pub issued: Vec<IssuedRequest>,
}

impl SchedulerState {
    fn is_issued(&self, position: &PlannedPosition) -> bool {
        self.issued
            .iter()
            .any(|r| r.location == position.location && r.structure_type == position.structure_type)
    }

    pub fn in_flight(&self) -> usize {
        self.issued.len()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// No budget this invocation; nothing was evaluated.
    Deferred,
    InProgress(Phase),
    /// The phase has work left but the global quota is used up.
    QuotaExhausted(Phase),
    AwaitingTier { phase: Phase, required: u8 },
    /// Every phase is realized.
    Complete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleOutcome {
    pub status: ScheduleStatus,
    pub requests: Vec<ConstructionRequest>,
    pub dismantle: Vec<DismantleEntry>,
    /// Planned defenses standing below the tier's hit target.
    pub repair_intents: Vec<Location>,
}

impl ScheduleOutcome {
    fn with_status(status: ScheduleStatus) -> Self {
        ScheduleOutcome {
            status,
            requests: Vec::new(),
            dismantle: Vec::new(),
            repair_intents: Vec::new(),
        }
    }
}

/// Positions of every build phase. A position belongs to the first phase
/// that lists it.
pub fn planned_positions(plan: &Plan) -> Vec<(Phase, Vec<PlannedPosition>)> {
    let route_positions = |kind: RouteKind| -> Vec<PlannedPosition> {
        plan.road_paths
            .iter()
            .filter(|p| p.kind == kind)
            .flat_map(|p| {
                p.access
                    .map(|l| PlannedPosition::new(l, SlotKind::Container.structure_type()))
                    .into_iter()
                    .chain(p.tiles.iter().map(|l| PlannedPosition::new(*l, StructureType::Road)))
            })
            .collect()
    };

    let candidates = [
        (Phase::ResourceAccess, route_positions(RouteKind::Resource)),
        (Phase::AnchorAccess, route_positions(RouteKind::ClaimAnchor)),
        (
            Phase::RoadNetwork,
            plan.road_tiles()
                .into_iter()
                .map(|l| PlannedPosition::new(l, StructureType::Road))
                .collect(),
        ),
        (
            Phase::CentralStorage,
            plan.storage()
                .map(|l| PlannedPosition::new(l, SlotKind::Storage.structure_type()))
                .into_iter()
                .collect(),
        ),
        (
            Phase::PerimeterDefense,
            plan.perimeter
                .iter()
                .map(|d| PlannedPosition::new(d.location, d.structure_type))
                .collect(),
        ),
    ];

    let mut seen = FnvHashSet::default();
    candidates
        .into_iter()
        .map(|(phase, positions)| {
            let owned = positions.into_iter().filter(|p| seen.insert(*p)).collect();
            (phase, owned)
        })
        .collect()
}

#[derive(Default)]
struct PhaseScan {
    missing: Vec<PlannedPosition>,
    dismantle: Vec<DismantleEntry>,
    repairs: Vec<Location>,
}

impl PhaseScan {
    fn is_realized(&self) -> bool {
        self.missing.is_empty() && self.dismantle.is_empty() && self.repairs.is_empty()
    }
}

pub struct ConstructionScheduler<'a> {
    plan: &'a Plan,
    config: &'a PlannerConfig,
}

impl<'a> ConstructionScheduler<'a> {
    pub fn new(plan: &'a Plan, config: &'a PlannerConfig) -> Self {
        ConstructionScheduler { plan, config }
    }

    pub fn run(
        &self,
        state: &mut SchedulerState,
        world: &dyn WorldView,
        budget: &CpuBudget,
    ) -> ScheduleOutcome {
        if !budget.has_budget() {
            return ScheduleOutcome::with_status(ScheduleStatus::Deferred);
        }

        state.invocation = state.invocation.wrapping_add(1);
        self.prune_issued(state, world);

        let tier = world.capability_tier();
        let positions = planned_positions(self.plan);

        for phase in Phase::ALL {
            let scan = match phase {
                Phase::Decommission => self.scan_legacy(world),
                _ => {
                    let phase_positions = positions
                        .iter()
                        .find(|(p, _)| *p == phase)
                        .map(|(_, list)| list.as_slice())
                        .unwrap_or(&[]);
                    let hits_target = if phase == Phase::PerimeterDefense {
                        defense_hits_target(tier)
                    } else {
                        0
                    };
                    self.scan_positions(phase_positions, hits_target, state, world)
                }
            };

            if scan.is_realized() {
                continue;
            }

            if tier < phase.min_tier() {
                debug!(
                    "{:?} waiting for tier {} (currently {})",
                    phase,
                    phase.min_tier(),
                    tier
                );
                return ScheduleOutcome::with_status(ScheduleStatus::AwaitingTier {
                    phase,
                    required: phase.min_tier(),
                });
            }

            return self.advance(phase, scan, state, world);
        }

        ScheduleOutcome::with_status(ScheduleStatus::Complete)
    }

    /// Forget requests the world has acknowledged, and requests it never
    /// acknowledged within the retry window so they get issued again.
    fn prune_issued(&self, state: &mut SchedulerState, world: &dyn WorldView) {
        let invocation = state.invocation;
        let retry_after = self.config.request_retry_invocations;

        state.issued.retain(|request| {
            let built = world
                .structures_at(request.location)
                .iter()
                .any(|s| s.structure_type == request.structure_type);
            let pending = world
                .pending_construction_at(request.location)
                .map_or(false, |o| o.structure_type == request.structure_type);
            if built || pending {
                return false;
            }

            let expired = invocation.wrapping_sub(request.issued_at) >= retry_after;
            if expired {
                debug!(
                    "Request for {:?} at ({}, {}) was never acknowledged, re-issuing",
                    request.structure_type,
                    request.location.x(),
                    request.location.y()
                );
            }
            !expired
        });
    }

    fn scan_positions(
        &self,
        positions: &[PlannedPosition],
        hits_target: u32,
        state: &SchedulerState,
        world: &dyn WorldView,
    ) -> PhaseScan {
        let mut scan = PhaseScan::default();

        for position in positions {
            let live = world.structures_at(position.location);

            if let Some(existing) = live
                .iter()
                .find(|s| s.structure_type == position.structure_type)
            {
                if existing.hits < hits_target {
                    scan.repairs.push(position.location);
                }
                continue;
            }

            let pending = world.pending_construction_at(position.location);
            if pending.map_or(false, |o| o.structure_type == position.structure_type)
                || state.is_issued(position)
            {
                continue;
            }

            let mut blocked = false;
            for conflict in live
                .iter()
                .filter(|s| !can_coexist(s.structure_type, position.structure_type))
            {
                blocked = true;
                if let Some(entry) = conflict.dismantle_entry() {
                    warn!(
                        "{:?} at ({}, {}) is in the way of planned {:?}",
                        conflict.structure_type,
                        position.location.x(),
                        position.location.y(),
                        position.structure_type
                    );
                    scan.dismantle.push(entry);
                }
            }
            if let Some(order) =
                pending.filter(|o| !can_coexist(o.structure_type, position.structure_type))
            {
                blocked = true;
                scan.dismantle.extend(order.dismantle_entry());
            }

            if !blocked {
                scan.missing.push(*position);
            }
        }

        scan
    }

    /// Defensive structures the plan no longer wants.
    fn scan_legacy(&self, world: &dyn WorldView) -> PhaseScan {
        let dismantle = world
            .live_structures()
            .into_iter()
            .filter(|s| matches!(s.structure_type, StructureType::Wall | StructureType::Rampart))
            .filter(|s| !self.plan.has_defense_at(s.location, s.structure_type))
            .sorted_by_key(|s| s.location.packed_repr())
            .filter_map(|s| s.dismantle_entry())
            .collect();

        PhaseScan {
            dismantle,
            ..PhaseScan::default()
        }
    }

    fn advance(
        &self,
        phase: Phase,
        scan: PhaseScan,
        state: &mut SchedulerState,
        world: &dyn WorldView,
    ) -> ScheduleOutcome {
        let in_flight = state.in_flight();
        let headroom = (world.construction_quota().headroom() as usize).saturating_sub(in_flight);
        let allowance = self
            .config
            .max_requests_per_invocation
            .saturating_sub(in_flight)
            .min(headroom);

        let requests: Vec<ConstructionRequest> = scan
            .missing
            .iter()
            .take(allowance)
            .map(|p| ConstructionRequest {
                location: p.location,
                structure_type: p.structure_type,
                phase,
            })
            .collect();

        for request in &requests {
            trace!(
                "Requesting {:?} at ({}, {}) for {:?}",
                request.structure_type,
                request.location.x(),
                request.location.y(),
                phase
            );
            state.issued.push(IssuedRequest {
                location: request.location,
                structure_type: request.structure_type,
                phase,
                issued_at: state.invocation,
            });
        }

        let status = if requests.is_empty() && !scan.missing.is_empty() && headroom == 0 {
            ScheduleStatus::QuotaExhausted(phase)
        } else {
            ScheduleStatus::InProgress(phase)
        };

        ScheduleOutcome {
            status,
            requests,
            dismantle: scan
                .dismantle
                .into_iter()
                .take(self.config.max_dismantles_per_invocation)
                .collect(),
            repair_intents: scan.repairs,
        }
    }
}
