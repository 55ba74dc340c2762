//! Finalization phase: facility placement, the perimeter ring, and assembly
//! of the persisted Plan.

use super::routing::RoutingOutput;
use super::{CpuBudget, PhaseResult};
use crate::defense::*;
use crate::facilities::*;
use crate::plan::*;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct FinalizePhase {
    routing: RoutingOutput,
    step: FinalizeStep,
}

#[derive(Clone, Serialize, Deserialize)]
enum FinalizeStep {
    Facilities,
    Perimeter(FacilityPlacement),
}

impl FinalizePhase {
    pub fn new(routing: RoutingOutput) -> Self {
        FinalizePhase {
            routing,
            step: FinalizeStep::Facilities,
        }
    }

    pub fn tick(&mut self, terrain: &FastRoomTerrain, budget: &CpuBudget) -> PhaseResult<Plan> {
        loop {
            if !budget.has_budget() {
                return PhaseResult::Running;
            }

            match &self.step {
                FinalizeStep::Facilities => {
                    let analysis = &self.routing.analysis;
                    let placement = place_facilities(
                        analysis.hub,
                        terrain,
                        &analysis.fields,
                        &mut self.routing.grid,
                    );
                    self.step = FinalizeStep::Perimeter(placement);
                }
                FinalizeStep::Perimeter(facilities) => {
                    let perimeter =
                        place_perimeter(terrain, &self.routing.analysis.fields, &self.routing.grid);
                    let plan = self.build_plan(facilities, perimeter, terrain.fingerprint());
                    return PhaseResult::Complete(plan);
                }
            }
        }
    }

    fn build_plan(
        &self,
        facilities: &FacilityPlacement,
        perimeter: Vec<DefenseSlot>,
        terrain_fingerprint: u64,
    ) -> Plan {
        // Containers come first, in routing order.
        let containers = self
            .routing
            .paths
            .iter()
            .filter_map(|p| p.access)
            .map(|location| FacilitySlot {
                kind: SlotKind::Container,
                location,
            });

        let facility_slots: Vec<FacilitySlot> = containers
            .chain(facilities.slots.iter().copied())
            .collect();

        let plan = Plan {
            version: PLAN_VERSION,
            hub: self.routing.analysis.hub,
            exit_segments: self.routing.analysis.exits.clone(),
            road_paths: self.routing.paths.clone(),
            facility_slots,
            perimeter,
            incomplete: facilities.incomplete,
            terrain_fingerprint,
        };

        info!(
            "Plan complete: hub ({}, {}), {} roads, {} facility slots{}",
            plan.hub.x(),
            plan.hub.y(),
            plan.road_tiles().len(),
            plan.facility_slots.len(),
            if plan.incomplete { " (incomplete)" } else { "" }
        );

        plan
    }
}
