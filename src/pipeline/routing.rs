use super::analysis::AnalysisOutput;
use super::{CpuBudget, PhaseResult};
use crate::layout::*;
use crate::plan::*;
use crate::roads::*;
use crate::room_data::*;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};

/// Output of the routing phase.
#[derive(Clone, Serialize, Deserialize)]
pub struct RoutingOutput {
    pub analysis: AnalysisOutput,
    pub grid: LayoutGrid,
    pub paths: Vec<RoadPath>,
}

/// Phase 2: route every target to the hub in a fixed order. Finished routes
/// are permanent; a budget cut resumes at the next unrouted target.
#[derive(Clone, Serialize, Deserialize)]
pub struct RoutingPhase {
    analysis: AnalysisOutput,
    grid: LayoutGrid,
    targets: Vec<RouteTarget>,
    paths: Vec<RoadPath>,
}

impl RoutingPhase {
    pub fn new(
        analysis: AnalysisOutput,
        terrain: &FastRoomTerrain,
        points: &[PointOfInterest],
    ) -> Self {
        let grid = LayoutGrid::new(terrain, &analysis.fields, analysis.hub, points);
        let targets = route_targets(&analysis.exits, points);

        RoutingPhase {
            analysis,
            grid,
            targets,
            paths: Vec::new(),
        }
    }

    pub fn tick(&mut self, search: &dyn PathSearch, budget: &CpuBudget) -> PhaseResult<RoutingOutput> {
        while let Some(&target) = self.targets.get(self.paths.len()) {
            if !budget.has_budget() {
                return PhaseResult::Running;
            }

            let path = route_target(target, self.analysis.hub, &mut self.grid, search);
            self.paths.push(path);
        }

        debug!(
            "Routed {} targets, {} unreachable",
            self.paths.len(),
            self.paths.iter().filter(|p| p.unreachable).count()
        );

        PhaseResult::Complete(RoutingOutput {
            analysis: self.analysis.clone(),
            grid: self.grid.clone(),
            paths: std::mem::take(&mut self.paths),
        })
    }
}
