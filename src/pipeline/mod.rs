pub mod analysis;
pub mod finalize;
pub mod routing;

use crate::error::PlannerError;
use crate::plan::*;
use crate::room_data::*;
use crate::roads::PathSearch;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Schema version of a persisted in-progress `PlanningState`.
pub const PIPELINE_STATE_VERSION: u32 = 1;

/// CPU budget for incremental planning.
pub struct CpuBudget {
    /// Function that returns true if the planner should continue working.
    should_continue: Box<dyn Fn() -> bool>,
}

impl CpuBudget {
    pub fn new<F: Fn() -> bool + 'static>(should_continue: F) -> Self {
        CpuBudget {
            should_continue: Box::new(should_continue),
        }
    }

    /// Budget backed by a remaining-CPU reading: work continues while more
    /// than `reserve` is left.
    pub fn from_remaining<F: Fn() -> f64 + 'static>(remaining: F, reserve: f64) -> Self {
        CpuBudget::new(move || remaining() > reserve)
    }

    /// Returns true if there is budget remaining to continue work.
    pub fn has_budget(&self) -> bool {
        (self.should_continue)()
    }

    /// Unlimited budget (for offline use).
    pub fn unlimited() -> Self {
        CpuBudget {
            should_continue: Box::new(|| true),
        }
    }

    /// A budget that is already spent.
    pub fn exhausted() -> Self {
        CpuBudget {
            should_continue: Box::new(|| false),
        }
    }

    /// Budget that grants a fixed number of budget checks, then runs out.
    /// Every pipeline step is preceded by one check.
    pub fn limited(steps: usize) -> Self {
        let remaining = Cell::new(steps);
        CpuBudget::new(move || match remaining.get() {
            0 => false,
            n => {
                remaining.set(n - 1);
                true
            }
        })
    }
}

/// Result of a single tick of phase work.
pub enum PhaseResult<T> {
    /// Phase needs more ticks to complete.
    Running,
    /// Phase is complete with output.
    Complete(T),
}

/// Terminal planning failures. Kept serializable so they can be stored as
/// the region's verdict.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum PlanFailure {
    NoWalkableTiles,
    NoValidHub,
}

impl From<PlanFailure> for PlannerError {
    fn from(failure: PlanFailure) -> Self {
        match failure {
            PlanFailure::NoWalkableTiles => PlannerError::NoWalkableTiles,
            PlanFailure::NoValidHub => PlannerError::NoValidHub,
        }
    }
}

/// The overall planning pipeline state. Everything computed so far is kept
/// in the state, so it can be persisted and resumed in a later invocation.
#[derive(Clone, Serialize, Deserialize)]
pub enum PlanningState {
    /// Distance fields, exit segments and hub selection.
    Analysis(analysis::AnalysisPhase),
    /// Routing every point of interest to the hub, one route at a time.
    Routing(routing::RoutingPhase),
    /// Facility placement, perimeter and plan assembly.
    Finalizing(finalize::FinalizePhase),
    /// Terminal states.
    Complete(Plan),
    Failed(PlanFailure),
}

impl Default for PlanningState {
    fn default() -> Self {
        PlanningState::Analysis(analysis::AnalysisPhase::new())
    }
}

impl PlanningState {
    /// True while nothing has been computed yet.
    pub fn is_fresh(&self) -> bool {
        matches!(self, PlanningState::Analysis(phase) if phase.is_fresh())
    }
}

/// Advance the planning pipeline until it finishes or the budget runs out.
///
/// Every phase checks the budget before each step, so an exhausted budget
/// returns the state untouched.
pub fn tick_pipeline(
    mut state: PlanningState,
    terrain: &FastRoomTerrain,
    points: &[PointOfInterest],
    search: &dyn PathSearch,
    budget: &CpuBudget,
) -> PlanningState {
    loop {
        state = match state {
            PlanningState::Analysis(mut phase) => match phase.tick(terrain, points, budget) {
                PhaseResult::Running => return PlanningState::Analysis(phase),
                PhaseResult::Complete(Ok(output)) => {
                    debug!("Analysis complete, routing to hub at ({}, {})", output.hub.x(), output.hub.y());
                    PlanningState::Routing(routing::RoutingPhase::new(output, terrain, points))
                }
                PhaseResult::Complete(Err(failure)) => {
                    warn!("Planning failed: {}", PlannerError::from(failure));
                    PlanningState::Failed(failure)
                }
            },
            PlanningState::Routing(mut phase) => match phase.tick(search, budget) {
                PhaseResult::Running => return PlanningState::Routing(phase),
                PhaseResult::Complete(output) => {
                    PlanningState::Finalizing(finalize::FinalizePhase::new(output))
                }
            },
            PlanningState::Finalizing(mut phase) => match phase.tick(terrain, budget) {
                PhaseResult::Running => return PlanningState::Finalizing(phase),
                PhaseResult::Complete(plan) => PlanningState::Complete(plan),
            },
            // Terminal states
            s @ PlanningState::Complete(_) | s @ PlanningState::Failed(_) => return s,
        };
    }
}

/// Check if the pipeline has reached a terminal state.
pub fn is_complete(state: &PlanningState) -> bool {
    matches!(state, PlanningState::Complete(_) | PlanningState::Failed(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roads::AStarPathSearch;
    use std::rc::Rc;

    fn open_terrain() -> FastRoomTerrain {
        FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain)
    }

    fn points() -> [PointOfInterest; 2] {
        [
            PointOfInterest::claim_anchor(25, 25),
            PointOfInterest::resource(10, 10),
        ]
    }

    fn complete_plan(state: PlanningState) -> Plan {
        match state {
            PlanningState::Complete(plan) => plan,
            _ => panic!("planning did not complete"),
        }
    }

    #[test]
    fn exhausted_budget_does_no_work() {
        let terrain = open_terrain();
        let state = tick_pipeline(
            PlanningState::default(),
            &terrain,
            &points(),
            &AStarPathSearch,
            &CpuBudget::exhausted(),
        );
        assert!(state.is_fresh());
    }

    #[test]
    fn one_step_per_check() {
        let terrain = open_terrain();
        let points = points();

        let mut state = PlanningState::default();
        let mut invocations = 0;
        while !is_complete(&state) {
            state = tick_pipeline(state, &terrain, &points, &AStarPathSearch, &CpuBudget::limited(1));
            invocations += 1;
        }

        // Three analysis steps, six routes, two finalize steps.
        assert_eq!(invocations, 11);

        let whole = tick_pipeline(
            PlanningState::default(),
            &terrain,
            &points,
            &AStarPathSearch,
            &CpuBudget::unlimited(),
        );
        assert_eq!(complete_plan(state), complete_plan(whole));
    }

    #[test]
    fn partial_state_survives_serialization() {
        let terrain = open_terrain();
        let points = [PointOfInterest::resource(10, 10)];

        let mut state = PlanningState::default();
        for _ in 0..4 {
            state = tick_pipeline(state, &terrain, &points, &AStarPathSearch, &CpuBudget::limited(1));
            let json = serde_json::to_string(&state).unwrap();
            state = serde_json::from_str(&json).unwrap();
        }
        assert!(!is_complete(&state));
        assert!(!state.is_fresh());

        let expected = tick_pipeline(
            PlanningState::default(),
            &terrain,
            &points,
            &AStarPathSearch,
            &CpuBudget::unlimited(),
        );
        let resumed = tick_pipeline(state, &terrain, &points, &AStarPathSearch, &CpuBudget::unlimited());
        assert_eq!(complete_plan(resumed), complete_plan(expected));
    }

    #[test]
    fn solid_region_fails_without_walkable_tiles() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Wall);
        let state = tick_pipeline(
            PlanningState::default(),
            &terrain,
            &[],
            &AStarPathSearch,
            &CpuBudget::unlimited(),
        );
        assert!(matches!(state, PlanningState::Failed(PlanFailure::NoWalkableTiles)));
    }

    #[test]
    fn limited_budget_counts_down() {
        let budget = CpuBudget::limited(2);
        assert!(budget.has_budget());
        assert!(budget.has_budget());
        assert!(!budget.has_budget());
    }

    #[test]
    fn remaining_budget_respects_reserve() {
        let remaining = Rc::new(Cell::new(10.0));
        let reading = remaining.clone();
        let budget = CpuBudget::from_remaining(move || reading.get(), 2.0);
        assert!(budget.has_budget());
        remaining.set(1.5);
        assert!(!budget.has_budget());
    }
}
