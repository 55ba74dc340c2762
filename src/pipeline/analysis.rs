use super::{CpuBudget, PhaseResult, PlanFailure};
use crate::distance::*;
use crate::exits::*;
use crate::hub::*;
use crate::location::*;
use crate::room_data::*;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};

/// Output of the analysis phase -- pre-computed terrain data for subsequent phases.
#[derive(Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub fields: DistanceFields,
    pub exits: Vec<ExitSegment>,
    pub hub: Location,
}

/// Phase 1: distance fields, exit segments, hub selection.
///
/// Each step carries everything computed so far, so a budget cut between
/// steps loses nothing.
#[derive(Clone, Serialize, Deserialize)]
pub struct AnalysisPhase {
    step: AnalysisStep,
}

#[derive(Clone, Serialize, Deserialize)]
enum AnalysisStep {
    DistanceFields,
    ExitSegments {
        fields: DistanceFields,
    },
    Hub {
        fields: DistanceFields,
        exits: Vec<ExitSegment>,
    },
}

impl Default for AnalysisPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisPhase {
    pub fn new() -> Self {
        AnalysisPhase {
            step: AnalysisStep::DistanceFields,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.step, AnalysisStep::DistanceFields)
    }

    pub fn tick(
        &mut self,
        terrain: &FastRoomTerrain,
        points: &[PointOfInterest],
        budget: &CpuBudget,
    ) -> PhaseResult<Result<AnalysisOutput, PlanFailure>> {
        loop {
            if !budget.has_budget() {
                return PhaseResult::Running;
            }

            let step = std::mem::replace(&mut self.step, AnalysisStep::DistanceFields);

            self.step = match step {
                AnalysisStep::DistanceFields => {
                    let fields = DistanceFields::build(terrain);
                    if fields.is_degenerate() {
                        return PhaseResult::Complete(Err(PlanFailure::NoWalkableTiles));
                    }
                    AnalysisStep::ExitSegments { fields }
                }
                AnalysisStep::ExitSegments { fields } => {
                    let exits = find_exit_segments(terrain);
                    debug!("Found {} exit segments", exits.len());
                    AnalysisStep::Hub { fields, exits }
                }
                AnalysisStep::Hub { fields, exits } => {
                    let result = match select_hub(terrain, &fields, &exits, points) {
                        Some(hub) => Ok(AnalysisOutput { fields, exits, hub }),
                        None => Err(PlanFailure::NoValidHub),
                    };
                    return PhaseResult::Complete(result);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_budget_leaves_phase_untouched() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let mut phase = AnalysisPhase::new();

        assert!(matches!(
            phase.tick(&terrain, &[], &CpuBudget::exhausted()),
            PhaseResult::Running
        ));
        assert!(phase.is_fresh());
    }

    #[test]
    fn one_step_per_budget_check() {
        let terrain = FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain);
        let mut phase = AnalysisPhase::new();

        assert!(matches!(phase.tick(&terrain, &[], &CpuBudget::limited(1)), PhaseResult::Running));
        assert!(!phase.is_fresh());
        assert!(matches!(phase.tick(&terrain, &[], &CpuBudget::limited(1)), PhaseResult::Running));
        match phase.tick(&terrain, &[], &CpuBudget::limited(1)) {
            PhaseResult::Complete(Ok(output)) => {
                assert_eq!(output.exits.len(), 4);
                assert_eq!(output.hub, Location::from_xy(25, 25));
            }
            _ => panic!("analysis did not complete"),
        }
    }

    #[test]
    fn no_qualifying_tile_fails_with_no_valid_hub() {
        // Narrow open strips: no tile is four tiles from a wall.
        let terrain = FastRoomTerrain::from_fn(|x, _| {
            if x % 4 == 0 {
                TerrainTile::Wall
            } else {
                TerrainTile::Plain
            }
        });
        let mut phase = AnalysisPhase::new();
        assert!(matches!(
            phase.tick(&terrain, &[], &CpuBudget::unlimited()),
            PhaseResult::Complete(Err(PlanFailure::NoValidHub))
        ));
    }
}
