//! Public API for the region steward.
//!
//! A `RegionPlanner` owns one region. Each invocation it either advances the
//! geometry pipeline within the CPU budget, or, once a plan is persisted,
//! hands the plan to the construction scheduler. All durable state lives in
//! the caller's `RegionMemoryStore`, including the partial pipeline state, so
//! a fresh planner resumes where the last one stopped.

use crate::error::PlannerError;
use crate::pipeline::*;
use crate::plan::*;
use crate::roads::{AStarPathSearch, PathSearch};
use crate::room_data::PlannerRoomDataSource;
use crate::scheduler::*;
use crate::store::*;
use crate::world::WorldView;
use log::*;
use serde::{Deserialize, Serialize};

/// Stored when a region cannot be planned. Valid only for the terrain it was
/// computed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplannableVerdict {
    pub terrain_fingerprint: u64,
    pub reason: PlanFailure,
}

pub const VERDICT_VERSION: u32 = 1;

/// Where planning stands after an invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanStatus {
    /// The pipeline needs more invocations.
    InProgress,
    Ready(Plan),
    Unplannable(PlanFailure),
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Planning,
    Unplannable(PlanFailure),
    Scheduled(ScheduleOutcome),
}

pub struct RegionPlanner {
    region: String,
    state: Option<PlanningState>,
    search: Box<dyn PathSearch>,
    config: PlannerConfig,
}

impl RegionPlanner {
    pub fn new<S: Into<String>>(region: S) -> Self {
        RegionPlanner {
            region: region.into(),
            state: None,
            search: Box::new(AStarPathSearch),
            config: PlannerConfig::default(),
        }
    }

    pub fn with_path_search(mut self, search: Box<dyn PathSearch>) -> Self {
        self.search = search;
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_planning(&self) -> bool {
        self.state.is_some()
    }

    /// One invocation: plan if needed, then schedule construction.
    pub fn run(
        &mut self,
        data: &dyn PlannerRoomDataSource,
        world: &dyn WorldView,
        store: &mut dyn RegionMemoryStore,
        budget: &CpuBudget,
    ) -> Result<RunOutcome, PlannerError> {
        let plan = match self.advance_planning(data, store, budget)? {
            PlanStatus::InProgress => return Ok(RunOutcome::Planning),
            PlanStatus::Unplannable(reason) => return Ok(RunOutcome::Unplannable(reason)),
            PlanStatus::Ready(plan) => plan,
        };

        let mut scheduler_state: SchedulerState =
            load_record(store, &self.region, SCHEDULER_KEY, SCHEDULER_STATE_VERSION)?
                .unwrap_or_default();

        let outcome =
            ConstructionScheduler::new(&plan, &self.config).run(&mut scheduler_state, world, budget);

        if outcome.status != ScheduleStatus::Deferred {
            save_record(
                store,
                &self.region,
                SCHEDULER_KEY,
                SCHEDULER_STATE_VERSION,
                &scheduler_state,
            )?;
        }

        Ok(RunOutcome::Scheduled(outcome))
    }

    /// Advance the geometry pipeline as far as the budget allows.
    ///
    /// Returns `TerrainUnavailable` without touching any state when the
    /// region cannot be observed. An exhausted budget computes and stores
    /// nothing.
    pub fn advance_planning(
        &mut self,
        data: &dyn PlannerRoomDataSource,
        store: &mut dyn RegionMemoryStore,
        budget: &CpuBudget,
    ) -> Result<PlanStatus, PlannerError> {
        let terrain = data
            .get_terrain()
            .ok_or_else(|| PlannerError::TerrainUnavailable(self.region.clone()))?;

        if let Some(plan) = load_record::<Plan>(store, &self.region, PLAN_KEY, PLAN_VERSION)? {
            return Ok(PlanStatus::Ready(plan));
        }

        let fingerprint = terrain.fingerprint();
        let mut stale_verdict = false;
        if let Some(verdict) =
            load_record::<UnplannableVerdict>(store, &self.region, VERDICT_KEY, VERDICT_VERSION)?
        {
            if verdict.terrain_fingerprint == fingerprint {
                return Ok(PlanStatus::Unplannable(verdict.reason));
            }
            stale_verdict = true;
        }

        let state = match self.state.take() {
            Some(state) => state,
            None => load_record::<PlanningState>(
                store,
                &self.region,
                PIPELINE_KEY,
                PIPELINE_STATE_VERSION,
            )?
            .unwrap_or_default(),
        };

        let state = tick_pipeline(
            state,
            terrain,
            data.get_points_of_interest(),
            self.search.as_ref(),
            budget,
        );

        if state.is_fresh() {
            return Ok(PlanStatus::InProgress);
        }

        if stale_verdict {
            info!("Terrain of {} changed, re-evaluating", self.region);
            store.remove(&self.region, VERDICT_KEY);
        }

        match state {
            PlanningState::Complete(mut plan) => {
                plan.version = PLAN_VERSION;
                save_record(store, &self.region, PLAN_KEY, PLAN_VERSION, &plan)?;
                store.remove(&self.region, PIPELINE_KEY);
                info!("Stored plan for {}", self.region);
                Ok(PlanStatus::Ready(plan))
            }
            PlanningState::Failed(reason) => {
                let verdict = UnplannableVerdict {
                    terrain_fingerprint: fingerprint,
                    reason,
                };
                save_record(store, &self.region, VERDICT_KEY, VERDICT_VERSION, &verdict)?;
                store.remove(&self.region, PIPELINE_KEY);
                warn!("{} is unplannable: {}", self.region, PlannerError::from(reason));
                Ok(PlanStatus::Unplannable(reason))
            }
            in_progress => {
                save_record(
                    store,
                    &self.region,
                    PIPELINE_KEY,
                    PIPELINE_STATE_VERSION,
                    &in_progress,
                )?;
                self.state = Some(in_progress);
                Ok(PlanStatus::InProgress)
            }
        }
    }

    /// Discard everything known about the region.
    pub fn abandon(&mut self, store: &mut dyn RegionMemoryStore) {
        info!("Abandoning {}", self.region);
        self.state = None;
        store.remove_region(&self.region);
    }
}

/// Run planning to completion (for offline use).
pub fn plan_region(data: &dyn PlannerRoomDataSource) -> Result<Plan, PlannerError> {
    plan_region_with(data, &AStarPathSearch)
}

pub fn plan_region_with(
    data: &dyn PlannerRoomDataSource,
    search: &dyn PathSearch,
) -> Result<Plan, PlannerError> {
    let terrain = data
        .get_terrain()
        .ok_or_else(|| PlannerError::TerrainUnavailable("offline".to_string()))?;
    let budget = CpuBudget::unlimited();
    let mut state = PlanningState::default();

    loop {
        state = tick_pipeline(state, terrain, data.get_points_of_interest(), search, &budget);
        match state {
            PlanningState::Complete(plan) => return Ok(plan),
            PlanningState::Failed(reason) => return Err(reason.into()),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room_data::*;
    use crate::terrain::*;
    use crate::world::SnapshotWorld;

    fn open_region() -> StaticRoomData {
        StaticRoomData::new(
            FastRoomTerrain::from_fn(|_, _| TerrainTile::Plain),
            vec![
                PointOfInterest::claim_anchor(25, 25),
                PointOfInterest::resource(10, 10),
            ],
        )
    }

    #[test]
    fn unobservable_region_mutates_nothing() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();
        let data = StaticRoomData::unobserved(Vec::new());
        let world = SnapshotWorld::new(1, 100);

        let result = planner.run(&data, &world, &mut store, &CpuBudget::unlimited());
        assert!(matches!(result, Err(PlannerError::TerrainUnavailable(_))));
        assert!(!store.has_region("W1N1"));
        assert!(!planner.is_planning());
    }

    #[test]
    fn plans_then_schedules() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();
        let data = open_region();
        let world = SnapshotWorld::new(1, 100);

        match planner.run(&data, &world, &mut store, &CpuBudget::unlimited()) {
            Ok(RunOutcome::Scheduled(outcome)) => {
                assert_eq!(outcome.status, ScheduleStatus::InProgress(Phase::ResourceAccess));
                assert!(!outcome.requests.is_empty());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(store.get("W1N1", PLAN_KEY).is_some());
        assert!(store.get("W1N1", SCHEDULER_KEY).is_some());
    }

    #[test]
    fn exhausted_budget_leaves_fresh_region_untouched() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();

        let status = planner
            .advance_planning(&open_region(), &mut store, &CpuBudget::exhausted())
            .unwrap();
        assert_eq!(status, PlanStatus::InProgress);
        assert!(!planner.is_planning());
        assert!(!store.has_region("W1N1"));
    }

    #[test]
    fn exhausted_budget_makes_no_progress() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();
        let data = open_region();

        planner
            .advance_planning(&data, &mut store, &CpuBudget::limited(1))
            .unwrap();
        let before = store.get("W1N1", PIPELINE_KEY);
        assert!(before.is_some());

        for _ in 0..20 {
            let status = planner
                .advance_planning(&data, &mut store, &CpuBudget::exhausted())
                .unwrap();
            assert_eq!(status, PlanStatus::InProgress);
        }
        assert_eq!(store.get("W1N1", PIPELINE_KEY), before);
        assert!(store.get("W1N1", PLAN_KEY).is_none());
    }

    #[test]
    fn starved_invocations_resume_planning() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();
        let data = open_region();

        let mut invocations = 0;
        loop {
            invocations += 1;
            match planner
                .advance_planning(&data, &mut store, &CpuBudget::limited(1))
                .unwrap()
            {
                PlanStatus::InProgress => assert!(planner.is_planning()),
                PlanStatus::Ready(plan) => {
                    assert_eq!(plan, plan_region(&data).unwrap());
                    break;
                }
                PlanStatus::Unplannable(reason) => panic!("unplannable: {:?}", reason),
            }
        }
        assert_eq!(invocations, 11);
        assert!(store.get("W1N1", PIPELINE_KEY).is_none());
    }

    #[test]
    fn fresh_planner_resumes_stored_progress() {
        let mut store = InMemoryRegionStore::new();
        let data = open_region();

        let mut first = RegionPlanner::new("W1N1");
        for _ in 0..3 {
            let status = first
                .advance_planning(&data, &mut store, &CpuBudget::limited(1))
                .unwrap();
            assert_eq!(status, PlanStatus::InProgress);
        }
        assert!(store.get("W1N1", PIPELINE_KEY).is_some());

        // Eight steps remain: six routes and two finalize steps.
        let mut second = RegionPlanner::new("W1N1");
        match second
            .advance_planning(&data, &mut store, &CpuBudget::limited(8))
            .unwrap()
        {
            PlanStatus::Ready(plan) => assert_eq!(plan, plan_region(&data).unwrap()),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(store.get("W1N1", PIPELINE_KEY).is_none());
    }

    #[test]
    fn newer_plan_records_are_refused() {
        let mut planner = RegionPlanner::new("W1N1");
        let mut store = InMemoryRegionStore::new();
        let record = StoredRecord {
            version: PLAN_VERSION + 1,
            payload: "{}".to_string(),
        };
        store.set("W1N1", PLAN_KEY, record.clone());

        let result = planner.advance_planning(&open_region(), &mut store, &CpuBudget::unlimited());
        assert!(matches!(result, Err(PlannerError::UnsupportedVersion { .. })));
        assert_eq!(store.get("W1N1", PLAN_KEY), Some(record));
    }

    #[test]
    fn abandon_discards_everything() {
        let mut store = InMemoryRegionStore::new();

        let mut planned = RegionPlanner::new("W1N1");
        planned
            .advance_planning(&open_region(), &mut store, &CpuBudget::unlimited())
            .unwrap();
        assert!(store.has_region("W1N1"));
        planned.abandon(&mut store);
        assert!(!store.has_region("W1N1"));

        let mut starved = RegionPlanner::new("W2N2");
        starved
            .advance_planning(&open_region(), &mut store, &CpuBudget::limited(1))
            .unwrap();
        assert!(starved.is_planning());
        assert!(store.has_region("W2N2"));
        starved.abandon(&mut store);
        assert!(!starved.is_planning());
        assert!(!store.has_region("W2N2"));
    }

    #[test]
    fn offline_planning_reports_failures() {
        let solid = StaticRoomData::new(FastRoomTerrain::from_fn(|_, _| TerrainTile::Wall), Vec::new());
        assert!(matches!(plan_region(&solid), Err(PlannerError::NoWalkableTiles)));

        let unobserved = StaticRoomData::unobserved(Vec::new());
        assert!(matches!(
            plan_region(&unobserved),
            Err(PlannerError::TerrainUnavailable(_))
        ));
    }
}
