pub mod constants;
pub mod defense;
pub mod distance;
pub mod error;
pub mod exits;
pub mod facilities;
pub mod hub;
pub mod layout;
pub mod location;
pub mod pipeline;
pub mod plan;
pub mod planner;
pub mod roads;
pub mod room_data;
pub mod scheduler;
pub mod store;
pub mod terrain;
pub mod world;

pub use error::PlannerError;
pub use location::Location;
pub use plan::Plan;
pub use planner::{plan_region, RegionPlanner, RunOutcome};

pub use screeps::constants::StructureType;
