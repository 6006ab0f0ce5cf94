pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::GameplayStrategy;
pub use seeds::{parse_seeds, parse_strategies, split_csv};
pub use simulation::{ScenarioResult, StrategyRunner};
