pub mod daily_run;
pub mod kpis;
pub mod replenishment;

pub use daily_run::{DailyPlanner, DailyReport};
pub use kpis::{KpiSummary, summarize_kpis};
pub use replenishment::{DecisionConfig, ReplenishmentAdvisor};
