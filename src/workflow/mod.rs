pub mod gather_flow;
pub mod ledger;
pub mod process_flow;
pub mod run_ctx;

pub use gather_flow::{merge_trending, GatherFlow};
pub use ledger::DedupLedger;
pub use process_flow::ProcessFlow;
pub use run_ctx::RunContext;
