//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次批处理，持有 RunContext)
//!     ↓
//! workflow::GatherFlow  (第一阶段：逐个分类收集文章)
//! workflow::ProcessFlow (第二阶段：逐条生成并投递帖子)
//!     ↓
//! services (能力层：news / analysis / image / compositor / upload / webhook)
//! ```
//!
//! ## 设计原则
//!
//! 1. **两阶段**：全部收集完成后才开始处理，去重账本在处理前已完整
//! 2. **状态隔离**：运行状态只存在于单次运行的上下文中
//! 3. **无业务逻辑**：只做调度，不做具体业务判断

pub mod batch_processor;

pub use batch_processor::{BatchOrchestrator, BatchSettings, Collaborators};
