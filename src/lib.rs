//! # News Batch
//!
//! 把固定的一组新闻分类批量生成社交媒体图片帖子，并推送到下游自动化 webhook
//!
//! ## 架构设计
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 每个外部能力一个 trait + 一个 HTTP 实现
//! - `NewsSource` / `ArticleAnalyzer` / `ImageLoader` / `ImageGenerator`
//! - `Compositor` / `Uploader` / `WebhookSender`
//!
//! ### ② 流程层（Workflow）
//! - `RunContext` - 单次运行的任务登记表、去重账本和完成计数
//! - `GatherFlow` - 第一阶段，逐个分类收集文章
//! - `ProcessFlow` - 第二阶段，逐条取图 → 合成 → 上传 → 推送
//!
//! ### ③ 编排层（Orchestration）
//! - `BatchOrchestrator` - `run_batch` 入口、并发保护、进度快照
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{BatchError, PipelineError};
pub use models::{BatchSnapshot, Category, Task, TaskStatus};
pub use orchestrator::{BatchOrchestrator, BatchSettings, Collaborators};
pub use workflow::{DedupLedger, GatherFlow, ProcessFlow, RunContext};
