//! 单次批处理的运行上下文
//!
//! 持有任务登记表、去重账本和完成计数。只在一次 `run_batch` 内存在，
//! 由 GatherFlow / ProcessFlow 通过 `&mut` 修改，外部只能看到快照。

use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::error::PipelineError;
use crate::models::{BatchSnapshot, Category, TaskRegistry, TaskResult, TaskStatus};
use crate::workflow::DedupLedger;

pub struct RunContext<'a> {
    registry: TaskRegistry,
    ledger: DedupLedger,
    completed: usize,
    progress: Option<&'a watch::Sender<BatchSnapshot>>,
}

impl<'a> RunContext<'a> {
    /// 所有分类初始化为 Pending
    pub fn new(categories: &[Category]) -> Self {
        Self {
            registry: TaskRegistry::new(categories),
            ledger: DedupLedger::new(),
            completed: 0,
            progress: None,
        }
    }

    /// 每次状态变化都会推送快照到该通道
    pub fn with_progress(mut self, progress: &'a watch::Sender<BatchSnapshot>) -> Self {
        self.progress = Some(progress);
        self.publish(true);
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DedupLedger {
        &mut self.ledger
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn status_of(&self, task_id: &str) -> Option<&TaskStatus> {
        self.registry.get(task_id).map(|task| &task.status)
    }

    /// 推进任务状态，返回是否生效
    pub fn set_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        let applied = self.apply(task_id, status);
        if applied {
            self.publish(true);
        }
        applied
    }

    /// 任务失败，记录错误信息
    pub fn fail(&mut self, task_id: &str, err: &PipelineError) {
        error!("[{}] ❌ {}", task_id, err);
        self.set_status(task_id, TaskStatus::Error(err.to_string()));
    }

    /// 任务完成，附带结果并累加完成计数
    ///
    /// 计数与 Done 状态在同一个快照里发布
    pub fn complete(&mut self, task_id: &str, result: TaskResult) {
        if self.apply(task_id, TaskStatus::Done(result)) {
            self.completed += 1;
            self.publish(true);
        }
    }

    fn apply(&mut self, task_id: &str, status: TaskStatus) -> bool {
        let label = status.label();
        match self.registry.transition(task_id, status) {
            Ok(()) => {
                debug!("[{}] → {}", task_id, label);
                true
            }
            Err(e) => {
                warn!("状态迁移被拒绝: {}", e);
                false
            }
        }
    }

    pub fn snapshot(&self, running: bool) -> BatchSnapshot {
        BatchSnapshot {
            tasks: self.registry.tasks().to_vec(),
            completed: self.completed,
            total: self.registry.len(),
            running,
        }
    }

    /// 结束运行，返回最终快照
    pub fn finish(self) -> BatchSnapshot {
        if !self.registry.all_terminal() {
            warn!("运行结束时仍有任务未到达终态");
        }
        let snapshot = self.snapshot(false);
        if let Some(progress) = self.progress {
            progress.send_replace(snapshot.clone());
        }
        snapshot
    }

    fn publish(&self, running: bool) {
        if let Some(progress) = self.progress {
            progress.send_replace(self.snapshot(running));
        }
    }
}
