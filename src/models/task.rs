//! 任务状态机
//!
//! 每个分类在一次批处理中对应一个 `Task`。状态是带负载的枚举：
//! 只有 `Done` 携带结果，只有 `Error` 携带错误信息，二者不可能同时出现。

use serde::Serialize;
use std::fmt;

use crate::error::TransitionError;
use crate::models::Category;

/// 成功任务的产物
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub headline: String,
    pub image_url: String,
    pub caption: String,
    pub source_url: String,
    pub source_name: String,
}

/// 任务状态
///
/// 正常顺序：Pending → Gathering → Gathered → Processing → (GeneratingImage) →
/// Composing → Uploading → SendingWebhook → Done。
/// 任何非终态都可以进入 Error。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail")]
pub enum TaskStatus {
    Pending,
    Gathering,
    Gathered,
    Processing,
    GeneratingImage,
    Composing,
    Uploading,
    SendingWebhook,
    Done(TaskResult),
    Error(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done(_) | TaskStatus::Error(_))
    }

    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            TaskStatus::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TaskStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// 状态标签（用于日志和进度展示）
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Gathering => "Gathering",
            TaskStatus::Gathered => "Gathered",
            TaskStatus::Processing => "Processing",
            TaskStatus::GeneratingImage => "GeneratingImage",
            TaskStatus::Composing => "Composing",
            TaskStatus::Uploading => "Uploading",
            TaskStatus::SendingWebhook => "SendingWebhook",
            TaskStatus::Done(_) => "Done",
            TaskStatus::Error(_) => "Error",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Gathering => 1,
            TaskStatus::Gathered => 2,
            TaskStatus::Processing => 3,
            TaskStatus::GeneratingImage => 4,
            TaskStatus::Composing => 5,
            TaskStatus::Uploading => 6,
            TaskStatus::SendingWebhook => 7,
            TaskStatus::Done(_) | TaskStatus::Error(_) => 8,
        }
    }

    /// 终态不可离开；其余只能向前推进，或进入 Error
    pub fn can_transition_to(&self, next: &TaskStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(next, TaskStatus::Error(_)) || next.rank() > self.rank()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 单个分类的任务记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub category_name: String,
    #[serde(flatten)]
    pub status: TaskStatus,
}

/// 有序的任务登记表
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    /// 为每个分类创建一个 Pending 任务，顺序与配置一致
    pub fn new(categories: &[Category]) -> Self {
        let tasks = categories
            .iter()
            .map(|category| Task {
                id: category.id.clone(),
                category_name: category.name.clone(),
                status: TaskStatus::Pending,
            })
            .collect();
        Self { tasks }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 更新任务状态，非法迁移会被拒绝
    pub fn transition(&mut self, id: &str, next: TaskStatus) -> Result<(), TransitionError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| TransitionError::UnknownTask(id.to_string()))?;

        if !task.status.can_transition_to(&next) {
            return Err(TransitionError::Illegal {
                task_id: id.to_string(),
                from: task.status.label(),
                to: next.label(),
            });
        }

        task.status = next;
        Ok(())
    }

    pub fn done_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| matches!(task.status, TaskStatus::Done(_)))
            .count()
    }

    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|task| task.status.is_terminal())
    }
}

/// 对外暴露的只读进度快照
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub tasks: Vec<Task>,
    pub completed: usize,
    pub total: usize,
    pub running: bool,
}

impl BatchSnapshot {
    /// 完成百分比 = Done 数 / 总任务数
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn failed(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| matches!(task.status, TaskStatus::Error(_)))
            .count()
    }
}
