pub mod article;
pub mod category;
pub mod task;

pub use article::{Article, GatheredItem, NewsAnalysis, WebhookPayload};
pub use category::{validate_categories, Category, AGGREGATE_CATEGORY_ID};
pub use task::{BatchSnapshot, Task, TaskRegistry, TaskResult, TaskStatus};
