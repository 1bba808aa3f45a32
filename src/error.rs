//! 错误类型
//!
//! - `PipelineError`：单个任务的失败原因，`Display` 就是写入任务 Error 状态的信息
//! - `UploadError` / `DeliveryError`：两个 HTTP 出口需要区分鉴权失败
//! - `CategoryError`：分类列表不合法（id 重复等）
//! - `BatchError`：批处理入口本身的拒绝原因
//! - `TransitionError`：任务状态机拒绝的迁移

use thiserror::Error;

/// 任务级错误
///
/// 两个阶段都会在任务边界捕获它并降级为任务的 Error 状态，不会中断整个批次
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 分类下一篇文章都没有
    #[error("Could not find any valid articles for the \"{category}\" category.")]
    EmptySource { category: String },

    /// 候选文章在本次运行中都已被使用
    #[error("No new, unused articles found for {category}.")]
    NoUnusedArticles { category: String },

    /// 分析没有选出合适的文章
    #[error("Could not find a relevant, unused Bangladesh-specific article for {category}.")]
    NoRelevantArticle { category: String },

    /// 新闻源请求失败
    #[error("Failed to fetch news for {category}: {reason}")]
    Fetch { category: String, reason: String },

    /// 分析调用失败
    #[error("Article analysis failed for {category}: {reason}")]
    Analysis { category: String, reason: String },

    /// 原图加载失败且兜底生成的图片也无法使用
    #[error("Image acquisition failed: {0}")]
    ImageAcquisition(String),

    #[error("Image composition failed: {0}")]
    Composition(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// 图片上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image upload failed (401 Unauthorized). Check the upload credentials and preset.")]
    Unauthorized,

    #[error("Image upload failed with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Image upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Image upload response did not contain a public URL")]
    MissingUrl,
}

/// Webhook 投递错误
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(
        "Webhook request failed (401 Unauthorized). The token in the `x-make-apikey` header was rejected; verify the webhook credentials."
    )]
    Unauthorized,

    #[error("Webhook request failed with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// 分类配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category id \"{0}\" is configured more than once")]
    DuplicateId(String),

    #[error("category id must not be empty")]
    EmptyId,
}

/// 批处理入口错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("a batch run is already in progress")]
    AlreadyRunning,

    #[error("invalid category configuration: {0}")]
    InvalidCategories(#[from] CategoryError),
}

/// 任务状态迁移错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("illegal transition for task {task_id}: {from} -> {to}")]
    Illegal {
        task_id: String,
        from: &'static str,
        to: &'static str,
    },
}

/// 任务级结果类型
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_category() {
        let err = PipelineError::EmptySource {
            category: "Crime".to_string(),
        };
        assert!(err.to_string().contains("Could not find any valid articles"));
        assert!(err.to_string().contains("Crime"));

        let err = PipelineError::NoUnusedArticles {
            category: "Politics".to_string(),
        };
        assert_eq!(err.to_string(), "No new, unused articles found for Politics.");
    }

    #[test]
    fn test_sink_errors_are_transparent() {
        let err = PipelineError::from(DeliveryError::Rejected {
            status: 500,
            body: "oops".to_string(),
        });
        assert_eq!(err.to_string(), "Webhook request failed with status 500: oops");

        let err = PipelineError::from(UploadError::Unauthorized);
        assert!(err.to_string().contains("401 Unauthorized"));
    }
}
