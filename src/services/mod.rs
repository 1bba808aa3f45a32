pub mod analysis_service;
pub mod compositor;
pub mod image_service;
pub mod news_service;
pub mod upload_service;
pub mod webhook_service;

pub use analysis_service::{AnalyzedArticle, ArticleAnalyzer, LlmAnalysisService};
pub use compositor::{Branding, Compositor, SvgCompositor};
pub use image_service::{HttpImageLoader, ImageGenerator, ImageHandle, ImageLoader, OpenAiImageGenerator};
pub use news_service::{NewsDataService, NewsSource};
pub use upload_service::{CloudinaryUploader, Uploader};
pub use webhook_service::{MakeWebhookSender, StatusLevel, StatusReporter, WebhookSender};
