//! 测试用的内存假实现

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use news_batch::error::{DeliveryError, UploadError};
use news_batch::models::{Article, BatchSnapshot, Category, NewsAnalysis, WebhookPayload};
use news_batch::services::{
    AnalyzedArticle, ArticleAnalyzer, Branding, Compositor, ImageGenerator, ImageHandle,
    ImageLoader, NewsSource, Uploader, WebhookSender,
};
use news_batch::{BatchOrchestrator, BatchSettings, Collaborators};

pub fn article(link: &str, pub_date: Option<&str>, image_url: Option<&str>) -> Article {
    Article {
        link: link.to_string(),
        title: format!("Title of {}", link),
        pub_date: pub_date.map(str::to_string),
        image_url: image_url.map(str::to_string),
        ..Default::default()
    }
}

/// 按分类返回固定文章列表
#[derive(Default)]
pub struct FakeNews {
    pub lists: HashMap<String, Vec<Article>>,
    pub failing: HashSet<String>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeNews {
    pub fn with(mut self, category_id: &str, articles: Vec<Article>) -> Self {
        self.lists.insert(category_id.to_string(), articles);
        self
    }

    pub fn failing(mut self, category_id: &str) -> Self {
        self.failing.insert(category_id.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NewsSource for FakeNews {
    async fn fetch_articles(&self, category_id: &str) -> Result<Vec<Article>> {
        self.calls.lock().unwrap().push(category_id.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(category_id) {
            anyhow::bail!("connection reset while fetching {}", category_id);
        }
        Ok(self.lists.get(category_id).cloned().unwrap_or_default())
    }
}

/// 总是选第一篇候选；`reject_all` 时返回 None
#[derive(Default)]
pub struct FakeAnalyzer {
    pub reject_all: bool,
    pub seen: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl ArticleAnalyzer for FakeAnalyzer {
    async fn analyze(&self, candidates: &[Article]) -> Result<Option<AnalyzedArticle>> {
        self.seen
            .lock()
            .unwrap()
            .push(candidates.iter().map(|a| a.link.clone()).collect());
        if self.reject_all {
            return Ok(None);
        }
        Ok(candidates.first().map(|article| AnalyzedArticle {
            analysis: NewsAnalysis {
                headline: format!("Headline for {}", article.link),
                caption: format!("Caption for {}", article.link),
                highlight_phrases: vec!["Headline".to_string()],
                image_prompt: format!("Prompt for {}", article.link),
                source_name: "Test Source".to_string(),
            },
            article: article.clone(),
        }))
    }
}

/// 含 `broken` 的来源加载失败，其余成功
#[derive(Default)]
pub struct FakeLoader {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageLoader for FakeLoader {
    async fn load(&self, source: &str) -> Result<ImageHandle> {
        self.calls.lock().unwrap().push(source.to_string());
        if source.contains("broken") {
            anyhow::bail!("404 for {}", source);
        }
        Ok(ImageHandle {
            bytes: source.as_bytes().to_vec(),
            mime: "image/png".to_string(),
        })
    }
}

/// 生成时记录当时的任务状态
#[derive(Default)]
pub struct FakeGenerator {
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
    pub progress: Option<watch::Receiver<BatchSnapshot>>,
    pub observed_status: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some(rx) = &self.progress {
            let labels = rx
                .borrow()
                .tasks
                .iter()
                .map(|t| format!("{}={}", t.id, t.status.label()))
                .collect::<Vec<_>>();
            self.observed_status.lock().unwrap().extend(labels);
        }
        if self.fail {
            anyhow::bail!("quota exceeded");
        }
        Ok("generated-image-data".to_string())
    }
}

#[derive(Default)]
pub struct FakeCompositor;

#[async_trait]
impl Compositor for FakeCompositor {
    async fn compose(
        &self,
        image: &ImageHandle,
        headline: &str,
        _highlight_phrases: &[String],
        branding: &Branding,
    ) -> Result<ImageHandle> {
        let mut bytes = image.bytes.clone();
        bytes.extend_from_slice(headline.as_bytes());
        bytes.extend_from_slice(branding.brand_text.as_bytes());
        Ok(ImageHandle {
            bytes,
            mime: "image/svg+xml".to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub unauthorized: bool,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, _image: &ImageHandle) -> Result<String, UploadError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if self.unauthorized {
            return Err(UploadError::Unauthorized);
        }
        Ok(format!("https://cdn.test/post-{}.svg", *calls))
    }
}

#[derive(Default)]
pub struct FakeWebhook {
    pub reject_status: Option<u16>,
    pub payloads: Mutex<Vec<WebhookPayload>>,
}

#[async_trait]
impl WebhookSender for FakeWebhook {
    async fn send(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        if let Some(status) = self.reject_status {
            if status == 401 {
                return Err(DeliveryError::Unauthorized);
            }
            return Err(DeliveryError::Rejected {
                status,
                body: "rejected".to_string(),
            });
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub fn branding() -> Branding {
    Branding {
        logo_url: "https://cdn.test/logo.png".to_string(),
        brand_text: "Dhaka Dispatch".to_string(),
        overlay_url: "https://cdn.test/overlay.png".to_string(),
    }
}

pub fn categories(ids: &[(&str, &str)]) -> Vec<Category> {
    ids.iter().map(|(id, name)| Category::new(*id, *name)).collect()
}

/// 用假实现组装编排器，并保留各个假实现的引用用于断言
pub struct Harness {
    pub news: Arc<FakeNews>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub loader: Arc<FakeLoader>,
    pub generator: Arc<FakeGenerator>,
    pub uploader: Arc<FakeUploader>,
    pub webhook: Arc<FakeWebhook>,
}

impl Harness {
    pub fn new(news: FakeNews) -> Self {
        Self {
            news: Arc::new(news),
            analyzer: Arc::new(FakeAnalyzer::default()),
            loader: Arc::new(FakeLoader::default()),
            generator: Arc::new(FakeGenerator::default()),
            uploader: Arc::new(FakeUploader::default()),
            webhook: Arc::new(FakeWebhook::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            news: self.news.clone(),
            analyzer: self.analyzer.clone(),
            loader: self.loader.clone(),
            generator: self.generator.clone(),
            compositor: Arc::new(FakeCompositor),
            uploader: self.uploader.clone(),
            webhook: self.webhook.clone(),
        }
    }

    pub fn settings(&self, categories: Vec<Category>, delay: Duration) -> BatchSettings {
        BatchSettings {
            categories,
            category_delay: delay,
            trending_size: 10,
            branding: branding(),
            verbose_logging: true,
        }
    }

    pub fn orchestrator(&self, categories: Vec<Category>, delay: Duration) -> BatchOrchestrator {
        BatchOrchestrator::new(self.collaborators(), self.settings(categories, delay)).unwrap()
    }
}
