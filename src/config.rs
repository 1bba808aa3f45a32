//! 程序配置
//!
//! 默认值 → TOML 配置文件 → 环境变量，后者覆盖前者

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::{validate_categories, Category};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 按顺序处理的新闻分类（id 为 `top` 的是合成的 Trending 分类）
    pub categories: Vec<Category>,
    /// 两个分类之间的固定间隔（毫秒），用于避开外部接口的频率限制
    pub category_delay_ms: u64,
    /// Trending 分类保留的最新文章数
    pub trending_size: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行报告输出文件
    pub report_file: String,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    // --- 新闻源配置 ---
    pub news_api_key: String,
    pub news_api_base_url: String,
    pub news_country: String,
    pub news_language: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub image_model_name: String,
    // --- 上传配置 ---
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    // --- Webhook 配置 ---
    pub webhook_url: String,
    pub webhook_auth_token: String,
    /// 批次结束后上报运行状态的 webhook（可选）
    pub status_webhook_url: Option<String>,
    // --- 品牌素材 ---
    pub logo_url: String,
    pub brand_text: String,
    pub overlay_image_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: vec![
                Category::new("top", "Trending"),
                Category::new("politics", "Politics"),
                Category::new("crime", "Crime"),
                Category::new("entertainment", "Entertainment"),
                Category::new("business", "Business/Corporate"),
            ],
            category_delay_ms: 5000,
            trending_size: 10,
            verbose_logging: false,
            report_file: "batch_report.json".to_string(),
            http_timeout_secs: 60,
            news_api_key: String::new(),
            news_api_base_url: "https://newsdata.io/api/1".to_string(),
            news_country: "bd".to_string(),
            news_language: "en".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            image_model_name: "gpt-image-1".to_string(),
            cloudinary_cloud_name: String::new(),
            cloudinary_upload_preset: "Autoupload".to_string(),
            webhook_url: String::new(),
            webhook_auth_token: String::new(),
            status_webhook_url: None,
            logo_url: "https://res.cloudinary.com/dy80ftu9k/image/upload/v1753507647/scs_cqidjz.png"
                .to_string(),
            brand_text: "Dhaka Dispatch".to_string(),
            overlay_image_url:
                "https://res.cloudinary.com/dy80ftu9k/image/upload/v1753644798/Untitled-1_hxkjvt.png"
                    .to_string(),
        }
    }
}

impl Config {
    /// 读取 TOML 配置文件（不存在时使用默认值），再应用环境变量覆盖
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let base = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("无法解析配置文件: {}", path.display()))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 解析 TOML 并校验分类列表
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        validate_categories(&config.categories)?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            category_delay_ms: env_parse("CATEGORY_DELAY_MS").unwrap_or(self.category_delay_ms),
            trending_size: env_parse("TRENDING_SIZE").unwrap_or(self.trending_size),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            report_file: std::env::var("REPORT_FILE").unwrap_or(self.report_file),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS").unwrap_or(self.http_timeout_secs),
            news_api_key: std::env::var("NEWSDATA_API_KEY").unwrap_or(self.news_api_key),
            news_api_base_url: std::env::var("NEWSDATA_API_BASE_URL").unwrap_or(self.news_api_base_url),
            news_country: std::env::var("NEWS_COUNTRY").unwrap_or(self.news_country),
            news_language: std::env::var("NEWS_LANGUAGE").unwrap_or(self.news_language),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            image_model_name: std::env::var("IMAGE_MODEL_NAME").unwrap_or(self.image_model_name),
            cloudinary_cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").unwrap_or(self.cloudinary_cloud_name),
            cloudinary_upload_preset: std::env::var("CLOUDINARY_UPLOAD_PRESET")
                .unwrap_or(self.cloudinary_upload_preset),
            webhook_url: std::env::var("MAKE_WEBHOOK_URL").unwrap_or(self.webhook_url),
            webhook_auth_token: std::env::var("MAKE_WEBHOOK_AUTH_TOKEN").unwrap_or(self.webhook_auth_token),
            status_webhook_url: std::env::var("STATUS_WEBHOOK_URL").ok().or(self.status_webhook_url),
            logo_url: std::env::var("LOGO_URL").unwrap_or(self.logo_url),
            brand_text: std::env::var("BRAND_TEXT").unwrap_or(self.brand_text),
            overlay_image_url: std::env::var("OVERLAY_IMAGE_URL").unwrap_or(self.overlay_image_url),
            categories: self.categories,
        }
    }

    pub fn category_delay(&self) -> Duration {
        Duration::from_millis(self.category_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories() {
        let config = Config::default();
        let ids: Vec<&str> = config.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "politics", "crime", "entertainment", "business"]);
        assert!(config.categories[0].is_aggregate());
        assert_eq!(config.category_delay(), Duration::from_secs(5));
        assert_eq!(config.trending_size, 10);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let content = r#"
            category_delay_ms = 0
            brand_text = "Test Brand"

            [[categories]]
            id = "sports"
            name = "Sports"
        "#;

        let config = Config::from_toml_str(content).unwrap();

        assert_eq!(config.category_delay_ms, 0);
        assert_eq!(config.brand_text, "Test Brand");
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].name, "Sports");
        // 未出现的字段保持默认
        assert_eq!(config.news_country, "bd");
    }

    #[test]
    fn test_duplicate_category_ids_rejected() {
        let content = r#"
            [[categories]]
            id = "crime"
            name = "Crime"

            [[categories]]
            id = "crime"
            name = "Crime again"
        "#;

        let err = Config::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("\"crime\" is configured more than once"));

        let path = std::env::temp_dir().join(format!("news_batch_dup_{}.toml", std::process::id()));
        std::fs::write(&path, content).unwrap();
        assert!(Config::load(&path).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("definitely/not/here.toml").unwrap();
        assert_eq!(config.categories.len(), 5);
    }
}
