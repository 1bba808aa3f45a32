//! 新闻源 - 业务能力层
//!
//! 只负责"按分类拉取最新文章"，不关心去重和筛选

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Config;
use crate::models::Article;

/// 按分类获取文章列表
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_articles(&self, category_id: &str) -> Result<Vec<Article>>;
}

/// NewsData.io 客户端
pub struct NewsDataService {
    client: Client,
    api_key: String,
    base_url: String,
    country: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    status: String,
    #[serde(default)]
    results: JsonValue,
}

impl NewsDataService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.news_api_key.clone(),
            base_url: config.news_api_base_url.trim_end_matches('/').to_string(),
            country: config.news_country.clone(),
            language: config.news_language.clone(),
        }
    }
}

#[async_trait]
impl NewsSource for NewsDataService {
    async fn fetch_articles(&self, category_id: &str) -> Result<Vec<Article>> {
        let endpoint = format!("{}/latest", self.base_url);
        debug!("请求新闻源: {} (分类: {})", endpoint, category_id);

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("country", self.country.as_str()),
                ("language", self.language.as_str()),
                ("category", category_id),
            ])
            .send()
            .await
            .with_context(|| format!("news request failed for category {}", category_id))?;

        let status = response.status();
        let body = response.text().await.context("failed to read news response")?;

        if !status.is_success() {
            anyhow::bail!("news API returned status {}: {}", status.as_u16(), body);
        }

        let articles = parse_news_response(&body)?;
        debug!("分类 {} 获取到 {} 篇文章", category_id, articles.len());
        Ok(articles)
    }
}

/// 解析 NewsData 的响应体
///
/// `status` 不为 `success` 时 `results` 是错误描述
fn parse_news_response(body: &str) -> Result<Vec<Article>> {
    let parsed: NewsDataResponse =
        serde_json::from_str(body).context("failed to parse news response")?;

    if parsed.status != "success" {
        let message = parsed
            .results
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        anyhow::bail!("news API error: {}", message);
    }

    let articles: Vec<Article> = match parsed.results {
        JsonValue::Null => Vec::new(),
        results => serde_json::from_value(results).context("unexpected news results shape")?,
    };

    // 没有链接的文章无法去重，直接丢弃
    Ok(articles
        .into_iter()
        .filter(|article| !article.link.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_response() {
        let body = r#"{
            "status": "success",
            "totalResults": 2,
            "results": [
                {"link": "https://a.com/1", "title": "One", "pubDate": "2024-07-25 10:00:00",
                 "image_url": "https://a.com/1.jpg", "source_id": "dailystar", "extra": 1},
                {"link": "", "title": "No link"},
                {"link": "https://a.com/2", "title": "Two", "image_url": null}
            ]
        }"#;

        let articles = parse_news_response(body).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].pub_date.as_deref(), Some("2024-07-25 10:00:00"));
        assert_eq!(articles[0].image_url.as_deref(), Some("https://a.com/1.jpg"));
        assert!(articles[1].image_url.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"status": "error", "results": {"message": "API key invalid", "code": "Unauthorized"}}"#;
        let err = parse_news_response(body).unwrap_err();
        assert!(err.to_string().contains("API key invalid"));
    }

    #[tokio::test]
    #[ignore] // 需要真实的 NEWSDATA_API_KEY：cargo test -- --ignored
    async fn test_fetch_live_politics() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let service = NewsDataService::new(&config, Client::new());

        let articles = service.fetch_articles("politics").await.unwrap();
        println!("获取到 {} 篇文章", articles.len());
    }
}
