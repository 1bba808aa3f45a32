use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// 新闻源返回的单篇文章
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Article {
    /// 原文链接，同时作为去重标识
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl Article {
    /// 解析发布时间
    ///
    /// 支持 `2024-07-25 10:30:00`（按 UTC 处理）和 RFC 3339 两种格式，无法解析时返回 None
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.pub_date.as_deref()?.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(naive.and_utc());
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// AI 分析得到的帖子内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsAnalysis {
    pub headline: String,
    pub caption: String,
    #[serde(default)]
    pub highlight_phrases: Vec<String>,
    pub image_prompt: String,
    #[serde(default)]
    pub source_name: String,
}

/// 第一阶段的产物，交给第二阶段处理
#[derive(Debug, Clone)]
pub struct GatheredItem {
    pub task_id: String,
    pub analysis: NewsAnalysis,
    pub article: Article,
}

/// 推送给自动化 webhook 的数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub headline: String,
    pub image_url: String,
    pub summary: String,
    pub news_link: String,
    pub status: String,
}

impl WebhookPayload {
    /// 新帖子一律以 `Queue` 状态进入下游队列
    pub fn queued(analysis: &NewsAnalysis, image_url: &str, news_link: &str) -> Self {
        Self {
            headline: analysis.headline.clone(),
            image_url: image_url.to_string(),
            summary: analysis.caption.clone(),
            news_link: news_link.to_string(),
            status: "Queue".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_at_formats() {
        let mut article = Article {
            link: "https://example.com/a".to_string(),
            pub_date: Some("2024-07-25 10:30:00".to_string()),
            ..Default::default()
        };
        let parsed = article.published_at().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-07-25T10:30:00+00:00");

        article.pub_date = Some("2024-07-25T12:30:00+02:00".to_string());
        assert_eq!(article.published_at().unwrap(), parsed);

        article.pub_date = Some("yesterday".to_string());
        assert!(article.published_at().is_none());

        article.pub_date = None;
        assert!(article.published_at().is_none());
    }

    #[test]
    fn test_webhook_payload_wire_format() {
        let analysis = NewsAnalysis {
            headline: "Headline".to_string(),
            caption: "Caption".to_string(),
            highlight_phrases: vec![],
            image_prompt: "prompt".to_string(),
            source_name: "Daily Star".to_string(),
        };
        let payload = WebhookPayload::queued(&analysis, "https://cdn/x.png", "https://news/1");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["headline"], "Headline");
        assert_eq!(json["imageUrl"], "https://cdn/x.png");
        assert_eq!(json["summary"], "Caption");
        assert_eq!(json["newsLink"], "https://news/1");
        assert_eq!(json["status"], "Queue");
    }
}
