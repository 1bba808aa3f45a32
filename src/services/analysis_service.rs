//! 文章分析服务 - 业务能力层
//!
//! 只负责"从候选文章中挑出最合适的一篇并生成帖子内容"，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Article, NewsAnalysis};

/// 分析结果：选中的文章及其帖子内容
#[derive(Debug, Clone)]
pub struct AnalyzedArticle {
    pub analysis: NewsAnalysis,
    pub article: Article,
}

/// 从候选列表中挑选最佳文章
///
/// 没有合适的文章时返回 `Ok(None)`
#[async_trait]
pub trait ArticleAnalyzer: Send + Sync {
    async fn analyze(&self, candidates: &[Article]) -> Result<Option<AnalyzedArticle>>;
}

/// 基于 LLM 的文章分析服务
pub struct LlmAnalysisService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

/// LLM 返回的 JSON 结构
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    index: Option<i64>,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    highlight_phrases: Vec<String>,
    #[serde(default)]
    image_prompt: String,
    #[serde(default)]
    source_name: String,
}

static RE_CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").unwrap());

const SYSTEM_MESSAGE: &str = "You are the news editor of a Bangladeshi social media outlet. \
You pick the single most important story that is specifically about Bangladesh \
and write a short, factual social media post for it. Always answer with JSON only.";

impl LlmAnalysisService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用
    pub async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API call failed: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM returned empty content"))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ArticleAnalyzer for LlmAnalysisService {
    async fn analyze(&self, candidates: &[Article]) -> Result<Option<AnalyzedArticle>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        debug!(
            "开始文章分析，候选数量: {}, 模型: {}",
            candidates.len(),
            self.model_name
        );

        let prompt = build_analysis_prompt(candidates);
        let response = self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await?;

        parse_analysis_response(&response, candidates)
    }
}

/// 构建分析提示词
fn build_analysis_prompt(candidates: &[Article]) -> String {
    let list: Vec<serde_json::Value> = candidates
        .iter()
        .enumerate()
        .map(|(index, article)| {
            serde_json::json!({
                "index": index,
                "title": article.title,
                "description": article.description,
                "source": article.source_name.as_ref().or(article.source_id.as_ref()),
                "published": article.pub_date,
            })
        })
        .collect();
    let candidates_json = serde_json::to_string_pretty(&list).unwrap_or_default();

    format!(
        r#"Below is a list of candidate news articles.

{candidates_json}

Pick the ONE article that is most newsworthy AND specifically about Bangladesh.
If none of them is about Bangladesh, answer {{"index": null}}.

Otherwise answer with this JSON object and nothing else:
{{
  "index": <index of the chosen article>,
  "headline": "<punchy headline, at most 15 words>",
  "caption": "<2-3 sentence social media caption summarising the story>",
  "highlightPhrases": ["<1-3 short phrases copied verbatim from the headline to emphasise>"],
  "imagePrompt": "<a photorealistic image prompt illustrating the story, no text in the image>",
  "sourceName": "<name of the publishing outlet>"
}}"#
    )
}

/// 解析 LLM 的 JSON 响应
///
/// index 为空、越界或缺少标题都视为"没有合适的文章"
fn parse_analysis_response(
    response: &str,
    candidates: &[Article],
) -> Result<Option<AnalyzedArticle>> {
    let json = strip_code_fence(response);
    let parsed: AnalysisResponse = serde_json::from_str(json)
        .with_context(|| format!("could not parse analysis response: {}", response))?;

    let Some(index) = parsed.index else {
        debug!("LLM 认为没有合适的文章");
        return Ok(None);
    };

    let Some(article) = usize::try_from(index).ok().and_then(|i| candidates.get(i)) else {
        warn!(
            "LLM 返回的索引 {} 超出范围 [0, {}]",
            index,
            candidates.len().saturating_sub(1)
        );
        return Ok(None);
    };

    if parsed.headline.trim().is_empty() {
        warn!("LLM 选中了文章但没有给出标题");
        return Ok(None);
    }

    let source_name = if parsed.source_name.trim().is_empty() {
        article
            .source_name
            .clone()
            .or_else(|| article.source_id.clone())
            .unwrap_or_default()
    } else {
        parsed.source_name
    };

    Ok(Some(AnalyzedArticle {
        analysis: NewsAnalysis {
            headline: parsed.headline.trim().to_string(),
            caption: parsed.caption.trim().to_string(),
            highlight_phrases: parsed.highlight_phrases,
            image_prompt: parsed.image_prompt,
            source_name,
        },
        article: article.clone(),
    }))
}

/// 去掉模型常加的 ```json 代码块包裹
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    RE_CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Article> {
        vec![
            Article {
                link: "https://a.com/1".to_string(),
                title: "Flood in Sylhet".to_string(),
                source_id: Some("dailystar".to_string()),
                ..Default::default()
            },
            Article {
                link: "https://a.com/2".to_string(),
                title: "Football results".to_string(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = r#"```json
{"index": 0, "headline": "Sylhet under water", "caption": "Heavy rain.", "highlightPhrases": ["under water"], "imagePrompt": "flooded street", "sourceName": ""}
```"#;

        let result = parse_analysis_response(response, &candidates()).unwrap().unwrap();

        assert_eq!(result.article.link, "https://a.com/1");
        assert_eq!(result.analysis.headline, "Sylhet under water");
        assert_eq!(result.analysis.highlight_phrases, vec!["under water"]);
        // 缺少来源时使用文章自带的 source_id
        assert_eq!(result.analysis.source_name, "dailystar");
    }

    #[test]
    fn test_parse_no_match() {
        assert!(parse_analysis_response(r#"{"index": null}"#, &candidates())
            .unwrap()
            .is_none());
        assert!(parse_analysis_response(r#"{"index": 7, "headline": "x"}"#, &candidates())
            .unwrap()
            .is_none());
        assert!(parse_analysis_response(r#"{"index": -1, "headline": "x"}"#, &candidates())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"index\": 1}\n```"), r#"{"index": 1}"#);
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"index\": null} "), r#"{"index": null}"#);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_analysis_response("I think number 1", &candidates()).is_err());
    }

    #[test]
    fn test_prompt_lists_every_candidate() {
        let prompt = build_analysis_prompt(&candidates());
        assert!(prompt.contains("Flood in Sylhet"));
        assert!(prompt.contains("Football results"));
        assert!(prompt.contains(r#""index": null"#));
    }
}
