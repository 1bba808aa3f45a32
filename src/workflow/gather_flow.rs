//! 第一阶段：收集文章 - 流程层
//!
//! 按配置顺序逐个分类：
//! 1. 拉取候选文章（Trending 分类并发拉取其它分类后合并）
//! 2. 过滤掉本次运行已用过的文章
//! 3. 交给分析服务挑出一篇
//! 4. 写入去重账本
//!
//! 单个分类失败只会让该任务进入 Error，不影响后续分类。

use futures::future::try_join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Article, Category, GatheredItem, TaskStatus};
use crate::services::{AnalyzedArticle, ArticleAnalyzer, NewsSource};
use crate::utils::logging::truncate_text;
use crate::workflow::{DedupLedger, RunContext};

pub struct GatherFlow<'a> {
    news: &'a dyn NewsSource,
    analyzer: &'a dyn ArticleAnalyzer,
    trending_size: usize,
    category_delay: Duration,
    verbose_logging: bool,
}

impl<'a> GatherFlow<'a> {
    pub fn new(news: &'a dyn NewsSource, analyzer: &'a dyn ArticleAnalyzer) -> Self {
        Self {
            news,
            analyzer,
            trending_size: 10,
            category_delay: Duration::ZERO,
            verbose_logging: false,
        }
    }

    pub fn trending_size(mut self, size: usize) -> Self {
        self.trending_size = size;
        self
    }

    /// 相邻两个分类之间的固定间隔
    pub fn category_delay(mut self, delay: Duration) -> Self {
        self.category_delay = delay;
        self
    }

    pub fn verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// 依次收集所有分类，返回成功收集的条目（保持分类顺序）
    pub async fn run(&self, categories: &[Category], ctx: &mut RunContext<'_>) -> Vec<GatheredItem> {
        let mut gathered = Vec::new();

        for (position, category) in categories.iter().enumerate() {
            ctx.set_status(&category.id, TaskStatus::Gathering);

            match self.gather_category(category, categories, ctx.ledger()).await {
                Ok(AnalyzedArticle { analysis, article }) => {
                    info!(
                        "[{}] ✓ 选中文章: {}",
                        category.name,
                        truncate_text(&analysis.headline, 80)
                    );
                    ctx.ledger_mut().add(article.link.clone());
                    gathered.push(GatheredItem {
                        task_id: category.id.clone(),
                        analysis,
                        article,
                    });
                    ctx.set_status(&category.id, TaskStatus::Gathered);
                }
                Err(e) => ctx.fail(&category.id, &e),
            }

            if position + 1 < categories.len() && !self.category_delay.is_zero() {
                debug!("等待 {:?} 后处理下一个分类", self.category_delay);
                tokio::time::sleep(self.category_delay).await;
            }
        }

        gathered
    }

    async fn gather_category(
        &self,
        category: &Category,
        categories: &[Category],
        ledger: &DedupLedger,
    ) -> PipelineResult<AnalyzedArticle> {
        let articles = if category.is_aggregate() {
            self.fetch_trending(category, categories).await?
        } else {
            self.fetch_category(category).await?
        };

        if articles.is_empty() {
            return Err(PipelineError::EmptySource {
                category: category.name.clone(),
            });
        }

        let unused: Vec<Article> = articles
            .into_iter()
            .filter(|article| !ledger.contains(&article.link))
            .collect();

        if unused.is_empty() {
            return Err(PipelineError::NoUnusedArticles {
                category: category.name.clone(),
            });
        }

        if self.verbose_logging {
            for (i, article) in unused.iter().enumerate() {
                debug!("[{}]   {}. {}", category.name, i + 1, truncate_text(&article.title, 80));
            }
        }

        info!("[{}] 🤖 分析 {} 篇候选文章...", category.name, unused.len());

        self.analyzer
            .analyze(&unused)
            .await
            .map_err(|e| PipelineError::Analysis {
                category: category.name.clone(),
                reason: format!("{:#}", e),
            })?
            .ok_or_else(|| PipelineError::NoRelevantArticle {
                category: category.name.clone(),
            })
    }

    async fn fetch_category(&self, category: &Category) -> PipelineResult<Vec<Article>> {
        info!("[{}] 📰 拉取新闻...", category.name);
        self.news
            .fetch_articles(&category.id)
            .await
            .map_err(|e| PipelineError::Fetch {
                category: category.name.clone(),
                reason: format!("{:#}", e),
            })
    }

    /// 并发拉取其它所有分类，合并出 Trending 列表
    async fn fetch_trending(
        &self,
        category: &Category,
        categories: &[Category],
    ) -> PipelineResult<Vec<Article>> {
        let siblings: Vec<&Category> = categories.iter().filter(|c| !c.is_aggregate()).collect();
        info!(
            "[{}] 📰 从 {} 个分类合成 Trending 列表...",
            category.name,
            siblings.len()
        );

        let lists = try_join_all(siblings.iter().map(|c| self.news.fetch_articles(&c.id)))
            .await
            .map_err(|e| PipelineError::Fetch {
                category: category.name.clone(),
                reason: format!("{:#}", e),
            })?;

        let merged = merge_trending(lists, self.trending_size);
        info!("[{}] 合成了 {} 篇最新文章", category.name, merged.len());
        Ok(merged)
    }
}

/// 合并多个分类的文章列表
///
/// - 按链接去重：保留首次出现的位置，内容取最后一次出现的
/// - 按发布时间倒序稳定排序，没有时间的排在最后且保持原有相对顺序
/// - 只保留前 `limit` 篇
pub fn merge_trending(lists: Vec<Vec<Article>>, limit: usize) -> Vec<Article> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Article> = Vec::new();

    for article in lists.into_iter().flatten() {
        match positions.get(&article.link) {
            Some(&index) => unique[index] = article,
            None => {
                positions.insert(article.link.clone(), unique.len());
                unique.push(article);
            }
        }
    }

    let mut keyed: Vec<_> = unique
        .into_iter()
        .map(|article| (article.published_at(), article))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));

    keyed
        .into_iter()
        .map(|(_, article)| article)
        .take(limit)
        .collect()
}
