use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CategoryError;

/// 合成 Trending 分类使用的 id
pub const AGGREGATE_CATEGORY_ID: &str = "top";

/// 新闻分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// 新闻源接口使用的分类值，同时作为任务 id
    pub id: String,
    /// 显示名称
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// 是否为聚合其它分类的 Trending 分类
    pub fn is_aggregate(&self) -> bool {
        self.id == AGGREGATE_CATEGORY_ID
    }
}

/// 校验分类列表：id 非空且在一次运行内唯一
///
/// Trending 由 id 标识，因此重复的 `top` 也会被拒绝
pub fn validate_categories(categories: &[Category]) -> Result<(), CategoryError> {
    let mut seen = HashSet::new();
    for category in categories {
        if category.id.trim().is_empty() {
            return Err(CategoryError::EmptyId);
        }
        if !seen.insert(category.id.as_str()) {
            return Err(CategoryError::DuplicateId(category.id.clone()));
        }
    }
    Ok(())
}
