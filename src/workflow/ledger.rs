use std::collections::HashSet;

/// 本次运行中已被选用的文章链接
///
/// 只增不减，随运行结束一起丢弃
#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    used: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.used.contains(link)
    }

    pub fn add(&mut self, link: impl Into<String>) {
        self.used.insert(link.into());
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.used.iter().map(String::as_str)
    }
}
