//! 翻译缓存模块
//!
//! 以修剪后的原文为键、译文为值的有界 LRU 缓存。语言对变化时整体清空，
//! 所以键里不带语言信息。

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::translation::config::constants;

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

/// 翻译缓存
pub struct TranslationCache {
    entries: LruCache<String, String>,
    stats: CacheStats,
}

impl TranslationCache {
    /// 使用默认容量创建
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_CACHE_CAPACITY)
    }

    /// 使用指定容量创建，容量为 0 时按 1 处理
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// 获取译文并刷新其最近使用位置
    pub fn get(&mut self, key: &str) -> Option<String> {
        self.stats.total_requests += 1;
        match self.entries.get(key) {
            Some(value) => {
                self.stats.cache_hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.cache_misses += 1;
                None
            }
        }
    }

    /// 插入或刷新条目，超出容量时淘汰最久未使用的条目
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some((evicted, _)) = self.entries.push(key.into(), value.into()) {
            // push 在键已存在时会返回旧值，这不算淘汰
            if !self.entries.contains(&evicted) {
                self.stats.evictions += 1;
                tracing::trace!("缓存淘汰: {}", evicted);
            }
        }
    }

    /// 是否包含某键（不刷新最近使用位置）
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// 清空缓存
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic_operations() {
        let mut cache = TranslationCache::new();
        assert_eq!(cache.capacity(), 500);

        cache.set("hola", "hello");
        assert_eq!(cache.get("hola"), Some("hello".to_string()));
        assert_eq!(cache.get("adios"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("hola"), None);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = TranslationCache::with_capacity(2);

        cache.set("1", "一");
        cache.set("2", "二");

        // 访问第一个，使其成为最近使用的
        cache.get("1");

        // 插入第三个，应该驱逐第二个
        cache.set("3", "三");
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("1"));
        assert!(!cache.contains("2"));
        assert!(cache.contains("3"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_set_refreshes_recency_without_eviction() {
        let mut cache = TranslationCache::with_capacity(2);
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("a", "1'");
        assert_eq!(cache.stats().evictions, 0);

        cache.set("c", "3");
        assert!(!cache.contains("b"));
        assert_eq!(cache.get("a"), Some("1'".to_string()));
    }

    #[test]
    fn test_capacity_plus_one_evicts_exactly_oldest() {
        let mut cache = TranslationCache::with_capacity(5);
        for i in 0..5 {
            cache.set(i.to_string(), format!("v{}", i));
        }
        cache.set("5", "v5");
        assert!(!cache.contains("0"));
        for i in 1..=5 {
            assert!(cache.contains(&i.to_string()));
        }
    }

    #[test]
    fn test_stats() {
        let mut cache = TranslationCache::with_capacity(4);
        cache.set("hello", "你好");
        cache.get("hello");
        cache.get("world");

        let stats = cache.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = TranslationCache::with_capacity(0);
        assert_eq!(cache.capacity(), 1);
    }
}
