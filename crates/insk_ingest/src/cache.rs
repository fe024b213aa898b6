use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use insk_core::{Error, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::loader::{load_news_from_files, ArticleTable};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CachedTable {
    table: Arc<ArticleTable>,
    loaded: Instant,
}

/// Process-wide canonical table for one set of source files, rebuilt once stale.
pub struct TableCache {
    paths: Vec<PathBuf>,
    ttl: Duration,
    slot: Mutex<Option<CachedTable>>,
}

impl TableCache {
    pub fn new(paths: Vec<PathBuf>, ttl: Duration) -> Self {
        Self {
            paths,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Cache primed with an already built table, mostly for embedding callers and tests.
    pub fn with_table(table: ArticleTable, ttl: Duration) -> Self {
        Self {
            paths: Vec::new(),
            ttl,
            slot: Mutex::new(Some(CachedTable {
                table: Arc::new(table),
                loaded: Instant::now(),
            })),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub async fn get(&self) -> Result<Arc<ArticleTable>> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.loaded.elapsed() < self.ttl {
                debug!("Serving cached table ({} articles)", cached.table.len());
                return Ok(cached.table.clone());
            }
            if self.paths.is_empty() {
                return Ok(cached.table.clone());
            }
            info!("⏰ Cached table is stale, reloading");
        }

        let paths = self.paths.clone();
        let table = tokio::task::spawn_blocking(move || load_news_from_files(&paths))
            .await
            .map_err(|e| Error::External(e.into()))?;
        let table = Arc::new(table);
        *slot = Some(CachedTable {
            table: table.clone(),
            loaded: Instant::now(),
        });
        Ok(table)
    }

    pub async fn invalidate(&self) {
        if !self.paths.is_empty() {
            *self.slot.lock().await = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("news.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_cache_serves_same_table_within_ttl() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_csv(&dir, "제목,내용 요약\nA,one\n");
        let cache = TableCache::new(vec![path.clone()], DEFAULT_TTL);

        let first = cache.get().await.unwrap();
        write_csv(&dir, "제목,내용 요약\nA,one\nB,two\n");
        let second = cache.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_reloads_when_stale_or_invalidated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_csv(&dir, "제목,내용 요약\nA,one\n");

        let cache = TableCache::new(vec![path.clone()], Duration::ZERO);
        assert_eq!(cache.get().await.unwrap().len(), 1);
        write_csv(&dir, "제목,내용 요약\nA,one\nB,two\n");
        assert_eq!(cache.get().await.unwrap().len(), 2);

        let cache = TableCache::new(vec![path], DEFAULT_TTL);
        assert_eq!(cache.get().await.unwrap().len(), 2);
        write_csv(&dir, "제목,내용 요약\nC,three\n");
        cache.invalidate().await;
        assert_eq!(cache.get().await.unwrap().articles[0].title, "C");
    }

    #[tokio::test]
    async fn test_primed_cache_never_reloads() {
        let cache = TableCache::with_table(ArticleTable::empty(), Duration::ZERO);
        cache.invalidate().await;
        assert!(cache.get().await.unwrap().is_empty());
    }
}
