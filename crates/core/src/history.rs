//! Local analysis history, one JSON object per line.

use crate::analysis::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const LOG_TARGET: &str = "history";
pub const SAMPLE_CHARS: usize = 40;
pub const SHORT_ID_LEN: usize = 8;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Lines written before ids existed get a fresh one on every read.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub created_at: SystemTime,
    pub input_text: String,
    pub result: AnalysisResult,
}

impl HistoryRecord {
    pub fn new<S: Into<String>>(input_text: S, result: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            input_text: input_text.into(),
            result,
        }
    }

    pub fn short_id(&self) -> String {
        let mut id = self.id.to_string();
        id.truncate(SHORT_ID_LEN);
        id
    }

    /// First [`SAMPLE_CHARS`] characters of the input on one line, with `...`
    /// when cut.
    pub fn sample(&self) -> String {
        let flat = self.input_text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut chars = flat.chars();
        let head: String = chars.by_ref().take(SAMPLE_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("history io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("history record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("id prefix {0:?} matches more than one record")]
    AmbiguousId(String),
}

#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    pub async fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_err(e))?;
        file.flush().await.map_err(|e| self.io_err(e))?;

        tracing::debug!(target: LOG_TARGET, path = %self.path.display(), "analysis saved");
        Ok(())
    }

    /// Most recent records first. A missing file is an empty history.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.read_all().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    /// Looks a record up by its id or a case-insensitive prefix of it.
    pub async fn find(&self, id_prefix: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let prefix = id_prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Ok(None);
        }

        let mut matches = self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(_), Some(_)) => Err(HistoryError::AmbiguousId(id_prefix.to_owned())),
            (found, _) => Ok(found),
        }
    }

    /// Deletes every saved analysis. Clearing an absent history is a no-op.
    pub async fn clear(&self) -> Result<(), HistoryError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(target: LOG_TARGET, path = %self.path.display(), "history cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    async fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let records = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(idx, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, line = idx + 1, error = %e, "skipping unreadable history line");
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(secs: u64, text: &str) -> HistoryRecord {
        HistoryRecord {
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            ..HistoryRecord::new(text, AnalysisResult::fallback())
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("none.jsonl"));
        assert!(store.recent(10).await.expect("readable").is_empty());
    }

    #[tokio::test]
    async fn appends_and_lists_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("nested/history.jsonl"));

        let third = record(30, "third");
        store.append(&record(10, "first")).await.expect("append");
        store.append(&third).await.expect("append");
        store.append(&record(20, "second")).await.expect("append");

        let all = store.recent(10).await.expect("readable");
        let texts: Vec<&str> = all.iter().map(|r| r.input_text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);

        let top = store.recent(1).await.expect("readable");
        assert_eq!(top, vec![third]);
    }

    #[tokio::test]
    async fn clear_removes_history_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        store.clear().await.expect("nothing to clear");

        store.append(&record(1, "one")).await.expect("append");
        store.append(&record(2, "two")).await.expect("append");
        store.clear().await.expect("cleared");

        assert!(store.recent(10).await.expect("readable").is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn find_by_full_id_or_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.jsonl"));

        let mut a = record(1, "alpha");
        a.id = Uuid::parse_str("aaaa1111-0000-4000-8000-000000000001").expect("uuid");
        let mut b = record(2, "beta");
        b.id = Uuid::parse_str("aaaa2222-0000-4000-8000-000000000002").expect("uuid");
        store.append(&a).await.expect("append");
        store.append(&b).await.expect("append");

        let found = store.find(&b.id.to_string()).await.expect("readable");
        assert_eq!(found.map(|r| r.input_text), Some("beta".to_owned()));
        let found = store.find("AAAA1").await.expect("readable");
        assert_eq!(found.map(|r| r.input_text), Some("alpha".to_owned()));

        assert!(store.find("ffff").await.expect("readable").is_none());
        assert!(store.find("  ").await.expect("readable").is_none());
        assert!(matches!(
            store.find("aaaa").await,
            Err(HistoryError::AmbiguousId(p)) if p == "aaaa"
        ));
    }

    #[test]
    fn sample_is_single_line_and_truncated() {
        let short = record(0, "See you\nat 5?");
        assert_eq!(short.sample(), "See you at 5?");

        let long = record(0, &"é".repeat(SAMPLE_CHARS + 5));
        let sample = long.sample();
        assert_eq!(sample.chars().count(), SAMPLE_CHARS + 3);
        assert!(sample.ends_with("..."));
    }

    #[test]
    fn short_id_is_uuid_head() {
        let mut r = record(0, "x");
        r.id = Uuid::parse_str("0123abcd-0000-4000-8000-000000000000").expect("uuid");
        assert_eq!(r.short_id(), "0123abcd");
    }

    #[test]
    fn lines_without_id_still_load() {
        let line = serde_json::to_value(record(3, "old")).expect("serializable");
        let mut obj = line.as_object().cloned().expect("object");
        obj.remove("id");
        let back: HistoryRecord =
            serde_json::from_value(serde_json::Value::Object(obj)).expect("deserializes");
        assert_eq!(back.input_text, "old");
    }

    #[tokio::test]
    async fn unreadable_lines_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.jsonl");
        let store = HistoryStore::new(&path);
        store.append(&record(5, "ok")).await.expect("append");
        tokio::fs::write(
            &path,
            format!(
                "{}not json\n\n",
                tokio::fs::read_to_string(&path).await.expect("read")
            ),
        )
        .await
        .expect("write");

        let all = store.recent(10).await.expect("readable");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].input_text, "ok");
    }
}
