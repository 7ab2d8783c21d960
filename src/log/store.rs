use std::{future::Future, io::SeekFrom};

use chrono::{DateTime, Utc};
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt,
};
use tracing::debug;

use crate::errors::AppResult;

use super::record::LogRecord;

/// Contract for the resource backing a log. Rewriting needs to drop stale
/// bytes past the new end, which the plain async IO traits don't cover.
pub trait LogResource: AsyncRead + AsyncWrite + AsyncSeek + Send + Unpin {
    fn truncate(&mut self) -> impl Future<Output = std::io::Result<()>> + Send;
}

impl LogResource for tokio::fs::File {
    async fn truncate(&mut self) -> std::io::Result<()> {
        self.set_len(0).await
    }
}

/// The in-memory record set plus its backing resource. Appends go straight to
/// the end of the file; every other mutation is a full truncate-and-rewrite,
/// so the file is always a flushed encoding of this set.
#[derive(Debug)]
pub struct LogStore<F> {
    file: F,
    records: Vec<LogRecord>,
}

impl<F: LogResource> LogStore<F> {
    /// Reads and parses the whole resource. Any unparsable line fails the
    /// load; a half-read record set must never be worked with.
    pub async fn load(mut file: F) -> AppResult<LogStore<F>> {
        file.seek(SeekFrom::Start(0)).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;
        let records = contents
            .lines()
            .map(LogRecord::parse)
            .collect::<AppResult<Vec<_>>>()?;
        file.seek(SeekFrom::Start(0)).await?;
        debug!("Loaded {} log records", records.len());
        Ok(LogStore { file, records })
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// The record whose `[start, end]` span contains `now`, if any. Records
    /// still missing an end never qualify.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&LogRecord> {
        self.records
            .iter()
            .find(|record| record.start <= now && record.end.is_some_and(|end| now <= end))
    }

    pub fn current_mut(&mut self, now: DateTime<Utc>) -> Option<&mut LogRecord> {
        self.records
            .iter_mut()
            .find(|record| record.start <= now && record.end.is_some_and(|end| now <= end))
    }

    /// Stable-sorts the set by start and rewrites the resource from scratch,
    /// leaving the file as the canonical encoding of the sorted set.
    pub async fn normalize_and_persist(&mut self) -> AppResult<()> {
        self.records.sort_by_key(|record| record.start);
        let mut buffer = Vec::<u8>::new();
        for record in &self.records {
            buffer.extend_from_slice(record.to_string().as_bytes());
            buffer.push(b'\n');
        }
        self.file.seek(SeekFrom::Start(0)).await?;
        self.file.truncate().await?;
        self.file.write_all(&buffer).await?;
        self.file.flush().await?;
        debug!("Rewrote {} log records", self.records.len());
        Ok(())
    }

    /// Appends one record in memory and one encoded line at the end of the
    /// resource. The file stays unsorted until the next rewrite.
    pub async fn append(&mut self, record: LogRecord) -> AppResult<()> {
        let mut line = record.to_string();
        line.push('\n');
        self.file.seek(SeekFrom::End(0)).await?;
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        debug!("Appended log record {:?}", record.title);
        self.records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempfile;
    use tokio::io::{AsyncReadExt, AsyncSeekExt};

    use crate::{
        errors::AppError,
        log::record::{LogRecord, Status},
    };

    use super::LogStore;

    async fn store_over(contents: &str) -> Result<LogStore<tokio::fs::File>> {
        let mut file = tempfile()?;
        file.write_all(contents.as_bytes())?;
        Ok(LogStore::load(tokio::fs::File::from_std(file)).await?)
    }

    async fn file_contents(store: &mut LogStore<tokio::fs::File>) -> Result<String> {
        store.file.rewind().await?;
        let mut contents = String::new();
        store.file.read_to_string(&mut contents).await?;
        Ok(contents)
    }

    #[tokio::test]
    async fn load_parses_every_line() -> Result<()> {
        let store = store_over(
            "+ 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000 write spec\n\
             2018-01-04 16:16-06:00 2018-01-04 16:41-06:00 old entry\n",
        )
        .await?;

        assert_eq!(store.records().len(), 2);
        assert_eq!(store.records()[0].status, Status::Achieved);
        assert_eq!(store.records()[1].title, "old entry");
        Ok(())
    }

    #[tokio::test]
    async fn load_fails_whole_on_one_bad_line() -> Result<()> {
        let mut file = tempfile()?;
        file.write_all(
            b"+ 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000 good\n\
              this line is corrupt\n",
        )?;

        let error = LogStore::load(tokio::fs::File::from_std(file))
            .await
            .unwrap_err();
        match error {
            AppError::LogParse { line } => assert_eq!(line.trim(), "this line is corrupt"),
            other => panic!("unexpected error {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn normalize_sorts_and_is_idempotent() -> Result<()> {
        // Out of order, legacy shapes mixed in.
        let mut store = store_over(
            "2024-01-02 09:00:00.0000+0000 2024-01-02 09:25:00.0000+0000 second\n\
             + 2024-01-01 09:00:00.0000-0600 2024-01-01 09:25:00.0000-0600 first\n",
        )
        .await?;

        store.normalize_and_persist().await?;
        let first_pass = file_contents(&mut store).await?;
        store.normalize_and_persist().await?;
        let second_pass = file_contents(&mut store).await?;

        assert_eq!(first_pass, second_pass);
        let lines = first_pass.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        // Offsets are normalized to UTC on rewrite.
        assert_eq!(
            lines[0],
            "+ 2024-01-01 15:00:00.0000+0000 2024-01-01 15:25:00.0000+0000 first"
        );
        assert!(lines[1].ends_with("second"));
        Ok(())
    }

    #[tokio::test]
    async fn equal_starts_keep_their_input_order() -> Result<()> {
        let mut store = store_over(
            "= 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000 earlier in file\n\
             - 2024-01-01 09:00:00.0000+0000 2024-01-01 09:30:00.0000+0000 later in file\n",
        )
        .await?;

        store.normalize_and_persist().await?;
        store.normalize_and_persist().await?;

        let titles = store
            .records()
            .iter()
            .map(|record| record.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["earlier in file", "later in file"]);

        let contents = file_contents(&mut store).await?;
        let lines = contents.lines().collect::<Vec<_>>();
        assert!(lines[0].ends_with("earlier in file"));
        assert!(lines[1].ends_with("later in file"));
        Ok(())
    }

    #[tokio::test]
    async fn append_writes_one_line_at_the_end() -> Result<()> {
        let mut store = store_over(
            "+ 2024-01-02 09:00:00.0000+0000 2024-01-02 09:25:00.0000+0000 existing\n",
        )
        .await?;

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        store
            .append(LogRecord {
                start,
                end: Some(start + Duration::minutes(25)),
                title: "appended".to_string(),
                status: Status::NeverEvaluated,
            })
            .await?;

        // The new line lands at the end even though it sorts earlier; only
        // the next rewrite reorders the file.
        let contents = file_contents(&mut store).await?;
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("existing"));
        assert!(lines[1].ends_with("appended"));

        store.normalize_and_persist().await?;
        let contents = file_contents(&mut store).await?;
        let lines = contents.lines().collect::<Vec<_>>();
        assert!(lines[0].ends_with("appended"));
        assert!(lines[1].ends_with("existing"));
        Ok(())
    }

    #[tokio::test]
    async fn current_requires_a_containing_span() -> Result<()> {
        let store = store_over(
            "= 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000 closed\n\
             ? 2024-01-01 10:00:00.0000+0000                               open\n",
        )
        .await?;

        let inside = Utc.with_ymd_and_hms(2024, 1, 1, 9, 10, 0).unwrap();
        assert_eq!(store.current(inside).unwrap().title, "closed");

        let after = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        assert!(store.current(after).is_none());

        // An open record never counts as current, even mid-interval.
        let during_open = Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();
        assert!(store.current(during_open).is_none());
        Ok(())
    }
}
