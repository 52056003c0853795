//! Cursor pagination over log queries
//!
//! A cursor identifies one event, and a request carrying a cursor may start
//! *at* that event: the last record of the previous page is echoed back as
//! the first record of the next one. Pages are always requested in
//! ascending order so that the echoed record, when present, is first.

use crate::core::{Completion, Cursor};
use crate::error::{LrqError, Result};
use crate::execution::LrqExecutor;
use crate::querying::log::{CursoredLogMatch, LogMatch, LogQuery};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One page of log matches.
#[derive(Debug, Clone)]
pub struct LogPage {
    pub matches: Vec<LogMatch>,
    /// Cursor to request the following page with. `None` on a complete
    /// page means end of stream; on a partial page it means nothing was
    /// gathered yet and the walk should restart from the beginning.
    pub next_cursor: Option<Cursor>,
    pub completion: Completion,
}

impl LogPage {
    /// Only a complete page can end the stream.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none() && self.completion.is_complete()
    }
}

/// Whether the server echoed the requested boundary record back.
///
/// The echo is observed server behaviour rather than a documented
/// guarantee; this is the only place that decides it.
pub fn is_boundary_echo(requested: &Cursor, first: &Cursor) -> bool {
    requested == first
}

/// Drop the echoed boundary record and pick the next cursor.
///
/// The next cursor is the cursor of the last match that survives; an empty
/// result (before or after trimming) ends the stream.
pub fn dedup_page(
    requested: Option<&Cursor>,
    mut matches: Vec<CursoredLogMatch>,
) -> (Vec<LogMatch>, Option<Cursor>) {
    if let Some(requested) = requested {
        let echoed = matches
            .first()
            .map_or(false, |first| is_boundary_echo(requested, &first.cursor));
        if echoed {
            matches.remove(0);
        }
    }

    let next_cursor = matches.last().map(|m| m.cursor.clone());
    let matches = matches.into_iter().map(|m| m.log_match).collect();
    (matches, next_cursor)
}

/// Fetch the page following `cursor` (or the first page when `None`).
///
/// A partial page that yields nothing new hands `cursor` back unchanged.
pub async fn fetch_log_page(
    executor: &LrqExecutor,
    query: &LogQuery,
    cursor: Option<&Cursor>,
    cancel: &CancellationToken,
) -> Result<LogPage> {
    let request = query.build_request_with(cursor, Some(true))?;
    let outcome = executor.execute(request, cancel).await?;
    let raw = query.decode_cursored(&outcome.data)?;
    let received = raw.len();

    let (matches, mut next_cursor) = dedup_page(cursor, raw);
    if next_cursor.is_none() && !outcome.completion.is_complete() {
        next_cursor = cursor.cloned();
    }
    debug!(
        received,
        returned = matches.len(),
        partial = !outcome.completion.is_complete(),
        "log page fetched"
    );

    Ok(LogPage { matches, next_cursor, completion: outcome.completion })
}

/// Walks a log query forward page by page until the stream ends.
#[derive(Debug, Clone)]
pub struct LogPaginator {
    executor: LrqExecutor,
    query: LogQuery,
    cursor: Option<Cursor>,
    exhausted: bool,
}

impl LogPaginator {
    pub fn new(executor: LrqExecutor, query: LogQuery) -> Self {
        Self { executor, query, cursor: None, exhausted: false }
    }

    /// Continue a previous walk from a saved cursor.
    pub fn resume(executor: LrqExecutor, query: LogQuery, cursor: Cursor) -> Self {
        Self { executor, query, cursor: Some(cursor), exhausted: false }
    }

    /// Cursor the next request will carry.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetch the next page, or `None` once a previous page ended the stream.
    pub async fn next_page(&mut self, cancel: &CancellationToken) -> Result<Option<LogPage>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = fetch_log_page(&self.executor, &self.query, self.cursor.as_ref(), cancel).await?;

        if page.is_last() {
            self.exhausted = true;
        } else if let Some(next) = &page.next_cursor {
            self.cursor = Some(next.clone());
        }
        Ok(Some(page))
    }

    /// Gather every remaining match in order.
    ///
    /// Stops early, keeping what was gathered, if `cancel` fires.
    pub async fn collect_all(mut self, cancel: &CancellationToken) -> Result<Vec<LogMatch>> {
        let mut all = Vec::new();
        loop {
            match self.next_page(cancel).await {
                Ok(Some(page)) => all.extend(page.matches),
                Ok(None) => break,
                Err(LrqError::RateLimitCancelled) if cancel.is_cancelled() => break,
                Err(err) => return Err(err),
            }
            if cancel.is_cancelled() {
                break;
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursored(cursor: &str, timestamp: i64) -> CursoredLogMatch {
        CursoredLogMatch {
            log_match: LogMatch { timestamp, ..Default::default() },
            cursor: Cursor::from(cursor),
        }
    }

    fn timestamps(matches: &[LogMatch]) -> Vec<i64> {
        matches.iter().map(|m| m.timestamp).collect()
    }

    #[test]
    fn test_first_page_returns_everything() {
        let raw = vec![cursored("c1", 1), cursored("c2", 2), cursored("c3", 3)];
        let (matches, next) = dedup_page(None, raw);
        assert_eq!(timestamps(&matches), vec![1, 2, 3]);
        assert_eq!(next, Some(Cursor::from("c3")));
    }

    #[test]
    fn test_first_page_empty_ends_stream() {
        let (matches, next) = dedup_page(None, Vec::new());
        assert!(matches.is_empty());
        assert_eq!(next, None);
    }

    #[test]
    fn test_first_page_never_trims() {
        // Without a requested cursor there is no boundary to compare against.
        let raw = vec![cursored("c1", 1)];
        let (matches, next) = dedup_page(None, raw);
        assert_eq!(matches.len(), 1);
        assert_eq!(next, Some(Cursor::from("c1")));
    }

    #[test]
    fn test_boundary_echo_is_dropped() {
        let requested = Cursor::from("c3");
        let raw = vec![cursored("c3", 3), cursored("c4", 4), cursored("c5", 5)];
        let (matches, next) = dedup_page(Some(&requested), raw);
        assert_eq!(timestamps(&matches), vec![4, 5]);
        assert_eq!(next, Some(Cursor::from("c5")));
    }

    #[test]
    fn test_no_echo_keeps_everything() {
        let requested = Cursor::from("c3");
        let raw = vec![cursored("c4", 4), cursored("c5", 5)];
        let (matches, next) = dedup_page(Some(&requested), raw);
        assert_eq!(timestamps(&matches), vec![4, 5]);
        assert_eq!(next, Some(Cursor::from("c5")));
    }

    #[test]
    fn test_empty_page_ends_stream() {
        let requested = Cursor::from("c5");
        let (matches, next) = dedup_page(Some(&requested), Vec::new());
        assert!(matches.is_empty());
        assert_eq!(next, None);
    }

    #[test]
    fn test_only_echo_ends_stream() {
        let requested = Cursor::from("c5");
        let (matches, next) = dedup_page(Some(&requested), vec![cursored("c5", 5)]);
        assert!(matches.is_empty());
        assert_eq!(next, None);
    }

    #[test]
    fn test_partial_page_is_never_last() {
        let partial = LogPage {
            matches: Vec::new(),
            next_cursor: None,
            completion: Completion::Partial { steps_completed: 0, steps_total: 5 },
        };
        assert!(!partial.is_last());

        let complete = LogPage { completion: Completion::Complete, ..partial };
        assert!(complete.is_last());
    }

    #[test]
    fn test_echo_only_checked_on_first_match() {
        let requested = Cursor::from("c3");
        let raw = vec![cursored("c4", 4), cursored("c3", 3)];
        let (matches, _) = dedup_page(Some(&requested), raw);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_walk_yields_each_record_once() {
        // Server pages of three, each continuation echoing the boundary.
        let all: Vec<CursoredLogMatch> = (1..=7).map(|i| cursored(&format!("c{}", i), i)).collect();
        let serve = |cursor: Option<&Cursor>| -> Vec<CursoredLogMatch> {
            let start = match cursor {
                None => 0,
                Some(c) => all.iter().position(|m| &m.cursor == c).unwrap(),
            };
            all[start..].iter().take(3).cloned().collect()
        };

        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let (matches, next) = dedup_page(cursor.as_ref(), serve(cursor.as_ref()));
            seen.extend(timestamps(&matches));
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
