//! Per-file views over a gist's history
//!
//! GitHub only knows about whole-gist revisions. [`find_file_revisions`] walks
//! that history and keeps the revisions where one file's content changed,
//! handing out a cursor so the walk can be resumed by a later request.
//!
//! Content comparisons need full snapshots, so the walk is expensive: commit
//! pages are over-fetched and every comparison costs two snapshot requests.

use crate::{
    errors::InvalidRequest,
    github::data::{CommitRecord, Gist},
    source::RevisionSource,
};

pub const DEFAULT_LIMIT: usize = 10;

/// Keeps the commit batch within GitHub's `per_page` maximum of 100
pub const MAX_LIMIT: usize = 50;

const MIN_BATCH_SIZE: usize = 50;

/// How many commits to request per upstream page for a given page `limit`
///
/// Most commits don't touch the file we're interested in, so we ask for more
/// than we could possibly return.
pub fn batch_size(limit: usize) -> usize {
    (limit * 2).max(MIN_BATCH_SIZE)
}

#[derive(Debug, Default)]
pub struct FilteredPage {
    /// Newest first
    pub revisions: Vec<CommitRecord>,
    /// The version to resume from, only present when the page is full
    pub next_cursor: Option<String>,
}

impl FilteredPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Change {
    Changed,
    Unchanged,
    /// The file doesn't exist at this revision, nothing older is relevant
    Gone,
}

/// Returns up to `limit` revisions, newest first, where `filename` changed
///
/// Without a `cursor` the newest revision containing the file starts the page.
/// With one, the walk resumes after the cursor's revision and compares against
/// it, so consecutive pages line up without gaps or duplicates. A cursor that
/// isn't part of the history yields an empty page.
///
/// When a comparison can't be made because a snapshot fetch failed, the
/// revision is reported as changed: showing an extra revision is preferable to
/// hiding a real change.
pub async fn find_file_revisions<S>(
    source: &S,
    gist_id: &str,
    filename: &str,
    cursor: Option<&str>,
    limit: usize,
) -> anyhow::Result<FilteredPage>
where
    S: RevisionSource + ?Sized,
{
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(InvalidRequest(format!("limit must be between 1 and {MAX_LIMIT}")).into());
    }

    let per_page = batch_size(limit);

    let mut accepted = Vec::<CommitRecord>::with_capacity(limit);
    // the revision the next candidate is compared against
    let mut baseline = cursor.map(ToString::to_string);
    let mut resuming = cursor.is_some();

    let mut page = 1;
    'walk: loop {
        let batch = source.list_commits(gist_id, per_page, page).await?;
        let exhausted = batch.len() < per_page;
        log::trace!(
            "{gist_id}: page {page} has {} commits (per page: {per_page})",
            batch.len()
        );

        for commit in batch {
            if resuming {
                resuming = Some(&*commit.version) != cursor;
                continue;
            }

            match evaluate(source, gist_id, filename, baseline.as_deref(), &commit).await? {
                Change::Changed => {
                    log::debug!("{gist_id}: {filename} changed at {}", commit.version);
                    baseline.replace(commit.version.clone());
                    accepted.push(commit);
                    if accepted.len() == limit {
                        break 'walk;
                    }
                }
                Change::Unchanged => {}
                Change::Gone => {
                    log::debug!("{gist_id}: {filename} is absent at {}", commit.version);
                    break 'walk;
                }
            }
        }

        if exhausted {
            break;
        }
        page += 1;
    }

    if resuming {
        log::debug!("{gist_id}: cursor {cursor:?} was not found in the history");
    }

    let next_cursor = match accepted.last() {
        Some(last) if accepted.len() == limit => Some(last.version.clone()),
        _ => None,
    };

    Ok(FilteredPage {
        revisions: accepted,
        next_cursor,
    })
}

async fn evaluate<S>(
    source: &S,
    gist_id: &str,
    filename: &str,
    baseline: Option<&str>,
    commit: &CommitRecord,
) -> anyhow::Result<Change>
where
    S: RevisionSource + ?Sized,
{
    let baseline = match baseline {
        Some(baseline) => baseline,
        None => {
            // nothing to compare against yet, any revision with the file starts the page
            let snapshot = source.get_snapshot(gist_id, &commit.version).await?;
            if snapshot.files.contains_key(filename) {
                return Ok(Change::Changed);
            }
            return Ok(Change::Unchanged);
        }
    };

    let (previous, current) = tokio::join!(
        source.get_snapshot(gist_id, baseline),
        source.get_snapshot(gist_id, &commit.version),
    );

    match (previous, current) {
        (Ok(previous), Ok(current)) => Ok(compare_snapshots(&previous, &current, filename)),
        (Err(err), _) | (_, Err(err)) => {
            log::warn!(
                "{gist_id}: cannot compare {filename} between {baseline} and {}, assuming it changed: {err:#}",
                commit.version
            );
            Ok(Change::Changed)
        }
    }
}

fn compare_snapshots(previous: &Gist, current: &Gist, filename: &str) -> Change {
    match (previous.files.get(filename), current.files.get(filename)) {
        (_, None) => Change::Gone,
        (None, Some(_)) => Change::Changed,
        (Some(previous), Some(current)) if previous.content != current.content => Change::Changed,
        _ => Change::Unchanged,
    }
}

/// The content of one file at two revisions
#[derive(Clone, Debug, PartialEq, Eq, ::serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub content_a: String,
    pub content_b: String,
}

/// Fetches `filename` at `version_a` and `version_b`
///
/// A file missing from a revision has empty content. Without a `version_b`
/// the second side is empty, e.g. to show a file's creation.
pub async fn compare<S>(
    source: &S,
    gist_id: &str,
    filename: &str,
    version_a: &str,
    version_b: Option<&str>,
) -> anyhow::Result<Comparison>
where
    S: RevisionSource + ?Sized,
{
    let content_of = |snapshot: &Gist| {
        snapshot
            .file_content(filename)
            .map(ToString::to_string)
            .unwrap_or_default()
    };

    let (content_a, content_b) = match version_b {
        Some(version_b) => {
            let (a, b) = tokio::try_join!(
                source.get_snapshot(gist_id, version_a),
                source.get_snapshot(gist_id, version_b),
            )?;
            (content_of(&a), content_of(&b))
        }
        None => {
            let a = source.get_snapshot(gist_id, version_a).await?;
            (content_of(&a), String::new())
        }
    };

    Ok(Comparison {
        content_a,
        content_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::NotFound, testing::MockGists};

    fn versions(page: &FilteredPage) -> Vec<&str> {
        page.revisions.iter().map(|c| &*c.version).collect()
    }

    // commits 5 (oldest) to 1 (newest), a.txt changes at 5, 3 and 1
    fn five_commits() -> MockGists {
        MockGists::default()
            .with_revision("g1", "5", &[("a.txt", "one"), ("c.txt", "same")])
            .with_revision("g1", "4", &[("a.txt", "two"), ("b.txt", "x"), ("c.txt", "same")])
            .with_revision("g1", "3", &[("a.txt", "two"), ("b.txt", "x"), ("c.txt", "same")])
            .with_revision("g1", "2", &[("a.txt", "three"), ("b.txt", "y"), ("c.txt", "same")])
            .with_revision("g1", "1", &[("a.txt", "three"), ("b.txt", "y"), ("c.txt", "same")])
    }

    #[tokio::test]
    async fn pages_through_changes() {
        let source = five_commits();

        let first = find_file_revisions(&source, "g1", "a.txt", None, 2)
            .await
            .unwrap();
        assert_eq!(versions(&first), ["1", "3"]);
        assert_eq!(first.next_cursor.as_deref(), Some("3"));
        assert!(first.has_more());

        let second = find_file_revisions(&source, "g1", "a.txt", first.next_cursor.as_deref(), 2)
            .await
            .unwrap();
        assert_eq!(versions(&second), ["5"]);
        assert_eq!(second.next_cursor, None);
        assert!(!second.has_more());
    }

    #[tokio::test]
    async fn file_that_never_exists() {
        let source = five_commits();
        for limit in [1, 2, 10, MAX_LIMIT] {
            let page = find_file_revisions(&source, "g1", "missing.txt", None, limit)
                .await
                .unwrap();
            assert!(page.revisions.is_empty());
            assert!(!page.has_more());
        }
    }

    #[tokio::test]
    async fn unchanged_file_only_reports_the_newest_revision() {
        let source = five_commits();
        for limit in [1, 2, 10] {
            let page = find_file_revisions(&source, "g1", "c.txt", None, limit)
                .await
                .unwrap();
            assert_eq!(versions(&page), ["1"]);
            assert_eq!(page.has_more(), limit == 1);
        }
    }

    #[tokio::test]
    async fn walk_ends_where_the_file_was_created() {
        let source = five_commits();
        let page = find_file_revisions(&source, "g1", "b.txt", None, 10)
            .await
            .unwrap();
        // b.txt doesn't exist at 5
        assert_eq!(versions(&page), ["1", "3"]);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn exactly_limit_matches() {
        let source = five_commits();
        let page = find_file_revisions(&source, "g1", "a.txt", None, 3)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["1", "3", "5"]);
        assert_eq!(page.next_cursor.as_deref(), Some("5"));

        let rest = find_file_revisions(&source, "g1", "a.txt", Some("5"), 3)
            .await
            .unwrap();
        assert!(rest.revisions.is_empty());
        assert!(!rest.has_more());
    }

    #[tokio::test]
    async fn cursor_pages_line_up_with_a_single_page() {
        let mut source = MockGists::default();
        for i in 0..120 {
            let content = format!("rev {}", i / 7);
            let other = format!("other {i}");
            source = source.with_revision("big", &format!("v{i}"), &[
                ("a.txt", &*content),
                ("b.txt", &*other),
            ]);
        }

        let all = find_file_revisions(&source, "big", "a.txt", None, MAX_LIMIT)
            .await
            .unwrap();

        let mut paged = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let page = find_file_revisions(&source, "big", "a.txt", cursor.as_deref(), 4)
                .await
                .unwrap();
            paged.extend(page.revisions.iter().map(|c| c.version.clone()));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let all = versions(&all);
        assert_eq!(all.len(), 18);
        assert_eq!(all, paged);
        assert_eq!(all.first(), Some(&"v119"));
    }

    #[tokio::test]
    async fn walks_multiple_upstream_pages() {
        let mut source = MockGists::default().with_revision("g", "v0", &[("a.txt", "old")]);
        for i in 1..=130 {
            source = source.with_revision("g", &format!("v{i}"), &[("a.txt", "new")]);
        }

        let page = find_file_revisions(&source, "g", "a.txt", None, 2)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["v130", "v0"]);
        assert!(page.has_more());
        // 131 commits in batches of 50
        assert_eq!(source.commit_pages_requested("g"), 3);
    }

    #[tokio::test]
    async fn history_filling_whole_pages() {
        let mut source = MockGists::default().with_revision("g", "v0", &[("a.txt", "old")]);
        for i in 1..100 {
            source = source.with_revision("g", &format!("v{i}"), &[("a.txt", "new")]);
        }

        let page = find_file_revisions(&source, "g", "a.txt", None, 10)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["v99", "v0"]);
        assert!(!page.has_more());
        // two full batches of 50, then the empty page that ends the history
        assert_eq!(source.commit_pages_requested("g"), 3);
    }

    #[tokio::test]
    async fn stops_where_the_file_disappears() {
        let source = MockGists::default()
            .with_revision("g", "v0", &[("a.txt", "ancient")])
            .with_revision("g", "v1", &[("b.txt", "x")])
            .with_revision("g", "v2", &[("a.txt", "one"), ("b.txt", "x")])
            .with_revision("g", "v3", &[("a.txt", "two"), ("b.txt", "x")]);

        let page = find_file_revisions(&source, "g", "a.txt", None, 10)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["v3", "v2"]);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn skips_newer_revisions_without_the_file() {
        let source = MockGists::default()
            .with_revision("g", "v0", &[("a.txt", "one")])
            .with_revision("g", "v1", &[("a.txt", "two")])
            .with_revision("g", "v2", &[("b.txt", "x")]);

        let page = find_file_revisions(&source, "g", "a.txt", None, 10)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["v1", "v0"]);
    }

    #[tokio::test]
    async fn failed_comparison_counts_as_a_change() {
        let source = five_commits().with_failing_snapshot("g1", "2");

        let page = find_file_revisions(&source, "g1", "a.txt", None, 10)
            .await
            .unwrap();
        assert_eq!(versions(&page), ["1", "2", "3", "5"]);
    }

    #[tokio::test]
    async fn failed_first_snapshot_is_an_error() {
        let source = five_commits().with_failing_snapshot("g1", "1");
        let err = find_file_revisions(&source, "g1", "a.txt", None, 10)
            .await
            .unwrap_err();
        assert!(!err.is::<NotFound>());
    }

    #[tokio::test]
    async fn unknown_cursor_yields_an_empty_page() {
        let source = five_commits();
        let page = find_file_revisions(&source, "g1", "a.txt", Some("nope"), 2)
            .await
            .unwrap();
        assert!(page.revisions.is_empty());
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn unknown_gist() {
        let source = MockGists::default();
        let err = find_file_revisions(&source, "nope", "a.txt", None, 2)
            .await
            .unwrap_err();
        assert!(err.is::<NotFound>());
    }

    #[tokio::test]
    async fn limit_is_bounded() {
        let source = five_commits();
        for limit in [0, MAX_LIMIT + 1] {
            let err = find_file_revisions(&source, "g1", "a.txt", None, limit)
                .await
                .unwrap_err();
            assert!(err.is::<InvalidRequest>());
        }
    }

    #[test]
    fn batch_sizes() {
        assert_eq!(batch_size(1), 50);
        assert_eq!(batch_size(25), 50);
        assert_eq!(batch_size(30), 60);
        assert_eq!(batch_size(MAX_LIMIT), 100);
    }

    #[tokio::test]
    async fn compare_two_revisions() {
        let source = five_commits();
        let cmp = compare(&source, "g1", "a.txt", "1", Some("3")).await.unwrap();
        assert_eq!(cmp.content_a, "three");
        assert_eq!(cmp.content_b, "two");
    }

    #[tokio::test]
    async fn compare_against_nothing() {
        let source = five_commits();
        let cmp = compare(&source, "g1", "a.txt", "5", None).await.unwrap();
        assert_eq!(cmp.content_a, "one");
        assert_eq!(cmp.content_b, "");
    }

    #[tokio::test]
    async fn compare_missing_file_is_empty() {
        let source = five_commits();
        let cmp = compare(&source, "g1", "b.txt", "5", Some("4")).await.unwrap();
        assert_eq!(cmp.content_a, "");
        assert_eq!(cmp.content_b, "x");
    }

    #[tokio::test]
    async fn compare_unknown_revision() {
        let source = five_commits();
        let err = compare(&source, "g1", "a.txt", "1", Some("nope"))
            .await
            .unwrap_err();
        assert!(err.is::<NotFound>());
    }
}
