//! What clients get to see of upstream payloads
//!
//! GitHub responses carry identity and navigation data (owners, api urls, raw
//! file urls) that the frontend has no use for. These projections drop them.

use std::collections::BTreeMap;

use crate::github::data::{ChangeStatus, CommitRecord, Gist, GistFile};

const INTERNAL_FIELDS: [&str; 11] = [
    "owner",
    "history",
    "forks",
    "user",
    "url",
    "forks_url",
    "commits_url",
    "git_pull_url",
    "git_push_url",
    "html_url",
    "comments_url",
];

#[derive(Clone, Debug, ::serde::Serialize)]
pub struct GistView {
    pub id: String,
    pub files: BTreeMap<String, FileView>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl From<Gist> for GistView {
    fn from(gist: Gist) -> Self {
        let Gist {
            id,
            files,
            mut fields,
        } = gist;

        for field in INTERNAL_FIELDS {
            fields.remove(field);
        }

        Self {
            id,
            files: files_view(files),
            fields,
        }
    }
}

#[derive(Clone, Debug, PartialEq, ::serde::Serialize)]
pub struct FileView {
    pub filename: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub language: Option<String>,
    pub size: u64,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl From<GistFile> for FileView {
    fn from(file: GistFile) -> Self {
        let GistFile {
            filename,
            kind,
            language,
            raw_url: _,
            size,
            truncated,
            content,
        } = file;

        Self {
            filename,
            kind,
            language,
            size,
            truncated,
            content,
        }
    }
}

pub fn files_view(files: BTreeMap<String, GistFile>) -> BTreeMap<String, FileView> {
    files.into_iter().map(|(k, v)| (k, v.into())).collect()
}

#[derive(Clone, Debug, ::serde::Serialize)]
pub struct CommitView {
    pub version: String,
    #[serde(with = "crate::serde::rfc3339")]
    pub committed_at: time::OffsetDateTime,
    pub change_status: ChangeStatus,
}

impl From<CommitRecord> for CommitView {
    fn from(commit: CommitRecord) -> Self {
        Self {
            version: commit.version,
            committed_at: commit.committed_at,
            change_status: commit.change_status,
        }
    }
}

pub fn commits_view(commits: Vec<CommitRecord>) -> Vec<CommitView> {
    commits.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gist_drops_internal_fields() {
        let gist: Gist = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "description": "notes",
            "public": false,
            "owner": { "login": "octocat" },
            "history": [],
            "forks": [],
            "url": "https://api.github.com/gists/abc",
            "html_url": "https://gist.github.com/abc",
            "git_pull_url": "https://gist.github.com/abc.git",
            "files": {
                "a.txt": {
                    "filename": "a.txt",
                    "type": "text/plain",
                    "language": "Text",
                    "raw_url": "https://gist.githubusercontent.com/raw/a.txt",
                    "size": 5,
                    "truncated": false,
                    "content": "hello"
                }
            }
        }))
        .unwrap();

        let view = serde_json::to_value(GistView::from(gist)).unwrap();
        let object = view.as_object().unwrap();
        for field in INTERNAL_FIELDS {
            assert!(!object.contains_key(field), "{field} should be stripped");
        }

        assert_eq!(view["id"], "abc");
        assert_eq!(view["description"], "notes");
        assert_eq!(view["public"], false);
        assert_eq!(view["files"]["a.txt"]["content"], "hello");
        assert_eq!(view["files"]["a.txt"]["type"], "text/plain");
        assert!(view["files"]["a.txt"].get("raw_url").is_none());
    }

    #[test]
    fn commit_drops_user_and_url() {
        let commit: CommitRecord = serde_json::from_value(serde_json::json!({
            "url": "https://api.github.com/gists/abc/v1",
            "version": "v1",
            "user": { "login": "octocat" },
            "change_status": { "total": 3, "additions": 2, "deletions": 1 },
            "committed_at": "2024-01-02T03:04:05Z"
        }))
        .unwrap();

        let view = serde_json::to_value(CommitView::from(commit)).unwrap();
        assert_eq!(
            view,
            serde_json::json!({
                "version": "v1",
                "committed_at": "2024-01-02T03:04:05Z",
                "change_status": { "total": 3, "additions": 2, "deletions": 1 }
            })
        );
    }
}
