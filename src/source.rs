use crate::github::data::{CommitRecord, Gist, GistEdit, NewGist};

/// Page-based access to a gist's history
///
/// Pages are 1-indexed and newest-first. A page shorter than `per_page` is the
/// last one, an empty page means the history is exhausted.
///
/// Errors are classified by their type: a [`crate::errors::NotFound`] when the
/// gist or the revision doesn't exist, anything else is an upstream failure.
#[async_trait::async_trait]
pub trait RevisionSource: Send + Sync {
    async fn list_commits(
        &self,
        gist_id: &str,
        per_page: usize,
        page: usize,
    ) -> anyhow::Result<Vec<CommitRecord>>;

    async fn get_snapshot(&self, gist_id: &str, version: &str) -> anyhow::Result<Gist>;
}

/// The rest of the gist api
#[async_trait::async_trait]
pub trait GistStore: RevisionSource {
    async fn get_gist(&self, gist_id: &str) -> anyhow::Result<Gist>;
    async fn create_gist(&self, gist: &NewGist) -> anyhow::Result<Gist>;
    async fn update_gist(&self, gist_id: &str, edit: &GistEdit) -> anyhow::Result<Gist>;
    async fn delete_gist(&self, gist_id: &str) -> anyhow::Result<()>;
}
