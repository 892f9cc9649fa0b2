use std::collections::BTreeMap;

use crate::{
    github::data::{FileContent, Gist, GistEdit, NewGist},
    revisions::{self, Comparison, FilteredPage},
    source::GistStore,
    view::{self, CommitView, FileView, GistView},
};

// GitHub's own defaults for the commit listing
const DEFAULT_COMMITS_PAGE: usize = 1;
const DEFAULT_COMMITS_PER_PAGE: usize = 30;

#[derive(Debug, ::serde::Deserialize)]
pub struct CreateGist {
    #[serde(default)]
    pub description: Option<String>,
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub public: Option<bool>,
}

/// A `null` content removes the file
#[derive(Debug, ::serde::Deserialize)]
pub struct UpdateGist {
    pub filename: String,
    pub content: Option<String>,
}

#[derive(Debug, ::serde::Serialize)]
pub struct CreatedGist {
    pub id: String,
    pub files: BTreeMap<String, FileView>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Updated {
    /// The update left no files behind, so the gist was deleted
    pub deleted: bool,
}

/// Everything the http api can do with gists
pub struct Gists<S> {
    store: S,
}

impl<S> Gists<S>
where
    S: GistStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get(&self, gist_id: &str) -> anyhow::Result<GistView> {
        self.store.get_gist(gist_id).await.map(GistView::from)
    }

    pub async fn create(&self, req: CreateGist) -> anyhow::Result<CreatedGist> {
        let CreateGist {
            description,
            filename,
            content,
            public,
        } = req;

        let new = NewGist {
            description: description.unwrap_or_default(),
            public: public.unwrap_or(false),
            files: BTreeMap::from([(filename, FileContent { content })]),
        };

        let gist = self.store.create_gist(&new).await?;
        log::info!("created gist {}", gist.id);
        Ok(CreatedGist {
            id: gist.id,
            files: view::files_view(gist.files),
        })
    }

    pub async fn update(&self, gist_id: &str, req: UpdateGist) -> anyhow::Result<Updated> {
        let UpdateGist { filename, content } = req;
        let edit = GistEdit {
            files: BTreeMap::from([(filename, content.map(|content| FileContent { content }))]),
        };

        let gist = self.store.update_gist(gist_id, &edit).await?;
        let deleted = self.delete_if_empty(&gist).await?;
        Ok(Updated { deleted })
    }

    pub async fn delete(&self, gist_id: &str) -> anyhow::Result<()> {
        self.store.delete_gist(gist_id).await?;
        log::info!("deleted gist {gist_id}");
        Ok(())
    }

    pub async fn commits(
        &self,
        gist_id: &str,
        per_page: Option<usize>,
        page: Option<usize>,
    ) -> anyhow::Result<Vec<CommitView>> {
        let per_page = per_page.unwrap_or(DEFAULT_COMMITS_PER_PAGE);
        let page = page.unwrap_or(DEFAULT_COMMITS_PAGE);
        self.store
            .list_commits(gist_id, per_page, page)
            .await
            .map(view::commits_view)
    }

    pub async fn revision(&self, gist_id: &str, version: &str) -> anyhow::Result<GistView> {
        self.store
            .get_snapshot(gist_id, version)
            .await
            .map(GistView::from)
    }

    pub async fn file_revisions(
        &self,
        gist_id: &str,
        filename: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<FilteredPage> {
        revisions::find_file_revisions(&self.store, gist_id, filename, cursor, limit).await
    }

    pub async fn compare(
        &self,
        gist_id: &str,
        filename: &str,
        version_a: &str,
        version_b: Option<&str>,
    ) -> anyhow::Result<Comparison> {
        revisions::compare(&self.store, gist_id, filename, version_a, version_b).await
    }

    async fn delete_if_empty(&self, gist: &Gist) -> anyhow::Result<bool> {
        if !gist.files.is_empty() {
            return Ok(false);
        }

        log::info!("gist {} has no files left, deleting it", gist.id);
        self.store.delete_gist(&gist.id).await?;
        Ok(true)
    }
}
