use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::Mutex;

use crate::{
    errors::{NotFound, Upstream},
    github::data::{ChangeStatus, CommitRecord, Gist, GistEdit, GistFile, NewGist},
    source::{GistStore, RevisionSource},
};

#[derive(Clone)]
struct Revision {
    commit: CommitRecord,
    files: BTreeMap<String, GistFile>,
}

#[derive(Default)]
struct State {
    // newest first
    history: HashMap<String, Vec<Revision>>,
    fields: HashMap<String, serde_json::Map<String, serde_json::Value>>,
    failing: HashSet<(String, String)>,
    pages_requested: HashMap<String, usize>,
    next_id: usize,
}

/// An in-memory gist store
#[derive(Default)]
pub struct MockGists {
    state: Mutex<State>,
}

impl MockGists {
    /// Adds a revision newer than all existing ones, creating the gist if needed
    pub fn with_revision(self, gist_id: &str, version: &str, files: &[(&str, &str)]) -> Self {
        let files = files
            .iter()
            .map(|(name, content)| (name.to_string(), GistFile::text(name, content)))
            .collect();
        self.push_revision(gist_id, version, files);
        self
    }

    /// Adds upstream fields to the gist's payload
    pub fn with_field(self, gist_id: &str, key: &str, value: serde_json::Value) -> Self {
        self.state
            .lock()
            .fields
            .entry(gist_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    /// Fetching this revision's snapshot fails with an upstream error
    pub fn with_failing_snapshot(self, gist_id: &str, version: &str) -> Self {
        self.state
            .lock()
            .failing
            .insert((gist_id.to_string(), version.to_string()));
        self
    }

    pub fn commit_pages_requested(&self, gist_id: &str) -> usize {
        self.state
            .lock()
            .pages_requested
            .get(gist_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, gist_id: &str) -> bool {
        self.state.lock().history.contains_key(gist_id)
    }

    fn push_revision(&self, gist_id: &str, version: &str, files: BTreeMap<String, GistFile>) {
        let mut state = self.state.lock();
        let history = state.history.entry(gist_id.to_string()).or_default();

        let committed_at =
            time::OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(history.len() as i64);
        let total = files.len() as u64;

        history.insert(
            0,
            Revision {
                commit: CommitRecord {
                    version: version.to_string(),
                    committed_at,
                    change_status: ChangeStatus {
                        total,
                        additions: total,
                        deletions: 0,
                    },
                    user: Some(serde_json::json!({ "login": "octocat" })),
                    url: Some(format!("https://api.github.com/gists/{gist_id}/{version}")),
                },
                files,
            },
        );
    }

    fn snapshot(state: &State, gist_id: &str, revision: &Revision) -> Gist {
        let mut fields = state.fields.get(gist_id).cloned().unwrap_or_default();
        fields.insert(
            "history".into(),
            serde_json::json!([{ "version": revision.commit.version }]),
        );
        Gist {
            id: gist_id.to_string(),
            files: revision.files.clone(),
            fields,
        }
    }

    fn latest(&self, gist_id: &str) -> anyhow::Result<Gist> {
        let state = self.state.lock();
        let revision = state
            .history
            .get(gist_id)
            .and_then(|history| history.first())
            .ok_or(NotFound)?;
        Ok(Self::snapshot(&state, gist_id, revision))
    }

    fn next_version(&self, gist_id: &str) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        format!("{gist_id}-{}", state.next_id)
    }
}

#[async_trait::async_trait]
impl RevisionSource for MockGists {
    async fn list_commits(
        &self,
        gist_id: &str,
        per_page: usize,
        page: usize,
    ) -> anyhow::Result<Vec<CommitRecord>> {
        let mut state = self.state.lock();
        *state
            .pages_requested
            .entry(gist_id.to_string())
            .or_default() += 1;

        let history = state.history.get(gist_id).ok_or(NotFound)?;
        Ok(history
            .iter()
            .skip(page.saturating_sub(1) * per_page)
            .take(per_page)
            .map(|rev| rev.commit.clone())
            .collect())
    }

    async fn get_snapshot(&self, gist_id: &str, version: &str) -> anyhow::Result<Gist> {
        let state = self.state.lock();
        if state
            .failing
            .contains(&(gist_id.to_string(), version.to_string()))
        {
            return Err(Upstream {
                status: 502,
                body: "bad gateway".into(),
            }
            .into());
        }

        let revision = state
            .history
            .get(gist_id)
            .and_then(|history| history.iter().find(|rev| rev.commit.version == version))
            .ok_or(NotFound)?;
        Ok(Self::snapshot(&state, gist_id, revision))
    }
}

#[async_trait::async_trait]
impl GistStore for MockGists {
    async fn get_gist(&self, gist_id: &str) -> anyhow::Result<Gist> {
        self.latest(gist_id)
    }

    async fn create_gist(&self, gist: &NewGist) -> anyhow::Result<Gist> {
        let id = self.next_version("gist");
        let files = gist
            .files
            .iter()
            .map(|(name, file)| (name.clone(), GistFile::text(name, &file.content)))
            .collect();

        self.push_revision(&id, &format!("{id}-initial"), files);
        let description = serde_json::Value::from(gist.description.clone());
        self.state
            .lock()
            .fields
            .entry(id.clone())
            .or_default()
            .extend([
                ("description".to_string(), description),
                ("public".to_string(), gist.public.into()),
            ]);

        self.latest(&id)
    }

    async fn update_gist(&self, gist_id: &str, edit: &GistEdit) -> anyhow::Result<Gist> {
        let mut files = self.latest(gist_id)?.files;
        for (name, file) in &edit.files {
            match file {
                Some(file) => {
                    files.insert(name.clone(), GistFile::text(name, &file.content));
                }
                None => {
                    files.remove(name);
                }
            }
        }

        let version = self.next_version(gist_id);
        self.push_revision(gist_id, &version, files);
        self.latest(gist_id)
    }

    async fn delete_gist(&self, gist_id: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        state.history.remove(gist_id).ok_or(NotFound)?;
        state.fields.remove(gist_id);
        Ok(())
    }
}
