use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, Url};

use crate::{
    errors::{NotFound, Upstream},
    source::{GistStore, RevisionSource},
};

use self::data::{CommitRecord, Gist, GistEdit, NewGist};

const API_VERSION: &str = "2022-11-28";

#[derive(Clone)]
pub struct GistClient {
    agent: reqwest::Client,
    token: Arc<str>,
    base: Url,
}

impl GistClient {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::new_with_ep(crate::config::DEFAULT_API_URL, token)
    }

    pub fn new_with_ep(ep: &str, token: &str) -> anyhow::Result<Self> {
        let agent = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()?;

        let base = Url::parse(ep)?;
        anyhow::ensure!(!base.cannot_be_a_base(), "invalid api url: {ep}");

        Ok(Self {
            agent,
            token: Arc::from(token),
            base,
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("gists").extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::trace!("{method} {url}");

        let req = [
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", API_VERSION),
        ]
        .into_iter()
        .fold(self.agent.request(method, url), |req, (k, v)| {
            req.header(k, v)
        });

        match &*self.token {
            "" => req,
            token => req.bearer_auth(token),
        }
    }

    async fn send(req: RequestBuilder) -> anyhow::Result<reqwest::Response> {
        let resp = req.send().await?;
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => Err(NotFound.into()),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(Upstream {
                    status: status.as_u16(),
                    body,
                }
                .into())
            }
        }
    }

    async fn send_json<T>(req: RequestBuilder) -> anyhow::Result<T>
    where
        for<'de> T: ::serde::Deserialize<'de> + Send + 'static,
    {
        Ok(Self::send(req).await?.json().await?)
    }
}

#[async_trait::async_trait]
impl RevisionSource for GistClient {
    async fn list_commits(
        &self,
        gist_id: &str,
        per_page: usize,
        page: usize,
    ) -> anyhow::Result<Vec<CommitRecord>> {
        let url = self.endpoint([gist_id, "commits"]);
        let req = self
            .request(Method::GET, url)
            .query(&[("per_page", per_page), ("page", page)]);
        Self::send_json(req).await
    }

    async fn get_snapshot(&self, gist_id: &str, version: &str) -> anyhow::Result<Gist> {
        let url = self.endpoint([gist_id, version]);
        Self::send_json(self.request(Method::GET, url)).await
    }
}

#[async_trait::async_trait]
impl GistStore for GistClient {
    async fn get_gist(&self, gist_id: &str) -> anyhow::Result<Gist> {
        let url = self.endpoint([gist_id]);
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn create_gist(&self, gist: &NewGist) -> anyhow::Result<Gist> {
        let url = self.endpoint([]);
        Self::send_json(self.request(Method::POST, url).json(gist)).await
    }

    async fn update_gist(&self, gist_id: &str, edit: &GistEdit) -> anyhow::Result<Gist> {
        let url = self.endpoint([gist_id]);
        Self::send_json(self.request(Method::PATCH, url).json(edit)).await
    }

    async fn delete_gist(&self, gist_id: &str) -> anyhow::Result<()> {
        let url = self.endpoint([gist_id]);
        Self::send(self.request(Method::DELETE, url)).await.map(drop)
    }
}

pub mod data {
    use std::collections::BTreeMap;

    /// One entry of a gist's history
    #[derive(Clone, Debug, ::serde::Deserialize)]
    pub struct CommitRecord {
        pub version: String,
        #[serde(with = "crate::serde::rfc3339")]
        pub committed_at: time::OffsetDateTime,
        #[serde(default)]
        pub change_status: ChangeStatus,

        #[serde(default)]
        pub user: Option<serde_json::Value>,
        #[serde(default)]
        pub url: Option<String>,
    }

    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
    pub struct ChangeStatus {
        #[serde(default)]
        pub total: u64,
        #[serde(default)]
        pub additions: u64,
        #[serde(default)]
        pub deletions: u64,
    }

    /// A gist as GitHub returns it, either current or at some revision
    ///
    /// Fields we don't look at are kept in `fields` so they can be forwarded.
    #[derive(Clone, Debug, ::serde::Deserialize)]
    pub struct Gist {
        #[serde(default)]
        pub id: String,
        #[serde(default, deserialize_with = "crate::serde::present_entries")]
        pub files: BTreeMap<String, GistFile>,
        #[serde(flatten)]
        pub fields: serde_json::Map<String, serde_json::Value>,
    }

    impl Gist {
        pub fn file_content(&self, filename: &str) -> Option<&str> {
            self.files.get(filename)?.content.as_deref()
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, ::serde::Deserialize)]
    pub struct GistFile {
        #[serde(default)]
        pub filename: Option<String>,
        #[serde(default, rename = "type")]
        pub kind: Option<String>,
        #[serde(default)]
        pub language: Option<String>,
        #[serde(default)]
        pub raw_url: Option<String>,
        #[serde(default)]
        pub size: u64,
        #[serde(default)]
        pub truncated: bool,
        #[serde(default)]
        pub content: Option<String>,
    }

    impl GistFile {
        pub fn text(filename: &str, content: &str) -> Self {
            Self {
                filename: Some(filename.to_string()),
                kind: Some("text/plain".into()),
                language: Some("Text".into()),
                size: content.len() as u64,
                content: Some(content.to_string()),
                ..Self::default()
            }
        }
    }

    #[derive(Clone, Debug, ::serde::Serialize)]
    pub struct FileContent {
        pub content: String,
    }

    #[derive(Clone, Debug, ::serde::Serialize)]
    pub struct NewGist {
        pub description: String,
        pub public: bool,
        pub files: BTreeMap<String, FileContent>,
    }

    /// Files mapped to `None` are removed from the gist
    #[derive(Clone, Debug, Default, ::serde::Serialize)]
    pub struct GistEdit {
        pub files: BTreeMap<String, Option<FileContent>>,
    }
}
