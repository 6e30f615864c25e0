//! The high-level client: discovers top-level resource URLs from the
//! entry-point collection and exposes one method per domain operation.

use crate::catalog::{self, ResourceType};
use crate::collection::{Link, Linked};
use crate::errors::{ConfigError, Error, ProtocolError};
use crate::resource::{ItemResource, ListResource};
use crate::transport::{Credentials, FileBlob, SearchParams, Transport};
use crate::types::{ApiUrl, CollectionUrl, ItemUrl, Username};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;

/// Client for a ChRIS Collection+JSON API.
///
/// Top-level URLs are discovered lazily: the first operation that needs
/// a link fetches the entry-point collection once, and the links are
/// cached for the lifetime of the client. [ChrisApiClient::rediscover]
/// explicitly invalidates the cache.
#[derive(Debug)]
pub struct ChrisApiClient {
    url: ApiUrl,
    transport: Transport,
    links: RwLock<Option<Vec<Link>>>,
}

/// Builder for [ChrisApiClient]. Construction is synchronous and
/// network-idle; supplying no credentials is a [ConfigError], not a
/// request failure later on.
pub struct ChrisApiClientBuilder {
    url: ApiUrl,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl ChrisApiClientBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Token(token.into()));
        self
    }

    pub fn basic(mut self, username: Username, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Basic {
            username,
            password: password.into(),
        });
        self
    }

    /// Override the default per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ChrisApiClient, ConfigError> {
        let credentials = self.credentials.ok_or(ConfigError::MissingCredentials)?;
        let transport = match self.timeout {
            Some(timeout) => Transport::with_timeout(credentials, timeout)?,
            None => Transport::new(credentials)?,
        };
        Ok(ChrisApiClient {
            url: self.url,
            transport,
            links: RwLock::new(None),
        })
    }
}

impl ChrisApiClient {
    /// Create a client builder.
    pub fn build(url: ApiUrl) -> ChrisApiClientBuilder {
        ChrisApiClientBuilder {
            url,
            credentials: None,
            timeout: None,
        }
    }

    /// The API base URL.
    pub fn url(&self) -> &ApiUrl {
        &self.url
    }

    /// Discard the cached entry-point links and fetch them again.
    pub async fn rediscover(&self) -> Result<(), Error> {
        {
            let mut cached = self.links.write().await;
            *cached = None;
        }
        self.entry_links().await.map(|_| ())
    }

    async fn entry_links(&self) -> Result<Vec<Link>, Error> {
        if let Some(links) = self.links.read().await.as_ref() {
            return Ok(links.clone());
        }
        let res = self.transport.get(self.url.as_str(), None, None).await?;
        let collection = res.collection()?;
        let mut cached = self.links.write().await;
        *cached = Some(collection.links.clone());
        Ok(collection.links)
    }

    /// Resolve the top-level URL for a link relation, discovering the
    /// entry-point links on first use.
    async fn resolve(&self, rel: &'static str) -> Result<String, Error> {
        let links = self.entry_links().await?;
        links
            .first_link(rel)
            .map(str::to_string)
            .ok_or_else(|| {
                ProtocolError::MissingLink {
                    rel: rel.to_string(),
                    url: self.url.to_string(),
                }
                .into()
            })
    }

    async fn list(
        &self,
        kind: &'static ResourceType,
        search: Option<SearchParams>,
    ) -> Result<ListResource, Error> {
        let url = self.resolve(kind.rel).await?;
        ListResource::new(kind, self.transport.clone(), CollectionUrl::new(url))
            .get(search, None)
            .await
    }

    async fn item(&self, kind: &'static ResourceType, id: u32) -> Result<ItemResource, Error> {
        let url = self.resolve(kind.rel).await?;
        let url = ItemUrl::new(format!("{}{}/", url, id));
        ItemResource::new(kind, self.transport.clone(), url)
            .get(None)
            .await
    }

    /// Get feeds. The API base URL is itself the feeds collection.
    pub async fn feeds(&self, search: Option<SearchParams>) -> Result<ListResource, Error> {
        let url = CollectionUrl::new(self.url.to_string());
        ListResource::new(&catalog::FEEDS, self.transport.clone(), url)
            .get(search, None)
            .await
    }

    /// Get one feed by ID.
    pub async fn feed(&self, id: u32) -> Result<ItemResource, Error> {
        let url = ItemUrl::new(format!("{}{}/", self.url, id));
        ItemResource::new(&catalog::FEEDS, self.transport.clone(), url)
            .get(None)
            .await
    }

    /// Get plugins.
    pub async fn plugins(&self, search: Option<SearchParams>) -> Result<ListResource, Error> {
        self.list(&catalog::PLUGINS, search).await
    }

    /// Get one plugin by ID.
    pub async fn plugin(&self, id: u32) -> Result<ItemResource, Error> {
        self.item(&catalog::PLUGINS, id).await
    }

    /// Get plugin instances.
    pub async fn plugin_instances(
        &self,
        search: Option<SearchParams>,
    ) -> Result<ListResource, Error> {
        self.list(&catalog::PLUGIN_INSTANCES, search).await
    }

    /// Get one plugin instance by ID.
    pub async fn plugin_instance(&self, id: u32) -> Result<ItemResource, Error> {
        self.item(&catalog::PLUGIN_INSTANCES, id).await
    }

    /// Get pipelines.
    pub async fn pipelines(&self, search: Option<SearchParams>) -> Result<ListResource, Error> {
        self.list(&catalog::PIPELINES, search).await
    }

    /// Get one pipeline by ID.
    pub async fn pipeline(&self, id: u32) -> Result<ItemResource, Error> {
        self.item(&catalog::PIPELINES, id).await
    }

    /// Get tags.
    pub async fn tags(&self, search: Option<SearchParams>) -> Result<ListResource, Error> {
        self.list(&catalog::TAGS, search).await
    }

    /// Get one tag by ID.
    pub async fn tag(&self, id: u32) -> Result<ItemResource, Error> {
        self.item(&catalog::TAGS, id).await
    }

    /// Get uploaded files.
    pub async fn files(&self, search: Option<SearchParams>) -> Result<ListResource, Error> {
        self.list(&catalog::FILES, search).await
    }

    /// Upload a file: one binary blob plus its describing fields (e.g.
    /// `upload_path`), sent as a multipart request to the uploaded-files
    /// collection. Returns the created file item.
    pub async fn upload(
        &self,
        data: &Map<String, Value>,
        blob: FileBlob,
    ) -> Result<ItemResource, Error> {
        let url = self.resolve(catalog::FILES.rel).await?;
        let files = ListResource::new(
            &catalog::FILES,
            self.transport.clone(),
            CollectionUrl::new(url.clone()),
        );
        let created = files.post(data, Some(blob), None).await?;
        created
            .first_item()
            .ok_or_else(|| ProtocolError::NoItems(url).into())
    }

    /// Get the authenticated user.
    pub async fn user(&self) -> Result<ItemResource, Error> {
        let url = self.resolve(catalog::USERS.rel).await?;
        ItemResource::new(&catalog::USERS, self.transport.clone(), ItemUrl::new(url))
            .get(None)
            .await
    }
}
