//! The generic resource layer: paginated list resources and single-item
//! resources, both wrapping a decoded [Collection] snapshot.
//!
//! Every operation returns a *new* resource value (functional update);
//! the receiver is never mutated, so readers holding an older snapshot
//! keep observing it, and a failed call leaves the receiver untouched.

use crate::catalog::ResourceType;
use crate::collection::{Collection, Item, Linked};
use crate::constants::{NEXT_REL, PREVIOUS_REL};
use crate::errors::{Error, GetError, ProtocolError, RequestError};
use crate::transport::{FileBlob, SearchParams, Transport};
use crate::types::{CollectionUrl, ItemUrl};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::Stream;
use serde_json::{Map, Value};
use std::time::Duration;

/// Lifecycle state of a resource object.
///
/// A resource is created network-idle ([ResourceState::Uninitialized])
/// and becomes [ResourceState::Ready] only after a successful operation
/// replaces its collection. `Ready` never transitions back. The explicit
/// tag keeps "never fetched" observably distinct from "fetched with zero
/// fields".
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState {
    Uninitialized,
    Ready(Collection),
}

impl ResourceState {
    pub fn collection(&self) -> Option<&Collection> {
        match self {
            ResourceState::Uninitialized => None,
            ResourceState::Ready(collection) => Some(collection),
        }
    }
}

/// Capabilities common to list and item resources: a URL, a state
/// snapshot, and re-fetching.
#[async_trait]
pub trait Resource: Sized {
    /// The resource's own URL.
    fn url(&self) -> &str;

    fn state(&self) -> &ResourceState;

    fn collection(&self) -> Option<&Collection> {
        self.state().collection()
    }

    /// Serialize the current snapshot back into its wire envelope.
    fn encode_state(&self) -> Option<Value> {
        self.collection().map(Collection::encode)
    }

    /// Fetch the latest server state, returning a new resource value.
    /// A [ListResource] reuses its recorded search parameters.
    async fn refresh(&self, timeout: Option<Duration>) -> Result<Self, Error>;
}

/// A paginated collection of items, supporting search parameters and
/// `post` to create children.
#[derive(Debug, Clone)]
pub struct ListResource {
    kind: &'static ResourceType,
    transport: Transport,
    url: CollectionUrl,
    state: ResourceState,
    /// Search parameters of the last `get`, reused by [Resource::refresh].
    search: SearchParams,
}

impl ListResource {
    pub(crate) fn new(kind: &'static ResourceType, transport: Transport, url: CollectionUrl) -> Self {
        Self {
            kind,
            transport,
            url,
            state: ResourceState::Uninitialized,
            search: SearchParams::new(),
        }
    }

    fn with_page(&self, collection: Collection, search: SearchParams) -> Self {
        Self {
            kind: self.kind,
            transport: self.transport.clone(),
            url: self.url.clone(),
            state: ResourceState::Ready(collection),
            search,
        }
    }

    /// Fetch this collection, optionally filtered by search parameters.
    pub async fn get(
        &self,
        search: Option<SearchParams>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let search = search.unwrap_or_default();
        let params = (!search.is_empty()).then_some(&search);
        let res = self.transport.get(self.url.as_str(), params, timeout).await?;
        let collection = res.collection()?;
        Ok(self.with_page(collection, search))
    }

    /// Create a child of this collection. The response collection becomes
    /// the new resource's state, so the created item is reachable through
    /// [ListResource::first_item]. With a [FileBlob] the request is
    /// multipart; otherwise it carries a Collection+JSON template built
    /// from `data`.
    pub async fn post(
        &self,
        data: &Map<String, Value>,
        blob: Option<FileBlob>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let res = self
            .transport
            .post(self.url.as_str(), data, blob, timeout)
            .await?;
        let collection = res.collection()?;
        Ok(self.with_page(collection, self.search.clone()))
    }

    /// Whether the decoded collection carries a `next` link.
    pub fn has_next_page(&self) -> bool {
        self.page_link(NEXT_REL).is_some()
    }

    /// Whether the decoded collection carries a `previous` link.
    pub fn has_previous_page(&self) -> bool {
        self.page_link(PREVIOUS_REL).is_some()
    }

    /// Follow the `next` link. `Ok(None)` when there is no next page.
    pub async fn next_page(&self, timeout: Option<Duration>) -> Result<Option<Self>, Error> {
        self.follow_page(NEXT_REL, timeout).await
    }

    /// Follow the `previous` link. `Ok(None)` when there is no previous page.
    pub async fn previous_page(&self, timeout: Option<Duration>) -> Result<Option<Self>, Error> {
        self.follow_page(PREVIOUS_REL, timeout).await
    }

    fn page_link(&self, rel: &str) -> Option<&str> {
        self.collection().and_then(|c| c.first_link(rel))
    }

    async fn follow_page(
        &self,
        rel: &'static str,
        timeout: Option<Duration>,
    ) -> Result<Option<Self>, Error> {
        // The page URL already carries its query string.
        let url = match self.page_link(rel).map(str::to_string) {
            Some(url) => url,
            None => return Ok(None),
        };
        let res = self.transport.get(&url, None, timeout).await?;
        let collection = res.collection()?;
        Ok(Some(self.with_page(collection, self.search.clone())))
    }

    /// Wrap each item of the current page as an [ItemResource]. Children
    /// share this resource's transport and collection-level links. Cheap;
    /// no network call.
    pub fn items(&self) -> Vec<ItemResource> {
        let collection = match self.collection() {
            Some(collection) => collection,
            None => return Vec::new(),
        };
        collection
            .items
            .iter()
            .map(|item| self.wrap_item(collection, item))
            .collect()
    }

    /// The first item of the current page, e.g. the entity a `post` just
    /// created.
    pub fn first_item(&self) -> Option<ItemResource> {
        let collection = self.collection()?;
        let item = collection.items.first()?;
        Some(self.wrap_item(collection, item))
    }

    /// Find the item whose `id` descriptor equals `id`. An empty match on
    /// a well-formed page is [GetError::NotFound], not a transport error.
    pub fn item(&self, id: impl Into<Value>) -> Result<ItemResource, GetError> {
        let id = id.into();
        self.items()
            .into_iter()
            .find(|child| child.item().and_then(|i| i.descriptor("id")) == Some(&id))
            .ok_or_else(|| GetError::NotFound(format!("{} {}", self.kind.name, id)))
    }

    /// Construct the related list resource behind the link relation `rel`.
    /// When the relation repeats, the first URL wins.
    pub fn related_list(
        &self,
        rel: &str,
        kind: &'static ResourceType,
    ) -> Result<ListResource, ProtocolError> {
        let url = self.related_url(rel)?;
        Ok(ListResource::new(
            kind,
            self.transport.clone(),
            CollectionUrl::new(url),
        ))
    }

    /// Construct the related item resource behind the link relation `rel`.
    pub fn related_item(
        &self,
        rel: &str,
        kind: &'static ResourceType,
    ) -> Result<ItemResource, ProtocolError> {
        let url = self.related_url(rel)?;
        Ok(ItemResource::new(
            kind,
            self.transport.clone(),
            ItemUrl::new(url),
        ))
    }

    fn related_url(&self, rel: &str) -> Result<String, ProtocolError> {
        self.collection()
            .and_then(|c| c.first_link(rel))
            .map(str::to_string)
            .ok_or_else(|| ProtocolError::MissingLink {
                rel: rel.to_string(),
                url: self.url.to_string(),
            })
    }

    /// Produce the items of this collection across all pages. Pagination
    /// is handled transparently: `next` links are followed as needed.
    pub fn stream(&self) -> impl Stream<Item = Result<Item, Error>> + '_ {
        try_stream! {
            // The first page may already be decoded; subsequent pages are
            // always fetched through their next link.
            let first = match self.collection() {
                Some(collection) => collection.clone(),
                None => {
                    let params = (!self.search.is_empty()).then_some(&self.search);
                    let res = self.transport.get(self.url.as_str(), params, None).await?;
                    res.collection()?
                }
            };
            let mut next = first.first_link(NEXT_REL).map(str::to_string);
            for item in first.items {
                yield item;
            }
            while let Some(url) = next {
                let res = self.transport.get(&url, None, None).await?;
                let page = res.collection()?;
                next = page.first_link(NEXT_REL).map(str::to_string);
                for item in page.items {
                    yield item;
                }
            }
        }
    }

    fn wrap_item(&self, collection: &Collection, item: &Item) -> ItemResource {
        let url = item
            .href
            .clone()
            .unwrap_or_else(|| ItemUrl::new(self.url.to_string()));
        let snapshot = Collection {
            version: collection.version.clone(),
            href: item.href.as_ref().map(|u| u.to_string()),
            links: collection.links.clone(),
            items: vec![item.clone()],
            template: None,
            error: None,
        };
        ItemResource {
            kind: self.kind,
            transport: self.transport.clone(),
            url,
            state: ResourceState::Ready(snapshot),
        }
    }
}

#[async_trait]
impl Resource for ListResource {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn state(&self) -> &ResourceState {
        &self.state
    }

    async fn refresh(&self, timeout: Option<Duration>) -> Result<Self, Error> {
        self.get(Some(self.search.clone()), timeout).await
    }
}

/// A single entity, supporting `put` and `delete` against its own href.
#[derive(Debug, Clone)]
pub struct ItemResource {
    kind: &'static ResourceType,
    transport: Transport,
    url: ItemUrl,
    state: ResourceState,
}

impl ItemResource {
    pub(crate) fn new(kind: &'static ResourceType, transport: Transport, url: ItemUrl) -> Self {
        Self {
            kind,
            transport,
            url,
            state: ResourceState::Uninitialized,
        }
    }

    fn with_state(&self, collection: Collection) -> Self {
        Self {
            kind: self.kind,
            transport: self.transport.clone(),
            url: self.url.clone(),
            state: ResourceState::Ready(collection),
        }
    }

    /// Fetch this entity.
    pub async fn get(&self, timeout: Option<Duration>) -> Result<Self, Error> {
        let res = self.transport.get(self.url.as_str(), None, timeout).await?;
        Ok(self.with_state(res.collection()?))
    }

    /// Modify this entity with a Collection+JSON template built from
    /// `data`. The response collection becomes the new resource's state.
    pub async fn put(
        &self,
        data: &Map<String, Value>,
        timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        let res = self.transport.put(self.url.as_str(), data, timeout).await?;
        Ok(self.with_state(res.collection()?))
    }

    /// Delete the remote entity. The local object is left as-is and
    /// becomes stale; dropping it is the caller's responsibility.
    pub async fn delete(&self, timeout: Option<Duration>) -> Result<(), RequestError> {
        self.transport.delete(self.url.as_str(), timeout).await?;
        Ok(())
    }

    /// The decoded item, if this resource has been populated.
    pub fn item(&self) -> Option<&Item> {
        self.collection().and_then(|c| c.items.first())
    }

    /// The item's descriptors. `None` means the resource was never
    /// fetched; `Some` of an empty map means it was fetched and has zero
    /// fields. The two are deliberately distinct.
    pub fn descriptors(&self) -> Option<Map<String, Value>> {
        self.collection()
            .map(|_| self.item().map(Item::descriptor_map).unwrap_or_default())
    }

    /// Construct the related list resource behind the link relation `rel`.
    /// Item-level links are consulted before collection-level links; when
    /// a relation repeats, the first URL wins.
    pub fn related_list(
        &self,
        rel: &str,
        kind: &'static ResourceType,
    ) -> Result<ListResource, ProtocolError> {
        let url = self.related_url(rel)?;
        Ok(ListResource::new(
            kind,
            self.transport.clone(),
            CollectionUrl::new(url),
        ))
    }

    /// Construct the related item resource behind the link relation `rel`.
    pub fn related_item(
        &self,
        rel: &str,
        kind: &'static ResourceType,
    ) -> Result<ItemResource, ProtocolError> {
        let url = self.related_url(rel)?;
        Ok(ItemResource::new(
            kind,
            self.transport.clone(),
            ItemUrl::new(url),
        ))
    }

    fn related_url(&self, rel: &str) -> Result<String, ProtocolError> {
        let from_item = self.item().and_then(|i| i.first_link(rel));
        let from_collection = self.collection().and_then(|c| c.first_link(rel));
        from_item
            .or(from_collection)
            .map(str::to_string)
            .ok_or_else(|| ProtocolError::MissingLink {
                rel: rel.to_string(),
                url: self.url.to_string(),
            })
    }

    /// Singular name of this resource's family.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name
    }
}

#[async_trait]
impl Resource for ItemResource {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn state(&self) -> &ResourceState {
        &self.state
    }

    async fn refresh(&self, timeout: Option<Duration>) -> Result<Self, Error> {
        self.get(timeout).await
    }
}
