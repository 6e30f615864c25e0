//! Client library for the ChRIS API speaking the Collection+JSON
//! hypermedia media type.
//!
//! The layers, bottom-up:
//!
//! - [collection]: the Collection+JSON envelope: decoding, link
//!   relations, item descriptors, write templates.
//! - [Transport]: authenticated HTTP with timeouts and multipart upload;
//!   every failure normalizes into [RequestError].
//! - [ListResource] / [ItemResource]: the generic resource model with
//!   pagination and link-following.
//! - [catalog]: static per-family configuration.
//! - [ChrisApiClient]: the high-level client, which discovers top-level
//!   URLs lazily from the entry-point collection.
//! - [account::Account]: the plain-JSON endpoints for token issuance and
//!   account creation.

pub mod account;
pub mod catalog;
mod client;
pub mod collection;
mod constants;
pub mod errors;
mod resource;
mod transport;
pub mod types;

pub use client::{ChrisApiClient, ChrisApiClientBuilder};
pub use collection::{Collection, CollectionMessage, Descriptor, Item, Link, Linked, Template};
pub use constants::{COLLECTION_JSON_MIME, DEFAULT_TIMEOUT};
pub use errors::{ConfigError, Error, GetError, ProtocolError, RequestError};
pub use resource::{ItemResource, ListResource, Resource, ResourceState};
pub use transport::{ApiResponse, Credentials, FileBlob, SearchParams, Transport};
