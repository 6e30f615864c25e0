//! The Collection+JSON envelope: decoding, link relations, item
//! descriptors, and write templates.
//!
//! Wire structure:
//!
//! ```json
//! { "collection": {
//!     "version": "1.0",
//!     "href": "...",
//!     "links": [ {"rel": "...", "href": "..."} ],
//!     "items": [ { "href": "...", "data": [ {"name": "...", "value": "..."} ], "links": [] } ],
//!     "template": { "data": [ {"name": "...", "value": "..."} ] },
//!     "error": { "message": "..." }
//! } }
//! ```

use crate::errors::ProtocolError;
use crate::types::ItemUrl;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A name-value pair within an item's `data` array or a [Template].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// A link relation. A collection or item may repeat a relation name
/// (one-to-many); callers must handle zero/one/many matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// One entity within a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<ItemUrl>,
    #[serde(default)]
    pub data: Vec<Descriptor>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Item {
    /// Flatten this item's descriptors into a mapping. Later duplicate
    /// names overwrite earlier ones (last-write-wins), which is a defined
    /// tie-break rather than an error.
    pub fn descriptor_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for descriptor in &self.data {
            map.insert(descriptor.name.clone(), descriptor.value.clone());
        }
        map
    }

    /// Get a single descriptor value by name, applying the same
    /// last-write-wins rule as [Item::descriptor_map].
    pub fn descriptor(&self, name: &str) -> Option<&Value> {
        self.data
            .iter()
            .rev()
            .find(|d| d.name == name)
            .map(|d| &d.value)
    }
}

/// The write template of a collection, also used as the body of `POST`
/// and `PUT` requests (wrapped as `{"template": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub data: Vec<Descriptor>,
}

impl Template {
    /// Convert a plain field mapping into the descriptor sequence required
    /// for write requests. Mapping iteration order is preserved. `null`
    /// values are omitted, not sent as empty strings.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let data = map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| Descriptor {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        Self { data }
    }
}

/// The `error` member of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMessage {
    pub message: String,
}

/// A decoded Collection+JSON envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CollectionMessage>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    collection: Collection,
}

impl Collection {
    /// Decode a raw response body. Fails if the top-level envelope is
    /// missing the required `collection` wrapper or `version` field.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ProtocolError::Envelope(e.to_string()))?;
        Ok(envelope.collection)
    }

    /// Re-encode this collection inside its envelope.
    pub fn encode(&self) -> Value {
        serde_json::json!({ "collection": self })
    }
}

/// Containers which carry Collection+JSON links: implemented by both
/// [Collection] and [Item].
pub trait Linked {
    fn links(&self) -> &[Link];

    /// The URLs of all links whose relation equals `rel`, preserving
    /// source order. Empty (never an error) when the relation is absent.
    fn link_urls(&self, rel: &str) -> Vec<&str> {
        self.links()
            .iter()
            .filter(|link| link.rel == rel)
            .map(|link| link.href.as_str())
            .collect()
    }

    /// The first URL for `rel`. When a relation repeats, the first URL
    /// wins; this policy is deliberate and consistent across the crate.
    fn first_link(&self, rel: &str) -> Option<&str> {
        self.links()
            .iter()
            .find(|link| link.rel == rel)
            .map(|link| link.href.as_str())
    }
}

impl Linked for Collection {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Linked for Item {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Linked for Vec<Link> {
    fn links(&self) -> &[Link] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde_json::json;

    const FEED_COLLECTION: &str = r#"{
        "collection": {
            "version": "1.0",
            "href": "http://localhost:8000/api/v1/",
            "links": [
                {"rel": "plugins", "href": "http://localhost:8000/api/v1/plugins/"},
                {"rel": "tags", "href": "http://localhost:8000/api/v1/tags/"},
                {"rel": "tags", "href": "http://localhost:8000/api/v1/tags/alt/"},
                {"rel": "next", "href": "http://localhost:8000/api/v1/?offset=10"}
            ],
            "items": [
                {
                    "href": "http://localhost:8000/api/v1/3/",
                    "data": [
                        {"name": "id", "value": 3},
                        {"name": "name", "value": "brain analysis"},
                        {"name": "name", "value": "brain analysis (v2)"}
                    ],
                    "links": [
                        {"rel": "note", "href": "http://localhost:8000/api/v1/note3/"}
                    ]
                }
            ],
            "template": {
                "data": [
                    {"name": "name", "value": ""}
                ]
            }
        }
    }"#;

    #[fixture]
    fn collection() -> Collection {
        Collection::decode(FEED_COLLECTION).unwrap()
    }

    #[rstest]
    fn test_decode(collection: Collection) {
        assert_eq!(collection.version, "1.0");
        assert_eq!(collection.links.len(), 4);
        assert_eq!(collection.items.len(), 1);
        assert!(collection.template.is_some());
        assert!(collection.error.is_none());
    }

    #[rstest]
    #[case(r#"{"version": "1.0"}"#)]
    #[case(r#"{"collection": {}}"#)]
    #[case(r#"{"collection": {"links": []}}"#)]
    #[case("not json at all")]
    fn test_decode_rejects_bad_envelope(#[case] raw: &str) {
        assert!(matches!(
            Collection::decode(raw).unwrap_err(),
            ProtocolError::Envelope(_)
        ));
    }

    #[rstest]
    fn test_link_urls_preserves_duplicate_order(collection: Collection) {
        let urls = collection.link_urls("tags");
        assert_eq!(
            urls,
            vec![
                "http://localhost:8000/api/v1/tags/",
                "http://localhost:8000/api/v1/tags/alt/"
            ]
        );
        assert_eq!(
            collection.first_link("tags"),
            Some("http://localhost:8000/api/v1/tags/")
        );
    }

    #[rstest]
    fn test_link_urls_empty_for_absent_relation(collection: Collection) {
        assert!(collection.link_urls("comments").is_empty());
        assert_eq!(collection.first_link("comments"), None);
    }

    #[rstest]
    fn test_item_links(collection: Collection) {
        let item = &collection.items[0];
        assert_eq!(
            item.link_urls("note"),
            vec!["http://localhost:8000/api/v1/note3/"]
        );
        assert!(item.link_urls("plugins").is_empty());
    }

    #[rstest]
    fn test_descriptor_map_last_write_wins(collection: Collection) {
        let item = &collection.items[0];
        let map = item.descriptor_map();
        assert_eq!(map.get("id"), Some(&json!(3)));
        assert_eq!(map.get("name"), Some(&json!("brain analysis (v2)")));
        assert_eq!(item.descriptor("name"), Some(&json!("brain analysis (v2)")));
        // idempotent
        assert_eq!(map, item.descriptor_map());
    }

    #[test]
    fn test_template_from_map_preserves_order_and_omits_null() {
        let mut map = Map::new();
        map.insert("title".to_string(), json!("T"));
        map.insert("owner".to_string(), Value::Null);
        map.insert("content".to_string(), json!("C"));
        let template = Template::from_map(&map);
        assert_eq!(
            template.data,
            vec![
                Descriptor {
                    name: "title".to_string(),
                    value: json!("T")
                },
                Descriptor {
                    name: "content".to_string(),
                    value: json!("C")
                },
            ]
        );
    }

    #[rstest]
    fn test_encode_round_trip(collection: Collection) {
        let encoded = collection.encode().to_string();
        let decoded = Collection::decode(&encoded).unwrap();
        assert_eq!(decoded, collection);
    }
}
