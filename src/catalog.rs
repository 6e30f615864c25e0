//! Static declarations for each resource family the API exposes.
//!
//! These are configuration, not logic: the generic resource layer in
//! [crate::resource] is parametrized by a [ResourceType] instead of one
//! subclass per family. Field lists document the server's conventions
//! and are not validated client-side.

/// Description of one resource family: its entry-point link relation and
/// the field names its items and search endpoints understand.
#[derive(Debug)]
pub struct ResourceType {
    /// Singular name, used in error messages.
    pub name: &'static str,
    /// Link relation at the entry-point collection. Empty for the feeds
    /// family, which *is* the entry-point collection.
    pub rel: &'static str,
    /// Search parameters accepted by the collection URL. Range filters
    /// follow the `min_*`/`max_*` convention; `limit`/`offset` paginate.
    pub search_fields: &'static [&'static str],
    /// Descriptor names found on items of this family.
    pub item_fields: &'static [&'static str],
}

pub static FEEDS: ResourceType = ResourceType {
    name: "feed",
    rel: "",
    search_fields: &[
        "id",
        "name",
        "name_exact",
        "name_startswith",
        "min_id",
        "max_id",
        "min_creation_date",
        "max_creation_date",
        "files_fname_icontains",
    ],
    item_fields: &[
        "id",
        "name",
        "creator_username",
        "creation_date",
        "modification_date",
    ],
};

pub static PLUGINS: ResourceType = ResourceType {
    name: "plugin",
    rel: "plugins",
    search_fields: &[
        "id",
        "name",
        "name_exact",
        "version",
        "title",
        "category",
        "type",
        "min_creation_date",
        "max_creation_date",
    ],
    item_fields: &["id", "name", "version", "title", "type", "dock_image"],
};

pub static PLUGIN_INSTANCES: ResourceType = ResourceType {
    name: "plugin instance",
    rel: "plugin_instances",
    search_fields: &[
        "id",
        "title",
        "status",
        "owner_username",
        "feed_id",
        "root_id",
        "plugin_name",
        "plugin_name_exact",
        "plugin_version",
    ],
    item_fields: &[
        "id",
        "title",
        "status",
        "plugin_id",
        "plugin_name",
        "feed_id",
        "start_date",
        "end_date",
    ],
};

pub static PIPELINES: ResourceType = ResourceType {
    name: "pipeline",
    rel: "pipelines",
    search_fields: &[
        "id",
        "name",
        "owner_username",
        "category",
        "description",
        "authors",
        "min_creation_date",
        "max_creation_date",
    ],
    item_fields: &[
        "id",
        "name",
        "locked",
        "authors",
        "category",
        "description",
    ],
};

pub static TAGS: ResourceType = ResourceType {
    name: "tag",
    rel: "tags",
    search_fields: &["id", "name", "owner_username", "color"],
    item_fields: &["id", "name", "color", "owner_username"],
};

pub static FILES: ResourceType = ResourceType {
    name: "file",
    rel: "uploadedfiles",
    search_fields: &[
        "id",
        "fname",
        "fname_exact",
        "fname_icontains",
        "min_creation_date",
        "max_creation_date",
    ],
    item_fields: &["id", "fname", "fsize", "upload_path", "creation_date"],
};

pub static USERS: ResourceType = ResourceType {
    name: "user",
    rel: "user",
    search_fields: &[],
    item_fields: &["id", "username", "email"],
};
