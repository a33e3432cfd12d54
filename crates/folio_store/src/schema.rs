//! Schema versions, collection specs and the persisted manifest.
//!
//! The schema is an append-only ladder: each version adds collections and
//! never alters or removes what earlier versions created. Opening a store
//! written at an older version applies only the missing steps.

use serde::{Deserialize, Serialize};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 3;

/// Name of the manifest blob.
pub const MANIFEST_BLOB: &str = "manifest";

/// The documents collection.
pub const DOCUMENTS: &str = "documents";

/// The master-pages collection.
pub const MASTER_PAGES: &str = "master_pages";

/// The templates collection.
pub const TEMPLATES: &str = "templates";

/// The recovery-snapshots collection.
pub const SNAPSHOTS: &str = "snapshots";

/// A secondary index over one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name, used by callers to select an ordering or filter.
    pub name: &'static str,
    /// The record field (wire key) the index reads.
    pub field: &'static str,
}

/// A named record collection and its secondary indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name.
    pub name: &'static str,
    /// Secondary indexes.
    pub indexes: &'static [IndexSpec],
}

impl CollectionSpec {
    /// Looks up an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|idx| idx.name == name)
    }
}

/// Collections introduced by each schema version, oldest first.
pub const SCHEMA_LADDER: &[(u32, &[CollectionSpec])] = &[
    (
        1,
        &[
            CollectionSpec {
                name: DOCUMENTS,
                indexes: &[
                    IndexSpec {
                        name: "last_modified",
                        field: "lastModified",
                    },
                    IndexSpec {
                        name: "title",
                        field: "title",
                    },
                ],
            },
            CollectionSpec {
                name: MASTER_PAGES,
                indexes: &[
                    IndexSpec {
                        name: "name",
                        field: "name",
                    },
                    IndexSpec {
                        name: "document_id",
                        field: "documentId",
                    },
                ],
            },
        ],
    ),
    (
        2,
        &[CollectionSpec {
            name: TEMPLATES,
            indexes: &[
                IndexSpec {
                    name: "category",
                    field: "category",
                },
                IndexSpec {
                    name: "name",
                    field: "name",
                },
            ],
        }],
    ),
    (
        3,
        &[CollectionSpec {
            name: SNAPSHOTS,
            indexes: &[IndexSpec {
                name: "page_id",
                field: "pageId",
            }],
        }],
    ),
];

/// Finds a collection spec by name across the whole ladder.
#[must_use]
pub fn collection_spec(name: &str) -> Option<&'static CollectionSpec> {
    SCHEMA_LADDER
        .iter()
        .flat_map(|(_, specs)| specs.iter())
        .find(|spec| spec.name == name)
}

/// The persisted schema manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version the store is at.
    pub schema_version: u32,
    /// Collections known to the store.
    pub collections: Vec<String>,
}

impl Manifest {
    /// Creates a manifest for a brand-new (pre-upgrade) store.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema_version: 0,
            collections: Vec::new(),
        }
    }
}
