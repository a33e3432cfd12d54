//! Document repository: validated persistence over the store.

use crate::error::CoreResult;
use folio_model::{Document, DocumentSummary, DrawableGraph, MasterPage};
use folio_repair::{
    validate_document, validate_document_typed, validate_graph, validate_master_page, GraphInput,
};
use folio_store::{schema, Store};
use serde_json::Value;
use std::sync::Arc;

/// Validated load/save of documents and master pages.
///
/// Every record passes through the structural validator in repair mode on
/// the way in and out, so a defective record degrades into a repaired
/// document instead of a failed load. Graphs are materialized on both
/// paths: a page that was never drawn on is handed to callers (and the
/// store) with an empty graph container, never a hole.
///
/// # Example
///
/// ```rust
/// use folio_core::DocumentRepository;
/// use folio_model::Document;
/// use folio_store::Store;
/// use std::sync::Arc;
///
/// let repo = DocumentRepository::new(Arc::new(Store::open_in_memory().unwrap()));
/// let doc = Document::new("Flyer");
/// let id = repo.save_document(&doc).unwrap();
/// let loaded = repo.load_document(&id).unwrap();
/// assert_eq!(loaded.title, "Flyer");
/// ```
#[derive(Debug)]
pub struct DocumentRepository {
    store: Arc<Store>,
}

impl DocumentRepository {
    /// Creates a repository over an open store.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Saves a document, repairing structural defects first.
    ///
    /// Embedded master pages are written to the master-pages collection as
    /// well, tagged with the owning document's id. Returns the document id.
    ///
    /// Concurrent saves of the same document id are not serialized; the
    /// last verified write wins.
    ///
    /// # Errors
    ///
    /// Store and encoding errors only; structural defects are repaired, not
    /// rejected.
    pub fn save_document(&self, doc: &Document) -> CoreResult<String> {
        let validation = validate_document_typed(doc, true);
        if !validation.valid {
            tracing::warn!(
                document_id = doc.id,
                violations = validation.errors.len(),
                "repaired document before save"
            );
        }
        let mut doc = validation.repaired.unwrap_or_else(|| doc.clone());
        materialize_graphs(&mut doc);
        let owner = doc.id.clone();
        for master in &mut doc.master_pages {
            master.document_id = Some(owner.clone());
        }

        let record = serde_json::to_value(&doc)?;
        let id = self.store.put(schema::DOCUMENTS, &record)?;

        for master in &doc.master_pages {
            let record = serde_json::to_value(master)?;
            self.store.put(schema::MASTER_PAGES, &record)?;
        }

        tracing::debug!(document_id = id, pages = doc.pages.len(), "document saved");
        Ok(id)
    }

    /// Loads a document by id, repairing any defects found in the stored
    /// record.
    ///
    /// # Errors
    ///
    /// Not-found when no such document exists, otherwise store errors.
    pub fn load_document(&self, id: &str) -> CoreResult<Document> {
        let record = self.store.get_by_id(schema::DOCUMENTS, id)?;
        Ok(repair_record(&record, id))
    }

    /// Lists stored documents, most recently modified first.
    ///
    /// Defective records are repaired rather than skipped, so the listing
    /// always reflects everything the store holds.
    pub fn list_document_summaries(
        &self,
        limit: Option<usize>,
    ) -> CoreResult<Vec<DocumentSummary>> {
        let records = self
            .store
            .list_sorted(schema::DOCUMENTS, "last_modified", true)?;
        let summaries = records
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|record| {
                let id = record.get("id").and_then(Value::as_str).unwrap_or_default();
                repair_record(record, id).summary()
            })
            .collect();
        Ok(summaries)
    }

    /// Deletes a document and the master pages it owns. Deleting an absent
    /// document is not an error.
    pub fn delete_document(&self, id: &str) -> CoreResult<()> {
        self.store.delete(schema::DOCUMENTS, id)?;
        for master in self
            .store
            .get_by_index(schema::MASTER_PAGES, "document_id", id)?
        {
            if let Some(master_id) = master.get("id").and_then(Value::as_str) {
                self.store.delete(schema::MASTER_PAGES, master_id)?;
            }
        }
        tracing::debug!(document_id = id, "document deleted");
        Ok(())
    }

    /// Saves a standalone master page under the given owning document.
    /// Returns the master-page id.
    pub fn save_master_page(&self, master: &MasterPage, document_id: &str) -> CoreResult<String> {
        let value = serde_json::to_value(master)?;
        let validation = validate_master_page(&value, true);
        if !validation.valid {
            tracing::warn!(
                master_page_id = master.id,
                violations = validation.errors.len(),
                "repaired master page before save"
            );
        }
        let mut master = validation.repaired.unwrap_or_else(|| master.clone());
        master.document_id = Some(document_id.to_string());
        master.graph = Some(healed_graph(master.graph.as_ref()));

        let record = serde_json::to_value(&master)?;
        let id = self.store.put(schema::MASTER_PAGES, &record)?;
        Ok(id)
    }

    /// Loads a master page by id, repairing any defects.
    ///
    /// # Errors
    ///
    /// Not-found when no such master page exists, otherwise store errors.
    pub fn load_master_page(&self, id: &str) -> CoreResult<MasterPage> {
        let record = self.store.get_by_id(schema::MASTER_PAGES, id)?;
        Ok(repair_master_record(&record))
    }

    /// Lists master pages, optionally filtered to one owning document,
    /// ordered by name.
    pub fn list_master_pages(&self, document_id: Option<&str>) -> CoreResult<Vec<MasterPage>> {
        let records = match document_id {
            Some(owner) => {
                let mut records =
                    self.store
                        .get_by_index(schema::MASTER_PAGES, "document_id", owner)?;
                records.sort_by(|a, b| name_of(a).cmp(&name_of(b)));
                records
            }
            None => self.store.list_sorted(schema::MASTER_PAGES, "name", false)?,
        };
        Ok(records.iter().map(repair_master_record).collect())
    }

    /// Deletes a master page. Deleting an absent one is not an error.
    pub fn delete_master_page(&self, id: &str) -> CoreResult<()> {
        Ok(self.store.delete(schema::MASTER_PAGES, id)?)
    }
}

/// Runs a stored document record through the validator in repair mode and
/// materializes every graph.
fn repair_record(record: &Value, id: &str) -> Document {
    let validation = validate_document(record, true);
    if !validation.valid {
        tracing::warn!(
            document_id = id,
            violations = validation.errors.len(),
            "repaired document on load"
        );
    }
    let mut doc = validation
        .repaired
        .unwrap_or_else(|| Document::new(folio_model::defaults::DEFAULT_TITLE));
    materialize_graphs(&mut doc);
    doc
}

fn repair_master_record(record: &Value) -> MasterPage {
    let validation = validate_master_page(record, true);
    let mut master = validation
        .repaired
        .unwrap_or_else(|| MasterPage::new(folio_model::defaults::DEFAULT_MASTER_NAME));
    master.graph = Some(healed_graph(master.graph.as_ref()));
    master
}

fn materialize_graphs(doc: &mut Document) {
    for page in &mut doc.pages {
        page.graph = Some(healed_graph(page.graph.as_ref()));
    }
    for master in &mut doc.master_pages {
        master.graph = Some(healed_graph(master.graph.as_ref()));
    }
}

/// Runs a graph through the codec in repair mode. `None` becomes the empty
/// default container.
fn healed_graph(graph: Option<&DrawableGraph>) -> DrawableGraph {
    let input = match graph {
        Some(graph) => match serde_json::to_value(graph) {
            Ok(value) => return healed_from_value(&value),
            Err(_) => GraphInput::Missing,
        },
        None => GraphInput::Missing,
    };
    validate_graph(input, true).graph.unwrap_or_default()
}

fn healed_from_value(value: &Value) -> DrawableGraph {
    validate_graph(GraphInput::Value(value), true)
        .graph
        .unwrap_or_default()
}

fn name_of(record: &Value) -> String {
    record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{DrawableEntry, Page, Transform};
    use serde_json::json;

    fn repo() -> DocumentRepository {
        DocumentRepository::new(Arc::new(Store::open_in_memory().unwrap()))
    }

    #[test]
    fn save_then_load_roundtrips() {
        let repo = repo();
        let mut doc = Document::new("Brochure");
        doc.pages[0].graph = Some(DrawableGraph {
            objects: vec![DrawableEntry::Rect {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 50.0,
                fill: "#ff0000".to_string(),
                transform: Transform::default(),
            }],
            ..DrawableGraph::default()
        });

        let id = repo.save_document(&doc).unwrap();
        let loaded = repo.load_document(&id).unwrap();

        assert_eq!(loaded.title, "Brochure");
        assert_eq!(loaded.pages.len(), 1);
        let graph = loaded.pages[0].graph.as_ref().unwrap();
        assert_eq!(graph.objects.len(), 1);
    }

    #[test]
    fn undrawn_page_loads_with_empty_graph_container() {
        let repo = repo();
        let doc = Document::new("Fresh");
        assert!(doc.pages[0].graph.is_none());

        let id = repo.save_document(&doc).unwrap();
        let loaded = repo.load_document(&id).unwrap();

        let graph = loaded.pages[0].graph.as_ref().unwrap();
        assert!(graph.objects.is_empty());
        assert_eq!(graph.background, "white");
        let serialized = serde_json::to_value(graph).unwrap();
        assert_eq!(serialized["objects"], json!([]));
        assert_eq!(serialized["background"], "white");
    }

    #[test]
    fn defective_stored_record_loads_repaired() {
        let repo = repo();
        // A record written by a buggy client: no title, no pages, a
        // mistyped grid.
        repo.store
            .put(
                schema::DOCUMENTS,
                &json!({"id": "d1", "grid": "big", "created": "2024-05-01T10:00:00Z"}),
            )
            .unwrap();

        let loaded = repo.load_document("d1").unwrap();
        assert_eq!(loaded.id, "d1");
        assert_eq!(loaded.title, folio_model::defaults::DEFAULT_TITLE);
        assert_eq!(loaded.pages.len(), 1);
    }

    #[test]
    fn load_missing_document_is_not_found() {
        let repo = repo();
        let err = repo.load_document("nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn summaries_are_ordered_by_last_modified() {
        let repo = repo();
        for (title, ts) in [
            ("Oldest", "2024-01-01T00:00:00Z"),
            ("Newest", "2024-03-01T00:00:00Z"),
            ("Middle", "2024-02-01T00:00:00Z"),
        ] {
            let mut doc = Document::new(title);
            doc.created = ts.parse().unwrap();
            doc.last_modified = ts.parse().unwrap();
            repo.save_document(&doc).unwrap();
        }

        let summaries = repo.list_document_summaries(None).unwrap();
        let titles: Vec<_> = summaries.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);

        let limited = repo.list_document_summaries(Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn embedded_master_pages_are_stored_and_tagged() {
        let repo = repo();
        let mut doc = Document::new("With master");
        doc.master_pages.push(MasterPage::new("A-Master"));

        let id = repo.save_document(&doc).unwrap();
        let masters = repo.list_master_pages(Some(&id)).unwrap();
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].name, "A-Master");
        assert_eq!(masters[0].document_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn delete_document_cascades_to_its_master_pages() {
        let repo = repo();
        let mut doc = Document::new("Doomed");
        doc.master_pages.push(MasterPage::new("A-Master"));
        let id = repo.save_document(&doc).unwrap();

        let other = Document::new("Survivor");
        let other_id = repo.save_document(&other).unwrap();
        repo.save_master_page(&MasterPage::new("B-Master"), &other_id)
            .unwrap();

        repo.delete_document(&id).unwrap();

        assert!(repo.load_document(&id).unwrap_err().is_not_found());
        assert!(repo.list_master_pages(Some(&id)).unwrap().is_empty());
        assert_eq!(repo.list_master_pages(Some(&other_id)).unwrap().len(), 1);

        // Idempotent.
        repo.delete_document(&id).unwrap();
    }

    #[test]
    fn standalone_master_page_roundtrips() {
        let repo = repo();
        let master = MasterPage::new("Footer");
        let id = repo.save_master_page(&master, "d1").unwrap();

        let loaded = repo.load_master_page(&id).unwrap();
        assert_eq!(loaded.name, "Footer");
        assert_eq!(loaded.document_id.as_deref(), Some("d1"));
        // Graph materialized on the way through.
        assert!(loaded.graph.is_some());
    }

    #[test]
    fn master_pages_list_is_sorted_by_name() {
        let repo = repo();
        for name in ["Zed", "Alpha", "Mid"] {
            repo.save_master_page(&MasterPage::new(name), "d1").unwrap();
        }
        let names: Vec<_> = repo
            .list_master_pages(Some("d1"))
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zed"]);
    }

    #[test]
    fn damaged_graph_is_healed_on_save() {
        let repo = repo();
        let mut doc = Document::new("Damaged");
        // A graph whose only entry is an image with no source: the codec
        // drops it rather than inventing pixels.
        doc.pages[0].graph = Some(DrawableGraph {
            objects: vec![DrawableEntry::Image {
                x: 0.0,
                y: 0.0,
                width: 50.0,
                height: 50.0,
                src: String::new(),
                transform: Transform::default(),
            }],
            ..DrawableGraph::default()
        });

        let id = repo.save_document(&doc).unwrap();
        let loaded = repo.load_document(&id).unwrap();
        assert!(loaded.pages[0].graph.as_ref().unwrap().objects.is_empty());
    }

    #[test]
    fn added_page_survives_a_second_save() {
        let repo = repo();
        let doc = Document::new("Growing");
        let id = repo.save_document(&doc).unwrap();

        let mut loaded = repo.load_document(&id).unwrap();
        loaded.pages.push(Page::new());
        repo.save_document(&loaded).unwrap();

        let again = repo.load_document(&id).unwrap();
        assert_eq!(again.pages.len(), 2);
    }
}
