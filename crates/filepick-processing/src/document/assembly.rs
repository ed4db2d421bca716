//! Builds a new document out of pages taken from one or more source documents.
//!
//! Every output document is assembled from scratch: the source page tree, catalog and
//! trailer are discarded, so the `/Info` dictionary and catalog `/Metadata` stream never
//! reach the output.

use crate::document::Rotation;
use crate::error::ProcessingError;
use lopdf::{dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on page tree depth, guards against Parent cycles
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when no MediaBox is found anywhere up the tree
const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

pub struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    used: HashSet<ObjectId>,
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            used: HashSet::new(),
        }
    }

    /// Move all objects of `source` into the output and return its page ids in page order.
    ///
    /// Imported pages are not part of the output until passed to [`Self::push_page`].
    pub fn import(&mut self, mut source: Document) -> Result<Vec<ObjectId>, ProcessingError> {
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &page_ids {
            flatten_inherited(&mut source, page_id)?;
        }

        source.renumber_objects_with(self.doc.max_id + 1);
        let page_ids = source.get_pages().into_values().collect();

        self.doc.max_id = source.max_id;
        self.doc.objects.extend(source.objects);
        Ok(page_ids)
    }

    /// Append an imported page. A page pushed twice is duplicated.
    pub fn push_page(
        &mut self,
        page_id: ObjectId,
        rotation: Option<Rotation>,
    ) -> Result<(), ProcessingError> {
        let id = if self.used.insert(page_id) {
            page_id
        } else {
            let copy = self.doc.get_dictionary(page_id)?.clone();
            self.doc.add_object(copy)
        };

        let page = self.doc.get_dictionary_mut(id)?;
        page.set("Parent", self.pages_id);
        if let Some(rotation) = rotation {
            page.set("Rotate", rotation.degrees());
        }

        self.kids.push(id);
        Ok(())
    }

    pub fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        let kids: Vec<Object> = self.kids.into_iter().map(Object::Reference).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc.prune_objects();
        self.doc.renumber_objects();
        self.doc
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of `key` on the page or the closest ancestor that defines it.
pub(crate) fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page itself so it survives losing its parent.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), ProcessingError> {
    let mut resolved = Vec::new();
    for key in INHERITABLE {
        if let Some(value) = inherited(doc, page_id, key) {
            resolved.push((key, value));
        } else if key == b"MediaBox" {
            let media_box = DEFAULT_MEDIA_BOX.iter().map(|&v| Object::Integer(v)).collect();
            resolved.push((key, Object::Array(media_box)));
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in resolved {
        page.set(key.to_vec(), value);
    }
    Ok(())
}
