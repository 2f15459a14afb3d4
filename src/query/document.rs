// Document query builder
// Turns field conditions into a MongoDB filter document

use super::{BackendKind, FieldCondition, Logical, MatchMode};
use crate::error::{QueryError, Result};
use bson::{doc, Bson, Document};

/// Compile field conditions into a flat MongoDB filter:
/// `{ "$or": [ {field: expr}, ... ] }` (or `$and`)
///
/// `partial` becomes a case-insensitive `.*value.*` regex and `exact` a
/// plain equality. The value is put into the regex as-is, so any regex
/// metacharacters in it keep their meaning.
pub fn compile_filter(fields: &[FieldCondition], logical: Logical) -> Result<Document> {
    if fields.is_empty() {
        return Err(QueryError::invalid("At least one field is required"));
    }

    let mut clauses = Vec::with_capacity(fields.len());
    for cond in fields {
        if cond.mode.backend() != BackendKind::Mongo {
            return Err(QueryError::invalid(format!(
                "Invalid mode for field \"{}\"",
                cond.field
            )));
        }

        let expr = match cond.mode {
            MatchMode::Partial => Bson::Document(doc! {
                "$regex": format!(".*{}.*", cond.value),
                "$options": "i",
            }),
            _ => Bson::String(cond.value.clone()),
        };

        let mut clause = Document::new();
        clause.insert(cond.field.clone(), expr);
        clauses.push(Bson::Document(clause));
    }

    let mut filter = Document::new();
    filter.insert(logical.mongo_operator(), clauses);
    Ok(filter)
}

/// Matched documents per collection, in the order the collections were queried.
/// Every queried collection has an entry, even when nothing matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentResults {
    entries: Vec<(String, Vec<Document>)>,
}

impl DocumentResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the documents for a collection, replacing any earlier entry
    pub fn insert(&mut self, collection: impl Into<String>, documents: Vec<Document>) {
        let collection = collection.into();
        match self.entries.iter_mut().find(|(name, _)| *name == collection) {
            Some((_, docs)) => *docs = documents,
            None => self.entries.push((collection, documents)),
        }
    }

    pub fn get(&self, collection: &str) -> Option<&[Document]> {
        self.entries
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, docs)| docs.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Document])> {
        self.entries
            .iter()
            .map(|(name, docs)| (name.as_str(), docs.as_slice()))
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of collections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total matched documents across every collection
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, docs)| docs.len()).sum()
    }
}
