// Connector module
// Driver capabilities for both backends, and the Backend they are wrapped in.
//
// The executor never talks to a driver directly: it asks a Connector to open a
// store, wraps the store in a Backend once, and hands compiled queries to it.

pub mod mongo_store;
pub mod mysql_store;

use crate::config::{MongoConfig, MySqlConfig};
use crate::error::{QueryError, Result};
use crate::query::{DocumentResults, SqlStatement};
use crate::row::RowSet;
use bson::Document;
use std::time::Duration;
use tracing::{debug, info};

/// What a document store must be able to do
pub trait DocumentStore {
    fn list_collection_names(&self) -> Result<Vec<String>>;
    /// Every document in `collection` matching `filter`, in the store's order
    fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>>;
    fn count(&self, collection: &str, filter: &Document) -> Result<u64>;
}

/// What a relational store must be able to do
pub trait RelationalStore {
    /// Run a statement once, binding its parameters, and return every row
    fn query(&mut self, statement: &SqlStatement) -> Result<RowSet>;
}

/// Opens connections to the two backends
pub trait Connector {
    fn open_document(
        &self,
        config: &MongoConfig,
        timeout: Duration,
    ) -> Result<Box<dyn DocumentStore>>;

    fn open_relational(
        &self,
        config: &MySqlConfig,
        timeout: Duration,
    ) -> Result<Box<dyn RelationalStore>>;
}

/// Connector backed by the real MongoDB and MySQL drivers
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverConnector;

impl Connector for DriverConnector {
    fn open_document(
        &self,
        config: &MongoConfig,
        timeout: Duration,
    ) -> Result<Box<dyn DocumentStore>> {
        Ok(Box::new(mongo_store::MongoStore::open(config, timeout)?))
    }

    fn open_relational(
        &self,
        config: &MySqlConfig,
        timeout: Duration,
    ) -> Result<Box<dyn RelationalStore>> {
        Ok(Box::new(mysql_store::MySqlStore::open(config, timeout)?))
    }
}

/// A query compiled for one of the backends
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    Document(Document),
    Relational(SqlStatement),
}

/// The result of executing a compiled query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Documents(DocumentResults),
    Rows(RowSet),
}

/// An open connection to the document store, with the collections to search
pub struct DocumentBackend {
    store: Box<dyn DocumentStore>,
    collections: Vec<String>,
}

impl DocumentBackend {
    pub fn new(store: Box<dyn DocumentStore>, collections: Vec<String>) -> Self {
        Self { store, collections }
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Apply the same filter to every collection, one after another
    pub fn execute(&self, filter: &Document) -> Result<DocumentResults> {
        info!("Querying...");
        let mut results = DocumentResults::new();

        for collection in &self.collections {
            info!("{}", filter);
            let documents = self.store.find(collection, filter)?;
            let count = self.store.count(collection, filter)?;
            debug!("  from \"{}\" with total rows: {}", collection, count);
            results.insert(collection.clone(), documents);
        }

        Ok(results)
    }
}

/// An open connection to the relational store
pub struct RelationalBackend {
    store: Box<dyn RelationalStore>,
}

impl RelationalBackend {
    pub fn new(store: Box<dyn RelationalStore>) -> Self {
        Self { store }
    }

    pub fn execute(&mut self, statement: &SqlStatement) -> Result<RowSet> {
        info!("QUERY: {}", statement);
        self.store.query(statement)
    }
}

/// A connected backend, chosen once when the connection is opened
pub enum Backend {
    Document(DocumentBackend),
    Relational(RelationalBackend),
}

impl Backend {
    /// Run a compiled query. The query must have been compiled for this backend.
    pub fn execute(&mut self, query: &CompiledQuery) -> Result<QueryOutput> {
        match (self, query) {
            (Backend::Document(backend), CompiledQuery::Document(filter)) => {
                backend.execute(filter).map(QueryOutput::Documents)
            }
            (Backend::Relational(backend), CompiledQuery::Relational(statement)) => {
                backend.execute(statement).map(QueryOutput::Rows)
            }
            (Backend::Document(_), CompiledQuery::Relational(_)) => Err(QueryError::invalid(
                "Cannot run a SQL statement against the document store",
            )),
            (Backend::Relational(_), CompiledQuery::Document(_)) => Err(QueryError::invalid(
                "Cannot run a document filter against the relational store",
            )),
        }
    }
}
