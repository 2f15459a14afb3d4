// MongoDB store
// Thin wrapper over the synchronous mongodb driver

use super::DocumentStore;
use crate::config::MongoConfig;
use crate::error::{QueryError, Result};
use bson::{doc, Document};
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::sync::{Client, Database};
use std::time::Duration;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `host:port` and select the configured database.
    /// Fails with a connection error if no server answers within `timeout`.
    pub fn open(config: &MongoConfig, timeout: Duration) -> Result<Self> {
        let address = ServerAddress::parse(format!("{}:{}", config.host, config.port))
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        let options = ClientOptions::builder()
            .hosts(vec![address])
            .server_selection_timeout(timeout)
            .build();

        let client =
            Client::with_options(options).map_err(|e| QueryError::Connection(e.to_string()))?;
        let db = client.database(&config.db);

        // The driver connects lazily; ping so an unreachable server fails now
        db.run_command(doc! { "ping": 1 })
            .run()
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        Ok(Self { db })
    }
}

fn execution_error(e: mongodb::error::Error) -> QueryError {
    QueryError::BackendExecution(e.to_string())
}

impl DocumentStore for MongoStore {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        self.db.list_collection_names().run().map_err(execution_error)
    }

    fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        self.db
            .collection::<Document>(collection)
            .find(filter.clone())
            .run()
            .map_err(execution_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(execution_error)
    }

    fn count(&self, collection: &str, filter: &Document) -> Result<u64> {
        self.db
            .collection::<Document>(collection)
            .count_documents(filter.clone())
            .run()
            .map_err(execution_error)
    }
}
