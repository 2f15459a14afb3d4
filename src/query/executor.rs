// Query Executor
// This module validates, compiles and runs queries against either backend

use super::{
    compile_filter, BackendKind, ConditionGroup, DocumentResults, FieldCondition, Logical,
    Selection, SqlQuery,
};
use crate::config::Config;
use crate::connector::{
    Backend, CompiledQuery, Connector, DocumentBackend, DocumentStore, DriverConnector,
    QueryOutput, RelationalBackend,
};
use crate::error::{QueryError, Result};
use crate::row::RowSet;
use tracing::{debug, info};

/// Collections whose names start with this are never searched when discovering
const SYSTEM_PREFIX: &str = "system";

/// The main interface: builds queries and runs them through a Connector
///
/// Each query opens its own connection and drops it when done. When no
/// collections are configured, the executor discovers them on its first
/// MongoDB connection and keeps that list for its whole lifetime.
pub struct QueryExecutor<C: Connector = DriverConnector> {
    config: Config,
    connector: C,
    discovered: Option<Vec<String>>,
}

impl QueryExecutor<DriverConnector> {
    /// Create an executor that uses the real database drivers
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, DriverConnector)
    }
}

impl<C: Connector> QueryExecutor<C> {
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config,
            connector,
            discovered: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a connection to the given backend
    pub fn connect(&mut self, backend: BackendKind) -> Result<Backend> {
        info!("Trying to connect with {}", backend);

        let connected = match backend {
            BackendKind::Mongo => {
                let store = self
                    .connector
                    .open_document(&self.config.mongo, self.config.server_selection_timeout())?;
                let collections = self.collections(store.as_ref())?;
                Backend::Document(DocumentBackend::new(store, collections))
            }
            BackendKind::MySql => {
                let store = self
                    .connector
                    .open_relational(&self.config.mysql, self.config.connect_timeout())?;
                Backend::Relational(RelationalBackend::new(store))
            }
        };

        info!("  connected");
        Ok(connected)
    }

    /// The collections a document query searches: the configured list, or
    /// every non-system collection of the database when none is configured.
    /// Discovery runs at most once per executor.
    pub fn collections(&mut self, store: &dyn DocumentStore) -> Result<Vec<String>> {
        if !self.config.mongo.collections.is_empty() {
            return Ok(self.config.mongo.collections.clone());
        }

        if let Some(collections) = &self.discovered {
            return Ok(collections.clone());
        }

        let collections: Vec<String> = store
            .list_collection_names()?
            .into_iter()
            .filter(|name| !name.starts_with(SYSTEM_PREFIX))
            .collect();
        debug!("Discovered collections: {:?}", collections);

        self.discovered = Some(collections.clone());
        Ok(collections)
    }

    /// Search every collection for documents matching `fields`
    ///
    /// Each field uses `exact` or `partial` matching; the clauses are combined
    /// with `logical`. Nothing is opened if any field is invalid.
    pub fn mongo_query(
        &mut self,
        fields: &[FieldCondition],
        logical: Logical,
    ) -> Result<DocumentResults> {
        info!("Building query...");
        let filter = compile_filter(fields, logical)?;

        let mut backend = self.connect(BackendKind::Mongo)?;
        match backend.execute(&CompiledQuery::Document(filter))? {
            QueryOutput::Documents(results) => Ok(results),
            QueryOutput::Rows(_) => Err(QueryError::BackendExecution(
                "Document store returned rows".to_string(),
            )),
        }
    }

    /// Run `SELECT <select> FROM <table> WHERE <groups...>` and return every row
    pub fn sql_query(
        &mut self,
        select: &Selection,
        table: &str,
        groups: &[ConditionGroup],
    ) -> Result<RowSet> {
        let statement = SqlQuery::build(select, table, groups)?;

        let mut backend = self.connect(BackendKind::MySql)?;
        match backend.execute(&CompiledQuery::Relational(statement))? {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Documents(_) => Err(QueryError::BackendExecution(
                "Relational store returned documents".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MongoConfig, MySqlConfig};
    use crate::connector::RelationalStore;
    use crate::query::{MatchMode, SqlStatement};
    use crate::row::{Row, Value};
    use bson::{doc, Document};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    /// Everything the fake backends were asked to do
    #[derive(Default)]
    struct Calls {
        opens: Vec<(BackendKind, Duration)>,
        listings: usize,
        finds: Vec<(String, Document)>,
        counts: Vec<String>,
        statements: Vec<SqlStatement>,
    }

    /// In-memory connector: each collection returns all of its documents
    #[derive(Default, Clone)]
    struct FakeConnector {
        calls: Rc<RefCell<Calls>>,
        collections: Rc<HashMap<String, Vec<Document>>>,
        rows: RowSet,
        refuse: bool,
    }

    struct FakeDocuments(FakeConnector);
    struct FakeRows(FakeConnector);

    impl DocumentStore for FakeDocuments {
        fn list_collection_names(&self) -> Result<Vec<String>> {
            self.0.calls.borrow_mut().listings += 1;
            let mut names: Vec<String> = self.0.collections.keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
            self.0
                .calls
                .borrow_mut()
                .finds
                .push((collection.to_string(), filter.clone()));
            Ok(self.0.collections.get(collection).cloned().unwrap_or_default())
        }

        fn count(&self, collection: &str, _filter: &Document) -> Result<u64> {
            self.0.calls.borrow_mut().counts.push(collection.to_string());
            Ok(self.0.collections.get(collection).map_or(0, |d| d.len() as u64))
        }
    }

    impl RelationalStore for FakeRows {
        fn query(&mut self, statement: &SqlStatement) -> Result<RowSet> {
            self.0.calls.borrow_mut().statements.push(statement.clone());
            Ok(self.0.rows.clone())
        }
    }

    impl Connector for FakeConnector {
        fn open_document(
            &self,
            _config: &MongoConfig,
            timeout: Duration,
        ) -> Result<Box<dyn DocumentStore>> {
            self.calls.borrow_mut().opens.push((BackendKind::Mongo, timeout));
            if self.refuse {
                return Err(QueryError::Connection("server selection timeout".into()));
            }
            Ok(Box::new(FakeDocuments(self.clone())))
        }

        fn open_relational(
            &self,
            _config: &MySqlConfig,
            timeout: Duration,
        ) -> Result<Box<dyn RelationalStore>> {
            self.calls.borrow_mut().opens.push((BackendKind::MySql, timeout));
            if self.refuse {
                return Err(QueryError::Connection("access denied".into()));
            }
            Ok(Box::new(FakeRows(self.clone())))
        }
    }

    fn fake_collections() -> HashMap<String, Vec<Document>> {
        let mut collections = HashMap::new();
        collections.insert(
            "people".to_string(),
            vec![doc! { "name": "Kadek" }, doc! { "name": "I Kadek Agus" }],
        );
        collections.insert("archive".to_string(), Vec::new());
        collections.insert("system.indexes".to_string(), vec![doc! { "v": 1 }]);
        collections.insert("system.users".to_string(), Vec::new());
        collections
    }

    fn executor(collections: Vec<&str>) -> QueryExecutor<FakeConnector> {
        let mut config = Config::default();
        config.mongo.collections = collections.into_iter().map(String::from).collect();

        let connector = FakeConnector {
            collections: Rc::new(fake_collections()),
            ..Default::default()
        };
        QueryExecutor::with_connector(config, connector)
    }

    fn kadek() -> Vec<FieldCondition> {
        vec![FieldCondition::new("name", "kadek", MatchMode::Partial)]
    }

    #[test]
    fn test_mongo_query_runs_same_filter_on_every_collection() {
        let mut exec = executor(vec!["people", "archive"]);
        let results = exec.mongo_query(&kadek(), Logical::Or).unwrap();

        let expected = doc! { "$or": [ { "name": { "$regex": ".*kadek.*", "$options": "i" } } ] };
        let calls = exec.connector().calls.borrow();
        assert_eq!(
            calls.finds,
            vec![
                ("people".to_string(), expected.clone()),
                ("archive".to_string(), expected),
            ]
        );
        assert_eq!(calls.counts, vec!["people", "archive"]);
        assert_eq!(calls.listings, 0);

        assert_eq!(results.collections().collect::<Vec<_>>(), vec!["people", "archive"]);
        assert_eq!(results.get("people").map(|d| d.len()), Some(2));
        assert_eq!(results.get("archive"), Some(&[][..]));
    }

    #[test]
    fn test_mongo_query_uses_server_selection_timeout() {
        let mut exec = executor(vec!["people"]);
        exec.mongo_query(&kadek(), Logical::And).unwrap();

        let calls = exec.connector().calls.borrow();
        assert_eq!(
            calls.opens,
            vec![(BackendKind::Mongo, Duration::from_millis(30_000))]
        );
    }

    #[test]
    fn test_discovery_skips_system_collections_and_runs_once() {
        let mut exec = executor(Vec::new());

        let first = exec.mongo_query(&kadek(), Logical::Or).unwrap();
        let second = exec.mongo_query(&kadek(), Logical::Or).unwrap();

        assert_eq!(first.collections().collect::<Vec<_>>(), vec!["archive", "people"]);
        assert_eq!(first, second);

        let calls = exec.connector().calls.borrow();
        assert_eq!(calls.listings, 1);
        assert_eq!(calls.opens.len(), 2);
        assert!(calls.finds.iter().all(|(c, _)| !c.starts_with("system")));
        // Config itself is left untouched
        assert!(exec.config().mongo.collections.is_empty());
    }

    #[test]
    fn test_invalid_document_mode_never_connects() {
        let mut exec = executor(vec!["people"]);
        let fields = vec![
            FieldCondition::new("name", "kadek", MatchMode::Exact),
            FieldCondition::new("city", "bali", MatchMode::StartsWith),
        ];

        let err = exec.mongo_query(&fields, Logical::Or).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidArgument("Invalid mode for field \"city\"".into())
        );
        assert!(exec.connector().calls.borrow().opens.is_empty());
    }

    #[test]
    fn test_invalid_sql_mode_never_connects() {
        let mut exec = executor(vec!["people"]);
        let groups = vec![ConditionGroup::new(
            Logical::Or,
            vec![FieldCondition::new("nama", "riki", MatchMode::Partial)],
        )];

        let err = exec.sql_query(&Selection::All, "contact_person", &groups).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
        assert!(exec.connector().calls.borrow().opens.is_empty());
    }

    #[test]
    fn test_sql_query_sends_statement_once() {
        let mut exec = executor(vec!["people"]);
        exec.connector.rows = RowSet::new(
            vec!["nama".into(), "jenis_kelamin".into()],
            vec![Row::new(vec![Value::Text("riki".into()), Value::Text("L".into())])],
        );

        let groups = vec![
            ConditionGroup::from_json(
                r#"{"conditions": [["logical", "or"], ["nama", ["riki", "contain"]]]}"#,
            )
            .unwrap(),
            ConditionGroup::from_json(
                r#"{"logical": "and", "conditions": [["logical", "and"],
                    ["nama", ["hidayat", "endswith"]], ["alamat", ["bandung", "equal"]]]}"#,
            )
            .unwrap(),
        ];

        let rows = exec
            .sql_query(
                &Selection::from(vec!["nama", "jenis_kelamin"]),
                "contact_person",
                &groups,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);

        let calls = exec.connector().calls.borrow();
        assert_eq!(calls.opens, vec![(BackendKind::MySql, Duration::from_secs(30))]);
        assert_eq!(calls.statements.len(), 1);
        assert_eq!(
            calls.statements[0].to_string(),
            "SELECT `nama`,`jenis_kelamin` FROM `contact_person` WHERE (`nama` LIKE '%riki%') \
             AND (`nama` LIKE '%hidayat' AND `alamat` = 'bandung')"
        );
    }

    #[test]
    fn test_connection_error_surfaces_without_retry() {
        let mut exec = executor(vec!["people"]);
        exec.connector.refuse = true;

        let err = exec.mongo_query(&kadek(), Logical::Or).unwrap_err();
        assert!(matches!(err, QueryError::Connection(_)));

        let err = exec.sql_query(&Selection::All, "t", &[]).unwrap_err();
        assert!(matches!(err, QueryError::Connection(_)));

        assert_eq!(exec.connector().calls.borrow().opens.len(), 2);
    }

    #[test]
    fn test_backend_rejects_query_of_other_kind() {
        let mut exec = executor(vec!["people"]);
        let mut backend = exec.connect(BackendKind::MySql).unwrap();

        let err = backend
            .execute(&CompiledQuery::Document(doc! { "$or": [] }))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }
}
