use async_trait::async_trait;
use bson::Document;
use mongodb::{
    Client, Collection as MongoCollection, Cursor,
    options::{ClientOptions, FindOptions},
};
use pagelayer_core::{
    backend::{DocumentCursor, FindRequest, PagingBackend, PagingBackendBuilder},
    error::{PagingError, PagingResult},
};

pub const TRACING_TARGET: &str = "pagelayer_mongodb::store";

/// Splits a [`FindRequest`] into the filter and the driver's [`FindOptions`].
///
/// A negative skip is sent as no skip at all.
fn find_options(request: FindRequest) -> (Document, FindOptions) {
    let mut options = FindOptions::default();

    options.skip = u64::try_from(request.skip).ok();
    options.limit = Some(request.limit);
    options.projection = request.projection;
    options.sort = request.sort;

    (request.filter, options)
}

#[derive(Debug)]
pub struct MongoPagingBackend {
    client: Client,
    database: String,
}

impl MongoPagingBackend {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoPagingBackendBuilder {
        MongoPagingBackendBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    async fn shutdown(self) -> PagingResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl PagingBackend for MongoPagingBackend {
    async fn find(&self, collection: &str, request: FindRequest) -> PagingResult<Box<dyn DocumentCursor>> {
        let (filter, options) = find_options(request);

        tracing::trace!(
            target: TRACING_TARGET,
            database = %self.database,
            collection,
            skip = ?options.skip,
            limit = ?options.limit,
            "Issuing find"
        );

        let cursor = self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(PagingError::backend)?;

        Ok(Box::new(MongoCursor { inner: cursor }))
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> PagingResult<i64> {
        let count = self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(PagingError::backend)?;

        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn aggregate(
        &self,
        collection: &str,
        stages: Vec<Document>,
        allow_disk_use: bool,
    ) -> PagingResult<Box<dyn DocumentCursor>> {
        tracing::trace!(
            target: TRACING_TARGET,
            database = %self.database,
            collection,
            stages = stages.len(),
            allow_disk_use,
            "Issuing aggregate"
        );

        let cursor = self.get_collection(collection)
            .aggregate(stages)
            .allow_disk_use(allow_disk_use)
            .await
            .map_err(PagingError::backend)?;

        Ok(Box::new(MongoCursor { inner: cursor }))
    }

    async fn shutdown(self) -> PagingResult<()> {
        self.shutdown().await
    }
}

/// Adapter exposing a driver cursor as a [`DocumentCursor`].
struct MongoCursor {
    inner: Cursor<Document>,
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn advance(&mut self) -> PagingResult<bool> {
        self.inner
            .advance()
            .await
            .map_err(PagingError::backend)
    }

    fn deserialize_current(&self) -> PagingResult<Document> {
        self.inner
            .deserialize_current()
            .map_err(|e| PagingError::Serialization(e.to_string()))
    }

    async fn close(self: Box<Self>) -> PagingResult<()> {
        // Dropping a live driver cursor kills it on the server.
        drop(self.inner);

        Ok(())
    }
}

pub struct MongoPagingBackendBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
}

impl MongoPagingBackendBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
        }
    }

    /// Sets the application name reported to the server.
    pub fn app_name(mut self, app_name: &str) -> Self {
        self.app_name = Some(app_name.to_string());
        self
    }
}

#[async_trait]
impl PagingBackendBuilder for MongoPagingBackendBuilder {
    type Backend = MongoPagingBackend;

    async fn build(self) -> PagingResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| PagingError::Initialization(e.to_string()))?;

        if let Some(app_name) = self.app_name {
            options.app_name = Some(app_name);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            database = %self.database,
            app_name = ?options.app_name,
            "Connecting to MongoDB"
        );

        Ok(MongoPagingBackend::new(
            Client::with_options(options)
                .map_err(|e| PagingError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn find_request_maps_to_driver_options() {
        let (filter, options) = find_options(FindRequest {
            filter: doc! { "kind": "a" },
            skip: 20,
            limit: 10,
            projection: Some(doc! { "n": 1 }),
            sort: Some(doc! { "n": -1 }),
        });

        assert_eq!(filter, doc! { "kind": "a" });
        assert_eq!(options.skip, Some(20));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.projection, Some(doc! { "n": 1 }));
        assert_eq!(options.sort, Some(doc! { "n": -1 }));
    }

    #[test]
    fn negative_skip_is_not_sent() {
        let (_, options) = find_options(FindRequest {
            filter: doc! {},
            skip: -4,
            limit: 10,
            projection: None,
            sort: None,
        });

        assert_eq!(options.skip, None);
        assert_eq!(options.projection, None);
        assert_eq!(options.sort, None);
    }

    #[test]
    fn builder_keeps_connection_settings() {
        let builder = MongoPagingBackend::builder("mongodb://localhost:27017", "app")
            .app_name("pager");

        assert_eq!(builder.dsn, "mongodb://localhost:27017");
        assert_eq!(builder.database, "app");
        assert_eq!(builder.app_name.as_deref(), Some("pager"));
    }
}
