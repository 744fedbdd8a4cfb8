use crate::models::{
    DeleteOutcome, InsertOutcome, NewProduct, Product, ProductFields, ProductId, UpdateOutcome,
    CREATED_AT_FIELD, ID_FIELD, PRODUCT_NAME_FIELD, USER_EMAIL_FIELD,
};
use crate::services::ProductStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, FindOptions, ServerApi, ServerApiVersion},
    Client as MongoClient, Collection, Cursor, Database,
};
use service_core::error::AppError;

pub const PRODUCTS_COLLECTION: &str = "products";

#[derive(Clone)]
pub struct MongoProductStore {
    client: MongoClient,
    db: Database,
}

impl MongoProductStore {
    /// Parses the connection string and builds a client pinned to Stable API
    /// v1. The driver connects lazily, so an unreachable server surfaces on
    /// the first round-trip (see [`ProductStore::ping`]), not here.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Invalid MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB");
        Ok(Self { client, db })
    }

    /// Handle to a named collection; the store creates it on first write.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub fn products(&self) -> Collection<Document> {
        self.collection(PRODUCTS_COLLECTION)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn find_many(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> Result<Vec<Product>, AppError> {
        let cursor: Cursor<Document> =
            self.products().find(filter, options).await.map_err(|e| {
                tracing::error!("Failed to query products: {}", e);
                AppError::from(e)
            })?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect products: {}", e);
            AppError::from(e)
        })?;

        docs.into_iter().map(Product::from_document).collect()
    }
}

/// Newest first; `_id` breaks timestamp ties so a limited listing is always
/// a prefix of the unlimited one.
fn newest_first(limit: Option<i64>) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { CREATED_AT_FIELD: -1, ID_FIELD: -1 })
        .limit(limit)
        .build()
}

/// `productName` filter matching `name` anywhere, ignoring case. The input
/// is matched literally.
pub fn name_search_filter(name: &str) -> Document {
    doc! {
        PRODUCT_NAME_FIELD: {
            "$regex": escape_regex(name),
            "$options": "i",
        }
    }
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
                | '-' | '#' | '/'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB ping failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<Product>, AppError> {
        self.find_many(doc! {}, Some(newest_first(limit))).await
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError> {
        let doc = self
            .products()
            .find_one(doc! { ID_FIELD: id.object_id() }, None)
            .await
            .map_err(|e| {
                tracing::error!(product_id = %id, "Failed to find product: {}", e);
                AppError::from(e)
            })?;

        doc.map(Product::from_document).transpose()
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, AppError> {
        self.find_many(name_search_filter(name), None).await
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Product>, AppError> {
        self.find_many(doc! { USER_EMAIL_FIELD: email }, Some(newest_first(None)))
            .await
    }

    async fn insert(&self, product: NewProduct) -> Result<InsertOutcome, AppError> {
        let result = self
            .products()
            .insert_one(product.to_document()?, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert product: {}", e);
                AppError::from(e)
            })?;

        let oid = result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "store assigned a non-ObjectId identifier: {}",
                result.inserted_id
            ))
        })?;

        Ok(InsertOutcome::new(ProductId::from(oid)))
    }

    async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .products()
            .update_one(
                doc! { ID_FIELD: id.object_id() },
                doc! { "$set": fields.to_document()? },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!(product_id = %id, "Failed to update product: {}", e);
                AppError::from(e)
            })?;

        Ok(UpdateOutcome::new(result.matched_count, result.modified_count))
    }

    async fn delete(&self, id: ProductId) -> Result<DeleteOutcome, AppError> {
        let result = self
            .products()
            .delete_one(doc! { ID_FIELD: id.object_id() }, None)
            .await
            .map_err(|e| {
                tracing::error!(product_id = %id, "Failed to delete product: {}", e);
                AppError::from(e)
            })?;

        Ok(DeleteOutcome::new(result.deleted_count))
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB connection");
        self.client.clone().shutdown().await;
    }
}
