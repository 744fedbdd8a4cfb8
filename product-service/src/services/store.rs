use crate::models::{
    DeleteOutcome, InsertOutcome, NewProduct, Product, ProductFields, ProductId, UpdateOutcome,
};
use async_trait::async_trait;
use service_core::error::AppError;

/// Query surface over the products collection.
///
/// Every listing except search is ordered by `createdAt`, newest first.
/// Lookups, updates and deletes against a missing id succeed with `None` or
/// zero counts.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Liveness round-trip to the backing store.
    async fn ping(&self) -> Result<(), AppError>;

    async fn list(&self, limit: Option<i64>) -> Result<Vec<Product>, AppError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError>;

    /// Case-insensitive literal substring match on `productName`. Unordered.
    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, AppError>;

    /// Exact match on `userEmail`.
    async fn list_by_email(&self, email: &str) -> Result<Vec<Product>, AppError>;

    async fn insert(&self, product: NewProduct) -> Result<InsertOutcome, AppError>;

    /// Overwrites only the supplied fields on the first product with `id`.
    async fn update(&self, id: ProductId, fields: ProductFields)
        -> Result<UpdateOutcome, AppError>;

    async fn delete(&self, id: ProductId) -> Result<DeleteOutcome, AppError>;

    /// Releases connections. Called once, after the server stops.
    async fn shutdown(&self) {}
}

/// Stand-in used when no connection could be established at startup, so the
/// server still answers and each query fails on its own.
#[derive(Debug, Clone)]
pub struct DisconnectedStore {
    reason: String,
}

impl DisconnectedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> AppError {
        AppError::StoreUnavailable(self.reason.clone())
    }
}

#[async_trait]
impl ProductStore for DisconnectedStore {
    async fn ping(&self) -> Result<(), AppError> {
        Err(self.unavailable())
    }

    async fn list(&self, _limit: Option<i64>) -> Result<Vec<Product>, AppError> {
        Err(self.unavailable())
    }

    async fn find_by_id(&self, _id: ProductId) -> Result<Option<Product>, AppError> {
        Err(self.unavailable())
    }

    async fn search_by_name(&self, _name: &str) -> Result<Vec<Product>, AppError> {
        Err(self.unavailable())
    }

    async fn list_by_email(&self, _email: &str) -> Result<Vec<Product>, AppError> {
        Err(self.unavailable())
    }

    async fn insert(&self, _product: NewProduct) -> Result<InsertOutcome, AppError> {
        Err(self.unavailable())
    }

    async fn update(
        &self,
        _id: ProductId,
        _fields: ProductFields,
    ) -> Result<UpdateOutcome, AppError> {
        Err(self.unavailable())
    }

    async fn delete(&self, _id: ProductId) -> Result<DeleteOutcome, AppError> {
        Err(self.unavailable())
    }
}
