use crate::models::{
    DeleteOutcome, InsertOutcome, NewProduct, Product, ProductFields, ProductId, UpdateOutcome,
};
use crate::services::ProductStore;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local product store. Used to exercise the HTTP surface without a
/// server.
///
/// Ordering, counts and input rejection match the MongoDB store. Stored
/// values are kept as the client sent them, so an extended-JSON value such as
/// `{"$date": ...}` reads back verbatim here but in its relaxed form from
/// MongoDB.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

fn sort_newest_first(products: &mut [Product]) {
    // Missing timestamps sort last, as they do in the store.
    products.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<Product>, AppError> {
        let mut products = self.products.read().await.clone();
        sort_newest_first(&mut products);
        if let Some(limit) = limit {
            products.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(products)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, AppError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, AppError> {
        let needle = name.to_lowercase();
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| {
                p.product_name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Product>, AppError> {
        let mut matching: Vec<Product> = self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.user_email.as_deref() == Some(email))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn insert(&self, product: NewProduct) -> Result<InsertOutcome, AppError> {
        product.to_document()?;
        let id = ProductId::new();
        self.products
            .write()
            .await
            .push(Product::create(id, product));
        Ok(InsertOutcome::new(id))
    }

    async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
    ) -> Result<UpdateOutcome, AppError> {
        if fields.is_empty() {
            return Err(AppError::InvalidRequest(
                "update document must contain at least one field".to_string(),
            ));
        }
        fields.to_document()?;

        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                let modified = product.apply(&fields);
                Ok(UpdateOutcome::new(1, u64::from(modified)))
            }
            None => Ok(UpdateOutcome::new(0, 0)),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<DeleteOutcome, AppError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(DeleteOutcome::new((before - products.len()) as u64))
    }
}
