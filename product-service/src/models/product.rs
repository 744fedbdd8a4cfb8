use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::fmt;

pub const ID_FIELD: &str = "_id";
pub const PRODUCT_NAME_FIELD: &str = "productName";
pub const USER_EMAIL_FIELD: &str = "userEmail";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Store-assigned product identifier, rendered as 24 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductId(ObjectId);

impl ProductId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        ObjectId::parse_str(raw).map(Self).map_err(|e| {
            AppError::InvalidId(format!("'{}' is not a valid product id: {}", raw, e))
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for ProductId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

/// A product listing as returned to clients.
///
/// Known fields are typed; anything else the client stored travels in
/// `extra` untouched. A known field holding an unexpected type (say a
/// numeric `productName` written by another tool) is kept in `extra`
/// rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(rename = "productName", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "userEmail", skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Builds a freshly inserted product.
    pub fn create(id: ProductId, new_product: NewProduct) -> Self {
        let NewProduct { fields, created_at } = new_product;
        Self {
            id,
            product_name: fields.product_name,
            user_email: fields.user_email,
            created_at: Some(created_at),
            extra: fields.extra,
        }
    }

    /// Shallow field overwrite. Returns whether any stored value changed.
    pub fn apply(&mut self, fields: &ProductFields) -> bool {
        let mut changed = false;

        if let Some(name) = &fields.product_name {
            changed |= self.product_name.as_ref() != Some(name);
            self.product_name = Some(name.clone());
            changed |= self.extra.remove(PRODUCT_NAME_FIELD).is_some();
        }
        if let Some(email) = &fields.user_email {
            changed |= self.user_email.as_ref() != Some(email);
            self.user_email = Some(email.clone());
            changed |= self.extra.remove(USER_EMAIL_FIELD).is_some();
        }
        for (key, value) in &fields.extra {
            // A non-string value for a known field displaces the typed value.
            if key == PRODUCT_NAME_FIELD {
                changed |= self.product_name.take().is_some();
            } else if key == USER_EMAIL_FIELD {
                changed |= self.user_email.take().is_some();
            }
            changed |= self.extra.get(key) != Some(value);
            self.extra.insert(key.clone(), value.clone());
        }

        changed
    }

    pub fn from_document(mut doc: Document) -> Result<Self, AppError> {
        let id = match doc.remove(ID_FIELD) {
            Some(Bson::ObjectId(oid)) => ProductId(oid),
            Some(other) => {
                return Err(AppError::InternalError(anyhow::anyhow!(
                    "product document has a non-ObjectId _id: {}",
                    other
                )))
            }
            None => {
                return Err(AppError::InternalError(anyhow::anyhow!(
                    "product document is missing _id"
                )))
            }
        };

        let mut extra = Map::new();

        let product_name = match doc.remove(PRODUCT_NAME_FIELD) {
            Some(Bson::String(name)) => Some(name),
            Some(other) => {
                extra.insert(PRODUCT_NAME_FIELD.to_string(), other.into_relaxed_extjson());
                None
            }
            None => None,
        };

        let user_email = match doc.remove(USER_EMAIL_FIELD) {
            Some(Bson::String(email)) => Some(email),
            Some(other) => {
                extra.insert(USER_EMAIL_FIELD.to_string(), other.into_relaxed_extjson());
                None
            }
            None => None,
        };

        let created_at = match doc.remove(CREATED_AT_FIELD) {
            Some(Bson::DateTime(at)) => Some(at.to_chrono()),
            Some(other) => {
                extra.insert(CREATED_AT_FIELD.to_string(), other.into_relaxed_extjson());
                None
            }
            None => None,
        };

        for (key, value) in doc {
            extra.insert(key, value.into_relaxed_extjson());
        }

        Ok(Self {
            id,
            product_name,
            user_email,
            created_at,
            extra,
        })
    }
}

/// Client-supplied product fields for inserts and partial updates.
///
/// Any JSON object is accepted. `_id` and `createdAt` are owned by the
/// server and silently discarded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ProductFields {
    pub product_name: Option<String>,
    pub user_email: Option<String>,
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ProductFields {
    fn from(mut map: Map<String, Value>) -> Self {
        map.remove(ID_FIELD);
        map.remove(CREATED_AT_FIELD);

        let product_name = take_string(&mut map, PRODUCT_NAME_FIELD);
        let user_email = take_string(&mut map, USER_EMAIL_FIELD);

        Self {
            product_name,
            user_email,
            extra: map,
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

impl ProductFields {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none() && self.user_email.is_none() && self.extra.is_empty()
    }

    /// Converts to a BSON document. Values are read as relaxed extended JSON,
    /// so `{"$date": ...}` style values keep their BSON type.
    ///
    /// Top-level names containing `.` or starting with `$` are rejected: under
    /// `$set` they would address nested paths or operators rather than name a
    /// field.
    pub fn to_document(&self) -> Result<Document, AppError> {
        let mut doc = Document::new();

        if let Some(name) = &self.product_name {
            doc.insert(PRODUCT_NAME_FIELD, name.as_str());
        }
        if let Some(email) = &self.user_email {
            doc.insert(USER_EMAIL_FIELD, email.as_str());
        }
        for (key, value) in &self.extra {
            if key.contains('.') || key.starts_with('$') {
                return Err(AppError::InvalidRequest(format!(
                    "field name '{}' may not contain '.' or start with '$'",
                    key
                )));
            }
            let bson = Bson::try_from(value.clone()).map_err(|e| {
                AppError::InvalidRequest(format!("field '{}' cannot be stored: {}", key, e))
            })?;
            doc.insert(key.as_str(), bson);
        }

        Ok(doc)
    }
}

/// Fields for an insert plus the server-assigned creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub created_at: DateTime<Utc>,
}

impl NewProduct {
    /// Stamps the creation time at millisecond precision, the resolution the
    /// store keeps.
    pub fn stamped_now(fields: ProductFields) -> Self {
        Self {
            fields,
            created_at: mongodb::bson::DateTime::now().to_chrono(),
        }
    }

    pub fn to_document(&self) -> Result<Document, AppError> {
        let mut doc = self.fields.to_document()?;
        doc.insert(
            CREATED_AT_FIELD,
            mongodb::bson::DateTime::from_chrono(self.created_at),
        );
        Ok(doc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: ProductId,
}

impl InsertOutcome {
    pub fn new(inserted_id: ProductId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<ProductId>,
}

impl UpdateOutcome {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}
