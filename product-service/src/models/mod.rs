pub mod product;

pub use product::{
    DeleteOutcome, InsertOutcome, NewProduct, Product, ProductFields, ProductId, UpdateOutcome,
    CREATED_AT_FIELD, ID_FIELD, PRODUCT_NAME_FIELD, USER_EMAIL_FIELD,
};
