pub mod exports;
pub mod health;
pub mod products;

pub use exports::my_exports;
pub use health::{health_check, metrics_endpoint, readiness_check, root};
pub use products::{
    create_product, delete_product, get_product, latest_products, list_products,
    search_products, update_product, LATEST_PRODUCTS_LIMIT,
};
