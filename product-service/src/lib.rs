//! Product listing API for the import/export marketplace: CRUD and simple
//! queries over the `products` collection.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
