//! Category management for grouping ledger records.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    count_categories, create_category, create_category_table, delete_category,
    get_all_categories, get_or_create_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryName};
pub use list::list_categories_endpoint;

#[cfg(test)]
pub use db::get_category;
