pub mod auth;
pub mod categories;
pub mod editor;
pub mod enquiries;
pub mod products;
pub mod upload;
