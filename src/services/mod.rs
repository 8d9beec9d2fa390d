pub mod auth_service;
pub mod category_service;
pub mod editor_service;
pub mod enquiry_service;
pub mod product_service;
pub mod upload_service;
