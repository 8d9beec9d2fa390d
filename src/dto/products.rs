use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    editor::SearchScope,
    models::{Product, ProductSummary},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// Storefront product page: the product plus its reference lists resolved
/// into display cards.
#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub related: Vec<ProductSummary>,
    pub other: Vec<ProductSummary>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CategoryFilter {
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductSearchQuery {
    pub term: String,
    #[serde(default)]
    pub scope: SearchScope,
    /// Category to restrict a `same_category` search to.
    pub category_id: Option<String>,
    /// Product the search is issued from; never part of the results.
    pub exclude: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InformationUpdate {
    pub information: Vec<String>,
    pub revision: Option<i64>,
}
