//! Related-item resolution: find products and attach or detach them on the
//! entity being edited.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EditError,
    collection::{append_unique, remove_matching},
};
use crate::{
    models::{Category, Product, ProductRef, ProductSummary},
    store::{DocumentStore, ProductSearch, StoreResult, documents},
};

/// Discount applied to a product card when it is first placed in deals.
pub const DEFAULT_DEAL_DISCOUNT: &str = "20% OFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    SameCategory,
}

/// Reference lists held on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefList {
    RelatedProducts,
    OtherProducts,
}

impl RefList {
    pub fn of(self, product: &Product) -> &[ProductRef] {
        match self {
            RefList::RelatedProducts => &product.related_products,
            RefList::OtherProducts => &product.other_products,
        }
    }

    fn set(self, product: &mut Product, refs: Vec<ProductRef>) {
        match self {
            RefList::RelatedProducts => product.related_products = refs,
            RefList::OtherProducts => product.other_products = refs,
        }
    }
}

/// Summary lists held on a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryList {
    Products,
    Deals,
    TrendingProducts,
    NewReleases,
}

impl SummaryList {
    pub fn of(self, category: &Category) -> &[ProductSummary] {
        match self {
            SummaryList::Products => &category.products,
            SummaryList::Deals => &category.deals,
            SummaryList::TrendingProducts => &category.trending_products,
            SummaryList::NewReleases => &category.new_releases,
        }
    }

    pub(crate) fn set(self, category: &mut Category, items: Vec<ProductSummary>) {
        match self {
            SummaryList::Products => category.products = items,
            SummaryList::Deals => category.deals = items,
            SummaryList::TrendingProducts => category.trending_products = items,
            SummaryList::NewReleases => category.new_releases = items,
        }
    }
}

/// Any list an editor can attach search results to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefTarget {
    RelatedProducts,
    OtherProducts,
    Products,
    Deals,
    TrendingProducts,
    NewReleases,
}

impl RefTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            RefTarget::RelatedProducts => "related_products",
            RefTarget::OtherProducts => "other_products",
            RefTarget::Products => "products",
            RefTarget::Deals => "deals",
            RefTarget::TrendingProducts => "trending_products",
            RefTarget::NewReleases => "new_releases",
        }
    }

    pub fn ref_list(self) -> Result<RefList, EditError> {
        match self {
            RefTarget::RelatedProducts => Ok(RefList::RelatedProducts),
            RefTarget::OtherProducts => Ok(RefList::OtherProducts),
            _ => Err(EditError::WrongTarget {
                target: self.as_str(),
                kind: "product",
            }),
        }
    }

    pub fn summary_list(self) -> Result<SummaryList, EditError> {
        match self {
            RefTarget::Products => Ok(SummaryList::Products),
            RefTarget::Deals => Ok(SummaryList::Deals),
            RefTarget::TrendingProducts => Ok(SummaryList::TrendingProducts),
            RefTarget::NewReleases => Ok(SummaryList::NewReleases),
            _ => Err(EditError::WrongTarget {
                target: self.as_str(),
                kind: "category",
            }),
        }
    }
}

/// The entity a search is issued from.
pub trait SearchSubject {
    fn subject_id(&self) -> &str;

    /// Category a same-category search is restricted to.
    fn scope_category(&self) -> Option<&str>;
}

impl SearchSubject for Product {
    fn subject_id(&self) -> &str {
        &self.id
    }

    fn scope_category(&self) -> Option<&str> {
        self.category()
    }
}

impl SearchSubject for Category {
    fn subject_id(&self) -> &str {
        &self.id
    }

    fn scope_category(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.trim().is_empty())
    }
}

/// Validates a search request and turns it into a store query.
pub fn build_search<S: SearchSubject + ?Sized>(
    term: &str,
    scope: SearchScope,
    subject: &S,
) -> Result<ProductSearch, EditError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(EditError::EmptyTerm);
    }
    let category_id = match scope {
        SearchScope::All => None,
        SearchScope::SameCategory => Some(
            subject
                .scope_category()
                .ok_or(EditError::MissingCategory)?
                .to_string(),
        ),
    };
    Ok(ProductSearch {
        term: term.to_string(),
        category_id,
    })
}

/// Drops the subject itself and anything already present in `attached`.
pub fn post_filter<S: SearchSubject + ?Sized>(
    candidates: Vec<Product>,
    subject: &S,
    attached: &[&str],
) -> Vec<Product> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.id != subject.subject_id())
        .filter(|candidate| !attached.contains(&candidate.id.as_str()))
        .collect()
}

/// Ids already present in `target` on the subject; empty when the target does
/// not belong to the subject's kind.
pub fn attached_ids_on_product(product: &Product, target: RefTarget) -> Vec<&str> {
    match target.ref_list() {
        Ok(list) => list.of(product).iter().map(ProductRef::id).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn attached_ids_on_category(category: &Category, target: RefTarget) -> Vec<&str> {
    match target.summary_list() {
        Ok(list) => list.of(category).iter().map(|s| s.id.as_str()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Store query plus caller-side filtering.
pub async fn search<S: SearchSubject + ?Sized>(
    store: &dyn DocumentStore,
    search: &ProductSearch,
    subject: &S,
    attached: &[&str],
) -> StoreResult<Vec<Product>> {
    let candidates: Vec<Product> = documents::search(store, search).await?;
    Ok(post_filter(candidates, subject, attached))
}

/// Adds `candidate_id` to a product reference list. Attaching an id that is
/// already present returns an unchanged copy.
pub fn attach_ref(product: &Product, list: RefList, candidate_id: &str) -> Result<Product, EditError> {
    if candidate_id == product.id {
        return Err(EditError::SelfReference(candidate_id.to_string()));
    }
    let mut next = product.clone();
    let refs = append_unique(
        list.of(product),
        ProductRef::new(candidate_id),
        |r| r.id() == candidate_id,
    );
    list.set(&mut next, refs);
    Ok(next)
}

pub fn detach_ref(product: &Product, list: RefList, candidate_id: &str) -> Product {
    let mut next = product.clone();
    list.set(
        &mut next,
        remove_matching(list.of(product), |r| r.id() == candidate_id),
    );
    next
}

pub fn attach_summary(category: &Category, list: SummaryList, candidate: &Product) -> Category {
    let mut summary = ProductSummary::from(candidate);
    if list == SummaryList::Deals {
        summary.discount = Some(DEFAULT_DEAL_DISCOUNT.to_string());
    }
    let mut next = category.clone();
    let items = append_unique(list.of(category), summary, |s| s.id == candidate.id);
    list.set(&mut next, items);
    next
}

pub fn detach_summary(category: &Category, list: SummaryList, candidate_id: &str) -> Category {
    let mut next = category.clone();
    let items = remove_matching(list.of(category), |s| s.id == candidate_id);
    list.set(&mut next, items);
    next
}

/// Checks the reference-list invariants on a product about to be saved.
pub fn check_references(product: &Product) -> Result<(), EditError> {
    for list in [RefList::RelatedProducts, RefList::OtherProducts] {
        let refs = list.of(product);
        for (i, r) in refs.iter().enumerate() {
            if r.id() == product.id {
                return Err(EditError::SelfReference(product.id.clone()));
            }
            if refs[..i].contains(r) {
                return Err(EditError::DuplicateReference(r.id().to_string()));
            }
        }
    }
    Ok(())
}

/// Resolves references into display summaries, keeping reference order and
/// skipping references whose product no longer exists.
pub async fn resolve_refs(
    store: &dyn DocumentStore,
    refs: &[ProductRef],
) -> StoreResult<Vec<ProductSummary>> {
    if refs.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = refs.iter().map(|r| r.id().to_string()).collect();
    let found: Vec<Product> = documents::fetch_many(store, &ids).await?;
    Ok(refs
        .iter()
        .filter_map(|r| found.iter().find(|p| p.id == r.id()))
        .map(ProductSummary::from)
        .collect())
}
