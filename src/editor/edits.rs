//! Field-level edits for the product and category editors.
//!
//! An edit names one scalar field or one nested collection and the change to
//! make to it. `apply` validates against the snapshot it is given and returns
//! a fresh snapshot; reference lists are handled by [`super::resolver`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EditError,
    collection::{append, put_slot, remove_at, update_at},
    resolver::{SummaryList, check_references},
};
use crate::models::{Category, Faq, Product, ProductSummary, SpecValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextList {
    Benefits,
    Information,
}

impl TextList {
    fn of(self, product: &Product) -> &[String] {
        match self {
            TextList::Benefits => &product.details.benefits,
            TextList::Information => &product.details.information,
        }
    }

    fn set(self, product: &mut Product, items: Vec<String>) {
        match self {
            TextList::Benefits => product.details.benefits = items,
            TextList::Information => product.details.information = items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProductEdit {
    SetName { value: String },
    SetDescription { value: String },
    SetCategory { value: String },
    SetRating { value: f64 },
    SetYoutubeLink { value: String },

    AppendSpecification,
    RenameSpecification { from: String, to: String },
    SetSpecificationValue { label: String, value: SpecValue },
    RemoveSpecification { label: String },

    AppendText { list: TextList },
    UpdateText { list: TextList, index: usize, value: String },
    RemoveText { list: TextList, index: usize },

    AppendFaq,
    UpdateFaq { index: usize, faq: Faq },
    RemoveFaq { index: usize },

    /// Result of an upload: overwrite slot `index`, or append without one.
    PutImage { index: Option<usize>, path: String },
    RemoveImage { index: usize },
}

impl ProductEdit {
    pub fn name(&self) -> &'static str {
        match self {
            ProductEdit::SetName { .. } => "set_name",
            ProductEdit::SetDescription { .. } => "set_description",
            ProductEdit::SetCategory { .. } => "set_category",
            ProductEdit::SetRating { .. } => "set_rating",
            ProductEdit::SetYoutubeLink { .. } => "set_youtube_link",
            ProductEdit::AppendSpecification => "append_specification",
            ProductEdit::RenameSpecification { .. } => "rename_specification",
            ProductEdit::SetSpecificationValue { .. } => "set_specification_value",
            ProductEdit::RemoveSpecification { .. } => "remove_specification",
            ProductEdit::AppendText { .. } => "append_text",
            ProductEdit::UpdateText { .. } => "update_text",
            ProductEdit::RemoveText { .. } => "remove_text",
            ProductEdit::AppendFaq => "append_faq",
            ProductEdit::UpdateFaq { .. } => "update_faq",
            ProductEdit::RemoveFaq { .. } => "remove_faq",
            ProductEdit::PutImage { .. } => "put_image",
            ProductEdit::RemoveImage { .. } => "remove_image",
        }
    }

    pub fn apply(&self, product: &Product) -> Result<Product, EditError> {
        let mut next = product.clone();
        match self {
            ProductEdit::SetName { value } => next.name = value.clone(),
            ProductEdit::SetDescription { value } => next.description = value.clone(),
            ProductEdit::SetCategory { value } => next.category_id = value.clone(),
            ProductEdit::SetRating { value } => {
                check_rating(*value)?;
                next.rating = *value;
            }
            ProductEdit::SetYoutubeLink { value } => next.youtube_link = value.clone(),

            ProductEdit::AppendSpecification => {
                next.specification = product.specification.with_blank_entry();
            }
            ProductEdit::RenameSpecification { from, to } => {
                next.specification = product.specification.with_renamed(from, to)?;
            }
            ProductEdit::SetSpecificationValue { label, value } => {
                next.specification = product.specification.with_value(label, value.clone())?;
            }
            ProductEdit::RemoveSpecification { label } => {
                next.specification = product.specification.without(label)?;
            }

            ProductEdit::AppendText { list } => {
                list.set(&mut next, append(list.of(product), String::new()));
            }
            ProductEdit::UpdateText { list, index, value } => {
                list.set(&mut next, update_at(list.of(product), *index, value.clone())?);
            }
            ProductEdit::RemoveText { list, index } => {
                list.set(&mut next, remove_at(list.of(product), *index)?);
            }

            ProductEdit::AppendFaq => {
                next.details.faqs = append(&product.details.faqs, Faq::default());
            }
            ProductEdit::UpdateFaq { index, faq } => {
                next.details.faqs = update_at(&product.details.faqs, *index, faq.clone())?;
            }
            ProductEdit::RemoveFaq { index } => {
                next.details.faqs = remove_at(&product.details.faqs, *index)?;
            }

            ProductEdit::PutImage { index, path } => {
                next.hero_images = put_slot(&product.hero_images, *index, path.clone())?;
            }
            ProductEdit::RemoveImage { index } => {
                next.hero_images = remove_at(&product.hero_images, *index)?;
            }
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CategoryEdit {
    SetName { value: String },
    SetDescription { value: String },
    PutImage { index: Option<usize>, path: String },
    RemoveImage { index: usize },
    /// Edits the embedded copy only; the product document is untouched.
    UpdateSummary { list: SummaryList, index: usize, summary: ProductSummary },
    RemoveSummary { list: SummaryList, index: usize },
}

impl CategoryEdit {
    pub fn name(&self) -> &'static str {
        match self {
            CategoryEdit::SetName { .. } => "set_name",
            CategoryEdit::SetDescription { .. } => "set_description",
            CategoryEdit::PutImage { .. } => "put_image",
            CategoryEdit::RemoveImage { .. } => "remove_image",
            CategoryEdit::UpdateSummary { .. } => "update_summary",
            CategoryEdit::RemoveSummary { .. } => "remove_summary",
        }
    }

    pub fn apply(&self, category: &Category) -> Result<Category, EditError> {
        let mut next = category.clone();
        match self {
            CategoryEdit::SetName { value } => next.name = value.clone(),
            CategoryEdit::SetDescription { value } => next.description = value.clone(),
            CategoryEdit::PutImage { index, path } => {
                next.hero_images = put_slot(&category.hero_images, *index, path.clone())?;
            }
            CategoryEdit::RemoveImage { index } => {
                next.hero_images = remove_at(&category.hero_images, *index)?;
            }
            CategoryEdit::UpdateSummary {
                list,
                index,
                summary,
            } => {
                check_rating(summary.rating)?;
                let items = update_at(list.of(category), *index, summary.clone())?;
                list.set(&mut next, items);
            }
            CategoryEdit::RemoveSummary { list, index } => {
                let items = remove_at(list.of(category), *index)?;
                list.set(&mut next, items);
            }
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "edit", rename_all = "snake_case")]
pub enum EntityEdit {
    Product(ProductEdit),
    Category(CategoryEdit),
}

impl EntityEdit {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EntityEdit::Product(_) => "product",
            EntityEdit::Category(_) => "category",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityEdit::Product(edit) => edit.name(),
            EntityEdit::Category(edit) => edit.name(),
        }
    }
}

/// Checks a product before it is written.
pub fn validate_product(product: &Product) -> Result<(), EditError> {
    if product.id.trim().is_empty() {
        return Err(EditError::Invalid {
            field: "id",
            reason: "must not be empty".into(),
        });
    }
    if product.name.trim().is_empty() {
        return Err(EditError::Invalid {
            field: "name",
            reason: "must not be empty".into(),
        });
    }
    check_rating(product.rating)?;
    check_references(product)
}

/// Checks a category before it is written. The id may still be empty; one is
/// assigned on first save.
pub fn validate_category(category: &Category) -> Result<(), EditError> {
    if category.name.trim().is_empty() {
        return Err(EditError::Invalid {
            field: "name",
            reason: "must not be empty".into(),
        });
    }
    [
        SummaryList::Products,
        SummaryList::Deals,
        SummaryList::TrendingProducts,
        SummaryList::NewReleases,
    ]
    .into_iter()
    .flat_map(|list| list.of(category))
    .try_for_each(|summary| check_rating(summary.rating))
}

pub(crate) fn check_rating(rating: f64) -> Result<(), EditError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(EditError::Invalid {
            field: "rating",
            reason: format!("{rating} is outside 0-5"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Specification;

    fn product() -> Product {
        let mut product = Product::blank();
        product.id = "exc-200".into();
        product.name = "Excavator 200".into();
        product.details.benefits = vec!["a".into(), "b".into(), "c".into()];
        product
    }

    #[test]
    fn edit_leaves_previous_snapshot_untouched() {
        let before = product();
        let after = ProductEdit::RemoveText {
            list: TextList::Benefits,
            index: 2,
        }
        .apply(&before)
        .unwrap();

        assert_eq!(before.details.benefits, vec!["a", "b", "c"]);
        assert_eq!(after.details.benefits, vec!["a", "b"]);

        let mut expected = before.clone();
        expected.details.benefits = after.details.benefits.clone();
        assert_eq!(after, expected);
    }

    #[test]
    fn specification_append_then_rename() {
        let p = ProductEdit::AppendSpecification.apply(&product()).unwrap();
        let p = ProductEdit::SetSpecificationValue {
            label: "New Specification 1".into(),
            value: SpecValue::Text("20 t".into()),
        }
        .apply(&p)
        .unwrap();
        let p = ProductEdit::RenameSpecification {
            from: "New Specification 1".into(),
            to: "Weight".into(),
        }
        .apply(&p)
        .unwrap();
        assert_eq!(
            p.specification,
            Specification::from_entries([("Weight", SpecValue::Text("20 t".into()))])
        );
    }

    #[test]
    fn out_of_range_faq_update_fails() {
        let err = ProductEdit::UpdateFaq {
            index: 0,
            faq: Faq::default(),
        }
        .apply(&product())
        .unwrap_err();
        assert_eq!(err, EditError::OutOfRange { index: 0, len: 0 });
    }

    #[test]
    fn rating_must_stay_in_range() {
        assert!(ProductEdit::SetRating { value: 4.5 }.apply(&product()).is_ok());
        assert!(matches!(
            ProductEdit::SetRating { value: 5.1 }.apply(&product()),
            Err(EditError::Invalid { field: "rating", .. })
        ));
    }

    #[test]
    fn image_upload_fills_slot_or_appends() {
        let p = ProductEdit::PutImage {
            index: None,
            path: "/uploads/a.png".into(),
        }
        .apply(&product())
        .unwrap();
        let p = ProductEdit::PutImage {
            index: Some(0),
            path: "/uploads/b.png".into(),
        }
        .apply(&p)
        .unwrap();
        assert_eq!(p.hero_images, vec!["/uploads/b.png"]);
    }

    #[test]
    fn category_summary_edit_is_local() {
        let mut category = Category::blank();
        category.deals = vec![ProductSummary {
            id: "exc-200".into(),
            name: "Excavator 200".into(),
            image: String::new(),
            rating: 4.0,
            discount: Some("20% OFF".into()),
        }];
        let mut summary = category.deals[0].clone();
        summary.discount = Some("35% OFF".into());
        let next = CategoryEdit::UpdateSummary {
            list: SummaryList::Deals,
            index: 0,
            summary,
        }
        .apply(&category)
        .unwrap();
        assert_eq!(next.deals[0].discount.as_deref(), Some("35% OFF"));
        assert_eq!(category.deals[0].discount.as_deref(), Some("20% OFF"));
    }

    #[test]
    fn edits_deserialize_from_tagged_json() {
        let edit: EntityEdit = serde_json::from_value(serde_json::json!({
            "kind": "product",
            "edit": { "op": "remove_text", "list": "benefits", "index": 1 }
        }))
        .unwrap();
        assert_eq!(
            edit,
            EntityEdit::Product(ProductEdit::RemoveText {
                list: TextList::Benefits,
                index: 1
            })
        );
    }
}
