use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use utoipa::ToSchema;
use uuid::Uuid;

/// Typed pointer at another product, stored as the bare product id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductRef(pub String);

impl ProductRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self(product.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    List(Vec<String>),
}

impl Default for SpecValue {
    fn default() -> Self {
        SpecValue::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecEntry {
    pub label: String,
    pub value: SpecValue,
}

/// Ordered label -> value map. Serialized as a JSON object whose key order is
/// the display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Specification {
    entries: Vec<SpecEntry>,
}

impl Specification {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, SpecValue)>,
        K: Into<String>,
    {
        let mut spec = Specification::default();
        for (label, value) in entries {
            let label = label.into();
            match spec.position(&label) {
                Some(idx) => spec.entries[idx].value = value,
                None => spec.entries.push(SpecEntry { label, value }),
            }
        }
        spec
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<SpecEntry> {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&SpecValue> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }
}

impl Serialize for Specification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, &entry.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Specification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecificationVisitor;

        impl<'de> Visitor<'de> for SpecificationVisitor {
            type Value = Specification;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of specification labels to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut spec = Specification::default();
                while let Some((label, value)) = access.next_entry::<String, SpecValue>()? {
                    if spec.contains(&label) {
                        return Err(de::Error::custom(format!(
                            "duplicate specification label `{label}`"
                        )));
                    }
                    spec.entries.push(SpecEntry { label, value });
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecificationVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub user: String,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetails {
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub information: Vec<String>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub specification: Specification,
    #[serde(default, rename = "heroImages")]
    pub hero_images: Vec<String>,
    #[serde(default, rename = "relatedProducts")]
    pub related_products: Vec<ProductRef>,
    #[serde(default)]
    pub other_products: Vec<ProductRef>,
    #[serde(default)]
    pub details: ProductDetails,
    #[serde(default, rename = "youtubeLink")]
    pub youtube_link: String,
    /// Store-assigned; echo it back on PUT to detect concurrent overwrites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

impl Product {
    /// Blank product for the "new" editor route. The id is generated up front
    /// so related-product references can be checked against it before saving.
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            category_id: String::new(),
            name: String::new(),
            description: String::new(),
            rating: 0.0,
            specification: Specification::default(),
            hero_images: Vec::new(),
            related_products: Vec::new(),
            other_products: Vec::new(),
            details: ProductDetails::default(),
            youtube_link: String::new(),
            revision: None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        Some(self.category_id.as_str()).filter(|c| !c.trim().is_empty())
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.hero_images.first().map(String::as_str)
    }

    /// Video id taken from the `v=` query parameter of the YouTube link.
    pub fn youtube_video_id(&self) -> Option<&str> {
        let start = self.youtube_link.find("v=")? + 2;
        let rest = &self.youtube_link[start..];
        let id = rest.split('&').next().unwrap_or_default();
        Some(id).filter(|id| !id.is_empty())
    }
}

/// Denormalized product card embedded in a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            image: product.primary_image().unwrap_or_default().to_string(),
            rating: product.rating,
            discount: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "heroImages")]
    pub hero_images: Vec<String>,
    #[serde(default)]
    pub products: Vec<ProductSummary>,
    #[serde(default)]
    pub deals: Vec<ProductSummary>,
    #[serde(default, rename = "trendingProducts")]
    pub trending_products: Vec<ProductSummary>,
    #[serde(default, rename = "newReleases")]
    pub new_releases: Vec<ProductSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

impl Category {
    /// Categories get no id until their first save.
    pub fn blank() -> Self {
        Self::default()
    }

    /// URL-safe id derived from the name: lowercase alphanumerics joined by `-`.
    pub fn slug(&self) -> String {
        self.name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Enquiry {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specification_keeps_document_order() {
        let raw = r#"{"Weight":"12 t","Engine":"Cummins","Buckets":["0.5 m3","0.8 m3"]}"#;
        let spec: Specification = serde_json::from_str(raw).unwrap();
        let labels: Vec<_> = spec.labels().collect();
        assert_eq!(labels, vec!["Weight", "Engine", "Buckets"]);
        assert_eq!(
            spec.get("Buckets"),
            Some(&SpecValue::List(vec!["0.5 m3".into(), "0.8 m3".into()]))
        );
        assert_eq!(serde_json::to_string(&spec).unwrap(), raw);
    }

    #[test]
    fn specification_rejects_duplicate_labels() {
        let raw = r#"{"Weight":"12 t","Weight":"13 t"}"#;
        assert!(serde_json::from_str::<Specification>(raw).is_err());
    }

    #[test]
    fn product_uses_storefront_field_names() {
        let raw = serde_json::json!({
            "id": "exc-200",
            "category_id": "excavators",
            "name": "Excavator 200",
            "heroImages": ["/uploads/a.png"],
            "relatedProducts": ["exc-300"],
            "youtubeLink": "https://www.youtube.com/watch?v=abc123&t=4"
        });
        let product: Product = serde_json::from_value(raw).unwrap();
        assert_eq!(product.related_products, vec![ProductRef::new("exc-300")]);
        assert_eq!(product.primary_image(), Some("/uploads/a.png"));
        assert_eq!(product.youtube_video_id(), Some("abc123"));
        assert!(product.other_products.is_empty());
        assert!(product.revision.is_none());
    }

    #[test]
    fn youtube_id_missing_without_query() {
        let mut product = Product::blank();
        product.youtube_link = "https://youtu.be/abc".into();
        assert_eq!(product.youtube_video_id(), None);
    }

    #[test]
    fn category_slug_from_name() {
        let mut category = Category::blank();
        category.name = "  Wheel Loaders & Skid-Steers ".into();
        assert_eq!(category.slug(), "wheel-loaders-skid-steers");
    }

    #[test]
    fn blank_category_has_no_id() {
        assert!(Category::blank().id.is_empty());
        assert!(!Product::blank().id.is_empty());
    }
}
