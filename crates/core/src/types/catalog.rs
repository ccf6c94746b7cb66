//! Catalog documents: products and their purchasable variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};
use super::money::Money;
use super::pricing::AddOnPricesOverride;
use super::status::{Orientation, ProductStatus};

/// Unit for print dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimensionUnit {
    #[default]
    In,
    Cm,
}

/// A purchasable size of a print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub label: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub unit: DimensionUnit,
    pub base_price: Money,
    pub sku: String,
    pub is_active: bool,
}

/// Photographic metadata shown on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

/// A catalog product (`products` collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub status: ProductStatus,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub metadata: ProductMetadata,
    pub variants: Vec<Variant>,
    /// Product-specific add-on table, stored for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<AddOnPricesOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the product is visible to customers.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Find a purchasable variant: it must exist and be active.
    #[must_use]
    pub fn active_variant(&self, variant_id: &VariantId) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| &v.id == variant_id && v.is_active)
    }

    /// Base price of the first variant, used for price sorting.
    #[must_use]
    pub fn lead_price(&self) -> Option<Money> {
        self.variants.first().map(|v| v.base_price)
    }

    /// Case-insensitive substring match on title and tags.
    ///
    /// `needle` must already be lower-cased.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("city-lights"),
            title: "City Lights".to_owned(),
            slug: "city-lights".to_owned(),
            description: String::new(),
            status: ProductStatus::Published,
            hero_image: String::new(),
            gallery_images: Vec::new(),
            tags: vec!["Night".to_owned(), "light-trails".to_owned()],
            collections: vec!["City".to_owned()],
            orientation: Orientation::Landscape,
            metadata: ProductMetadata::default(),
            variants: vec![
                Variant {
                    id: VariantId::new("12x16"),
                    label: "12x16".to_owned(),
                    width: 12,
                    height: 16,
                    unit: DimensionUnit::In,
                    base_price: Money::from_minor(8900),
                    sku: "CL-12x16".to_owned(),
                    is_active: true,
                },
                Variant {
                    id: VariantId::new("24x36"),
                    label: "24x36".to_owned(),
                    width: 24,
                    height: 36,
                    unit: DimensionUnit::In,
                    base_price: Money::from_minor(18_900),
                    sku: "CL-24x36".to_owned(),
                    is_active: false,
                },
            ],
            add_ons: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_active_variant_requires_active_flag() {
        let p = product();
        assert!(p.active_variant(&VariantId::new("12x16")).is_some());
        assert!(p.active_variant(&VariantId::new("24x36")).is_none());
        assert!(p.active_variant(&VariantId::new("nope")).is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_tags() {
        let p = product();
        assert!(p.matches_search("city"));
        assert!(p.matches_search("night"));
        assert!(p.matches_search("trails"));
        assert!(!p.matches_search("sunset"));
    }

    #[test]
    fn test_lead_price() {
        assert_eq!(product().lead_price(), Some(Money::from_minor(8900)));
    }
}
