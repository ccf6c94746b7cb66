//! Published catalog lookup and listing.
//!
//! Draft products are indistinguishable from missing ones here: every
//! lookup that finds an unpublished product reports `NotFound`.

use darkroom_core::{Orientation, Product, ProductId, ProductStatus, Variant, VariantId};
use serde::Deserialize;
use tracing::instrument;

use super::ServiceError;
use crate::db::{ProductFilter, ProductRepository};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 100;

/// Listing order for `GET /products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Store order.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
}

impl SortOrder {
    /// Parse a `sort` query value; unknown values fall back to `Featured`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "price-low" => Self::PriceLow,
            "price-high" => Self::PriceHigh,
            _ => Self::Featured,
        }
    }
}

/// Query parameters for `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub collection: Option<String>,
    pub tag: Option<String>,
    pub orientation: Option<Orientation>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

/// Read access to the published catalog.
pub struct CatalogService<'a> {
    products: &'a dyn ProductRepository,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(products: &'a dyn ProductRepository) -> Self {
        Self { products }
    }

    /// Fetch a published product by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product is absent or not published.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        self.products
            .get(id)
            .await?
            .filter(Product::is_published)
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))
    }

    /// Fetch a published product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product is absent or not published.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ServiceError> {
        self.products
            .find_by_slug(slug)
            .await?
            .filter(Product::is_published)
            .ok_or_else(|| ServiceError::NotFound(format!("product {slug}")))
    }

    /// List published products.
    ///
    /// Store-level filters and the limit are applied first, then the search
    /// text, then the sort.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ServiceError> {
        let filter = ProductFilter {
            status: Some(ProductStatus::Published),
            orientation: query.orientation,
            collection: query.collection.clone(),
            tag: query.tag.clone(),
            limit: Some(
                query
                    .limit
                    .unwrap_or(DEFAULT_LIST_LIMIT)
                    .clamp(1, MAX_LIST_LIMIT),
            ),
        };

        let mut products = self.products.query(&filter).await?;

        if let Some(search) = query.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let needle = search.to_lowercase();
            products.retain(|p| p.matches_search(&needle));
        }

        let sort = query.sort.as_deref().map(SortOrder::parse).unwrap_or_default();
        sort_products(&mut products, sort);

        Ok(products)
    }
}

/// Find an active variant of `product`.
///
/// # Errors
///
/// Returns `ServiceError::InvalidVariant` if the variant is absent or inactive.
pub fn find_variant<'p>(
    product: &'p Product,
    variant_id: &VariantId,
) -> Result<&'p Variant, ServiceError> {
    product
        .active_variant(variant_id)
        .ok_or_else(|| ServiceError::InvalidVariant {
            product_id: product.id.clone(),
            variant_id: variant_id.clone(),
        })
}

/// Stable sort by lead price; products without variants go last.
fn sort_products(products: &mut [Product], sort: SortOrder) {
    match sort {
        SortOrder::Featured => {}
        SortOrder::PriceLow => {
            products.sort_by_key(|p| (p.lead_price().is_none(), p.lead_price()));
        }
        SortOrder::PriceHigh => {
            products.sort_by_key(|p| {
                (
                    p.lead_price().is_none(),
                    std::cmp::Reverse(p.lead_price()),
                )
            });
        }
    }
}
