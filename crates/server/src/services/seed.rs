//! Demo catalog.

use chrono::{DateTime, Utc};
use darkroom_core::{
    AddOnPricesOverride, DimensionUnit, Money, Orientation, PricingConfig, PricingOverride,
    Product, ProductId, ProductMetadata, ProductStatus, Variant, VariantId,
};
use tracing::{info, instrument};

use super::ServiceError;
use crate::db::{Clock, Repositories};

fn variant(id: &str, width: u32, height: u32, base_price: i64, sku_prefix: &str) -> Variant {
    Variant {
        id: VariantId::new(id),
        label: id.to_owned(),
        width,
        height,
        unit: DimensionUnit::In,
        base_price: Money::from_minor(base_price),
        sku: format!("{sku_prefix}-{id}"),
        is_active: true,
    }
}

struct DemoProduct {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    images: [&'static str; 2],
    tags: &'static [&'static str],
    collection: &'static str,
    orientation: Orientation,
    location: &'static str,
    date_taken: &'static str,
    camera: &'static str,
    sku_prefix: &'static str,
    sizes: [(&'static str, u32, u32, i64); 3],
}

const DEMO_PRODUCTS: [DemoProduct; 3] = [
    DemoProduct {
        slug: "city-lights",
        title: "City Lights",
        description: "Moody cityscape with long exposure light trails.",
        images: [
            "https://images.unsplash.com/photo-1500964757637-c85e8a162699?w=1400",
            "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1400",
        ],
        tags: &["city", "night", "light-trails"],
        collection: "City",
        orientation: Orientation::Landscape,
        location: "London",
        date_taken: "2024-05-12",
        camera: "Sony A7 IV",
        sku_prefix: "CL",
        sizes: [
            ("12x16", 12, 16, 8900),
            ("16x20", 16, 20, 11_900),
            ("24x36", 24, 36, 18_900),
        ],
    },
    DemoProduct {
        slug: "golden-hour",
        title: "Golden Hour",
        description: "Soft golden light over a quiet landscape.",
        images: [
            "https://images.unsplash.com/photo-1579547944212-c4f4961a8dd8?w=1400",
            "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=1400",
        ],
        tags: &["nature", "sunset"],
        collection: "Nature",
        orientation: Orientation::Landscape,
        location: "Cotswolds",
        date_taken: "2024-03-05",
        camera: "Canon R5",
        sku_prefix: "GH",
        sizes: [
            ("12x16", 12, 16, 7900),
            ("16x20", 16, 20, 10_500),
            ("24x36", 24, 36, 16_900),
        ],
    },
    DemoProduct {
        slug: "abstract-lines",
        title: "Abstract Lines",
        description: "Minimal abstract composition with strong lines.",
        images: [
            "https://images.unsplash.com/photo-1602128110234-2d11c0aaadfe?w=1400",
            "https://images.unsplash.com/photo-1652780241487-f396513216ef?w=1400",
        ],
        tags: &["abstract", "minimal"],
        collection: "Abstract",
        orientation: Orientation::Portrait,
        location: "Studio",
        date_taken: "2024-01-10",
        camera: "Fuji GFX",
        sku_prefix: "AL",
        sizes: [
            ("12x16", 12, 16, 7200),
            ("16x20", 16, 20, 9500),
            ("20x30", 20, 30, 13_900),
        ],
    },
];

impl DemoProduct {
    fn build(&self, add_ons: AddOnPricesOverride, now: Option<DateTime<Utc>>) -> Product {
        Product {
            id: ProductId::new(self.slug),
            title: self.title.to_owned(),
            slug: self.slug.to_owned(),
            description: self.description.to_owned(),
            status: ProductStatus::Published,
            hero_image: self.images[0].to_owned(),
            gallery_images: self.images.iter().map(|s| (*s).to_owned()).collect(),
            tags: self.tags.iter().map(|s| (*s).to_owned()).collect(),
            collections: vec![self.collection.to_owned()],
            orientation: self.orientation,
            metadata: ProductMetadata {
                location: Some(self.location.to_owned()),
                date_taken: Some(self.date_taken.to_owned()),
                camera: Some(self.camera.to_owned()),
            },
            variants: self
                .sizes
                .iter()
                .map(|&(id, w, h, price)| variant(id, w, h, price, self.sku_prefix))
                .collect(),
            add_ons: Some(add_ons),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The demo products, without timestamps.
#[must_use]
pub fn demo_products() -> Vec<Product> {
    let add_ons = AddOnPricesOverride::from(PricingConfig::default().add_ons);
    DEMO_PRODUCTS
        .iter()
        .map(|p| p.build(add_ons, None))
        .collect()
}

/// Load the demo catalog and the default pricing.
///
/// Products are upserted by id, so running this twice leaves the same
/// catalog. Default pricing is merged into the stored override, which puts
/// every price back to its default.
///
/// # Errors
///
/// Returns `ServiceError::Repository` if any write fails.
#[instrument(skip_all)]
pub async fn seed_catalog(repos: &Repositories, clock: &dyn Clock) -> Result<usize, ServiceError> {
    let now = clock.now();
    let add_ons = AddOnPricesOverride::from(PricingConfig::default().add_ons);

    let mut count = 0;
    for demo in &DEMO_PRODUCTS {
        let created_at = repos
            .products
            .get(&ProductId::new(demo.slug))
            .await?
            .and_then(|existing| existing.created_at)
            .unwrap_or(now);

        let mut product = demo.build(add_ons, Some(now));
        product.created_at = Some(created_at);
        repos.products.upsert(&product).await?;
        count += 1;
    }

    let stored = repos.settings.get_pricing().await?.unwrap_or_default();
    let merged = stored.merged_with(PricingOverride::from(PricingConfig::default()));
    repos.settings.put_pricing(&merged).await?;

    info!(products = count, "Demo catalog seeded");
    Ok(count)
}
