use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog listing normalized into a schema that does not depend on the
/// shape of the storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    /// When the listing was normalized, not when the source data changed.
    pub captured_at: DateTime<Utc>,
    /// Storefront product ID, stored as a string to avoid precision loss.
    pub id: String,
    /// Product page on the storefront.
    pub url: String,
    pub title: String,
    /// First brand title, or `""` when the listing has no brands.
    pub brand: String,
    /// Non-empty label names in source order. Duplicates are kept.
    pub marketing_tags: Vec<String>,
    pub price: PriceData,
    /// `true` iff at least one online warehouse holds the item.
    pub in_stock: bool,
    pub assets: Assets,
    /// Plain text extracted from the HTML description.
    pub description: String,
    pub metadata: ListingMetadata,
}

impl CanonicalListing {
    /// Returns `true` when the listing carries a sale tag.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.price.sale_tag.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    /// Price the item sells for now. `None` when the API sent `null`.
    ///
    /// Boundary note: this is an `f64` convenience type; prices are whole or
    /// two-decimal rouble amounts.
    pub current: Option<f64>,
    /// Pre-discount price. `None` when the API sent `null`.
    pub original: Option<f64>,
    /// `"Скидка {n}%"`, present only when both prices are known and differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    /// First gallery image, or `""` when there are no pictures.
    pub main_image: String,
    /// Every gallery image in source order.
    pub set_images: Vec<String>,
    /// First video URL. Later videos are not surfaced.
    pub video: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingMetadata {
    pub article: Option<String>,
    pub sex: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub questions_count: Option<u64>,
    pub vendor: VendorInfo,
}

/// Legal identity of the marketplace seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInfo {
    /// Vendor code assigned by the storefront.
    pub id: Option<String>,
    pub name: Option<String>,
    /// Taxpayer identification number (ИНН).
    pub inn: Option<String>,
    /// Primary state registration number (ОГРН).
    pub ogrn: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
