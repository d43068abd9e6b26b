//! Normalization from raw catalog listings to [`detmir_core::CanonicalListing`].
//!
//! Every required field is checked explicitly so a malformed listing fails
//! with the dotted path of the first missing field (e.g. `"prices.old"`).
//! Description text extraction is delegated to [`crate::description`].

use chrono::{DateTime, Utc};
use detmir_core::{Assets, CanonicalListing, ListingMetadata, PriceData, VendorInfo};

use crate::description::html_to_text;
use crate::error::ScraperError;
use crate::types::{RawListing, RawPrices, RawVendor};

/// Normalizes one element of a page array.
///
/// # Errors
///
/// - [`ScraperError::MalformedListing`] if a field has the wrong JSON type.
/// - [`ScraperError::MissingField`] if a required field is absent.
pub fn normalize_value(
    value: serde_json::Value,
    captured_at: DateTime<Utc>,
) -> Result<CanonicalListing, ScraperError> {
    let raw: RawListing = serde_json::from_value(value)
        .map_err(|source| ScraperError::MalformedListing { source })?;
    normalize_listing(raw, captured_at)
}

/// Normalizes a [`RawListing`] into a [`CanonicalListing`] stamped with
/// `captured_at`.
///
/// # Errors
///
/// Returns [`ScraperError::MissingField`] naming the first required field
/// that is absent. `null` is accepted wherever the canonical field is optional.
pub fn normalize_listing(
    raw: RawListing,
    captured_at: DateTime<Utc>,
) -> Result<CanonicalListing, ScraperError> {
    let id = raw.id.ok_or_else(|| ScraperError::missing("id"))?.to_string();

    let url = raw
        .link
        .ok_or_else(|| ScraperError::missing("link"))?
        .web_url
        .ok_or_else(|| ScraperError::missing("link.web_url"))?;

    let title = raw.title.ok_or_else(|| ScraperError::missing("title"))?;

    // Only the first brand is surfaced; its title must be present.
    let brand = match raw.brands.unwrap_or_default().into_iter().next() {
        Some(first) => first
            .title
            .ok_or_else(|| ScraperError::missing("brands[].title"))?,
        None => String::new(),
    };

    let marketing_tags = raw
        .labels
        .ok_or_else(|| ScraperError::missing("labels"))?
        .into_iter()
        .filter_map(|label| label.name.filter(|name| !name.is_empty()))
        .collect();

    let discount_percentage = raw
        .discount_percentage
        .ok_or_else(|| ScraperError::missing("discount_percentage"))?;
    let price = normalize_price(
        raw.prices.ok_or_else(|| ScraperError::missing("prices"))?,
        discount_percentage,
    )?;

    let warehouse_codes = raw
        .available
        .ok_or_else(|| ScraperError::missing("available"))?
        .online
        .ok_or_else(|| ScraperError::missing("available.online"))?
        .warehouse_codes
        .ok_or_else(|| ScraperError::missing("available.online.warehouse_codes"))?;
    let in_stock = warehouse_codes.is_some_and(|codes| !codes.is_empty());

    let set_images = raw
        .pictures
        .ok_or_else(|| ScraperError::missing("pictures"))?
        .into_iter()
        .map(|picture| {
            picture
                .original
                .ok_or_else(|| ScraperError::missing("pictures[].original"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let video = match raw
        .videos
        .ok_or_else(|| ScraperError::missing("videos"))?
        .into_iter()
        .next()
    {
        Some(first) => Some(
            first
                .url
                .ok_or_else(|| ScraperError::missing("videos[].url"))?,
        ),
        None => None,
    };

    let description = html_to_text(
        &raw.description
            .ok_or_else(|| ScraperError::missing("description"))?,
    );

    let metadata = ListingMetadata {
        article: raw.article.ok_or_else(|| ScraperError::missing("article"))?,
        sex: raw.sex.ok_or_else(|| ScraperError::missing("sex"))?,
        rating: raw.rating.ok_or_else(|| ScraperError::missing("rating"))?,
        review_count: raw
            .review_count
            .ok_or_else(|| ScraperError::missing("review_count"))?,
        questions_count: raw
            .questions_count
            .ok_or_else(|| ScraperError::missing("questions_count"))?,
        vendor: normalize_vendor(raw.vendor.ok_or_else(|| ScraperError::missing("vendor"))?)?,
    };

    Ok(CanonicalListing {
        captured_at,
        id,
        url,
        title,
        brand,
        marketing_tags,
        price,
        in_stock,
        assets: Assets {
            main_image: set_images.first().cloned().unwrap_or_default(),
            set_images,
            video,
        },
        description,
        metadata,
    })
}

fn normalize_price(
    prices: RawPrices,
    discount_percentage: Option<f64>,
) -> Result<PriceData, ScraperError> {
    let current = prices
        .sale
        .ok_or_else(|| ScraperError::missing("prices.sale"))?;
    let original = prices
        .old
        .ok_or_else(|| ScraperError::missing("prices.old"))?;

    Ok(PriceData {
        current,
        original,
        sale_tag: sale_tag(current, original, discount_percentage),
    })
}

/// Builds `"Скидка {n}%"` when both prices are known and differ.
///
/// A `null` price on either side means "unknown", not "zero", so no tag is
/// produced. When the API omits the percentage for a discounted item it is
/// derived from the two prices and rounded to a whole number. A current price
/// above the original derives 0, never a negative percentage.
#[allow(clippy::float_cmp)]
fn sale_tag(current: Option<f64>, original: Option<f64>, discount: Option<f64>) -> Option<String> {
    let (current, original) = (current?, original?);
    if current == original {
        return None;
    }

    let percent = discount.unwrap_or_else(|| {
        if original > current && original > 0.0 {
            ((original - current) / original * 100.0).round()
        } else {
            0.0
        }
    });
    Some(format!("Скидка {percent}%"))
}

fn normalize_vendor(vendor: RawVendor) -> Result<VendorInfo, ScraperError> {
    Ok(VendorInfo {
        id: vendor
            .code
            .ok_or_else(|| ScraperError::missing("vendor.code"))?,
        name: vendor
            .name
            .ok_or_else(|| ScraperError::missing("vendor.name"))?,
        inn: vendor
            .inn
            .ok_or_else(|| ScraperError::missing("vendor.inn"))?,
        ogrn: vendor
            .ogrn
            .ok_or_else(|| ScraperError::missing("vendor.ogrn"))?,
        phone: vendor
            .phone
            .ok_or_else(|| ScraperError::missing("vendor.phone"))?,
        address: vendor
            .address
            .ok_or_else(|| ScraperError::missing("vendor.address"))?,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
