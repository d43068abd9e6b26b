//! Raw response types for the catalog endpoint `GET /v2/products/new`.
//!
//! ## Observed shape
//!
//! The endpoint returns a bare JSON array of listing objects, not an envelope.
//! A page shorter than the requested `limit` is the last page.
//!
//! ### Absent vs. `null`
//! Every field here is modelled as optional so that a single listing missing
//! a key fails with a precise [`crate::ScraperError::MissingField`] instead of
//! a serde error that takes the whole page down. Fields that legitimately
//! carry `null` (prices, discount, metadata scalars, vendor contacts) use
//! `Option<Option<T>>`: the outer `None` means the key was absent, `Some(None)`
//! means it was sent as `null`.
//!
//! ### Identifiers
//! `id`, `article` and the vendor's `code`/`inn`/`ogrn` have been seen both as
//! JSON numbers and as strings. They are read as either and kept as strings.
//!
//! ### `brands`
//! Frequently an empty array; occasionally absent. Both mean "no brand".

use serde::{Deserialize, Deserializer};

/// One element of the page array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub id: Option<Scalar>,

    #[serde(default)]
    pub link: Option<RawLink>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub brands: Option<Vec<RawBrand>>,

    #[serde(default)]
    pub labels: Option<Vec<RawLabel>>,

    #[serde(default)]
    pub prices: Option<RawPrices>,

    /// Whole-number percentage, e.g. `25`. `null` on some discounted items.
    #[serde(default, deserialize_with = "nullable")]
    pub discount_percentage: Option<Option<f64>>,

    #[serde(default)]
    pub available: Option<RawAvailability>,

    #[serde(default)]
    pub pictures: Option<Vec<RawPicture>>,

    #[serde(default)]
    pub videos: Option<Vec<RawVideo>>,

    /// HTML fragment, frequently with `\r\n` line breaks between paragraphs.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "nullable_scalar")]
    pub article: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub sex: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<f64>>,

    #[serde(default, deserialize_with = "nullable")]
    pub review_count: Option<Option<u64>>,

    #[serde(default, deserialize_with = "nullable")]
    pub questions_count: Option<Option<u64>>,

    #[serde(default)]
    pub vendor: Option<RawVendor>,
}

/// A JSON value accepted as either a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBrand {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLabel {
    /// Display text; `null` or `""` for icon-only labels.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPrices {
    /// Price the item sells for now.
    #[serde(default, deserialize_with = "nullable")]
    pub sale: Option<Option<f64>>,
    /// Pre-discount price. Equal to `sale` when nothing is discounted.
    #[serde(default, deserialize_with = "nullable")]
    pub old: Option<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAvailability {
    #[serde(default)]
    pub online: Option<RawOnlineAvailability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOnlineAvailability {
    /// Warehouse codes holding stock. Element type varies, only the count matters.
    #[serde(default, deserialize_with = "nullable")]
    pub warehouse_codes: Option<Option<Vec<serde_json::Value>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPicture {
    /// Full-size image URL.
    #[serde(default)]
    pub original: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVendor {
    #[serde(default, deserialize_with = "nullable_scalar")]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_scalar")]
    pub inn: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_scalar")]
    pub ogrn: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
}

/// Distinguishes a present-but-`null` field from an absent one. Paired with
/// `#[serde(default)]`, which supplies the outer `None` for absent keys.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_scalar<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(|v| Some(v.map(|s| s.to_string())))
}
