//! Page request construction for the catalog endpoint.
//!
//! The API does not care about parameter order, but every request is
//! serialized in one fixed order (`filter`, `expand`, `exclude`, `limit`,
//! `sort`, `platform`, `offset`) so identical inputs always produce identical
//! URLs. Values are emitted verbatim: the filter expression's `[]`, `:` and
//! `;` are not percent-encoded.

use crate::error::ScraperError;

/// Number of listings requested per page. A shorter page ends pagination.
pub const PAGE_LIMIT: u32 = 36;

/// Path of the catalog endpoint, relative to the API origin.
pub const PRODUCTS_PATH: &str = "/v2/products/new";

/// Fixed query terms shared by every page request.
///
/// Only `api_base_url` is expected to vary (tests point it at a mock server);
/// the remaining terms describe the storefront view being harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Scheme + host, without a trailing slash.
    pub api_base_url: String,
    pub platform: String,
    pub site: String,
    pub region: String,
    pub promo: bool,
    pub sort: String,
    pub expand: String,
    pub exclude: String,
    pub limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.detmir.ru".to_string(),
            platform: "web".to_string(),
            site: "detmir".to_string(),
            region: "RU-MOW".to_string(),
            promo: false,
            sort: "popularity:desc".to_string(),
            expand: "meta.filter.info,meta.filters.delivery_speed,webp".to_string(),
            exclude: "stores".to_string(),
            limit: PAGE_LIMIT,
        }
    }
}

impl QueryConfig {
    /// Default terms against a different API origin.
    #[must_use]
    pub fn with_base_url(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// A storefront category, identified by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryTarget {
    pub alias: String,
}

impl CategoryTarget {
    /// Resolves the category named by a seed URL.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::MalformedSeedUrl`] when the URL has no
    /// usable path segment.
    pub fn from_seed_url(seed_url: &str) -> Result<Self, ScraperError> {
        category_alias(seed_url).map(|alias| Self { alias })
    }
}

impl std::fmt::Display for CategoryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.alias)
    }
}

/// One page fetch, fully described. Built by [`QueryBuilder::build_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub category: CategoryTarget,
    pub offset: u32,
    pub limit: u32,
    url: String,
}

impl PageRequest {
    /// Absolute URL to fetch.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `offset / limit`, zero-based.
    #[must_use]
    pub fn page_index(&self) -> u32 {
        self.offset.checked_div(self.limit).unwrap_or(0)
    }
}

/// Extracts the last non-empty path segment of `seed_url`.
///
/// `https://www.detmir.ru/catalog/index/name/bombery_vo/` yields `"bombery_vo"`.
///
/// # Errors
///
/// Returns [`ScraperError::MalformedSeedUrl`] when the URL cannot be parsed
/// or its path has no segments.
pub fn category_alias(seed_url: &str) -> Result<String, ScraperError> {
    let url = reqwest::Url::parse(seed_url.trim()).map_err(|e| ScraperError::MalformedSeedUrl {
        seed_url: seed_url.to_owned(),
        reason: e.to_string(),
    })?;

    url.path_segments()
        .and_then(|segments| segments.rev().find(|s| !s.is_empty()))
        .map(str::to_owned)
        .ok_or_else(|| ScraperError::MalformedSeedUrl {
            seed_url: seed_url.to_owned(),
            reason: "URL path has no category segment".to_string(),
        })
}

/// Turns `(category, offset)` into a [`PageRequest`]. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    config: QueryConfig,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.config.limit
    }

    /// Builds the request for the page of `category` starting at `offset`.
    #[must_use]
    pub fn build_request(&self, category: &CategoryTarget, offset: u32) -> PageRequest {
        let url = format!(
            "{}{}?{}",
            self.config.api_base_url,
            PRODUCTS_PATH,
            to_query_string(&self.query_pairs(category, offset))
        );
        PageRequest {
            category: category.clone(),
            offset,
            limit: self.config.limit,
            url,
        }
    }

    /// The filter expression. Only the category alias varies between calls.
    #[must_use]
    pub fn filter_expression(&self, category: &CategoryTarget) -> String {
        let c = &self.config;
        format!(
            "categories[].alias:{};platform:{};promo:{};site:{};withregion:{}",
            category.alias, c.platform, c.promo, c.site, c.region
        )
    }

    /// Query parameters in serialization order.
    fn query_pairs(&self, category: &CategoryTarget, offset: u32) -> [(&'static str, String); 7] {
        let c = &self.config;
        [
            ("filter", self.filter_expression(category)),
            ("expand", c.expand.clone()),
            ("exclude", c.exclude.clone()),
            ("limit", c.limit.to_string()),
            ("sort", c.sort.clone()),
            ("platform", c.platform.clone()),
            ("offset", offset.to_string()),
        ]
    }
}

fn to_query_string(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bombery() -> CategoryTarget {
        CategoryTarget {
            alias: "bombery_vo".to_string(),
        }
    }

    #[test]
    fn alias_from_seed_with_trailing_slash() {
        let alias = category_alias("https://www.detmir.ru/catalog/index/name/bombery_vo/").unwrap();
        assert_eq!(alias, "bombery_vo");
    }

    #[test]
    fn alias_from_seed_without_trailing_slash() {
        let alias = category_alias("https://www.detmir.ru/catalog/index/name/bryuki_uteplennye")
            .unwrap();
        assert_eq!(alias, "bryuki_uteplennye");
    }

    #[test]
    fn alias_ignores_query_string() {
        let alias =
            category_alias("https://www.detmir.ru/catalog/index/name/bombery_vo/?page=2").unwrap();
        assert_eq!(alias, "bombery_vo");
    }

    #[test]
    fn alias_skips_repeated_slashes() {
        let alias = category_alias("https://www.detmir.ru/catalog//bombery_vo//").unwrap();
        assert_eq!(alias, "bombery_vo");
    }

    #[test]
    fn alias_fails_for_root_path() {
        let err = category_alias("https://www.detmir.ru/").unwrap_err();
        assert!(
            matches!(err, ScraperError::MalformedSeedUrl { ref reason, .. } if reason.contains("no category segment")),
            "expected MalformedSeedUrl, got: {err:?}"
        );
    }

    #[test]
    fn alias_fails_for_unparseable_url() {
        let err = category_alias("not a url").unwrap_err();
        assert!(matches!(err, ScraperError::MalformedSeedUrl { .. }));
    }

    #[test]
    fn first_page_url_matches_fixed_parameter_order() {
        let builder = QueryBuilder::default();
        let request = builder.build_request(&bombery(), 0);
        assert_eq!(
            request.url(),
            "https://api.detmir.ru/v2/products/new?\
             filter=categories[].alias:bombery_vo;platform:web;promo:false;site:detmir;withregion:RU-MOW\
             &expand=meta.filter.info,meta.filters.delivery_speed,webp\
             &exclude=stores\
             &limit=36\
             &sort=popularity:desc\
             &platform=web\
             &offset=0"
        );
        assert_eq!(request.offset, 0);
        assert_eq!(request.limit, PAGE_LIMIT);
        assert_eq!(request.category, bombery());
    }

    #[test]
    fn build_request_is_deterministic() {
        let builder = QueryBuilder::default();
        let a = builder.build_request(&bombery(), 72);
        let b = builder.build_request(&bombery(), 72);
        assert_eq!(a, b);
        assert_eq!(a.url().as_bytes(), b.url().as_bytes());
    }

    #[test]
    fn offset_is_the_last_parameter() {
        let builder = QueryBuilder::default();
        let request = builder.build_request(&bombery(), 108);
        assert!(request.url().ends_with("&platform=web&offset=108"));
        assert_eq!(request.page_index(), 3);
    }

    #[test]
    fn filter_varies_only_by_category() {
        let builder = QueryBuilder::default();
        let other = CategoryTarget {
            alias: "bryuki_uteplennye".to_string(),
        };
        let a = builder.filter_expression(&bombery());
        let b = builder.filter_expression(&other);
        assert_eq!(
            a.replace("bombery_vo", "bryuki_uteplennye"),
            b,
            "filter terms other than the alias must be identical"
        );
    }

    #[test]
    fn base_url_override_keeps_path_and_query() {
        let builder = QueryBuilder::new(QueryConfig::with_base_url("http://127.0.0.1:9000/"));
        let request = builder.build_request(&bombery(), 0);
        assert!(request
            .url()
            .starts_with("http://127.0.0.1:9000/v2/products/new?filter="));
    }

    #[test]
    fn category_target_from_seed_url() {
        let target =
            CategoryTarget::from_seed_url("https://www.detmir.ru/catalog/index/name/bombery_vo/")
                .unwrap();
        assert_eq!(target, bombery());
        assert_eq!(target.to_string(), "bombery_vo");
    }
}
