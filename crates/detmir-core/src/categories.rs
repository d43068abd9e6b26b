use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Seeds harvested when neither a categories file nor `--seed` flags are given.
pub const DEFAULT_SEED_URLS: &[&str] = &[
    "https://www.detmir.ru/catalog/index/name/bombery_vo/",
    "https://www.detmir.ru/catalog/index/name/bryuki_uteplennye/",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    /// Storefront catalog page, e.g. `https://www.detmir.ru/catalog/index/name/bombery_vo/`.
    pub seed_url: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategorySeed>,
}

impl CategoriesFile {
    /// Builds a file from [`DEFAULT_SEED_URLS`].
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_seed_urls(DEFAULT_SEED_URLS.iter().copied())
    }

    #[must_use]
    pub fn from_seed_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: urls
                .into_iter()
                .map(|url| CategorySeed {
                    seed_url: url.into(),
                    notes: None,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn seed_urls(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.seed_url.as_str()).collect()
    }
}

/// Load and validate the category seeds from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let categories_file: CategoriesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CategoriesFileParse)?;

    validate_categories(&categories_file)?;

    Ok(categories_file)
}

/// Rejects empty seed URLs and duplicates. Trailing slashes are ignored when
/// comparing, so `.../bombery_vo` and `.../bombery_vo/` count as one seed.
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first offending entry.
pub fn validate_categories(categories_file: &CategoriesFile) -> Result<(), ConfigError> {
    if categories_file.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category seed is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in &categories_file.categories {
        let seed = category.seed_url.trim();
        if seed.is_empty() {
            return Err(ConfigError::Validation(
                "seed_url must be non-empty".to_string(),
            ));
        }

        if !seen.insert(seed.trim_end_matches('/').to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed_url: '{seed}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(url: &str) -> CategorySeed {
        CategorySeed {
            seed_url: url.to_string(),
            notes: None,
        }
    }

    #[test]
    fn validate_rejects_empty_list() {
        let file = CategoriesFile { categories: vec![] };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn validate_rejects_blank_seed_url() {
        let file = CategoriesFile {
            categories: vec![seed("   ")],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_ignoring_trailing_slash() {
        let file = CategoriesFile {
            categories: vec![
                seed("https://www.detmir.ru/catalog/index/name/bombery_vo/"),
                seed("https://www.detmir.ru/catalog/index/name/bombery_vo"),
            ],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate seed_url"));
    }

    #[test]
    fn validate_accepts_builtin_seeds() {
        assert!(validate_categories(&CategoriesFile::builtin()).is_ok());
    }

    #[test]
    fn from_seed_urls_preserves_order() {
        let file = CategoriesFile::from_seed_urls(["https://a.test/x/", "https://a.test/y/"]);
        assert_eq!(file.seed_urls(), vec!["https://a.test/x/", "https://a.test/y/"]);
    }

    #[test]
    fn parses_yaml_with_optional_notes() {
        let yaml = "categories:\n  - seed_url: https://a.test/x/\n    notes: jackets\n  - seed_url: https://a.test/y/\n";
        let file: CategoriesFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.categories.len(), 2);
        assert_eq!(file.categories[0].notes.as_deref(), Some("jackets"));
        assert!(file.categories[1].notes.is_none());
    }

    #[test]
    fn load_categories_missing_file_is_io_error() {
        let err = load_categories(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CategoriesFileIo { .. }));
    }

    #[test]
    fn load_categories_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("categories.yaml");
        assert!(
            path.exists(),
            "categories.yaml missing at {path:?}, required for this test"
        );
        let result = load_categories(&path);
        assert!(result.is_ok(), "failed to load categories.yaml: {result:?}");
        assert_eq!(result.unwrap().categories.len(), 2);
    }
}
