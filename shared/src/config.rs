use serde::{Deserialize, Serialize};

use crate::builder::SiblingLoading;
use crate::error::LoadError;
use crate::layout::{DEFAULT_ROW_HEIGHT, DEFAULT_VIEWPORT_HEIGHT, RowSizing};
use crate::paging::DEFAULT_PAGE_SIZE;

pub const MAX_DATASET_DEPTH: usize = 8;
pub const MAX_DATASET_FANOUT: usize = 20;
/// Upper bound on generated demo items; generation is eager.
pub const MAX_DATASET_ITEMS: usize = 100_000;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub tree: TreeViewConfig,
    pub dataset: DatasetConfig,
}

// Version of the config file format, bumped when sections change shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

/// Where additional root-level items are fetched from while scrolling.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PageSourceConfig {
    #[default]
    Backend,
    /// `GET <endpoint>?startIndex=..&stopIndex=..` returning a JSON item array.
    Http(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TreeViewConfig {
    pub row_height: f64,
    pub viewport_height: f64,
    pub page_size: usize,
    pub child_load_delay_ms: u32,
    pub page_load_delay_ms: u32,
    pub sibling_loading: SiblingLoading,
    pub row_sizing: RowSizing,
    pub page_source: PageSourceConfig,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            page_size: DEFAULT_PAGE_SIZE,
            child_load_delay_ms: 100,
            page_load_delay_ms: 1000,
            sibling_loading: SiblingLoading::default(),
            row_sizing: RowSizing::default(),
            page_source: PageSourceConfig::default(),
        }
    }
}

/// Demo data served by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root items sent with the initial load.
    pub initial_roots: usize,
    /// Root items available in total, including the initial ones.
    pub total_roots: usize,
    pub depth: usize,
    pub fanout: usize,
    /// Flat JSON item list used instead of generated items.
    pub path: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            initial_roots: 5,
            total_roots: 200,
            depth: 3,
            fanout: 3,
            path: None,
        }
    }
}

impl DatasetConfig {
    /// Nodes in one generated root subtree: `1 + fanout + … + fanout^(depth-1)`.
    pub fn subtree_size(&self) -> usize {
        let mut size: usize = 0;
        let mut level: usize = 1;
        for _ in 0..self.depth {
            size = size.saturating_add(level);
            level = level.saturating_mul(self.fanout);
        }
        size
    }

    pub fn generated_item_count(&self) -> usize {
        self.subtree_size().saturating_mul(self.total_roots)
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, LoadError> {
        toml::to_string_pretty(self).map_err(|error| LoadError::Config(error.to_string()))
    }

    /// Clamp out-of-range values in place and describe every fix.
    pub fn validate_and_fix(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.app.is_supported_version() {
            warnings.push(format!(
                "Unsupported config version '{}', treating it as {}",
                self.app.version,
                AppSection::CURRENT_VERSION
            ));
            self.app.version = AppSection::CURRENT_VERSION.to_string();
        }

        let tree = &mut self.tree;
        if !(tree.row_height.is_finite() && tree.row_height >= 1.0) {
            warnings.push(format!(
                "Row height {} is invalid, using {DEFAULT_ROW_HEIGHT}",
                tree.row_height
            ));
            tree.row_height = DEFAULT_ROW_HEIGHT;
        }
        if !(tree.viewport_height.is_finite() && tree.viewport_height >= 1.0) {
            warnings.push(format!(
                "Viewport height {} is invalid, using {DEFAULT_VIEWPORT_HEIGHT}",
                tree.viewport_height
            ));
            tree.viewport_height = DEFAULT_VIEWPORT_HEIGHT;
        }
        if tree.page_size == 0 {
            warnings.push("Page size 0 is invalid, using 1".to_string());
            tree.page_size = 1;
        }
        if let PageSourceConfig::Http(endpoint) = &tree.page_source {
            if endpoint.trim().is_empty() {
                warnings.push("Empty HTTP page endpoint, using the backend".to_string());
                tree.page_source = PageSourceConfig::Backend;
            }
        }

        let dataset = &mut self.dataset;
        if dataset.depth == 0 || dataset.depth > MAX_DATASET_DEPTH {
            let fixed = dataset.depth.clamp(1, MAX_DATASET_DEPTH);
            warnings.push(format!("Dataset depth {} clamped to {fixed}", dataset.depth));
            dataset.depth = fixed;
        }
        if dataset.fanout > MAX_DATASET_FANOUT {
            warnings.push(format!(
                "Dataset fanout {} clamped to {MAX_DATASET_FANOUT}",
                dataset.fanout
            ));
            dataset.fanout = MAX_DATASET_FANOUT;
        }
        if dataset.initial_roots > dataset.total_roots {
            warnings.push(format!(
                "Initial roots {} exceed total roots {}, raising the total",
                dataset.initial_roots, dataset.total_roots
            ));
            dataset.total_roots = dataset.initial_roots;
        }
        if dataset.generated_item_count() > MAX_DATASET_ITEMS {
            let requested = dataset.generated_item_count();
            while dataset.depth > 1 && dataset.subtree_size() > MAX_DATASET_ITEMS {
                dataset.depth -= 1;
            }
            dataset.total_roots = dataset
                .total_roots
                .min(MAX_DATASET_ITEMS / dataset.subtree_size())
                .max(1);
            dataset.initial_roots = dataset.initial_roots.min(dataset.total_roots);
            warnings.push(format!(
                "Dataset of {requested} items exceeds {MAX_DATASET_ITEMS}, using depth {} \
                 and {} roots",
                dataset.depth, dataset.total_roots
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = AppConfig::from_toml_str("[tree]\npage_size = 25\n").unwrap();
        assert_eq!(config.tree.page_size, 25);
        assert_eq!(config.tree.row_height, 20.0);
        assert_eq!(config.tree.sibling_loading, SiblingLoading::Concurrent);
        assert_eq!(config.tree.row_sizing, RowSizing::Measured);
        assert_eq!(config.dataset, DatasetConfig::default());
        assert_eq!(config.app.version, AppSection::CURRENT_VERSION);
    }

    #[test]
    fn parses_enum_settings() {
        let config = AppConfig::from_toml_str(
            r#"
            [tree]
            sibling_loading = "sequential"
            row_sizing = "fixed"
            page_source = { http = "https://example.test/items" }
            "#,
        )
        .unwrap();
        assert_eq!(config.tree.sibling_loading, SiblingLoading::Sequential);
        assert_eq!(config.tree.row_sizing, RowSizing::Fixed);
        assert_eq!(
            config.tree.page_source,
            PageSourceConfig::Http("https://example.test/items".to_string())
        );

        let config = AppConfig::from_toml_str("[tree]\npage_source = \"backend\"\n").unwrap();
        assert_eq!(config.tree.page_source, PageSourceConfig::Backend);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let error = AppConfig::from_toml_str("[tree\n").unwrap_err();
        assert!(matches!(error, LoadError::Config(_)));
    }

    #[test]
    fn validate_and_fix_clamps_and_reports() {
        let mut config = AppConfig::default();
        config.tree.row_height = 0.0;
        config.tree.page_size = 0;
        config.tree.page_source = PageSourceConfig::Http("  ".to_string());
        config.dataset.depth = 50;
        config.dataset.initial_roots = 10;
        config.dataset.total_roots = 4;

        let warnings = config.validate_and_fix();

        assert_eq!(warnings.len(), 5);
        assert_eq!(config.tree.row_height, DEFAULT_ROW_HEIGHT);
        assert_eq!(config.tree.page_size, 1);
        assert_eq!(config.tree.page_source, PageSourceConfig::Backend);
        assert_eq!(config.dataset.depth, MAX_DATASET_DEPTH);
        assert_eq!(config.dataset.total_roots, 10);

        assert!(AppConfig::default().validate_and_fix().is_empty());
    }

    #[test]
    fn generated_dataset_size_is_capped() {
        let mut config = AppConfig::default();
        config.dataset.depth = MAX_DATASET_DEPTH;
        config.dataset.fanout = MAX_DATASET_FANOUT;

        let warnings = config.validate_and_fix();

        assert_eq!(warnings.len(), 1);
        // 1 + 20 + 400 + 8000 nodes per root fits, one more level does not.
        assert_eq!(config.dataset.depth, 4);
        assert_eq!(config.dataset.subtree_size(), 8421);
        assert_eq!(config.dataset.total_roots, 11);
        assert_eq!(config.dataset.initial_roots, 5);
        assert!(config.dataset.generated_item_count() <= MAX_DATASET_ITEMS);
    }

    #[test]
    fn serialized_config_reads_back() {
        let config = AppConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }
}
