use fs_err as fs;
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::CatalogError;
use crate::wire::{CatalogFile, Product};

/// Read-only product catalog loaded from a path or an http(s) URL.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub async fn load(source: &str) -> Result<Self, CatalogError> {
        let raw = if source.starts_with("http://") || source.starts_with("https://") {
            debug!(%source, "fetching catalog");
            reqwest::get(source).await?.error_for_status()?.text().await?
        } else {
            fs::read_to_string(source).map_err(|e| CatalogError::Io {
                path: source.to_string(),
                source: e,
            })?
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Ok(Self { products: file.products })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Exact category match, catalog order.
    pub fn in_category(&self, category: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.category == category).collect()
    }

    pub fn find(&self, id: i64) -> Result<&Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or(CatalogError::UnknownProduct(id))
    }
}
