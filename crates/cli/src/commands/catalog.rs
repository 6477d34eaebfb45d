//! Catalog file checks.
//!
//! # Usage
//!
//! ```bash
//! gachadex catalog validate
//! gachadex catalog validate --path data/catalog.json --strict
//! ```

use std::path::Path;

use gachadex_core::{Catalog, Rarity};

use super::CliError;

/// Summary of a validated catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub total: usize,
    pub counts: Vec<(Rarity, usize)>,
    pub missing: Vec<Rarity>,
}

impl CatalogReport {
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            total: catalog.len(),
            counts: catalog.counts_by_rarity(),
            missing: catalog.missing_rarities(),
        }
    }
}

/// Load a catalog file and report per-rarity counts.
///
/// With `strict`, a rarity with no items is an error.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or parsed, has duplicate ids
/// or empty names, or (with `strict`) leaves a rarity empty.
pub fn validate(path: &Path, strict: bool) -> Result<CatalogReport, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let report = CatalogReport::from_catalog(&Catalog::from_json(&json)?);

    tracing::info!("{}: {} item(s)", path.display(), report.total);
    for (rarity, count) in &report.counts {
        tracing::info!("  {:<10} {}", rarity.as_str(), count);
    }
    for rarity in &report.missing {
        tracing::warn!("No items for {}; draws landing there will fail", rarity);
    }

    if strict && !report.missing.is_empty() {
        let names: Vec<&str> = report.missing.iter().map(|r| r.as_str()).collect();
        return Err(CliError::MissingRarities(names.join(", ")));
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHIPPED_CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../server/data/catalog.json");

    #[test]
    fn test_shipped_catalog_covers_every_rarity() {
        let report = validate(Path::new(SHIPPED_CATALOG), true).unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.counts.len(), Rarity::ALL.len());
        assert_eq!(report.counts.iter().map(|(_, n)| n).sum::<usize>(), report.total);
    }

    #[test]
    fn test_report_lists_missing_rarities() {
        let catalog = Catalog::from_json(
            r#"[{"id": 1, "name": "Pidgey", "type": "Normal", "rarity": "Common", "image": "./Front/016.png"}]"#,
        )
        .unwrap();
        let report = CatalogReport::from_catalog(&catalog);
        assert_eq!(report.total, 1);
        assert_eq!(report.missing.len(), Rarity::ALL.len() - 1);
        assert!(!report.missing.contains(&Rarity::Common));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = validate(Path::new("/nonexistent/catalog.json"), false).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
