//! Static OS × category table of vetted, read-only command templates.

mod table;

use crate::types::{CandidateCommand, Category, OsType};

/// Most entries a single lookup returns.
pub const MAX_ENTRIES: usize = 3;

/// Result of a lookup by category name.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLookup {
    Commands(Vec<CandidateCommand>),
    /// The name did not match any category; the command list is empty.
    UnknownCategory(String),
}

impl CatalogLookup {
    pub fn is_unknown(&self) -> bool {
        matches!(self, CatalogLookup::UnknownCategory(_))
    }

    pub fn into_commands(self) -> Vec<CandidateCommand> {
        match self {
            CatalogLookup::Commands(c) => c,
            CatalogLookup::UnknownCategory(_) => Vec::new(),
        }
    }
}

/// Shared, immutable catalog. Constructed once per process.
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog;

impl CommandCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }

    /// Entries for `category` on `os`. Unknown OS falls back to Linux.
    pub fn catalog(&self, category: Category, os: OsType) -> Vec<CandidateCommand> {
        table::entries(category, os)
            .iter()
            .take(MAX_ENTRIES)
            .map(|e| {
                CandidateCommand::new(e.command, e.purpose, category, table::CATALOG_RISK)
                    .with_timeout(e.timeout_secs)
                    .with_hint(e.hint)
            })
            .collect()
    }

    pub fn lookup(&self, category_name: &str, os: OsType) -> CatalogLookup {
        match category_name.parse::<Category>() {
            Ok(category) => CatalogLookup::Commands(self.catalog(category, os)),
            Err(name) => CatalogLookup::UnknownCategory(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskLevel, MAX_COMMAND_TIMEOUT_SECS};

    #[test]
    fn every_cell_is_bounded_and_safe() {
        let catalog = CommandCatalog::new();
        for os in [OsType::Linux, OsType::Windows, OsType::Macos, OsType::Unknown] {
            for category in catalog.categories() {
                let cmds = catalog.catalog(*category, os);
                assert!(!cmds.is_empty(), "{os} {category} is empty");
                assert!(cmds.len() <= MAX_ENTRIES);
                for c in cmds {
                    assert_eq!(c.category, *category);
                    assert_eq!(c.risk_level, RiskLevel::Safe);
                    assert!(c.timeout_seconds <= MAX_COMMAND_TIMEOUT_SECS);
                }
            }
        }
    }

    #[test]
    fn unknown_os_falls_back_to_linux() {
        let catalog = CommandCatalog::new();
        assert_eq!(
            catalog.catalog(Category::Memory, OsType::Unknown),
            catalog.catalog(Category::Memory, OsType::Linux)
        );
    }

    #[test]
    fn os_specific_entries() {
        let catalog = CommandCatalog::new();
        let win: Vec<String> = catalog
            .catalog(Category::Network, OsType::Windows)
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert!(win.contains(&"ipconfig /all".to_string()));
        let mac: Vec<String> = catalog
            .catalog(Category::Memory, OsType::Macos)
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert!(mac.contains(&"vm_stat".to_string()));
    }

    #[test]
    fn unknown_category_name_is_a_visible_sentinel() {
        let catalog = CommandCatalog::new();
        let res = catalog.lookup("printers", OsType::Linux);
        assert!(res.is_unknown());
        assert!(res.into_commands().is_empty());

        let res = catalog.lookup("disk", OsType::Linux);
        assert!(!res.is_unknown());
        assert!(!res.into_commands().is_empty());
    }
}
