use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::CategoryPair;
use thiserror::Error;

use crate::rules::CategoryManager;

#[derive(Error, Debug)]
pub enum RuleFileError {
    #[error("Failed to read rule file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse JSON rules: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse TOML rules: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unsupported rule file format: '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTarget {
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "subcategoria")]
    pub subcategory: String,
}

impl From<RuleTarget> for CategoryPair {
    fn from(target: RuleTarget) -> Self {
        CategoryPair::new(target.category, target.subcategory)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRuleSpec {
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "subcategoria")]
    pub subcategory: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Rules as supplied by the user.
///
/// Two shapes are accepted: `{ "manual": {...}, "keywords": [...] }` (either
/// key optional) or a bare description -> target mapping. Mapping and list
/// order are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleFileRepr")]
pub struct RuleFile {
    pub manual: IndexMap<String, RuleTarget>,
    pub keywords: Vec<KeywordRuleSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFileRepr {
    Structured(StructuredRules),
    Flat(IndexMap<String, RuleTarget>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredRules {
    #[serde(default)]
    manual: IndexMap<String, RuleTarget>,
    #[serde(default)]
    keywords: Vec<KeywordRuleSpec>,
}

impl From<RuleFileRepr> for RuleFile {
    fn from(repr: RuleFileRepr) -> Self {
        match repr {
            RuleFileRepr::Structured(s) => RuleFile {
                manual: s.manual,
                keywords: s.keywords,
            },
            RuleFileRepr::Flat(manual) => RuleFile {
                manual,
                keywords: Vec::new(),
            },
        }
    }
}

impl RuleFile {
    pub fn from_json_str(content: &str) -> Result<Self, RuleFileError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RuleFileError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a rule file, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, RuleFileError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if extension != "json" && extension != "toml" {
            return Err(RuleFileError::UnsupportedFormat(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| RuleFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let rules = if extension == "json" {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        tracing::debug!(
            "Loaded {} manual and {} keyword rules from {}",
            rules.manual.len(),
            rules.keywords.len(),
            path.display()
        );
        Ok(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.keywords.is_empty()
    }

    /// Registers manual rules first, then keyword rules in file order.
    pub fn into_manager(self) -> CategoryManager {
        let mut manager = CategoryManager::from_manual_mapping(
            self.manual
                .into_iter()
                .map(|(description, target)| (description, CategoryPair::from(target))),
        );
        ensure_subcategories(&mut manager, self.keywords);
        manager
    }
}

/// Registers each keyword rule below those already in `manager`, in the
/// order given.
pub fn ensure_subcategories<I>(manager: &mut CategoryManager, rules: I)
where
    I: IntoIterator<Item = KeywordRuleSpec>,
{
    for rule in rules {
        manager.add_keyword_rule(&rule.category, &rule.subcategory, rule.keywords);
    }
}
