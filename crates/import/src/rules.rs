use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tally_core::{fold, normalize, CategorizedTransaction, CategoryPair, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub subcategory: String,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleKind {
    /// Matches one description exactly, after normalization.
    Manual { description: String },
    /// Matches when any keyword occurs inside the normalized description.
    Keyword { keywords: Vec<String> },
}

impl CategoryRule {
    pub fn manual(description: &str, category: &str, subcategory: &str) -> Self {
        CategoryRule {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            kind: RuleKind::Manual {
                description: description.to_string(),
            },
        }
    }

    pub fn keyword<I, S>(category: &str, subcategory: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryRule {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            kind: RuleKind::Keyword {
                keywords: keywords.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn pair(&self) -> CategoryPair {
        CategoryPair::new(&self.category, &self.subcategory)
    }
}

/// Outcome of resolving one description against the rule set.
///
/// `Unmatched` is kept distinct from a rule whose labels happen to equal the
/// fallback text; it only collapses to the fallback pair in `pair()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Manual(&'a CategoryRule),
    Keyword {
        rule: &'a CategoryRule,
        keyword: &'a str,
    },
    Unmatched,
}

impl<'a> Resolution<'a> {
    pub fn rule(self) -> Option<&'a CategoryRule> {
        match self {
            Resolution::Manual(rule) | Resolution::Keyword { rule, .. } => Some(rule),
            Resolution::Unmatched => None,
        }
    }

    pub fn is_matched(self) -> bool {
        !matches!(self, Resolution::Unmatched)
    }

    pub fn pair(self) -> CategoryPair {
        self.rule()
            .map(CategoryRule::pair)
            .unwrap_or_else(CategoryPair::uncategorized)
    }
}

/// Internal pairing of a keyword rule with its folded keywords.
struct KeywordRule {
    rule: CategoryRule,
    /// Parallel to the rule's keywords; empty entries never match.
    folded: Vec<String>,
}

impl KeywordRule {
    fn new(rule: CategoryRule) -> Self {
        let folded = match &rule.kind {
            RuleKind::Keyword { keywords } => keywords.iter().map(|k| fold(k)).collect(),
            RuleKind::Manual { .. } => Vec::new(),
        };
        KeywordRule { rule, folded }
    }

    fn first_hit(&self, normalized: &str) -> Option<&str> {
        let RuleKind::Keyword { keywords } = &self.rule.kind else {
            return None;
        };
        self.folded
            .iter()
            .zip(keywords)
            .find(|(folded, _)| !folded.is_empty() && normalized.contains(folded.as_str()))
            .map(|(_, original)| original.as_str())
    }
}

/// Ordered rule registry.
///
/// Manual rules always win over keyword rules. Keyword rules are scanned in
/// registration order and the first hit wins.
#[derive(Default)]
pub struct CategoryManager {
    manual: IndexMap<String, CategoryRule>,
    keyword: Vec<KeywordRule>,
}

impl CategoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a manager from description -> category pairs, in iteration order.
    pub fn from_manual_mapping<I, K>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, CategoryPair)>,
        K: AsRef<str>,
    {
        let mut manager = Self::new();
        for (description, pair) in mapping {
            manager.add_manual_rule(description.as_ref(), &pair.category, &pair.subcategory);
        }
        manager
    }

    /// Upserts a manual rule keyed by the normalized description. A later rule
    /// for the same key replaces the earlier one in place.
    pub fn add_manual_rule(&mut self, description: &str, category: &str, subcategory: &str) {
        let key = normalize(description);
        tracing::debug!("Manual rule '{}' -> {} / {}", key, category, subcategory);
        let rule = CategoryRule::manual(description, category, subcategory);
        if let Some(previous) = self.manual.insert(key, rule) {
            tracing::debug!("Replaced manual rule -> {}", previous.pair());
        }
    }

    /// Appends a keyword rule below every rule registered so far.
    pub fn add_keyword_rule<I, S>(&mut self, category: &str, subcategory: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = CategoryRule::keyword(category, subcategory, keywords);
        tracing::debug!(
            "Keyword rule #{} -> {} / {}",
            self.keyword.len(),
            category,
            subcategory
        );
        self.keyword.push(KeywordRule::new(rule));
    }

    pub fn resolve(&self, description: &str) -> Resolution<'_> {
        let normalized = normalize(description);

        if let Some(rule) = self.manual.get(&normalized) {
            return Resolution::Manual(rule);
        }

        self.keyword
            .iter()
            .find_map(|kr| {
                kr.first_hit(&normalized).map(|keyword| Resolution::Keyword {
                    rule: &kr.rule,
                    keyword,
                })
            })
            .unwrap_or_else(|| {
                tracing::trace!("No rule for '{}'", normalized);
                Resolution::Unmatched
            })
    }

    /// Category pair for a description, falling back to `Uncategorized`.
    pub fn categorize(&self, description: &str) -> CategoryPair {
        self.resolve(description).pair()
    }

    /// Categorizes every row, preserving order. Never fails.
    pub fn categorize_table(&self, rows: &[Transaction]) -> Vec<CategorizedTransaction> {
        let categorized: Vec<CategorizedTransaction> = rows
            .iter()
            .map(|tx| CategorizedTransaction::new(tx.clone(), self.categorize(&tx.description)))
            .collect();
        tracing::debug!("Categorized {} rows", categorized.len());
        categorized
    }

    /// Manual rules keyed by normalized description, in first-insertion order.
    pub fn manual_rules(&self) -> impl Iterator<Item = (&str, &CategoryRule)> {
        self.manual.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    /// Keyword rules in precedence order.
    pub fn keyword_rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.keyword.iter().map(|kr| &kr.rule)
    }

    pub fn len(&self) -> usize {
        self.manual.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CategoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryManager")
            .field("manual", &self.manual.len())
            .field("keyword", &self.keyword.len())
            .finish()
    }
}
