use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The rules applied by the cleaner that can change the row count or repair a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningRule {
    DuplicatesRemoved,
    MissingPriceRemoved,
    MissingTitleRemoved,
    CategoryRepaired,
    InvalidPriceRemoved,
}

impl CleaningRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningRule::DuplicatesRemoved => "duplicates_removed",
            CleaningRule::MissingPriceRemoved => "missing_price_removed",
            CleaningRule::MissingTitleRemoved => "missing_title_removed",
            CleaningRule::CategoryRepaired => "category_repaired",
            CleaningRule::InvalidPriceRemoved => "invalid_price_removed",
        }
    }

    pub fn effect(&self) -> RuleEffect {
        match self {
            CleaningRule::CategoryRepaired => RuleEffect::Repaired,
            _ => RuleEffect::Removed,
        }
    }
}

impl fmt::Display for CleaningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    Removed,
    Repaired,
}

/// One rule application, measured against the batch as the previous rule left it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub rule: CleaningRule,
    pub rows_before: usize,
    pub affected: usize,
    pub rows_after: usize,
}

/// Accumulates one entry per rule as a batch moves through the cleaner.
/// Doubles as the removal/repair report handed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningAudit {
    pub initial_rows: usize,
    pub entries: Vec<AuditEntry>,
}

impl CleaningAudit {
    pub fn new(initial_rows: usize) -> Self {
        Self {
            initial_rows,
            entries: Vec::new(),
        }
    }

    /// Record a rule that dropped `removed` rows out of `rows_before`.
    pub fn record_removal(&mut self, rule: CleaningRule, rows_before: usize, removed: usize) {
        debug_assert_eq!(rule.effect(), RuleEffect::Removed);
        self.entries.push(AuditEntry {
            rule,
            rows_before,
            affected: removed,
            rows_after: rows_before - removed,
        });
    }

    /// Record a rule that fixed `repaired` rows in place.
    pub fn record_repair(&mut self, rule: CleaningRule, rows: usize, repaired: usize) {
        debug_assert_eq!(rule.effect(), RuleEffect::Repaired);
        self.entries.push(AuditEntry {
            rule,
            rows_before: rows,
            affected: repaired,
            rows_after: rows,
        });
    }

    /// Count for a rule; zero if the rule never ran.
    pub fn count(&self, rule: CleaningRule) -> usize {
        self.entries
            .iter()
            .filter(|e| e.rule == rule)
            .map(|e| e.affected)
            .sum()
    }

    pub fn final_rows(&self) -> usize {
        self.entries
            .last()
            .map(|e| e.rows_after)
            .unwrap_or(self.initial_rows)
    }

    pub fn total_removed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.rule.effect() == RuleEffect::Removed)
            .map(|e| e.affected)
            .sum()
    }

    pub fn total_repaired(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.rule.effect() == RuleEffect::Repaired)
            .map(|e| e.affected)
            .sum()
    }

    /// Percentage of input rows removed; zero for an empty input
    pub fn removed_pct(&self) -> f64 {
        if self.initial_rows == 0 {
            return 0.0;
        }
        self.total_removed() as f64 / self.initial_rows as f64 * 100.0
    }

    /// Stage name to count, in the order the rules ran
    pub fn counts(&self) -> IndexMap<&'static str, usize> {
        self.entries
            .iter()
            .map(|e| (e.rule.as_str(), e.affected))
            .collect()
    }
}
