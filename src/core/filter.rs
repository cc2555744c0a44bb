//! Test filters deciding which discovered nodes run.

use regex::Regex;

use crate::core::test_tree::TestNode;
use crate::error::Result;

/// Verdict of a filter set for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSetResult {
    Include,
    Exclude,
    /// No rule says anything about the node
    Indeterminate,
}

/// Filter evaluator consulted when the engine asks whether to skip a node.
pub trait FilterSet {
    fn evaluate(&self, node: &TestNode) -> FilterSetResult;

    /// Whether at least one inclusion rule exists (an allow-list is in effect)
    fn has_inclusion_rules(&self) -> bool;
}

/// Filter set with no rules: everything is indeterminate
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFilterSet;

impl FilterSet for EmptyFilterSet {
    fn evaluate(&self, _node: &TestNode) -> FilterSetResult {
        FilterSetResult::Indeterminate
    }

    fn has_inclusion_rules(&self) -> bool {
        false
    }
}

/// One compiled pattern
#[derive(Debug, Clone)]
struct Rule {
    regex: Regex,
    /// Only patterns starting with `^` are tried against ids, which begin
    /// with the file path and would otherwise match loose fragments.
    matches_id: bool,
}

impl Rule {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            matches_id: pattern.starts_with('^'),
        })
    }

    fn is_match(&self, node: &TestNode) -> bool {
        self.regex.is_match(&node.full_name) || (self.matches_id && self.regex.is_match(&node.id))
    }
}

/// Filter set built from regular expressions over a node's full name, or
/// its id for `^`-anchored patterns.
///
/// Any matching exclusion wins over any matching inclusion.
#[derive(Debug, Clone, Default)]
pub struct RuleFilterSet {
    include: Vec<Rule>,
    exclude: Vec<Rule>,
}

impl RuleFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for pattern in include {
            set = set.include(pattern.as_ref())?;
        }
        for pattern in exclude {
            set = set.exclude(pattern.as_ref())?;
        }
        Ok(set)
    }

    pub fn include(mut self, pattern: &str) -> Result<Self> {
        self.include.push(Rule::new(pattern)?);
        Ok(self)
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude.push(Rule::new(pattern)?);
        Ok(self)
    }

    fn matches(rules: &[Rule], node: &TestNode) -> bool {
        rules.iter().any(|r| r.is_match(node))
    }
}

impl FilterSet for RuleFilterSet {
    fn evaluate(&self, node: &TestNode) -> FilterSetResult {
        if Self::matches(&self.exclude, node) {
            FilterSetResult::Exclude
        } else if Self::matches(&self.include, node) {
            FilterSetResult::Include
        } else {
            FilterSetResult::Indeterminate
        }
    }

    fn has_inclusion_rules(&self) -> bool {
        !self.include.is_empty()
    }
}
