/// Registry of lint rules
use crate::error::RegistrationError;
use crate::rules;
use crate::traits::LintRule;
use indexmap::IndexMap;
use std::sync::{Arc, LazyLock};

/// Append-only mapping from rule id to rule.
///
/// Registration order does not matter: the runner sorts findings, so the
/// order rules are evaluated in is not observable.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<&'static str, Arc<dyn LintRule>>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `rules`, failing on the first bad id.
    pub fn with_rules(
        rules: impl IntoIterator<Item = Arc<dyn LintRule>>,
    ) -> Result<Self, RegistrationError> {
        let mut registry = Self::new();
        for rule in rules {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Add a rule. Ids must be unique and follow the `E1234` scheme.
    pub fn register(&mut self, rule: Arc<dyn LintRule>) -> Result<(), RegistrationError> {
        let id = rule.id();
        if !is_valid_rule_id(id) {
            return Err(RegistrationError::InvalidRuleId { id: id.to_string() });
        }
        if self.rules.contains_key(id) {
            return Err(RegistrationError::DuplicateRuleId { id: id.to_string() });
        }
        self.rules.insert(id, rule);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn LintRule>> {
        self.rules.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Rules in registration order
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn LintRule>> {
        self.rules.values()
    }

    /// Every registered id, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.rules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.ids())
            .finish()
    }
}

/// `E`, `W` or `I` followed by exactly four digits.
fn is_valid_rule_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('E' | 'W' | 'I'))
        && id.len() == 5
        && chars.all(|c| c.is_ascii_digit())
}

/// Lazily built registry of the built-in catalog.
/// A duplicate built-in id aborts on first use, before any rule runs.
static BUILTIN_REGISTRY: LazyLock<RuleRegistry> = LazyLock::new(|| {
    match RuleRegistry::with_rules(rules::builtin_rules()) {
        Ok(registry) => registry,
        Err(err) => panic!("built-in rule catalog is invalid: {err}"),
    }
});

/// The registry holding every built-in rule.
#[must_use]
pub fn builtin_registry() -> &'static RuleRegistry {
    &BUILTIN_REGISTRY
}

/// Ids of every built-in rule, sorted
#[must_use]
pub fn all_rule_ids() -> Vec<&'static str> {
    builtin_registry().ids()
}
