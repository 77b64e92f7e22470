//! Inference rules for rule-guided chaining.

use crate::atom::AtomKind;
use crate::error::ValidationError;
use crate::pattern::Pattern;
use crate::pln::formula::Formula;

/// A registered inference rule.
///
/// Rules are immutable once built. A rule fires when every premise pattern
/// has at least one match in the store; the first match of each premise is
/// bound, in premise order.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    premises: Vec<Pattern>,
    conclusion: Pattern,
    conclusion_kind: AtomKind,
    formula: Option<Formula>,
    weight: f32,
}

impl Rule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(name)
    }

    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Premise patterns, in binding order.
    #[must_use]
    pub fn premises(&self) -> &[Pattern] {
        &self.premises
    }

    /// Conclusion pattern.
    #[must_use]
    pub fn conclusion(&self) -> &Pattern {
        &self.conclusion
    }

    /// Kind of the atom the rule creates.
    #[must_use]
    pub fn conclusion_kind(&self) -> AtomKind {
        self.conclusion_kind
    }

    /// Formula for the conclusion's truth value, if one was attached.
    #[must_use]
    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    /// Static weight used for prioritisation.
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// `weight / (1 + complexity)`.
    #[must_use]
    pub fn priority(&self, complexity: f32) -> f32 {
        self.weight / (1.0 + complexity)
    }

    /// True when the conclusion should be built as a link over the bound
    /// premises rather than as a node.
    #[must_use]
    pub fn concludes_link(&self) -> bool {
        self.conclusion.children.len() >= 2 && self.premises.len() >= 2
    }
}

/// Builder for [`Rule`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    name: String,
    premises: Vec<Pattern>,
    conclusion: Option<Pattern>,
    formula: Option<Formula>,
    weight: f32,
}

impl RuleBuilder {
    /// Creates a builder with weight 1.0 and no formula.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            premises: Vec::new(),
            conclusion: None,
            formula: None,
            weight: 1.0,
        }
    }

    /// Appends a premise pattern.
    #[must_use]
    pub fn premise(mut self, pattern: Pattern) -> Self {
        self.premises.push(pattern);
        self
    }

    /// Sets the conclusion pattern.
    #[must_use]
    pub fn conclusion(mut self, pattern: Pattern) -> Self {
        self.conclusion = Some(pattern);
        self
    }

    /// Attaches a truth formula.
    #[must_use]
    pub fn formula(mut self, formula: Formula) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Sets the weight.
    #[must_use]
    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// - `MissingField` without a conclusion.
    /// - `NoPremises` without premises.
    /// - `UnspecifiedConclusionKind` if the conclusion has no kind or is a wildcard.
    /// - `NonFiniteWeight` for NaN or infinite weights.
    pub fn build(self) -> Result<Rule, ValidationError> {
        let conclusion = self.conclusion.ok_or(ValidationError::MissingField {
            field: "conclusion".to_string(),
        })?;

        if self.premises.is_empty() {
            return Err(ValidationError::NoPremises { rule: self.name });
        }
        let conclusion_kind = match conclusion.kind {
            Some(kind) if !conclusion.wildcard => kind,
            _ => return Err(ValidationError::UnspecifiedConclusionKind { rule: self.name }),
        };
        if !self.weight.is_finite() {
            return Err(ValidationError::NonFiniteWeight {
                rule: self.name,
                weight: self.weight,
            });
        }

        Ok(Rule {
            name: self.name,
            premises: self.premises,
            conclusion,
            conclusion_kind,
            formula: self.formula,
            weight: self.weight,
        })
    }
}
