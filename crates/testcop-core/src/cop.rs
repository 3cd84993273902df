use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;

use crate::complaint::Complaint;
use crate::config::{ConfigError, RuleParameters};
use crate::rules::{
    known_rule_names, ProductionIndex, Rule, RuleCorrectTestCase, RuleCorrectTestUnit,
    RuleEveryTestHasProductionClass, RuleSuppressed,
};
use crate::suppression::Suppressions;
use crate::tagger::Tagger;
use crate::types::{Project, TestUnit};

/// Runs every rule over a project.
///
/// Units are checked independently on the rayon pool; the result keeps the
/// order of the project's test units.
pub struct Cop {
    params: RuleParameters,
    suppressions: Suppressions,
    tagger: Option<Arc<dyn Tagger>>,
    excluded: GlobSet,
}

impl Default for Cop {
    fn default() -> Self {
        Self::new(RuleParameters::default(), Suppressions::default())
    }
}

impl Cop {
    pub fn new(params: RuleParameters, suppressions: Suppressions) -> Self {
        Self {
            params,
            suppressions,
            tagger: None,
            excluded: GlobSet::empty(),
        }
    }

    /// Build from configuration values.
    pub fn configured(
        params: RuleParameters,
        exclusions: &[String],
        strict: bool,
        exclude_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        let mut suppressions = Suppressions::new(exclusions);
        if strict {
            suppressions = suppressions.strict(known_rule_names());
        }
        Self::new(params, suppressions).with_exclude_patterns(exclude_patterns)
    }

    /// Enable the model-assisted tense rule.
    pub fn with_tagger(mut self, tagger: Arc<dyn Tagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Skip test units whose path matches any of `patterns`.
    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        self.excluded = builder
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: patterns.join(", "),
                source,
            })?;
        Ok(self)
    }

    /// Every complaint about the project, flattened.
    pub fn check(&self, project: &Project) -> Vec<Complaint> {
        self.per_unit(project).into_iter().flatten().collect()
    }

    /// One class complaint per test unit that has any complaints.
    pub fn check_grouped(&self, project: &Project) -> Vec<Complaint> {
        project
            .test_units()
            .iter()
            .zip(self.per_unit(project))
            .filter(|(_, complaints)| !complaints.is_empty())
            .map(|(unit, complaints)| Complaint::Class {
                unit: unit.to_string(),
                complaints,
            })
            .collect()
    }

    fn per_unit(&self, project: &Project) -> Vec<Vec<Complaint>> {
        let index = ProductionIndex::new(project);
        project
            .test_units()
            .par_iter()
            .map(|unit| {
                if self.excluded.is_match(unit.path()) {
                    tracing::debug!(unit = unit.name(), "excluded by pattern");
                    Vec::new()
                } else {
                    self.check_unit(&index, unit)
                }
            })
            .collect()
    }

    fn check_unit(&self, index: &ProductionIndex<'_>, unit: &TestUnit) -> Vec<Complaint> {
        let unit_suppressed = self.suppressions.for_unit(unit);
        let field_suppressed = unit
            .fields()
            .iter()
            .map(|field| self.suppressions.for_field(unit, field))
            .collect();

        let mut complaints =
            RuleCorrectTestUnit::new(unit, unit_suppressed.clone(), field_suppressed).complaints();

        for case in unit.all() {
            let mut rule = RuleCorrectTestCase::new(
                unit,
                case,
                &self.params,
                self.suppressions.for_case(unit, case),
            );
            if let Some(tagger) = self.tagger.as_deref() {
                rule = rule.with_tagger(tagger);
            }
            complaints.extend(rule.complaints());
        }

        complaints.extend(
            RuleSuppressed::new(
                RuleEveryTestHasProductionClass::new(index, unit),
                unit_suppressed,
            )
            .complaints(),
        );

        tracing::debug!(unit = unit.name(), complaints = complaints.len(), "checked unit");
        complaints
    }
}
