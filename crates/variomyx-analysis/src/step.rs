//! Analysis steps: the closed set of things a pipeline can run.

use std::fmt;
use std::sync::Arc;

use variomyx_common::{FilterKind, PriorityKind};

use crate::filters::{GeneFilter, VariantFilter};
use crate::priority::Prioritiser;

/// Identifier used for ordering decisions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    VariantFilter(FilterKind),
    GeneFilter(FilterKind),
    /// A priority-score gate, identified by the prioritiser it depends on
    PriorityGate(PriorityKind),
    Prioritiser(PriorityKind),
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::VariantFilter(kind) => write!(f, "{kind:?}VariantFilter"),
            StepKind::GeneFilter(kind) => write!(f, "{kind:?}GeneFilter"),
            StepKind::PriorityGate(kind) => write!(f, "PriorityScoreFilter({kind})"),
            StepKind::Prioritiser(kind) => write!(f, "{kind}Prioritiser"),
        }
    }
}

/// One pipeline step. Matching on this enum is exhaustive, so every dispatch
/// site handles every kind of step.
#[derive(Clone)]
pub enum AnalysisStep {
    VariantFilter(Arc<dyn VariantFilter>),
    GeneFilter(Arc<dyn GeneFilter>),
    Prioritiser(Arc<dyn Prioritiser>),
}

impl AnalysisStep {
    pub fn variant_filter(filter: impl VariantFilter + 'static) -> Self {
        AnalysisStep::VariantFilter(Arc::new(filter))
    }

    pub fn gene_filter(filter: impl GeneFilter + 'static) -> Self {
        AnalysisStep::GeneFilter(Arc::new(filter))
    }

    pub fn prioritiser(prioritiser: impl Prioritiser + 'static) -> Self {
        AnalysisStep::Prioritiser(Arc::new(prioritiser))
    }

    pub fn kind(&self) -> StepKind {
        match self {
            AnalysisStep::VariantFilter(f) => StepKind::VariantFilter(f.kind()),
            AnalysisStep::GeneFilter(f) => match f.gated_priority() {
                Some(priority) => StepKind::PriorityGate(priority),
                None => StepKind::GeneFilter(f.kind()),
            },
            AnalysisStep::Prioritiser(p) => StepKind::Prioritiser(p.kind()),
        }
    }

    pub fn is_variant_filter(&self) -> bool {
        matches!(self, AnalysisStep::VariantFilter(_))
    }

    /// The genotype-segregation gene filter.
    pub fn is_segregation_filter(&self) -> bool {
        matches!(self, AnalysisStep::GeneFilter(f) if f.kind() == FilterKind::Inheritance)
    }

    pub fn is_omim_prioritiser(&self) -> bool {
        matches!(self, AnalysisStep::Prioritiser(p) if p.kind() == PriorityKind::Omim)
    }

    /// Needs gene inheritance modes computed before it runs.
    pub fn is_inheritance_dependent(&self) -> bool {
        self.is_segregation_filter() || self.is_omim_prioritiser()
    }

    /// Can run on genes before any variant is loaded.
    pub fn only_requires_genes(&self) -> bool {
        match self {
            AnalysisStep::Prioritiser(_) => true,
            AnalysisStep::GeneFilter(f) => f.gated_priority().is_some(),
            AnalysisStep::VariantFilter(_) => false,
        }
    }

    /// Prioritiser kind, for prioritiser steps.
    pub fn priority_kind(&self) -> Option<PriorityKind> {
        match self {
            AnalysisStep::Prioritiser(p) => Some(p.kind()),
            _ => None,
        }
    }

    /// Prioritiser kind a priority-score gate depends on.
    pub fn gated_priority(&self) -> Option<PriorityKind> {
        match self {
            AnalysisStep::GeneFilter(f) => f.gated_priority(),
            _ => None,
        }
    }

    pub fn as_variant_filter(&self) -> Option<Arc<dyn VariantFilter>> {
        match self {
            AnalysisStep::VariantFilter(f) => Some(Arc::clone(f)),
            _ => None,
        }
    }
}

impl fmt::Debug for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStep::VariantFilter(inner) => f.debug_tuple("VariantFilter").field(inner).finish(),
            AnalysisStep::GeneFilter(inner) => f.debug_tuple("GeneFilter").field(inner).finish(),
            AnalysisStep::Prioritiser(inner) => f.debug_tuple("Prioritiser").field(inner).finish(),
        }
    }
}

/// Step kinds in order, for logging and comparisons.
pub fn kinds(steps: &[AnalysisStep]) -> Vec<StepKind> {
    steps.iter().map(AnalysisStep::kind).collect()
}
