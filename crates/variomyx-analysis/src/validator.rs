//! Step ordering validation.
//!
//! Users may list steps in any order. Some orders cannot work: segregation
//! analysis must see the variants that survive filtering, and a priority-score
//! gate is meaningless without its prioritiser. `validate` repairs the list
//! and logs a warning for every repair; it never fails.
//!
//! Passes run in a fixed sequence, each assuming the ones before it ran:
//!   1. nothing to check → return as given
//!   2. move inheritance-dependent steps to just after the last variant filter
//!   3. drop gates whose prioritiser is absent
//!   4. move each gate to just after its prioritiser
//!   5. stable sort by the step partial order

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{info, warn};
use variomyx_common::PriorityKind;

use crate::step::{kinds, AnalysisStep, StepKind};

/// One repair made to a step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCorrection {
    /// Inheritance-dependent steps moved after the variant filters
    InheritanceStepsMoved { moved: Vec<StepKind> },
    /// Priority-score gate removed for lack of its prioritiser
    OrphanGateRemoved { priority: PriorityKind },
    /// Priority-score gate moved next to its prioritiser
    GateMoved { priority: PriorityKind },
    /// Final partial-order sort changed the list
    Reordered { from: Vec<StepKind>, to: Vec<StepKind> },
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub steps: Vec<AnalysisStep>,
    pub corrections: Vec<StepCorrection>,
}

pub struct StepOrderingValidator;

impl StepOrderingValidator {
    /// Return the steps in a runnable order.
    pub fn validate(steps: Vec<AnalysisStep>) -> Vec<AnalysisStep> {
        Self::check(steps).steps
    }

    /// As [`validate`](Self::validate), also listing the repairs made.
    pub fn check(steps: Vec<AnalysisStep>) -> ValidationReport {
        let mut corrections = Vec::new();

        if !steps.is_empty() && !steps.iter().any(AnalysisStep::is_variant_filter) {
            info!(
                steps = steps.len(),
                "No variant filters specified. Every variant will be considered, so result quality will likely be poor"
            );
        }

        let has_dependent = steps.iter().any(AnalysisStep::is_inheritance_dependent);
        let has_gate = steps.iter().any(|s| s.gated_priority().is_some());
        if !has_dependent && !has_gate {
            return ValidationReport { steps, corrections };
        }

        let steps = if has_dependent {
            place_inheritance_dependent_steps(steps, &mut corrections)
        } else {
            steps
        };
        let steps = remove_orphan_gates(steps, &mut corrections);
        let steps = place_priority_gates(steps, &mut corrections);
        let steps = partial_order_sort(steps, &mut corrections);

        ValidationReport { steps, corrections }
    }
}

// ── Pass 2 ────────────────────────────────────────────────────────────────────

fn place_inheritance_dependent_steps(
    steps: Vec<AnalysisStep>,
    corrections: &mut Vec<StepCorrection>,
) -> Vec<AnalysisStep> {
    let original = kinds(&steps);
    // every step before the first dependent one stays in `main`, so this is
    // also its index there
    let first_dependent = steps
        .iter()
        .position(AnalysisStep::is_inheritance_dependent)
        .unwrap_or(0);

    let (mut dependent, mut main): (Vec<_>, Vec<_>) = steps
        .into_iter()
        .partition(AnalysisStep::is_inheritance_dependent);
    // segregation filter before the OMIM prioritiser, otherwise as given
    dependent.sort_by_key(AnalysisStep::is_omim_prioritiser);

    let insert_at = match main.iter().rposition(AnalysisStep::is_variant_filter) {
        Some(last_variant_filter) => last_variant_filter + 1,
        None => first_dependent.min(main.len()),
    };
    let moved = kinds(&dependent);
    main.splice(insert_at..insert_at, dependent);

    if kinds(&main) != original {
        warn!(
            moved = ?moved,
            "Inheritance-dependent steps must run after all variant filters. Moved them after the last variant filter"
        );
        corrections.push(StepCorrection::InheritanceStepsMoved { moved });
    }
    main
}

// ── Pass 3 ────────────────────────────────────────────────────────────────────

fn remove_orphan_gates(
    mut steps: Vec<AnalysisStep>,
    corrections: &mut Vec<StepCorrection>,
) -> Vec<AnalysisStep> {
    let prioritisers: HashSet<PriorityKind> = steps.iter().filter_map(AnalysisStep::priority_kind).collect();

    steps.retain(|step| match step.gated_priority() {
        Some(priority) if !prioritisers.contains(&priority) => {
            warn!(
                priority = %priority,
                "Priority score filter has no {priority} prioritiser to take scores from and would reject every gene. Removed it"
            );
            corrections.push(StepCorrection::OrphanGateRemoved { priority });
            false
        }
        _ => true,
    });
    steps
}

// ── Pass 4 ────────────────────────────────────────────────────────────────────

fn place_priority_gates(
    steps: Vec<AnalysisStep>,
    corrections: &mut Vec<StepCorrection>,
) -> Vec<AnalysisStep> {
    let original = kinds(&steps);
    let (gates, mut main): (Vec<_>, Vec<_>) = steps
        .into_iter()
        .partition(|s| s.gated_priority().is_some());

    let mut moved = Vec::new();
    for gate in gates {
        let Some(priority) = gate.gated_priority() else {
            main.push(gate);
            continue;
        };
        let Some(anchor) = main.iter().rposition(|s| s.priority_kind() == Some(priority)) else {
            // orphans were removed by pass 3
            main.push(gate);
            continue;
        };
        // after the prioritiser and after gates of the same kind already placed
        let mut at = anchor + 1;
        while at < main.len() && main[at].gated_priority() == Some(priority) {
            at += 1;
        }
        main.insert(at, gate);
        moved.push(priority);
    }

    if kinds(&main) != original {
        for priority in moved {
            warn!(priority = %priority, "Moved priority score filter to run directly after its prioritiser");
            corrections.push(StepCorrection::GateMoved { priority });
        }
    }
    main
}

// ── Pass 5 ────────────────────────────────────────────────────────────────────

/// Strict partial order over steps. Anything not explicitly ordered compares
/// equal, so user order is kept among variant filters and among prioritisers.
pub fn compare_steps(a: &AnalysisStep, b: &AnalysisStep) -> Ordering {
    if a.is_variant_filter() && b.is_inheritance_dependent() {
        return Ordering::Less;
    }
    if a.is_inheritance_dependent() && b.is_variant_filter() {
        return Ordering::Greater;
    }
    if a.is_segregation_filter() && b.is_omim_prioritiser() {
        return Ordering::Less;
    }
    if a.is_omim_prioritiser() && b.is_segregation_filter() {
        return Ordering::Greater;
    }
    if let (Some(p), Some(g)) = (a.priority_kind(), b.gated_priority()) {
        if p == g {
            return Ordering::Less;
        }
    }
    if let (Some(g), Some(p)) = (a.gated_priority(), b.priority_kind()) {
        if p == g {
            return Ordering::Greater;
        }
    }
    Ordering::Equal
}

/// Stable insertion sort under [`compare_steps`]. The relation is not a
/// total order, which `slice::sort_by` requires.
fn partial_order_sort(
    mut steps: Vec<AnalysisStep>,
    corrections: &mut Vec<StepCorrection>,
) -> Vec<AnalysisStep> {
    let before = kinds(&steps);
    for i in 1..steps.len() {
        let mut j = i;
        while j > 0 && compare_steps(&steps[j], &steps[j - 1]) == Ordering::Less {
            steps.swap(j, j - 1);
            j -= 1;
        }
    }

    let after = kinds(&steps);
    if after != before {
        warn!(from = ?before, to = ?after, "Reordered analysis steps to satisfy step dependencies");
        corrections.push(StepCorrection::Reordered { from: before, to: after });
    }
    steps
}
