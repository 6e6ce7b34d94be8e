//! Segregation analysis: which Mendelian modes a gene's passing variants
//! are consistent with, given the family.
//!
//! A mode is kept unless the genotypes contradict it. A no-call never
//! contradicts a mode, but each mode needs at least one affected individual
//! with a qualifying call.

use std::collections::BTreeSet;

use tracing::{debug, info};
use variomyx_common::{Gene, Genotype, Individual, InheritanceMode, Pedigree, VariantEvaluation};

pub struct InheritanceAnalyzer<'a> {
    pedigree: &'a Pedigree,
}

impl<'a> InheritanceAnalyzer<'a> {
    pub fn new(pedigree: &'a Pedigree) -> Self {
        Self { pedigree }
    }

    /// Modes compatible with the gene's currently passing variants. A gene
    /// without passing variants is compatible with nothing; a pedigree
    /// without affected individuals constrains nothing.
    pub fn analyse(&self, gene: &Gene, variants: &[VariantEvaluation]) -> BTreeSet<InheritanceMode> {
        let passing: Vec<&VariantEvaluation> = gene.passed_variants(variants).map(|(_, v)| v).collect();
        if passing.is_empty() {
            return BTreeSet::new();
        }
        if self.pedigree.is_empty() || !self.pedigree.has_affected() {
            return InheritanceMode::CANDIDATES.into_iter().collect();
        }

        InheritanceMode::CANDIDATES
            .into_iter()
            .filter(|&mode| self.is_compatible(mode, &passing))
            .collect()
    }

    /// Compute and store modes for every gene that still passes its filters.
    /// Returns how many genes were analysed.
    pub fn analyse_genes(&self, genes: &mut [Gene], variants: &[VariantEvaluation]) -> usize {
        let mut analysed = 0;
        for gene in genes.iter_mut() {
            if !gene.passed_filters(variants) {
                continue;
            }
            let modes = self.analyse(gene, variants);
            debug!(gene = %gene.symbol, modes = ?modes, "Inheritance modes computed");
            gene.set_compatible_modes(modes);
            analysed += 1;
        }
        info!(genes = analysed, pedigree_size = self.pedigree.len(), "Segregation analysis complete");
        analysed
    }

    fn is_compatible(&self, mode: InheritanceMode, passing: &[&VariantEvaluation]) -> bool {
        match mode {
            InheritanceMode::AutosomalDominant => passing
                .iter()
                .any(|v| v.contig.is_autosome() && self.segregates_dominant(v)),
            InheritanceMode::AutosomalRecessive => {
                let autosomal: Vec<&VariantEvaluation> =
                    passing.iter().copied().filter(|v| v.contig.is_autosome()).collect();
                autosomal.iter().any(|v| self.segregates_homozygous(v)) || self.has_compound_het(&autosomal)
            }
            InheritanceMode::XDominant => passing
                .iter()
                .any(|v| v.contig.is_x() && self.segregates_dominant(v)),
            InheritanceMode::XRecessive => passing
                .iter()
                .any(|v| v.contig.is_x() && self.segregates_x_recessive(v)),
            InheritanceMode::Mitochondrial => passing
                .iter()
                .any(|v| v.contig.is_mitochondrial() && self.segregates_maternal(v)),
            InheritanceMode::Any => true,
        }
    }

    /// Every affected individual is heterozygous, no unaffected one carries it.
    fn segregates_dominant(&self, v: &VariantEvaluation) -> bool {
        let affected_ok = self.pedigree.affected().all(|ind| {
            matches!(v.genotype_of(&ind.id), Genotype::Het | Genotype::NoCall)
        });
        affected_ok
            && self.any_affected(|ind| v.genotype_of(&ind.id) == Genotype::Het)
            && self.pedigree.unaffected().all(|ind| !v.genotype_of(&ind.id).carries_alt())
    }

    fn segregates_homozygous(&self, v: &VariantEvaluation) -> bool {
        let affected_ok = self.pedigree.affected().all(|ind| {
            matches!(v.genotype_of(&ind.id), Genotype::HomAlt | Genotype::NoCall)
        });
        affected_ok
            && self.any_affected(|ind| v.genotype_of(&ind.id) == Genotype::HomAlt)
            && self.pedigree.unaffected().all(|ind| v.genotype_of(&ind.id) != Genotype::HomAlt)
            && self.pedigree.affected().all(|ind| {
                self.parents(ind)
                    .all(|parent| v.genotype_of(&parent.id) != Genotype::HomRef)
            })
    }

    /// Two heterozygous variants in trans in every affected individual.
    fn has_compound_het(&self, autosomal: &[&VariantEvaluation]) -> bool {
        for (i, first) in autosomal.iter().enumerate() {
            for second in &autosomal[i + 1..] {
                if self.segregates_compound_het(first, second) {
                    return true;
                }
            }
        }
        false
    }

    fn segregates_compound_het(&self, a: &VariantEvaluation, b: &VariantEvaluation) -> bool {
        let het_or_missing = |v: &VariantEvaluation, id: &str| matches!(v.genotype_of(id), Genotype::Het | Genotype::NoCall);

        let affected_ok = self
            .pedigree
            .affected()
            .all(|ind| het_or_missing(a, &ind.id) && het_or_missing(b, &ind.id));
        let called = self.any_affected(|ind| {
            a.genotype_of(&ind.id) == Genotype::Het && b.genotype_of(&ind.id) == Genotype::Het
        });
        let unaffected_ok = self.pedigree.unaffected().all(|ind| {
            !(a.genotype_of(&ind.id).carries_alt() && b.genotype_of(&ind.id).carries_alt())
        });
        affected_ok && called && unaffected_ok && self.pedigree.affected().all(|ind| self.in_trans(ind, a, b))
    }

    /// One allele from each parent. Holds trivially when either parent is
    /// missing from the pedigree or uncalled at either site.
    fn in_trans(&self, ind: &Individual, a: &VariantEvaluation, b: &VariantEvaluation) -> bool {
        let (Some(father), Some(mother)) = (self.pedigree.father_of(ind), self.pedigree.mother_of(ind)) else {
            return true;
        };
        let calls = [
            a.genotype_of(&father.id),
            b.genotype_of(&father.id),
            a.genotype_of(&mother.id),
            b.genotype_of(&mother.id),
        ];
        if calls.iter().any(Genotype::is_no_call) {
            return true;
        }
        let [fa, fb, ma, mb] = calls.map(|gt| gt.carries_alt());
        (fa && !fb && mb && !ma) || (fb && !fa && ma && !mb)
    }

    /// Affected males carry the allele, affected females are homozygous.
    /// Unaffected males do not carry it, unaffected females are not homozygous.
    /// Individuals of unknown sex are treated as female.
    fn segregates_x_recessive(&self, v: &VariantEvaluation) -> bool {
        let qualifies = |ind: &Individual| {
            let gt = v.genotype_of(&ind.id);
            if ind.is_male() { gt.carries_alt() } else { gt == Genotype::HomAlt }
        };
        let affected_ok = self
            .pedigree
            .affected()
            .all(|ind| v.genotype_of(&ind.id).is_no_call() || qualifies(ind));
        let unaffected_ok = self.pedigree.unaffected().all(|ind| {
            let gt = v.genotype_of(&ind.id);
            if ind.is_male() { !gt.carries_alt() } else { gt != Genotype::HomAlt }
        });
        affected_ok && self.any_affected(qualifies) && unaffected_ok
    }

    /// Affected individuals carry the allele and their mothers are not
    /// homozygous reference. Unaffected relatives may be heteroplasmic.
    fn segregates_maternal(&self, v: &VariantEvaluation) -> bool {
        let affected_ok = self.pedigree.affected().all(|ind| {
            let gt = v.genotype_of(&ind.id);
            gt.is_no_call() || gt.carries_alt()
        });
        let mothers_ok = self.pedigree.affected().all(|ind| {
            self.pedigree
                .mother_of(ind)
                .map_or(true, |mother| v.genotype_of(&mother.id) != Genotype::HomRef)
        });
        affected_ok
            && mothers_ok
            && self.any_affected(|ind| v.genotype_of(&ind.id).carries_alt())
            && self.pedigree.unaffected().all(|ind| v.genotype_of(&ind.id) != Genotype::HomAlt)
    }

    fn any_affected(&self, pred: impl Fn(&Individual) -> bool) -> bool {
        self.pedigree.affected().any(|ind| pred(ind))
    }

    fn parents(&self, ind: &Individual) -> impl Iterator<Item = &'a Individual> + 'a {
        let pedigree = self.pedigree;
        pedigree.father_of(ind).into_iter().chain(pedigree.mother_of(ind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use variomyx_common::{FilterKind, FilterResult, Sex};
    use variomyx_test_utils::{genes_from, genotyped, mt_variant, trio, variant, x_variant, FATHER, MOTHER, PROBAND};

    use variomyx_common::Genotype::{Het, HomAlt, HomRef, NoCall};
    use variomyx_common::InheritanceMode::{
        AutosomalDominant, AutosomalRecessive, Mitochondrial, XDominant, XRecessive,
    };

    fn modes(pedigree: &Pedigree, variants: &[VariantEvaluation]) -> BTreeSet<InheritanceMode> {
        let genes = genes_from(variants);
        InheritanceAnalyzer::new(pedigree).analyse(&genes[0], variants)
    }

    fn trio_call(v: VariantEvaluation, proband: Genotype, father: Genotype, mother: Genotype) -> VariantEvaluation {
        genotyped(v, &[(PROBAND, proband), (FATHER, father), (MOTHER, mother)])
    }

    #[test]
    fn test_empty_pedigree_compatible_with_every_mode() {
        let variants = vec![genotyped(variant("FGFR2", 2263, 100), &[(PROBAND, Het)])];
        let modes = modes(&Pedigree::empty(), &variants);
        assert_eq!(modes, InheritanceMode::CANDIDATES.into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_no_passing_variants_compatible_with_nothing() {
        let mut v = trio_call(variant("FGFR2", 2263, 100), Het, HomRef, HomRef);
        v.record_filter_result(FilterResult::fail(FilterKind::Frequency, 0.0));
        assert!(modes(&trio(Sex::Female), &[v]).is_empty());
    }

    #[test]
    fn test_de_novo_het_is_dominant() {
        let variants = vec![trio_call(variant("FGFR2", 2263, 100), Het, HomRef, HomRef)];
        assert_eq!(modes(&trio(Sex::Female), &variants), BTreeSet::from([AutosomalDominant]));
    }

    #[test]
    fn test_het_shared_with_unaffected_parent_is_not_dominant() {
        let variants = vec![trio_call(variant("FGFR2", 2263, 100), Het, Het, HomRef)];
        assert!(modes(&trio(Sex::Female), &variants).is_empty());
    }

    #[test]
    fn test_homozygous_with_carrier_parents_is_recessive() {
        let variants = vec![trio_call(variant("CFTR", 1080, 100), HomAlt, Het, Het)];
        assert_eq!(modes(&trio(Sex::Male), &variants), BTreeSet::from([AutosomalRecessive]));
    }

    #[test]
    fn test_homozygous_with_reference_parent_is_not_recessive() {
        let variants = vec![trio_call(variant("CFTR", 1080, 100), HomAlt, Het, HomRef)];
        assert!(!modes(&trio(Sex::Male), &variants).contains(&AutosomalRecessive));
    }

    #[test]
    fn test_compound_het_in_trans() {
        let variants = vec![
            trio_call(variant("CFTR", 1080, 100), Het, Het, HomRef),
            trio_call(variant("CFTR", 1080, 200), Het, HomRef, Het),
        ];
        let modes = modes(&trio(Sex::Female), &variants);
        assert!(modes.contains(&AutosomalRecessive));
        assert!(!modes.contains(&AutosomalDominant));
    }

    #[test]
    fn test_compound_het_in_cis_rejected() {
        let variants = vec![
            trio_call(variant("CFTR", 1080, 100), Het, Het, HomRef),
            trio_call(variant("CFTR", 1080, 200), Het, Het, HomRef),
        ];
        assert!(!modes(&trio(Sex::Female), &variants).contains(&AutosomalRecessive));
    }

    #[test]
    fn test_compound_het_with_uncalled_parents_accepted() {
        let variants = vec![
            trio_call(variant("CFTR", 1080, 100), Het, NoCall, NoCall),
            trio_call(variant("CFTR", 1080, 200), Het, NoCall, NoCall),
        ];
        assert!(modes(&trio(Sex::Female), &variants).contains(&AutosomalRecessive));
    }

    #[test]
    fn test_hemizygous_male_from_carrier_mother_is_x_recessive() {
        let variants = vec![trio_call(x_variant("DMD", 1756, 100), HomAlt, HomRef, Het)];
        assert_eq!(modes(&trio(Sex::Male), &variants), BTreeSet::from([XRecessive]));
    }

    #[test]
    fn test_het_female_is_x_dominant_not_recessive() {
        let variants = vec![trio_call(x_variant("PCDH19", 57526, 100), Het, HomRef, HomRef)];
        assert_eq!(modes(&trio(Sex::Female), &variants), BTreeSet::from([XDominant]));
    }

    #[test]
    fn test_mitochondrial_needs_carrier_mother() {
        let inherited = vec![trio_call(mt_variant("MT-ND4", 4538, 11778), HomAlt, HomRef, Het)];
        assert_eq!(modes(&trio(Sex::Male), &inherited), BTreeSet::from([Mitochondrial]));

        let reference_mother = vec![trio_call(mt_variant("MT-ND4", 4538, 11778), HomAlt, HomRef, HomRef)];
        assert!(modes(&trio(Sex::Male), &reference_mother).is_empty());
    }

    #[test]
    fn test_all_no_calls_support_nothing() {
        let variants = vec![trio_call(variant("FGFR2", 2263, 100), NoCall, NoCall, NoCall)];
        assert!(modes(&trio(Sex::Female), &variants).is_empty());
    }

    #[test]
    fn test_analyse_genes_skips_failed_genes() {
        let passing = trio_call(variant("FGFR2", 2263, 100), Het, HomRef, HomRef);
        let mut failing = trio_call(variant("TP53", 7157, 100), Het, HomRef, HomRef);
        failing.record_filter_result(FilterResult::fail(FilterKind::Quality, 0.0));
        let variants = vec![passing, failing];
        let mut genes = genes_from(&variants);
        let pedigree = trio(Sex::Female);

        let analysed = InheritanceAnalyzer::new(&pedigree).analyse_genes(&mut genes, &variants);

        assert_eq!(analysed, 1);
        assert!(genes[0].is_compatible_with(AutosomalDominant));
        assert!(genes[1].compatible_modes().is_empty());
    }
}
