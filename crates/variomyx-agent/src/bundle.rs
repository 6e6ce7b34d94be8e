//! JSON sample bundles.
//!
//! A bundle carries what a VCF reader, PED parser and annotation databases
//! would otherwise supply: sample names, pedigree, called variants, the
//! known-gene reference list, annotations keyed by variant and gene–disease
//! associations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use variomyx_analysis::priority::{Disease, InMemoryDiseaseSource};
use variomyx_analysis::{InMemoryAnnotationProvider, PartialSample, Sample, SampleDataFactory, VariantStream};
use variomyx_common::{
    FrequencyData, GeneIdentifier, Individual, PathogenicityData, Pedigree, Result, VariantEvaluation,
    VariomyxError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleBundle {
    /// VCF this bundle was exported from; checked against the analysis when set
    #[serde(default)]
    pub vcf: Option<PathBuf>,
    pub sample_names: Vec<String>,
    #[serde(default)]
    pub pedigree: Vec<Individual>,
    #[serde(default)]
    pub known_genes: Vec<GeneIdentifier>,
    #[serde(default)]
    pub variants: Vec<VariantEvaluation>,
    /// Keyed by chr-pos-ref-alt
    #[serde(default)]
    pub frequencies: HashMap<String, FrequencyData>,
    #[serde(default)]
    pub pathogenicities: HashMap<String, PathogenicityData>,
    /// Keyed by Entrez id
    #[serde(default)]
    pub diseases: HashMap<u32, Vec<Disease>>,
}

impl SampleBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VariomyxError::SampleLoad(format!("Cannot read bundle {}: {e}", path.display())))?;
        let bundle: Self = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            samples = bundle.sample_names.len(),
            variants = bundle.variants.len(),
            known_genes = bundle.known_genes.len(),
            "Loaded sample bundle"
        );
        Ok(bundle)
    }

    pub fn annotations(&self) -> InMemoryAnnotationProvider {
        let mut provider = InMemoryAnnotationProvider::new();
        for (key, data) in &self.frequencies {
            provider.insert_frequency(key.clone(), data.clone());
        }
        for (key, data) in &self.pathogenicities {
            provider.insert_pathogenicity(key.clone(), data.clone());
        }
        provider
    }

    pub fn disease_source(&self) -> InMemoryDiseaseSource {
        self.diseases
            .iter()
            .flat_map(|(id, diseases)| diseases.iter().map(move |d| (*id, d.clone())))
            .fold(InMemoryDiseaseSource::new(), |source, (id, disease)| source.with(id, disease))
    }
}

/// Serves a [`SampleBundle`] through the sample factory contract.
pub struct BundleFactory {
    bundle: SampleBundle,
    annotations: InMemoryAnnotationProvider,
}

impl BundleFactory {
    pub fn new(bundle: SampleBundle) -> Self {
        let annotations = bundle.annotations();
        Self { bundle, annotations }
    }

    pub fn annotations(&self) -> &InMemoryAnnotationProvider {
        &self.annotations
    }

    fn check_vcf(&self, vcf_path: &Path) -> Result<()> {
        match &self.bundle.vcf {
            Some(expected) if expected != vcf_path => Err(VariomyxError::SampleLoad(format!(
                "Bundle was exported from {} but the analysis names {}",
                expected.display(),
                vcf_path.display()
            ))),
            _ => Ok(()),
        }
    }

    /// A PED path replaces the bundle's own pedigree.
    fn pedigree(&self, pedigree_path: Option<&Path>) -> Result<Pedigree> {
        let individuals = match pedigree_path {
            Some(path) => {
                debug!(path = %path.display(), "Reading pedigree");
                read_pedigree(path)?
            }
            None => self.bundle.pedigree.clone(),
        };
        if individuals.is_empty() {
            return Ok(Pedigree::empty());
        }
        Pedigree::new(individuals)
    }
}

impl SampleDataFactory for BundleFactory {
    fn create(&self, vcf_path: &Path, pedigree_path: Option<&Path>) -> Result<Sample> {
        self.check_vcf(vcf_path)?;
        let pedigree = self.pedigree(pedigree_path)?;
        let mut variants = self.bundle.variants.clone();
        self.annotations.annotate_all(&mut variants);
        Ok(Sample::new(self.bundle.sample_names.clone(), pedigree, variants))
    }

    fn create_without_variants_or_genes(&self, vcf_path: &Path, pedigree_path: Option<&Path>) -> Result<PartialSample> {
        self.check_vcf(vcf_path)?;
        Ok(PartialSample {
            sample_names: self.bundle.sample_names.clone(),
            pedigree: self.pedigree(pedigree_path)?,
            known_genes: self.bundle.known_genes.clone(),
        })
    }

    fn stream_variants(&self, vcf_path: &Path) -> Result<VariantStream<'_>> {
        self.check_vcf(vcf_path)?;
        Ok(Box::new(self.bundle.variants.iter().cloned()))
    }
}

/// Pedigree files are JSON arrays of individuals.
fn read_pedigree(path: &Path) -> Result<Vec<Individual>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| VariomyxError::Pedigree(format!("Cannot read pedigree {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a `gene_symbol,score` CSV of precomputed prioritiser scores.
pub fn load_score_table(path: &Path) -> Result<HashMap<String, f64>> {
    let content = std::fs::read_to_string(path)?;
    parse_score_table(&content)
}

fn parse_score_table(content: &str) -> Result<HashMap<String, f64>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| VariomyxError::Config(format!("Score table header: {e}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| VariomyxError::Config(format!("Score table is missing a '{name}' column")))
    };
    let symbol_col = column("gene_symbol")?;
    let score_col = column("score")?;

    let mut scores = HashMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| VariomyxError::Config(format!("Score table row {}: {e}", line + 2)))?;
        let symbol = record.get(symbol_col).map(str::trim).unwrap_or_default();
        if symbol.is_empty() {
            continue;
        }
        let score: f64 = record
            .get(score_col)
            .map(str::trim)
            .unwrap_or_default()
            .parse()
            .map_err(|_| VariomyxError::Config(format!("Score table row {}: bad score for {symbol}", line + 2)))?;
        if !(0.0..=1.0).contains(&score) {
            return Err(VariomyxError::Config(format!(
                "Score table row {}: score {score} for {symbol} is outside [0, 1]",
                line + 2
            )));
        }
        scores.insert(symbol.to_string(), score);
    }
    debug!(genes = scores.len(), "Parsed score table");
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use variomyx_analysis::AnnotationProvider;
    use variomyx_common::{AffectedStatus, Contig, Genotype, Sex};

    fn bundle() -> SampleBundle {
        let variant = VariantEvaluation::new(Contig::Autosome(10), 100, "A", "G")
            .with_gene("FGFR2", 2263)
            .with_genotype("proband", Genotype::Het);
        let mut frequencies = HashMap::new();
        frequencies.insert(variant.key(), FrequencyData::empty());
        SampleBundle {
            vcf: Some(PathBuf::from("family.vcf")),
            sample_names: vec!["proband".to_string()],
            pedigree: vec![Individual::new("proband", Sex::Male, AffectedStatus::Affected)],
            known_genes: vec![GeneIdentifier::new("FGFR2", 2263), GeneIdentifier::new("TTN", 7273)],
            variants: vec![variant],
            frequencies,
            ..Default::default()
        }
    }

    #[test]
    fn test_eager_create_attaches_annotations() {
        let factory = BundleFactory::new(bundle());

        let sample = factory.create(Path::new("family.vcf"), None).unwrap();

        assert_eq!(sample.genes().len(), 1);
        let variant = &sample.variants()[0];
        assert_eq!(variant.frequency, Some(FrequencyData::empty()));
        assert_eq!(variant.pathogenicity, Some(PathogenicityData::empty()));
        assert_eq!(factory.annotations().frequency_fetches(), 0);
    }

    #[test]
    fn test_partial_sample_has_no_variants() {
        let factory = BundleFactory::new(bundle());

        let partial = factory
            .create_without_variants_or_genes(Path::new("family.vcf"), None)
            .unwrap();

        assert_eq!(partial.known_genes.len(), 2);
        assert_eq!(partial.pedigree.len(), 1);
    }

    #[test]
    fn test_vcf_mismatch_is_sample_load_error() {
        let factory = BundleFactory::new(bundle());

        let err = factory.create(Path::new("other.vcf"), None).unwrap_err();

        assert!(matches!(err, VariomyxError::SampleLoad(_)));
        assert!(factory.stream_variants(Path::new("other.vcf")).is_err());
    }

    #[test]
    fn test_pedigree_file_replaces_bundle_pedigree() {
        let dir = tempfile::tempdir().unwrap();
        let ped = dir.path().join("family.ped.json");
        let individuals = vec![
            Individual::new("proband", Sex::Female, AffectedStatus::Affected),
            Individual::new("sister", Sex::Female, AffectedStatus::Unaffected),
        ];
        std::fs::write(&ped, serde_json::to_string(&individuals).unwrap()).unwrap();
        let factory = BundleFactory::new(bundle());

        let partial = factory
            .create_without_variants_or_genes(Path::new("family.vcf"), Some(&ped))
            .unwrap();

        assert_eq!(partial.pedigree.len(), 2);
    }

    #[test]
    fn test_missing_pedigree_file_is_pedigree_error() {
        let factory = BundleFactory::new(bundle());

        let err = factory
            .create(Path::new("family.vcf"), Some(Path::new("/nonexistent/family.ped")))
            .unwrap_err();

        assert!(matches!(err, VariomyxError::Pedigree(_)));
    }

    #[test]
    fn test_bundle_annotations_serve_missing_keys_as_empty() {
        let bundle = bundle();
        let provider = bundle.annotations();
        let unknown = VariantEvaluation::new(Contig::X, 5, "C", "T").with_gene("DMD", 1756);

        assert_eq!(provider.fetch_frequency(&unknown), FrequencyData::empty());
        assert_eq!(provider.frequency_fetches(), 1);
    }

    #[test]
    fn test_bundle_json_roundtrip_fields() {
        let json = r#"{
            "sample_names": ["proband"],
            "variants": [{
                "contig": "7", "position": 117559590, "reference": "G", "alternate": "A",
                "gene_symbol": "CFTR", "gene_id": 1080,
                "genotypes": {"proband": "hom_alt"}
            }],
            "diseases": {"1080": [{"id": "OMIM:219700", "name": "Cystic fibrosis", "inheritance": "AUTOSOMAL_RECESSIVE"}]}
        }"#;

        let bundle: SampleBundle = serde_json::from_str(json).unwrap();

        assert_eq!(bundle.variants[0].genotype_of("proband"), Genotype::HomAlt);
        assert!(bundle.pedigree.is_empty());
        let diseases = variomyx_analysis::priority::DiseaseSource::diseases_for(&bundle.disease_source(), 1080);
        assert_eq!(diseases[0].name, "Cystic fibrosis");
    }

    #[test]
    fn test_parse_score_table() {
        let scores = parse_score_table("gene_symbol,score\nFGFR2, 0.9\nCFTR,0.8\n,0.1\n").unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores["FGFR2"], 0.9);
    }

    #[test]
    fn test_score_table_rejects_out_of_range() {
        assert!(parse_score_table("gene_symbol,score\nFGFR2,1.5\n").is_err());
        assert!(parse_score_table("symbol,value\nFGFR2,0.5\n").is_err());
    }

    #[test]
    fn test_load_score_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hiphive.csv");
        std::fs::write(&path, "score,gene_symbol\n0.25,TP53\n").unwrap();

        let scores = load_score_table(&path).unwrap();

        assert_eq!(scores["TP53"], 0.25);
    }
}
