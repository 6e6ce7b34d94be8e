//! Family structure for segregation analysis.
//!
//! A pedigree is immutable for the length of a run and is passed explicitly to
//! everything that needs it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VariomyxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AffectedStatus {
    Affected,
    Unaffected,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    #[serde(default)]
    pub father_id: Option<String>,
    #[serde(default)]
    pub mother_id: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub status: AffectedStatus,
}

impl Individual {
    pub fn new(id: &str, sex: Sex, status: AffectedStatus) -> Self {
        Self {
            id: id.to_string(),
            father_id: None,
            mother_id: None,
            sex,
            status,
        }
    }

    pub fn with_parents(mut self, father_id: &str, mother_id: &str) -> Self {
        self.father_id = Some(father_id.to_string());
        self.mother_id = Some(mother_id.to_string());
        self
    }

    pub fn is_affected(&self) -> bool {
        self.status == AffectedStatus::Affected
    }

    pub fn is_unaffected(&self) -> bool {
        self.status == AffectedStatus::Unaffected
    }

    pub fn is_male(&self) -> bool {
        self.sex == Sex::Male
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pedigree {
    individuals: Vec<Individual>,
}

impl Pedigree {
    /// The pedigree of a single, unphenotyped sample.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a pedigree, rejecting duplicate ids and parents of the wrong sex.
    pub fn new(individuals: Vec<Individual>) -> Result<Self> {
        let mut seen = HashSet::new();
        for ind in &individuals {
            if !seen.insert(ind.id.as_str()) {
                return Err(VariomyxError::Pedigree(format!("Duplicate individual id: {}", ind.id)));
            }
        }

        let pedigree = Self { individuals };
        for ind in &pedigree.individuals {
            if let Some(father) = ind.father_id.as_deref().and_then(|id| pedigree.individual(id)) {
                if father.sex == Sex::Female {
                    return Err(VariomyxError::Pedigree(format!(
                        "Father {} of {} is recorded as female",
                        father.id, ind.id
                    )));
                }
            }
            if let Some(mother) = ind.mother_id.as_deref().and_then(|id| pedigree.individual(id)) {
                if mother.sex == Sex::Male {
                    return Err(VariomyxError::Pedigree(format!(
                        "Mother {} of {} is recorded as male",
                        mother.id, ind.id
                    )));
                }
            }
        }
        Ok(pedigree)
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individual(&self, id: &str) -> Option<&Individual> {
        self.individuals.iter().find(|i| i.id == id)
    }

    pub fn affected(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter().filter(|i| i.is_affected())
    }

    pub fn has_affected(&self) -> bool {
        self.individuals.iter().any(Individual::is_affected)
    }

    pub fn unaffected(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter().filter(|i| i.is_unaffected())
    }

    pub fn father_of(&self, ind: &Individual) -> Option<&Individual> {
        ind.father_id.as_deref().and_then(|id| self.individual(id))
    }

    pub fn mother_of(&self, ind: &Individual) -> Option<&Individual> {
        ind.mother_id.as_deref().and_then(|id| self.individual(id))
    }

    /// Check the pedigree can describe the samples genotyped in the VCF.
    /// A multi-sample VCF needs a pedigree naming every sample.
    pub fn check_sample_names(&self, sample_names: &[String]) -> Result<()> {
        if self.is_empty() {
            if sample_names.len() > 1 {
                return Err(VariomyxError::Pedigree(format!(
                    "VCF declares {} samples but no pedigree was supplied",
                    sample_names.len()
                )));
            }
            return Ok(());
        }

        let missing: Vec<&str> = sample_names
            .iter()
            .filter(|name| self.individual(name).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(VariomyxError::Pedigree(format!(
                "Samples missing from pedigree: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
