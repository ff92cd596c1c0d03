//! Worker/company directory and assignment construction

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::aggregate::RateResolver;
use crate::company::{fold_text, id_is_unassigned};
use crate::{Assignment, CompanyIdentity, WorkerId};

/// A worker's link to a company (contract or relation)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLink {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

/// Worker as returned by the directory feed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    pub id: WorkerId,
    #[serde(alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contracts: Vec<CompanyLink>,
    #[serde(default)]
    pub relations: Vec<CompanyLink>,
    /// Last-resort company references when no contract or relation exists
    #[serde(default)]
    pub company_names: Vec<String>,
}

impl WorkerRecord {
    /// Company links in priority order: contracts, relations, bare names
    fn links(&self) -> impl Iterator<Item = CompanyLink> + '_ {
        self.contracts
            .iter()
            .chain(&self.relations)
            .cloned()
            .chain(self.company_names.iter().map(|name| CompanyLink {
                company_name: Some(name.clone()),
                ..Default::default()
            }))
    }
}

/// Company-label lookup, normalized once per load
#[derive(Clone, Debug, Default)]
pub struct CompanyDirectory {
    labels: HashMap<String, String>,
}

impl CompanyDirectory {
    pub fn new(labels: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            labels: labels
                .into_iter()
                .filter(|(id, label)| !id_is_unassigned(id) && !label.trim().is_empty())
                .map(|(id, label)| (fold_text(&id), label.trim().to_string()))
                .collect(),
        }
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(&fold_text(id)).map(String::as_str)
    }

    /// Resolve a reference, filling a missing name from the label table
    pub fn resolve(&self, id: Option<&str>, name: Option<&str>) -> CompanyIdentity {
        let has_name = name.is_some_and(|n| !n.trim().is_empty());
        let label = if has_name { None } else { id.and_then(|id| self.label(id)) };
        CompanyIdentity::resolve(id, label.or(name))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One assignment per distinct company of the worker; a worker without any
/// company gets a single assignment to the unassigned sentinel.
pub fn build_assignments(worker: &WorkerRecord, companies: &CompanyDirectory) -> Vec<Assignment> {
    let mut seen = HashSet::new();
    let mut assignments = Vec::new();

    for link in worker.links() {
        let company = companies.resolve(link.company_id.as_deref(), link.company_name.as_deref());
        if seen.insert(company.id_key()) && seen.insert(company.name_key()) {
            assignments.push(Assignment::new(&worker.id, &worker.name, company));
        }
    }
    if assignments.is_empty() {
        assignments.push(Assignment::new(&worker.id, &worker.name, CompanyIdentity::unassigned()));
    }
    debug!(worker_id = %worker.id, assignments = assignments.len(), "built assignments");
    assignments
}

pub fn build_all_assignments(workers: &[WorkerRecord], companies: &CompanyDirectory) -> Vec<Assignment> {
    workers
        .iter()
        .flat_map(|w| build_assignments(w, companies))
        .collect()
}

/// Hourly rates as stored on each worker's contracts and relations
#[derive(Clone, Debug, Default)]
pub struct DirectoryRates {
    rates: HashMap<WorkerId, Vec<(CompanyIdentity, f64)>>,
}

impl DirectoryRates {
    pub fn new(workers: &[WorkerRecord], companies: &CompanyDirectory) -> Self {
        let rates = workers
            .iter()
            .map(|worker| {
                let known = worker
                    .contracts
                    .iter()
                    .chain(&worker.relations)
                    .filter_map(|link| {
                        let rate = link.hourly_rate?.to_f64()?;
                        let company = companies.resolve(link.company_id.as_deref(), link.company_name.as_deref());
                        Some((company, rate))
                    })
                    .collect();
                (worker.id.clone(), known)
            })
            .collect();
        Self { rates }
    }
}

impl RateResolver for DirectoryRates {
    fn hourly_rate(&self, worker_id: &str, company: &CompanyIdentity) -> Option<f64> {
        let known = self.rates.get(worker_id)?;
        known
            .iter()
            .find(|(c, _)| c.id_key() == company.id_key())
            .or_else(|| known.iter().find(|(c, _)| c.name_key() == company.name_key()))
            .map(|(_, rate)| *rate)
    }
}
