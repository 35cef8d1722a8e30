//! Immutable reference tables for one run.
//!
//! The store is built once before any extraction and then only read;
//! stages receive it by reference.

use crate::error::PipelineResult;
use crate::loader::{load_reference, PROJECT_ID_COLUMN};
use crate::table::Table;
use crate::types::{
    InvestmentPriorityTheme, ManagementUnit, ProjectServiceEntry, ServiceKey, ServicePair,
    ServiceTarget,
};
use crate::util::{financial_year_label, format_int};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Default)]
pub struct LookupStore {
    management_units: HashMap<String, ManagementUnit>,
    investment_priorities: HashMap<String, Vec<InvestmentPriorityTheme>>,
    service_catalogue: Vec<ServicePair>,
    project_services: HashMap<ServiceKey, ServiceTarget>,
    projects_with_services: HashSet<String>,
}

/// Where the project-services entries of a store came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceCounts {
    pub placeholder: usize,
    pub worksheet: usize,
}

impl LookupStore {
    pub fn new(
        management_units: Vec<ManagementUnit>,
        themes: Vec<InvestmentPriorityTheme>,
        service_catalogue: Vec<ServicePair>,
    ) -> Self {
        let mut investment_priorities: HashMap<String, Vec<InvestmentPriorityTheme>> =
            HashMap::new();
        for theme in themes {
            investment_priorities
                .entry(theme.investment_priority.clone())
                .or_default()
                .push(theme);
        }
        Self {
            management_units: management_units
                .into_iter()
                .map(|mu| (mu.management_unit.clone(), mu))
                .collect(),
            investment_priorities,
            service_catalogue,
            project_services: HashMap::new(),
            projects_with_services: HashSet::new(),
        }
    }

    /// Load the three reference CSVs.
    pub fn load(
        management_units: &Path,
        investment_priority_themes: &Path,
        service_catalogue: &Path,
    ) -> PipelineResult<Self> {
        let (units, _) = load_reference::<ManagementUnit>(management_units)?;
        let (themes, _) = load_reference::<InvestmentPriorityTheme>(investment_priority_themes)?;
        let (catalogue, _) = load_reference::<ServicePair>(service_catalogue)?;
        Ok(Self::new(units, themes, catalogue))
    }

    /// Register project-service entries.
    ///
    /// Placeholder entries go in first; an entry from the targets worksheet
    /// for the same key replaces it. Two worksheet entries for one key keep
    /// the later one.
    pub fn install_project_services(
        &mut self,
        placeholders: Vec<ProjectServiceEntry>,
        worksheet: Vec<ProjectServiceEntry>,
    ) -> ServiceCounts {
        let counts = ServiceCounts {
            placeholder: placeholders.len(),
            worksheet: worksheet.len(),
        };
        for entry in placeholders {
            self.insert_service(entry);
        }
        let mut seen: HashSet<ServiceKey> = HashSet::new();
        for entry in worksheet {
            let key = entry.key();
            if !seen.insert(key.clone()) {
                warn!(
                    "Duplicate service target for {} / {} / {} / {}; keeping the later row",
                    key.merit_project_id, key.service, key.target_measure, key.report_financial_year
                );
            } else if self.project_services.contains_key(&key) {
                debug!(
                    "Service target for {} replaces placeholder ({} / {})",
                    key.merit_project_id, key.target_measure, key.report_financial_year
                );
            }
            self.insert_service(entry);
        }
        info!(
            "Project services catalogue: {} entries ({} placeholder rows, {} worksheet rows)",
            format_int(self.project_services.len()),
            format_int(counts.placeholder),
            format_int(counts.worksheet)
        );
        counts
    }

    fn insert_service(&mut self, entry: ProjectServiceEntry) {
        self.projects_with_services
            .insert(entry.merit_project_id.clone());
        let target = ServiceTarget {
            total_to_be_delivered: entry.total_to_be_delivered,
            fy_target: entry.fy_target,
        };
        self.project_services.insert(entry.key(), target);
    }

    pub fn service_target(&self, key: &ServiceKey) -> Option<ServiceTarget> {
        self.project_services.get(key).copied()
    }

    pub fn has_services(&self, merit_project_id: &str) -> bool {
        self.projects_with_services.contains(merit_project_id)
    }

    pub fn project_service_count(&self) -> usize {
        self.project_services.len()
    }

    pub fn management_unit(&self, name: &str) -> Option<&ManagementUnit> {
        self.management_units.get(name)
    }

    pub fn investment_priority_themes(&self, priority: &str) -> &[InvestmentPriorityTheme] {
        self.investment_priorities
            .get(priority)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn service_catalogue(&self) -> &[ServicePair] {
        &self.service_catalogue
    }
}

/// Melt the `Project services and targets` worksheet into one entry per
/// project, service, target measure and financial year.
///
/// Every `YYYY_YYYY` column is a year; its cell is that year's target.
pub fn melt_service_targets(table: &Table) -> PipelineResult<Vec<ProjectServiceEntry>> {
    let id_col = table.require(PROJECT_ID_COLUMN)?;
    let service_col = table.require("service")?;
    let measure_col = table.require("target_measure")?;
    let total_col = table.require("total_to_be_delivered")?;
    let year_cols: Vec<(usize, String)> = table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| financial_year_label(name).map(|label| (idx, label)))
        .collect();

    let mut out = Vec::with_capacity(table.len() * year_cols.len());
    for row in 0..table.len() {
        let (Some(id), Some(service), Some(measure)) = (
            table.text(row, id_col),
            table.text(row, service_col),
            table.text(row, measure_col),
        ) else {
            continue;
        };
        let total = table.number(row, total_col);
        for (col, year) in &year_cols {
            out.push(ProjectServiceEntry {
                merit_project_id: id.clone(),
                service: service.clone(),
                target_measure: measure.clone(),
                total_to_be_delivered: total,
                report_financial_year: year.clone(),
                fy_target: table.number(row, *col),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn entry(id: &str, measure: &str, fy: &str, total: f64) -> ProjectServiceEntry {
        ProjectServiceEntry {
            merit_project_id: id.into(),
            service: "Community/stakeholder engagement".into(),
            target_measure: measure.into(),
            total_to_be_delivered: Some(total),
            report_financial_year: fy.into(),
            fy_target: Some(total / 2.0),
        }
    }

    #[test]
    fn worksheet_entries_replace_placeholders() {
        let mut store = LookupStore::default();
        let counts = store.install_project_services(
            vec![entry("P1", "Number of field days", "2021/2022", 0.0)],
            vec![entry("P1", "Number of field days", "2021/2022", 8.0)],
        );
        assert_eq!(counts.placeholder, 1);
        assert_eq!(counts.worksheet, 1);
        assert_eq!(store.project_service_count(), 1);
        let target = store
            .service_target(&entry("P1", "Number of field days", "2021/2022", 0.0).key())
            .unwrap();
        assert_eq!(target.total_to_be_delivered, Some(8.0));
        assert!(store.has_services("P1"));
        assert!(!store.has_services("P2"));
    }

    #[test]
    fn themes_are_grouped_by_priority() {
        let store = LookupStore::new(
            vec![ManagementUnit {
                management_unit: "Hunter".into(),
                management_unit_id: Some("MU12".into()),
                management_unit_state: Some("NSW".into()),
            }],
            vec![
                InvestmentPriorityTheme {
                    investment_priority: "Koala".into(),
                    short_term_outcome_indicator_outcome: Some("Threatened Species".into()),
                },
                InvestmentPriorityTheme {
                    investment_priority: "Koala".into(),
                    short_term_outcome_indicator_outcome: Some("Ramsar".into()),
                },
            ],
            vec![],
        );
        assert_eq!(store.investment_priority_themes("Koala").len(), 2);
        assert!(store.investment_priority_themes("Dingo").is_empty());
        assert_eq!(
            store.management_unit("Hunter").unwrap().management_unit_state.as_deref(),
            Some("NSW")
        );
    }

    #[test]
    fn melt_service_targets_emits_one_entry_per_year() {
        let mut table = Table::new(
            "Project services and targets",
            [
                "merit_project_id",
                "service",
                "target_measure",
                "total_to_be_delivered",
                "2020_2021",
                "2021_2022",
                "notes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        table.push_row(vec![
            "P1".into(),
            "Collecting, or synthesising baseline data".into(),
            "Number of baseline data sets collected and/or synthesised".into(),
            4.0.into(),
            1.0.into(),
            Cell::Empty,
            "ignored".into(),
        ]);
        table.push_row(vec![Cell::Empty, "x".into(), "y".into()]);

        let entries = melt_service_targets(&table).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].report_financial_year, "2020/2021");
        assert_eq!(entries[0].fy_target, Some(1.0));
        assert_eq!(entries[1].report_financial_year, "2021/2022");
        assert_eq!(entries[1].fy_target, None);
        assert_eq!(entries[1].total_to_be_delivered, Some(4.0));
    }

    #[test]
    fn melt_service_targets_requires_key_columns() {
        let table = Table::new("Project services and targets", vec!["service".into()]);
        assert!(melt_service_targets(&table).is_err());
    }
}
