use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Reference row: one management unit.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagementUnit {
    pub management_unit: String,
    #[serde(default)]
    pub management_unit_id: Option<String>,
    #[serde(default)]
    pub management_unit_state: Option<String>,
}

/// Reference row: one investment-priority theme.
#[derive(Debug, Clone, Deserialize)]
pub struct InvestmentPriorityTheme {
    #[serde(rename = "investment_priority_derived")]
    pub investment_priority: String,
    #[serde(rename = "short_term_indicator", default)]
    pub short_term_outcome_indicator_outcome: Option<String>,
}

/// A (service, target measure) pair from the project-services catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ServicePair {
    pub service: String,
    pub target_measure: String,
}

/// Join key of the service validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
    pub merit_project_id: String,
    pub service: String,
    pub target_measure: String,
    pub report_financial_year: String,
}

/// A legitimate service target for a project in one financial year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectServiceEntry {
    pub merit_project_id: String,
    pub service: String,
    pub target_measure: String,
    pub total_to_be_delivered: Option<f64>,
    pub report_financial_year: String,
    pub fy_target: Option<f64>,
}

impl ProjectServiceEntry {
    pub fn key(&self) -> ServiceKey {
        ServiceKey {
            merit_project_id: self.merit_project_id.clone(),
            service: self.service.clone(),
            target_measure: self.target_measure.clone(),
            report_financial_year: self.report_financial_year.clone(),
        }
    }
}

/// Project-identifying columns carried on every worksheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFields {
    pub project_id: Option<String>,
    pub merit_project_id: Option<String>,
    pub external_id: Option<String>,
    pub internal_order_number: Option<String>,
    pub work_order_id: Option<String>,
    pub program: Option<String>,
    pub sub_program: Option<String>,
    pub name: Option<String>,
    pub management_unit: Option<String>,
    pub organisation: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub contracted_start_date: Option<String>,
    pub contracted_end_date: Option<String>,
    pub last_modified: Option<String>,
}

/// Activity-report columns carried on every worksheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFields {
    pub site_id: Option<String>,
    pub report_status: Option<String>,
    pub report_financial_year: Option<String>,
    pub stage: Option<String>,
    pub activity_id: Option<String>,
    pub activity_type: Option<String>,
    pub report_from_date: Option<String>,
    pub report_to_date: Option<String>,
}

impl ReportFields {
    pub fn is_approved(&self) -> bool {
        self.report_status.as_deref() == Some(APPROVED)
    }
}

pub const APPROVED: &str = "Approved";

/// The three numeric facts of a line item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Facts {
    pub measured: Option<f64>,
    pub invoiced: Option<f64>,
    pub actual: Option<f64>,
}

impl Facts {
    /// Unapproved reports cannot claim invoiced amounts.
    pub fn suppress_unapproved(&mut self, report: &ReportFields) {
        if !report.is_approved() {
            self.invoiced = Some(0.0);
        }
    }
}

/// A worksheet row mapped onto the canonical schema, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub project: ProjectFields,
    pub report: ReportFields,
    pub service: String,
    pub target_measure: String,
    pub category: Option<String>,
    pub context: Option<String>,
    pub species: Option<String>,
    pub facts: Facts,
}

impl LineItem {
    /// `None` when the row lacks a project id or financial year, which can
    /// never match the catalogue.
    pub fn key(&self) -> Option<ServiceKey> {
        Some(ServiceKey {
            merit_project_id: self.project.merit_project_id.clone()?,
            service: self.service.clone(),
            target_measure: self.target_measure.clone(),
            report_financial_year: self.report.report_financial_year.clone()?,
        })
    }
}

/// Targets a line item inherits from its catalogue entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServiceTarget {
    pub total_to_be_delivered: Option<f64>,
    pub fy_target: Option<f64>,
}

/// Provenance of a fact record: where each output field came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaRecord {
    pub source_sheetname: String,
    pub transform_func: String,
    pub col_measured: String,
    pub col_actual: String,
    pub col_invoiced: String,
    pub col_category: Option<String>,
    pub text_subcategory: Option<String>,
    pub col_context: Option<String>,
    pub col_species: Option<String>,
    pub line_item_object_class: Option<String>,
    pub line_item_property: Option<String>,
    pub line_item_value: Option<String>,
}

/// A validated line item with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRecord {
    pub line: LineItem,
    pub target: ServiceTarget,
    pub grant_or_procurement: String,
    pub meta: MetaRecord,
}

/// Why the validation gate turned a line item away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Row has no project id or no financial year
    IncompleteKey,
    /// Project has no catalogue entries at all
    UnknownProject,
    /// Project exists but not for this service/measure/year
    NoServiceTarget,
}

/// One rejected line item, as written to the rejection ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub source_sheetname: String,
    pub merit_project_id: Option<String>,
    pub service: String,
    pub target_measure: String,
    pub report_financial_year: Option<String>,
    pub reason: RejectReason,
}

/// Final output row; field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReportRow {
    pub project_id: Option<String>,
    pub merit_project_id: Option<String>,
    pub external_id: Option<String>,
    pub internal_order_number: Option<String>,
    pub work_order_id: Option<String>,
    pub organisation: Option<String>,
    pub management_unit: Option<String>,
    pub management_unit_id: Option<String>,
    pub management_unit_state: Option<String>,
    pub project_name: Option<String>,
    pub program: Option<String>,
    pub sub_program: Option<String>,
    pub project_start_date: Option<String>,
    pub project_end_date: Option<String>,
    pub project_contracted_start_date: Option<String>,
    pub project_contracted_end_date: Option<String>,
    pub project_status: Option<String>,

    #[serde(rename = "MERIT_Reports_link")]
    pub merit_reports_link: Option<String>,
    pub report_financial_year: Option<String>,
    pub report_status: Option<String>,
    pub service: String,
    pub target_measure: String,
    pub context: Option<String>,
    pub site_id: Option<String>,
    pub report_last_modified: Option<String>,
    pub category: Option<String>,
    pub report_species: Option<String>,
    pub total_to_be_delivered: Option<f64>,
    pub fy_target: Option<f64>,
    pub measured: Option<f64>,
    pub invoiced: Option<f64>,
    pub actual: Option<f64>,
    pub report_stage: Option<String>,
    pub report_activity_id: Option<String>,
    pub report_activity_type: Option<String>,
    pub report_from_date: Option<String>,
    pub report_to_date: Option<String>,

    pub meta_source_sheetname: String,
    pub meta_col_project_start_date: &'static str,
    pub meta_col_project_end_date: &'static str,
    pub meta_col_project_contracted_start_date: &'static str,
    pub meta_col_project_contracted_end_date: &'static str,
    pub meta_col_project_name: &'static str,

    pub meta_col_measured: String,
    pub meta_col_actual: String,
    pub meta_col_invoiced: String,
    pub meta_col_category: Option<String>,
    pub meta_text_subcategory: Option<String>,
    pub meta_col_context: Option<String>,
    pub meta_col_report_species: Option<String>,
    pub meta_line_item_object_class: Option<String>,
    pub meta_line_item_property: Option<String>,
    pub meta_line_item_value: Option<String>,
    pub meta_col_project_status: &'static str,
    pub meta_col_report_last_modified: &'static str,
    pub meta_col_report_stage: &'static str,
    pub meta_col_report_activity_id: &'static str,
    pub meta_col_report_activity_type: &'static str,
    pub meta_transform_func: String,

    pub version: String,
    pub grant_or_procurement: String,
    pub extract_date: String,
}

/// Project-level fan-out attributes, one row per project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectAttributesRow {
    pub project_id: Option<String>,
    pub merit_project_id: String,
    pub organisation: Option<String>,
    pub management_unit: Option<String>,
    pub management_unit_id: Option<String>,
    pub management_unit_state: Option<String>,
    pub project_name: Option<String>,
    pub program: Option<String>,
    pub sub_program: Option<String>,
    pub project_status: Option<String>,
    pub primary_secondary_outcomes: Option<String>,
    pub primary_outcomes: Option<String>,
    pub secondary_outcomes: Option<String>,
    pub primary_secondary_investment_priorities: Option<String>,
    pub primary_investment_priority: Option<String>,
    pub secondary_investment_priority: Option<String>,
    pub assets: Option<String>,
    pub natural_cultural_assets_managed: Option<String>,
    pub threatened_species: Option<String>,
    pub threatened_ecological_communities: Option<String>,
    pub migratory_species: Option<String>,
    pub ramsar_wetland: Option<String>,
    pub world_heritage_area: Option<String>,
    pub community_awareness_participation_in_nrm: Option<String>,
    pub indigenous_cultural_values: Option<String>,
    pub indigenous_ecological_knowledge: Option<String>,
    pub remnant_vegetation: Option<String>,
    pub aquatic_and_coastal_systems_including_wetlands: Option<String>,
    pub report_species: Option<String>,
    pub epbc: Option<String>,
    pub tec: Option<String>,
    pub ramsar: Option<String>,
    pub version: String,
    pub extract_date: String,
}

/// Per-extraction console and summary line.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ExtractionSummaryRow {
    #[serde(rename = "Worksheet")]
    #[tabled(rename = "Worksheet")]
    pub worksheet: String,
    #[serde(rename = "Transform")]
    #[tabled(rename = "Transform")]
    pub transform_func: String,
    #[serde(rename = "TargetMeasure")]
    #[tabled(rename = "TargetMeasure")]
    pub target_measure: String,
    #[serde(rename = "Kept")]
    #[tabled(rename = "Kept")]
    pub kept: usize,
    #[serde(rename = "Rejected")]
    #[tabled(rename = "Rejected")]
    pub rejected: usize,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub extract_date: String,
    pub project_services: usize,
    pub placeholder_services: usize,
    pub worksheet_services: usize,
    pub fact_records: usize,
    pub rejected_records: usize,
    pub degenerate_rows_dropped: usize,
    pub report_rows: usize,
    pub project_attribute_rows: usize,
    pub extractions: Vec<ExtractionSummaryRow>,
}
