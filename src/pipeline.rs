//! One batch run: load, extract, validate, assemble.

use crate::assemble::{assemble_project_attributes, assemble_project_reports, Stamp};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::extract;
use crate::fanout::{build_fan_out, FanOutSources};
use crate::fields::ProjectColumns;
use crate::loader::{load_mult_wbooks, read_sheet, ACTIVITY_HEADER_ROW};
use crate::lookup::{melt_service_targets, LookupStore, ServiceCounts};
use crate::pairing::ids_by_df;
use crate::plan::{default_plan, SheetPlan, WorkbookSet};
use crate::table::Table;
use crate::types::{
    ExtractionSummaryRow, FactRecord, ProjectAttributesRow, ProjectReportRow, Rejection,
    RunSummary,
};
use crate::util::format_int;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;

const PROJECTS_SHEET: &str = "Projects";
const SERVICES_SHEET: &str = "Project services and targets";
const OUTCOMES_SHEET: &str = "RLP Outcomes";
const ASSETS_SHEET: &str = "MERI_Project Assets";
const MERI_OUTCOMES_SHEET: &str = "MERI_Outcomes";

/// Everything a run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub reports: Vec<ProjectReportRow>,
    pub attributes: Vec<ProjectAttributesRow>,
    pub rejections: Vec<Rejection>,
    pub summary: RunSummary,
}

#[derive(Debug, Default)]
struct PlanOutcome {
    records: Vec<FactRecord>,
    rejections: Vec<Rejection>,
    extractions: Vec<ExtractionSummaryRow>,
}

fn load_lookups(config: &PipelineConfig) -> PipelineResult<LookupStore> {
    let refs = &config.reference;
    LookupStore::load(
        &config.reference_path(&refs.management_units),
        &config.reference_path(&refs.investment_priority_themes),
        &config.reference_path(&refs.project_services_catalogue),
    )
}

/// Placeholder rows for the configured cohort plus the melted targets
/// worksheet, installed into the store.
fn install_services(
    lookups: &mut LookupStore,
    projects: &Table,
    services: &Table,
    config: &PipelineConfig,
) -> PipelineResult<ServiceCounts> {
    let cols = ProjectColumns::lenient(projects)?;
    let cohort: Vec<String> = (0..projects.len())
        .map(|row| cols.read(projects, row))
        .filter(|p| p.sub_program.as_deref() == Some(config.placeholder_sub_program.as_str()))
        .filter_map(|p| p.merit_project_id)
        .collect();
    info!(
        "{} projects in the '{}' placeholder cohort",
        format_int(cohort.len()),
        config.placeholder_sub_program
    );

    let placeholders = config
        .financial_years
        .iter()
        .flat_map(|year| ids_by_df(&cohort, lookups.service_catalogue(), year))
        .collect();
    let worksheet = melt_service_targets(services)?;
    Ok(lookups.install_project_services(placeholders, worksheet))
}

fn workbook_paths(config: &PipelineConfig, set: WorkbookSet) -> Vec<PathBuf> {
    let prefixes = match set {
        WorkbookSet::OutputReports => &config.output_report_workbooks,
        WorkbookSet::FinalReports => &config.final_report_workbooks,
    };
    prefixes.iter().map(|p| config.workbook_path(p)).collect()
}

/// Every workbook the run will open must exist before anything is read.
fn check_workbooks(plan: &[SheetPlan], config: &PipelineConfig) -> PipelineResult<()> {
    let mut paths = BTreeSet::new();
    paths.insert(config.workbook_path(&config.project_workbook));
    for sheet in plan {
        paths.extend(workbook_paths(config, sheet.workbooks));
    }
    match paths.iter().find(|p| !p.is_file()) {
        Some(missing) => Err(PipelineError::source_load(
            missing.display().to_string(),
            "workbook not found",
        )),
        None => Ok(()),
    }
}

fn run_plan(
    plan: &[SheetPlan],
    config: &PipelineConfig,
    lookups: &LookupStore,
) -> PipelineResult<PlanOutcome> {
    let mut out = PlanOutcome::default();
    for sheet in plan {
        let table = load_mult_wbooks(
            &workbook_paths(config, sheet.workbooks),
            sheet.sheet,
            ACTIVITY_HEADER_ROW,
        )?;
        if table.is_empty() {
            warn!("Worksheet '{}' has no rows", sheet.sheet);
        }
        for spec in &sheet.extractions {
            let result = extract(&table, spec, lookups, &config.grant_or_procurement)?;
            out.extractions.push(ExtractionSummaryRow {
                worksheet: spec.worksheet.clone(),
                transform_func: spec.shape().transform_func(),
                target_measure: spec.target_measure.clone(),
                kept: result.records.len(),
                rejected: result.rejected.len(),
            });
            out.records.extend(result.records);
            out.rejections.extend(result.rejected);
        }
    }
    info!(
        "Extracted {} fact records, {} rejected by the service join",
        format_int(out.records.len()),
        format_int(out.rejections.len())
    );
    Ok(out)
}

/// Run the standard extraction plan.
pub fn run(config: &PipelineConfig) -> PipelineResult<RunOutput> {
    run_with_plan(config, &default_plan())
}

pub fn run_with_plan(config: &PipelineConfig, plan: &[SheetPlan]) -> PipelineResult<RunOutput> {
    let stamp = Stamp {
        version: config.version.clone(),
        extract_date: config.extract_date().format("%Y-%m-%d").to_string(),
        report_link_base: config.report_link_base.clone(),
    };
    info!("Extract {} (version {})", stamp.extract_date, stamp.version);
    check_workbooks(plan, config)?;

    let mut lookups = load_lookups(config)?;
    let project_book = config.workbook_path(&config.project_workbook);
    let projects = read_sheet(&project_book, PROJECTS_SHEET, 0)?;
    let services = read_sheet(&project_book, SERVICES_SHEET, 0)?;
    let counts = install_services(&mut lookups, &projects, &services, config)?;

    let extracted = run_plan(plan, config, &lookups)?;
    let assembled = assemble_project_reports(&extracted.records, &lookups, &stamp);

    let outcomes = read_sheet(&project_book, OUTCOMES_SHEET, 0)?;
    let assets = read_sheet(&project_book, ASSETS_SHEET, 0)?;
    let meri_outcomes = read_sheet(&project_book, MERI_OUTCOMES_SHEET, 0)?;
    let sources = FanOutSources {
        outcomes: &outcomes,
        assets: &assets,
        meri_outcomes: &meri_outcomes,
    };
    let fan = build_fan_out(&sources, &extracted.records, &lookups)?;
    let attributes = assemble_project_attributes(&projects, &fan, &lookups, &stamp)?;
    info!("Built {} project attribute rows", format_int(attributes.len()));

    let summary = RunSummary {
        version: stamp.version,
        extract_date: stamp.extract_date,
        project_services: lookups.project_service_count(),
        placeholder_services: counts.placeholder,
        worksheet_services: counts.worksheet,
        fact_records: extracted.records.len(),
        rejected_records: extracted.rejections.len(),
        degenerate_rows_dropped: assembled.dropped,
        report_rows: assembled.rows.len(),
        project_attribute_rows: attributes.len(),
        extractions: extracted.extractions,
    };
    Ok(RunOutput {
        reports: assembled.rows,
        attributes,
        rejections: extracted.rejections,
        summary,
    })
}
