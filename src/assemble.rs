//! Final assembly of the `ProjectReport` table and the project attribute
//! table.

use crate::error::PipelineResult;
use crate::fanout::FanOut;
use crate::fields::{ProjectColumns, LAST_MODIFIED_COLUMN};
use crate::lookup::LookupStore;
use crate::pairing::TARGET_MISSING;
use crate::table::Table;
use crate::types::{Facts, FactRecord, ProjectAttributesRow, ProjectReportRow};
use crate::util::format_int;
use log::info;
use std::collections::HashSet;

const COL_STATUS: &str = "status";
const COL_STAGE: &str = "stage";
const COL_ACTIVITY_ID: &str = "activity_id";
const COL_ACTIVITY_TYPE: &str = "activity_type";
const COL_NAME: &str = "name";
const COL_START_DATE: &str = "start_date";
const COL_END_DATE: &str = "end_date";
const COL_CONTRACTED_START_DATE: &str = "contracted_start_date";
const COL_CONTRACTED_END_DATE: &str = "contracted_end_date";

/// Run-level values stamped onto every output row.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub version: String,
    pub extract_date: String,
    pub report_link_base: String,
}

#[derive(Debug, Default)]
pub struct Assembled {
    pub rows: Vec<ProjectReportRow>,
    pub dropped: usize,
}

/// A row carries information unless every fact is zero; invoiced only
/// counts on approved reports. Null facts are not zero.
fn carries_information(facts: &Facts, approved: bool) -> bool {
    let nonzero = |v: Option<f64>| v != Some(0.0);
    nonzero(facts.measured) || nonzero(facts.actual) || (nonzero(facts.invoiced) && approved)
}

fn report_row(rec: &FactRecord, lookups: &LookupStore, stamp: &Stamp) -> ProjectReportRow {
    let project = &rec.line.project;
    let report = &rec.line.report;
    let unit = project
        .management_unit
        .as_deref()
        .and_then(|name| lookups.management_unit(name));
    let mut facts = rec.line.facts;
    facts.suppress_unapproved(report);

    ProjectReportRow {
        project_id: project.project_id.clone(),
        merit_project_id: project.merit_project_id.clone(),
        external_id: project.external_id.clone(),
        internal_order_number: project.internal_order_number.clone(),
        work_order_id: project.work_order_id.clone(),
        organisation: project.organisation.clone(),
        management_unit: project.management_unit.clone(),
        management_unit_id: unit.and_then(|u| u.management_unit_id.clone()),
        management_unit_state: unit.and_then(|u| u.management_unit_state.clone()),
        project_name: project.name.clone(),
        program: project.program.clone(),
        sub_program: project.sub_program.clone(),
        project_start_date: project.start_date.clone(),
        project_end_date: project.end_date.clone(),
        project_contracted_start_date: project.contracted_start_date.clone(),
        project_contracted_end_date: project.contracted_end_date.clone(),
        project_status: project.status.clone(),

        merit_reports_link: project
            .project_id
            .as_ref()
            .map(|id| format!("{}{}", stamp.report_link_base, id)),
        report_financial_year: report.report_financial_year.clone(),
        report_status: report.report_status.clone(),
        service: rec.line.service.clone(),
        target_measure: rec.line.target_measure.clone(),
        context: rec.line.context.clone(),
        site_id: report.site_id.clone(),
        report_last_modified: project.last_modified.clone(),
        category: rec.line.category.clone(),
        report_species: rec.line.species.clone(),
        total_to_be_delivered: rec.target.total_to_be_delivered.or(Some(TARGET_MISSING)),
        fy_target: rec.target.fy_target,
        measured: facts.measured,
        invoiced: facts.invoiced,
        actual: facts.actual,
        report_stage: report.stage.clone(),
        report_activity_id: report.activity_id.clone(),
        report_activity_type: report.activity_type.clone(),
        report_from_date: report.report_from_date.clone(),
        report_to_date: report.report_to_date.clone(),

        meta_source_sheetname: rec.meta.source_sheetname.clone(),
        meta_col_project_start_date: COL_START_DATE,
        meta_col_project_end_date: COL_END_DATE,
        meta_col_project_contracted_start_date: COL_CONTRACTED_START_DATE,
        meta_col_project_contracted_end_date: COL_CONTRACTED_END_DATE,
        meta_col_project_name: COL_NAME,

        meta_col_measured: rec.meta.col_measured.clone(),
        meta_col_actual: rec.meta.col_actual.clone(),
        meta_col_invoiced: rec.meta.col_invoiced.clone(),
        meta_col_category: rec.meta.col_category.clone(),
        meta_text_subcategory: rec.meta.text_subcategory.clone(),
        meta_col_context: rec.meta.col_context.clone(),
        meta_col_report_species: rec.meta.col_species.clone(),
        meta_line_item_object_class: rec.meta.line_item_object_class.clone(),
        meta_line_item_property: rec.meta.line_item_property.clone(),
        meta_line_item_value: rec.meta.line_item_value.clone(),
        meta_col_project_status: COL_STATUS,
        meta_col_report_last_modified: LAST_MODIFIED_COLUMN,
        meta_col_report_stage: COL_STAGE,
        meta_col_report_activity_id: COL_ACTIVITY_ID,
        meta_col_report_activity_type: COL_ACTIVITY_TYPE,
        meta_transform_func: rec.meta.transform_func.clone(),

        version: stamp.version.clone(),
        grant_or_procurement: rec.grant_or_procurement.clone(),
        extract_date: stamp.extract_date.clone(),
    }
}

/// Build the `ProjectReport` table from every validated fact record.
///
/// Rows whose facts are all zero are dropped and counted.
pub fn assemble_project_reports(
    records: &[FactRecord],
    lookups: &LookupStore,
    stamp: &Stamp,
) -> Assembled {
    let mut out = Assembled::default();
    for rec in records {
        let row = report_row(rec, lookups, stamp);
        let facts = Facts {
            measured: row.measured,
            invoiced: row.invoiced,
            actual: row.actual,
        };
        if carries_information(&facts, rec.line.report.is_approved()) {
            out.rows.push(row);
        } else {
            out.dropped += 1;
        }
    }
    info!(
        "Assembled {} report rows ({} degenerate rows dropped)",
        format_int(out.rows.len()),
        format_int(out.dropped)
    );
    out
}

/// One attribute row per project on the Projects worksheet.
///
/// A project listed twice keeps its first row.
pub fn assemble_project_attributes(
    projects: &Table,
    fan: &FanOut,
    lookups: &LookupStore,
    stamp: &Stamp,
) -> PipelineResult<Vec<ProjectAttributesRow>> {
    let cols = ProjectColumns::lenient(projects)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();
    for row in 0..projects.len() {
        let project = cols.read(projects, row);
        let Some(id) = project.merit_project_id.clone() else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        let unit = project
            .management_unit
            .as_deref()
            .and_then(|name| lookups.management_unit(name));
        let meri = fan.meri_outcomes.get(&id).cloned().unwrap_or_default();
        let [natural_cultural_assets_managed, threatened_species, threatened_ecological_communities, migratory_species, ramsar_wetland, world_heritage_area, community_awareness_participation_in_nrm, indigenous_cultural_values, indigenous_ecological_knowledge, remnant_vegetation, aquatic_and_coastal_systems_including_wetlands] =
            meri;
        rows.push(ProjectAttributesRow {
            project_id: project.project_id,
            organisation: project.organisation,
            management_unit_id: unit.and_then(|u| u.management_unit_id.clone()),
            management_unit_state: unit.and_then(|u| u.management_unit_state.clone()),
            management_unit: project.management_unit,
            project_name: project.name,
            program: project.program,
            sub_program: project.sub_program,
            project_status: project.status,
            primary_secondary_outcomes: fan.primary_secondary_outcomes.get(&id).cloned(),
            primary_outcomes: fan.primary_outcomes.get(&id).cloned(),
            secondary_outcomes: fan.secondary_outcomes.get(&id).cloned(),
            primary_secondary_investment_priorities: fan
                .primary_secondary_investment_priorities
                .get(&id)
                .cloned(),
            primary_investment_priority: fan.primary_investment_priority.get(&id).cloned(),
            secondary_investment_priority: fan.secondary_investment_priority.get(&id).cloned(),
            assets: fan.assets.get(&id).cloned(),
            natural_cultural_assets_managed,
            threatened_species,
            threatened_ecological_communities,
            migratory_species,
            ramsar_wetland,
            world_heritage_area,
            community_awareness_participation_in_nrm,
            indigenous_cultural_values,
            indigenous_ecological_knowledge,
            remnant_vegetation,
            aquatic_and_coastal_systems_including_wetlands,
            report_species: fan.report_species.get(&id).cloned(),
            epbc: fan.flag("epbc", &id),
            tec: fan.flag("tec", &id),
            ramsar: fan.flag("ramsar", &id),
            version: stamp.version.clone(),
            extract_date: stamp.extract_date.clone(),
            merit_project_id: id,
        });
    }
    Ok(rows)
}
