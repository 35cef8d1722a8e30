//! Column sets shared by every activity worksheet.

use crate::error::PipelineResult;
use crate::loader::PROJECT_ID_COLUMN;
use crate::table::Table;
use crate::types::{ProjectFields, ReportFields};

/// Source column of the report's last-modified stamp; the project's own
/// `last_modified` column precedes it in the worksheets.
pub const LAST_MODIFIED_COLUMN: &str = "last_modified_1";

fn resolve(table: &Table, column: &str, strict: bool) -> PipelineResult<Option<usize>> {
    if strict {
        table.require(column).map(Some)
    } else {
        Ok(table.column_index(column))
    }
}

fn read(table: &Table, row: usize, col: Option<usize>) -> Option<String> {
    col.and_then(|c| table.text(row, c))
}

/// Resolved positions of the project-identifying columns.
#[derive(Debug, Clone, Copy)]
pub struct ProjectColumns {
    project_id: Option<usize>,
    merit_project_id: Option<usize>,
    external_id: Option<usize>,
    internal_order_number: Option<usize>,
    work_order_id: Option<usize>,
    program: Option<usize>,
    sub_program: Option<usize>,
    name: Option<usize>,
    management_unit: Option<usize>,
    organisation: Option<usize>,
    status: Option<usize>,
    start_date: Option<usize>,
    end_date: Option<usize>,
    contracted_start_date: Option<usize>,
    contracted_end_date: Option<usize>,
    last_modified: Option<usize>,
}

impl ProjectColumns {
    /// Every column must be present; activity worksheets always carry them.
    pub fn strict(table: &Table) -> PipelineResult<Self> {
        Self::resolve(table, true)
    }

    /// Only the project id is required; absent columns read as null.
    pub fn lenient(table: &Table) -> PipelineResult<Self> {
        let cols = Self::resolve(table, false)?;
        table.require(PROJECT_ID_COLUMN)?;
        Ok(cols)
    }

    fn resolve(table: &Table, strict: bool) -> PipelineResult<Self> {
        Ok(Self {
            project_id: resolve(table, "project_id", strict)?,
            merit_project_id: resolve(table, PROJECT_ID_COLUMN, strict)?,
            external_id: resolve(table, "external_id", strict)?,
            internal_order_number: resolve(table, "internal_order_number", strict)?,
            work_order_id: resolve(table, "work_order_id", strict)?,
            program: resolve(table, "program", strict)?,
            sub_program: resolve(table, "sub_program", strict)?,
            name: resolve(table, "name", strict)?,
            management_unit: resolve(table, "management_unit", strict)?,
            organisation: resolve(table, "organisation", strict)?,
            status: resolve(table, "status", strict)?,
            start_date: resolve(table, "start_date", strict)?,
            end_date: resolve(table, "end_date", strict)?,
            contracted_start_date: resolve(table, "contracted_start_date", strict)?,
            contracted_end_date: resolve(table, "contracted_end_date", strict)?,
            last_modified: resolve(table, LAST_MODIFIED_COLUMN, strict)?,
        })
    }

    pub fn read(&self, table: &Table, row: usize) -> ProjectFields {
        ProjectFields {
            project_id: read(table, row, self.project_id),
            merit_project_id: read(table, row, self.merit_project_id),
            external_id: read(table, row, self.external_id),
            internal_order_number: read(table, row, self.internal_order_number),
            work_order_id: read(table, row, self.work_order_id),
            program: read(table, row, self.program),
            sub_program: read(table, row, self.sub_program),
            name: read(table, row, self.name),
            management_unit: read(table, row, self.management_unit),
            organisation: read(table, row, self.organisation),
            status: read(table, row, self.status),
            start_date: read(table, row, self.start_date),
            end_date: read(table, row, self.end_date),
            contracted_start_date: read(table, row, self.contracted_start_date),
            contracted_end_date: read(table, row, self.contracted_end_date),
            last_modified: read(table, row, self.last_modified),
        }
    }
}

/// Resolved positions of the activity-report columns.
#[derive(Debug, Clone, Copy)]
pub struct ReportColumns {
    site_id: usize,
    report_status: usize,
    report_financial_year: usize,
    stage: usize,
    activity_id: usize,
    activity_type: usize,
    report_from_date: usize,
    report_to_date: usize,
}

impl ReportColumns {
    pub fn resolve(table: &Table) -> PipelineResult<Self> {
        Ok(Self {
            site_id: table.require("site_id")?,
            report_status: table.require("report_status")?,
            report_financial_year: table.require("report_financial_year")?,
            stage: table.require("stage")?,
            activity_id: table.require("activity_id")?,
            activity_type: table.require("activity_type")?,
            report_from_date: table.require("report_from_date")?,
            report_to_date: table.require("report_to_date")?,
        })
    }

    pub fn read(&self, table: &Table, row: usize) -> ReportFields {
        ReportFields {
            site_id: table.text(row, self.site_id),
            report_status: table.text(row, self.report_status),
            report_financial_year: table.text(row, self.report_financial_year),
            stage: table.text(row, self.stage),
            activity_id: table.text(row, self.activity_id),
            activity_type: table.text(row, self.activity_type),
            report_from_date: table.text(row, self.report_from_date),
            report_to_date: table.text(row, self.report_to_date),
        }
    }
}

/// Every column an activity worksheet must carry besides its fact columns.
#[cfg(test)]
pub const ACTIVITY_COLUMNS: &[&str] = &[
    "project_id",
    PROJECT_ID_COLUMN,
    "external_id",
    "internal_order_number",
    "work_order_id",
    "program",
    "sub_program",
    "name",
    "management_unit",
    "organisation",
    "status",
    "start_date",
    "end_date",
    "contracted_start_date",
    "contracted_end_date",
    LAST_MODIFIED_COLUMN,
    "site_id",
    "report_status",
    "report_financial_year",
    "stage",
    "activity_id",
    "activity_type",
    "report_from_date",
    "report_to_date",
];
