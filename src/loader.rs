use crate::error::{PipelineError, PipelineResult};
use crate::table::{Cell, Table};
use crate::util::{clean_headers, format_int, render_datetime, render_number};
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// The loader's canonical name for the grant identifier column.
pub const PROJECT_ID_COLUMN: &str = "merit_project_id";
const GRANT_ID_COLUMN: &str = "grant_id";

/// Activity worksheets carry two title rows above their headings.
pub const ACTIVITY_HEADER_ROW: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Cell::Text(render_datetime(d)),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => render_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Read one worksheet into a `Table`.
///
/// `header_row` is the zero-based sheet row holding the headings; rows
/// above it are skipped. Headings are cleaned to snake_case and
/// `grant_id` is renamed to `merit_project_id`.
pub fn read_sheet(path: &Path, sheet_name: &str, header_row: usize) -> PipelineResult<Table> {
    let display = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PipelineError::source_load(&display, e))?;
    if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
        return Err(PipelineError::source_load(
            &display,
            format!("worksheet '{}' not found", sheet_name),
        ));
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| PipelineError::source_load(&display, e))?;

    // The range starts at the first non-empty cell, not at A1.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let skip = header_row.saturating_sub(first_row as usize);
    let lead = first_col as usize;

    let mut rows = range.rows().skip(skip);
    let Some(header_cells) = rows.next() else {
        return Ok(Table::new(sheet_name, Vec::new()));
    };
    let mut headings: Vec<String> = vec![String::new(); lead];
    headings.extend(header_cells.iter().map(header_text));
    let mut columns = clean_headers(&headings);
    if let Some(idx) = columns.iter().position(|c| c == GRANT_ID_COLUMN) {
        columns[idx] = PROJECT_ID_COLUMN.to_string();
    }

    let mut table = Table::new(sheet_name, columns);
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut cells = vec![Cell::Empty; lead];
        cells.extend(row.iter().map(convert_cell));
        table.push_row(cells);
    }
    debug!(
        "Read {} rows from '{}' in {}",
        format_int(table.len()),
        sheet_name,
        display
    );
    Ok(table)
}

/// Read the same worksheet from several workbooks and stack the rows.
///
/// Columns are aligned by name; a column one workbook lacks is empty for
/// that workbook's rows.
pub fn load_mult_wbooks(
    paths: &[PathBuf],
    sheet_name: &str,
    header_row: usize,
) -> PipelineResult<Table> {
    let mut out = Table::new(sheet_name, Vec::new());
    for path in paths {
        let part = read_sheet(path, sheet_name, header_row)?;
        out.append(&part);
    }
    info!(
        "Loaded '{}' from {} workbook(s): {} rows",
        sheet_name,
        paths.len(),
        format_int(out.len())
    );
    Ok(out)
}

/// Load a reference CSV into typed rows.
///
/// Headings are cleaned the same way as worksheet headings before
/// deserializing. Rows that fail to decode are skipped and counted.
pub fn load_reference<T: DeserializeOwned>(path: &Path) -> PipelineResult<(Vec<T>, LoadReport)> {
    let display = path.display().to_string();
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::source_load(&display, e))?;
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::ReferenceParse {
            path: display.clone(),
            message: e.to_string(),
        })?
        .clone();
    let cleaned: Vec<String> = clean_headers(&headers.iter().collect::<Vec<_>>());
    rdr.set_headers(StringRecord::from(cleaned));

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        report.total_rows += 1;
        match result {
            Ok(row) => rows.push(row),
            Err(_) => report.parse_errors += 1,
        }
    }
    report.loaded_rows = rows.len();
    if report.parse_errors > 0 {
        warn!(
            "{}: skipped {} of {} rows that failed to parse",
            display,
            format_int(report.parse_errors),
            format_int(report.total_rows)
        );
    }
    info!("Loaded {} rows from {}", format_int(report.loaded_rows), display);
    Ok((rows, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ManagementUnit, ServicePair};
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_workbook(path: &Path, sheet: &str, rows: &[Vec<&str>]) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) => worksheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => worksheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn read_sheet_cleans_headers_and_renames_grant_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("M01 2022-07-18.xlsx");
        write_workbook(
            &path,
            "Projects",
            &[
                vec!["Grant ID", "Sub-program", "Last Modified", "Last Modified"],
                vec!["RLP-1", "State Government Emergency", "2022-01-01", "2022-02-01"],
                vec!["", "", "", ""],
                vec!["RLP-2", "Regional Land Partnerships", "", ""],
            ],
        );
        let table = read_sheet(&path, "Projects", 0).unwrap();
        assert_eq!(
            table.columns(),
            &["merit_project_id", "sub_program", "last_modified", "last_modified_1"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.text(1, 0).as_deref(), Some("RLP-2"));
    }

    #[test]
    fn read_sheet_honours_header_offset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_workbook(
            &path,
            "Data",
            &[
                vec!["Title row"],
                vec![""],
                vec!["Grant ID", "Measured"],
                vec!["RLP-1", "5"],
            ],
        );
        let table = read_sheet(&path, "Data", 2).unwrap();
        assert_eq!(table.columns(), &["merit_project_id", "measured"]);
        assert_eq!(table.number(0, 1), Some(5.0));
    }

    #[test]
    fn read_sheet_missing_file_or_sheet_is_source_load_error() {
        let dir = TempDir::new().unwrap();
        let missing = read_sheet(&dir.path().join("absent.xlsx"), "Projects", 0);
        assert!(matches!(missing, Err(PipelineError::SourceLoad { .. })));

        let path = dir.path().join("book.xlsx");
        write_workbook(&path, "Projects", &[vec!["Grant ID"]]);
        let wrong_sheet = read_sheet(&path, "Outcomes", 0);
        assert!(matches!(wrong_sheet, Err(PipelineError::SourceLoad { .. })));
    }

    #[test]
    fn load_mult_wbooks_stacks_rows() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("M02.xlsx");
        let b = dir.path().join("M05.xlsx");
        write_workbook(&a, "Sheet", &[vec!["Grant ID", "Stage"], vec!["P1", "Stage 1"]]);
        write_workbook(&b, "Sheet", &[vec!["Grant ID", "Site ID"], vec!["P2", "S9"]]);
        let table = load_mult_wbooks(&[a, b], "Sheet", 0).unwrap();
        assert_eq!(table.columns(), &["merit_project_id", "stage", "site_id"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.text(1, 1), None);
        assert_eq!(table.text(1, 2).as_deref(), Some("S9"));
    }

    #[test]
    fn load_reference_cleans_headers_and_counts_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_project_services.csv");
        std::fs::write(
            &path,
            "Service,Target Measure\nCommunity/stakeholder engagement,Number of field days\nonly-one-field\n",
        )
        .unwrap();
        let (rows, report) = load_reference::<ServicePair>(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].target_measure, "Number of field days");
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.parse_errors, 1);
    }

    #[test]
    fn load_reference_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_reference::<ManagementUnit>(&dir.path().join("mu.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLoad { .. }));
    }
}
