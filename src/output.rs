use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::RunOutput;
use log::info;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub const REPORTS_FILE: &str = "project_reports.csv";
pub const ATTRIBUTES_FILE: &str = "project_attributes.csv";
pub const REJECTIONS_FILE: &str = "rejections.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> PipelineResult<()> {
    let fail = |e: &dyn std::fmt::Display| PipelineError::output(path.display().to_string(), e);
    let mut wtr = csv::Writer::from_path(path).map_err(|e| fail(&e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| fail(&e))?;
    }
    wtr.flush().map_err(|e| fail(&e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let fail = |e: &dyn std::fmt::Display| PipelineError::output(path.display().to_string(), e);
    let s = serde_json::to_string_pretty(value).map_err(|e| fail(&e))?;
    std::fs::write(path, s).map_err(|e| fail(&e))?;
    Ok(())
}

/// Write every output table of a run into `dir`, creating it if needed.
pub fn write_outputs(output: &RunOutput, dir: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| PipelineError::output(dir.display().to_string(), e))?;
    write_csv(&dir.join(REPORTS_FILE), &output.reports)?;
    write_csv(&dir.join(ATTRIBUTES_FILE), &output.attributes)?;
    write_csv(&dir.join(REJECTIONS_FILE), &output.rejections)?;
    write_json(&dir.join(SUMMARY_FILE), &output.summary)?;
    info!("Wrote outputs to {}", dir.display());
    Ok(())
}

pub fn preview_table_rows<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}\n", title);
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("({} more rows)\n", rows.len() - max_rows);
    }
}
