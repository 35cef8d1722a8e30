//! Run configuration parsed from `pipeline.yml`

use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything a run needs to locate its inputs and stamp its outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the workbooks and reference tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory the output tables are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Date of the extract; also part of every workbook file name.
    /// Defaults to today.
    #[serde(default)]
    pub extract_date: Option<NaiveDate>,

    /// Schema version stamped on every output row
    #[serde(default = "default_version")]
    pub version: String,

    /// Workbook holding Projects, Project services and targets, outcomes
    #[serde(default = "default_project_workbook")]
    pub project_workbook: String,

    /// Workbooks holding the `RLP - ...` output-report worksheets
    #[serde(default = "default_output_report_workbooks")]
    pub output_report_workbooks: Vec<String>,

    /// Workbooks holding the final-report worksheets
    #[serde(default = "default_final_report_workbooks")]
    pub final_report_workbooks: Vec<String>,

    /// Years placeholder service rows are synthesized for
    #[serde(default = "default_financial_years")]
    pub financial_years: Vec<String>,

    /// Sub-program whose projects get placeholder service rows
    #[serde(default = "default_placeholder_sub_program")]
    pub placeholder_sub_program: String,

    /// Report hyperlink prefix; the project id is appended
    #[serde(default = "default_report_link_base")]
    pub report_link_base: String,

    /// Tag attached to every record that passes the validation join
    #[serde(default = "default_grant_or_procurement")]
    pub grant_or_procurement: String,

    #[serde(default)]
    pub reference: ReferencePaths,
}

/// Reference table files, relative to `data_dir` unless absolute.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferencePaths {
    #[serde(default = "default_management_units")]
    pub management_units: PathBuf,
    #[serde(default = "default_investment_priority_themes")]
    pub investment_priority_themes: PathBuf,
    #[serde(default = "default_project_services_catalogue")]
    pub project_services_catalogue: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_version() -> String {
    "1.0.1".to_string()
}

fn default_project_workbook() -> String {
    "M01".to_string()
}

fn default_output_report_workbooks() -> Vec<String> {
    ["M02", "M05", "M07", "M08", "M09"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_final_report_workbooks() -> Vec<String> {
    vec!["M05".to_string()]
}

fn default_financial_years() -> Vec<String> {
    ["2018/2019", "2019/2020", "2020/2021", "2021/2022", "2022/2023"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_placeholder_sub_program() -> String {
    "State Government Emergency".to_string()
}

fn default_report_link_base() -> String {
    "https://fieldcapture.ala.org.au/project/index/".to_string()
}

fn default_grant_or_procurement() -> String {
    "procurement".to_string()
}

fn default_management_units() -> PathBuf {
    PathBuf::from("management_units.csv")
}

fn default_investment_priority_themes() -> PathBuf {
    PathBuf::from("investment_priority_themes.csv")
}

fn default_project_services_catalogue() -> PathBuf {
    PathBuf::from("all_project_services.csv")
}

impl Default for ReferencePaths {
    fn default() -> Self {
        Self {
            management_units: default_management_units(),
            investment_priority_themes: default_investment_priority_themes(),
            project_services_catalogue: default_project_services_catalogue(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            extract_date: None,
            version: default_version(),
            project_workbook: default_project_workbook(),
            output_report_workbooks: default_output_report_workbooks(),
            final_report_workbooks: default_final_report_workbooks(),
            financial_years: default_financial_years(),
            placeholder_sub_program: default_placeholder_sub_program(),
            report_link_base: default_report_link_base(),
            grant_or_procurement: default_grant_or_procurement(),
            reference: ReferencePaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content, path)
    }

    fn from_yaml(content: &str, path: &Path) -> PipelineResult<Self> {
        serde_yaml::from_str(content).map_err(|e| PipelineError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// The configured extract date, or today when none was given.
    pub fn extract_date(&self) -> NaiveDate {
        self.extract_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// `<data_dir>/<prefix> <extract_date>.xlsx`
    pub fn workbook_path(&self, prefix: &str) -> PathBuf {
        self.data_dir.join(format!(
            "{} {}.xlsx",
            prefix,
            self.extract_date().format("%Y-%m-%d")
        ))
    }

    pub fn reference_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_fill_every_field() {
        let config = PipelineConfig::from_yaml(
            "extract_date: 2022-07-18\n",
            Path::new("pipeline.yml"),
        )
        .unwrap();
        assert_eq!(config.version, "1.0.1");
        assert_eq!(config.output_report_workbooks.len(), 5);
        assert_eq!(config.financial_years[0], "2018/2019");
        assert_eq!(config.grant_or_procurement, "procurement");
        assert_eq!(
            config.workbook_path("M01"),
            PathBuf::from("data").join("M01 2022-07-18.xlsx")
        );
        assert_eq!(
            config.reference_path(&config.reference.management_units),
            PathBuf::from("data").join("management_units.csv")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_yaml("extract_dat: 2022-07-18\n", Path::new("p.yml"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = PipelineConfig::load(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_reads_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.yml");
        std::fs::write(
            &path,
            "data_dir: /srv/merit\nversion: 2.0.0\nfinancial_years: [\"2021/2022\"]\nreference:\n  management_units: /ref/mu.csv\n",
        )
        .unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.financial_years, vec!["2021/2022"]);
        assert_eq!(
            config.reference_path(&config.reference.management_units),
            PathBuf::from("/ref/mu.csv")
        );
        assert_eq!(
            config.reference_path(&config.reference.investment_priority_themes),
            PathBuf::from("/srv/merit/investment_priority_themes.csv")
        );
    }
}
