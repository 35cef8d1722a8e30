//! Shape extractors.
//!
//! Every worksheet "shape" is a combination of three optional axes:
//! category (absent, a category column, or a sub-category value filter on
//! that column), context, and species. One algorithm serves all eight
//! shapes; the shape only decides which bindings are read and which
//! transform name ends up in the provenance record.

use crate::error::PipelineResult;
use crate::fields::{ProjectColumns, ReportColumns};
use crate::lookup::LookupStore;
use crate::table::Table;
use crate::types::{Facts, FactRecord, LineItem, MetaRecord, Rejection};
use crate::validate::join_by_service_target_measure;
use log::debug;

/// Category written on records whose worksheet has no category axis.
pub const CATEGORY_VARIOUS: &str = "Various";

/// How the category axis of a worksheet is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryBinding {
    Absent,
    /// Source column renamed to `category`; with a `value`, rows are kept
    /// only when the column equals it
    Column { column: String, value: Option<String> },
}

impl CategoryBinding {
    fn column(&self) -> Option<&str> {
        match self {
            CategoryBinding::Absent => None,
            CategoryBinding::Column { column, .. } => Some(column.as_str()),
        }
    }

    fn selector(&self) -> Option<&str> {
        match self {
            CategoryBinding::Column { value, .. } => value.as_deref(),
            CategoryBinding::Absent => None,
        }
    }
}

/// Which optional axes a worksheet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub category: CategoryAxis,
    pub context: bool,
    pub species: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAxis {
    Absent,
    Column,
    SubCategory,
}

impl Shape {
    /// Name of the transformation, e.g. `sub_category_extract_context_no_species`.
    pub fn transform_func(&self) -> String {
        let category = match self.category {
            CategoryAxis::Absent => "no_category",
            CategoryAxis::Column => "category",
            CategoryAxis::SubCategory => "sub_category",
        };
        let context = if self.context { "context" } else { "no_context" };
        let species = if self.species { "species" } else { "no_species" };
        format!("{}_extract_{}_{}", category, context, species)
    }
}

/// One extractor invocation: which worksheet columns produce which
/// semantic (service, target measure) facts.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub worksheet: String,
    pub service: String,
    pub target_measure: String,
    pub measured: String,
    pub invoiced: String,
    pub actual: String,
    pub category: CategoryBinding,
    pub context: Option<String>,
    pub species: Option<String>,
    pub object_class: Option<String>,
    pub property: Option<String>,
    pub value: Option<String>,
}

impl Extraction {
    /// Start an extraction whose three facts all come from `fact_column`.
    pub fn new(
        worksheet: impl Into<String>,
        service: impl Into<String>,
        target_measure: impl Into<String>,
        fact_column: &str,
    ) -> Self {
        Self {
            worksheet: worksheet.into(),
            service: service.into(),
            target_measure: target_measure.into(),
            measured: fact_column.to_string(),
            invoiced: fact_column.to_string(),
            actual: fact_column.to_string(),
            category: CategoryBinding::Absent,
            context: None,
            species: None,
            object_class: None,
            property: None,
            value: None,
        }
    }

    /// Bind the three facts to separate columns
    pub fn facts(mut self, measured: &str, invoiced: &str, actual: &str) -> Self {
        self.measured = measured.to_string();
        self.invoiced = invoiced.to_string();
        self.actual = actual.to_string();
        self
    }

    #[cfg(test)]
    pub fn category(mut self, column: &str) -> Self {
        self.category = CategoryBinding::Column {
            column: column.to_string(),
            value: None,
        };
        self
    }

    /// Keep only rows whose `column` equals `value`
    pub fn sub_category(mut self, column: &str, value: &str) -> Self {
        self.category = CategoryBinding::Column {
            column: column.to_string(),
            value: Some(value.to_string()),
        };
        self
    }

    pub fn context(mut self, column: &str) -> Self {
        self.context = Some(column.to_string());
        self
    }

    pub fn species(mut self, column: &str) -> Self {
        self.species = Some(column.to_string());
        self
    }

    /// Business labels describing the line item
    pub fn line_item(mut self, object_class: &str, property: &str, value: &str) -> Self {
        self.object_class = Some(object_class.to_string());
        self.property = Some(property.to_string());
        self.value = Some(value.to_string());
        self
    }

    pub fn shape(&self) -> Shape {
        Shape {
            category: match self.category {
                CategoryBinding::Absent => CategoryAxis::Absent,
                CategoryBinding::Column { value: None, .. } => CategoryAxis::Column,
                CategoryBinding::Column { value: Some(_), .. } => CategoryAxis::SubCategory,
            },
            context: self.context.is_some(),
            species: self.species.is_some(),
        }
    }

    fn meta(&self) -> MetaRecord {
        MetaRecord {
            source_sheetname: self.worksheet.clone(),
            transform_func: self.shape().transform_func(),
            col_measured: self.measured.clone(),
            col_actual: self.actual.clone(),
            col_invoiced: self.invoiced.clone(),
            col_category: self.category.column().map(String::from),
            text_subcategory: self.category.selector().map(String::from),
            col_context: self.context.clone(),
            col_species: self.species.clone(),
            line_item_object_class: self.object_class.clone(),
            line_item_property: self.property.clone(),
            line_item_value: self.value.clone(),
        }
    }
}

/// Records and rejections produced by one extraction.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub records: Vec<FactRecord>,
    pub rejected: Vec<Rejection>,
}

struct BoundColumns {
    project: ProjectColumns,
    report: ReportColumns,
    measured: usize,
    invoiced: usize,
    actual: usize,
    category: Option<usize>,
    context: Option<usize>,
    species: Option<usize>,
}

impl BoundColumns {
    fn resolve(table: &Table, spec: &Extraction) -> PipelineResult<Self> {
        let optional = |column: Option<&str>| -> PipelineResult<Option<usize>> {
            column.map(|c| table.require(c)).transpose()
        };
        Ok(Self {
            project: ProjectColumns::strict(table)?,
            report: ReportColumns::resolve(table)?,
            measured: table.require(&spec.measured)?,
            invoiced: table.require(&spec.invoiced)?,
            actual: table.require(&spec.actual)?,
            category: optional(spec.category.column())?,
            context: optional(spec.context.as_deref())?,
            species: optional(spec.species.as_deref())?,
        })
    }
}

/// Map the worksheet rows onto line items, applying the sub-category
/// filter. The caller's table is only read.
fn line_items(table: &Table, spec: &Extraction) -> PipelineResult<Vec<LineItem>> {
    let cols = BoundColumns::resolve(table, spec)?;
    let selector = spec.category.selector();
    let mut out = Vec::new();
    for row in 0..table.len() {
        let category = match cols.category {
            Some(c) => table.text(row, c),
            None => Some(CATEGORY_VARIOUS.to_string()),
        };
        if let Some(wanted) = selector {
            if category.as_deref() != Some(wanted) {
                continue;
            }
        }
        let report = cols.report.read(table, row);
        let mut facts = Facts {
            measured: table.number(row, cols.measured),
            invoiced: table.number(row, cols.invoiced),
            actual: table.number(row, cols.actual),
        };
        facts.suppress_unapproved(&report);
        out.push(LineItem {
            project: cols.project.read(table, row),
            report,
            service: spec.service.clone(),
            target_measure: spec.target_measure.clone(),
            category,
            context: cols.context.and_then(|c| table.text(row, c)),
            species: cols.species.and_then(|c| table.text(row, c)),
            facts,
        });
    }
    Ok(out)
}

/// Run one extraction against a worksheet table.
///
/// Fails only when a bound column is missing. Rows without a catalogue
/// match are returned as rejections. Provenance is stamped only when at
/// least one row survives.
pub fn extract(
    table: &Table,
    spec: &Extraction,
    lookups: &LookupStore,
    grant_or_procurement: &str,
) -> PipelineResult<ExtractOutcome> {
    let lines = line_items(table, spec)?;
    let candidates = lines.len();
    let validated =
        join_by_service_target_measure(lines, lookups, &spec.worksheet, grant_or_procurement);

    let records = if validated.kept.is_empty() {
        Vec::new()
    } else {
        let meta = spec.meta();
        validated
            .kept
            .into_iter()
            .map(|v| FactRecord {
                line: v.line,
                target: v.target,
                grant_or_procurement: v.grant_or_procurement,
                meta: meta.clone(),
            })
            .collect()
    };
    debug!(
        "{} [{}] {}: {} candidates, {} kept",
        spec.worksheet,
        spec.shape().transform_func(),
        spec.target_measure,
        candidates,
        records.len()
    );
    Ok(ExtractOutcome {
        records,
        rejected: validated.rejected,
    })
}
