//! Project-level fan-out attributes.
//!
//! Outcomes, investment priorities, assets and reported species are
//! one-to-many per project; each becomes one pipe-joined string per
//! project through `conc_col`.

use crate::aggregate::{conc_col_by, conc_pairs};
use crate::error::PipelineResult;
use crate::loader::PROJECT_ID_COLUMN;
use crate::lookup::LookupStore;
use crate::table::Table;
use crate::types::FactRecord;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const PRIMARY_OUTCOME: &str = "Primary outcome";
const SECONDARY_OUTCOME: &str = "Secondary Outcome/s";

/// MERI outcome indicator columns, in output order.
pub const MERI_INDICATORS: [&str; 11] = [
    "natural_cultural_assets_managed",
    "threatened_species",
    "threatened_ecological_communities",
    "migratory_species",
    "ramsar_wetland",
    "world_heritage_area",
    "community_awareness_participation_in_nrm",
    "indigenous_cultural_values",
    "indigenous_ecological_knowledge",
    "remnant_vegetation",
    "aquatic_and_coastal_systems_including_wetlands",
];

/// Short-term indicator that flags a project for each indicator column.
const INDICATOR_FLAGS: [(&str, &str); 3] = [
    ("epbc", "Threatened Species"),
    ("tec", "Threatened Ecological Community"),
    ("ramsar", "Ramsar"),
];

/// The worksheets fan-out attributes are built from.
pub struct FanOutSources<'a> {
    pub outcomes: &'a Table,
    pub assets: &'a Table,
    pub meri_outcomes: &'a Table,
}

/// Every fan-out attribute, keyed by merit project id.
#[derive(Debug, Default)]
pub struct FanOut {
    pub primary_secondary_outcomes: BTreeMap<String, String>,
    pub primary_outcomes: BTreeMap<String, String>,
    pub secondary_outcomes: BTreeMap<String, String>,
    pub primary_secondary_investment_priorities: BTreeMap<String, String>,
    pub primary_investment_priority: BTreeMap<String, String>,
    pub secondary_investment_priority: BTreeMap<String, String>,
    pub assets: BTreeMap<String, String>,
    pub report_species: BTreeMap<String, String>,
    /// `epbc`, `tec`, `ramsar` → projects flagged `Y`
    pub indicators: HashMap<&'static str, BTreeSet<String>>,
    /// Last MERI outcomes row per project, one entry per indicator column
    pub meri_outcomes: HashMap<String, [Option<String>; 11]>,
}

impl FanOut {
    pub fn flag(&self, indicator: &str, merit_project_id: &str) -> Option<String> {
        self.indicators
            .get(indicator)
            .filter(|ids| ids.contains(merit_project_id))
            .map(|_| "Y".to_string())
    }
}

/// Outcomes of the given types, reduced to (project id, `agg_col`).
fn outcomes_of_type(
    outcomes: &Table,
    types: &[&str],
    agg_col: &str,
) -> PipelineResult<BTreeMap<String, String>> {
    let type_col = outcomes.require("type_of_outcomes")?;
    let id_col = outcomes.require(PROJECT_ID_COLUMN)?;
    let value_col = outcomes.require(agg_col)?;
    let pairs = outcomes.rows().filter_map(|row| {
        let kind = row[type_col].as_text()?;
        if !types.contains(&kind.as_str()) {
            return None;
        }
        Some((row[id_col].as_text()?, row[value_col].as_text()?))
    });
    Ok(conc_pairs(pairs))
}

/// Projects whose investment priorities map to each indicator.
///
/// The priority cell is a comma-separated list; each trimmed entry is
/// looked up in the investment-priority themes.
fn indicator_flags(
    outcomes: &Table,
    lookups: &LookupStore,
) -> PipelineResult<HashMap<&'static str, BTreeSet<String>>> {
    let id_col = outcomes.require(PROJECT_ID_COLUMN)?;
    let priority_col = outcomes.require("investment_priority")?;
    let mut flags: HashMap<&'static str, BTreeSet<String>> = INDICATOR_FLAGS
        .iter()
        .map(|(name, _)| (*name, BTreeSet::new()))
        .collect();
    for row in 0..outcomes.len() {
        let (Some(id), Some(priorities)) = (
            outcomes.text(row, id_col),
            outcomes.text(row, priority_col),
        ) else {
            continue;
        };
        for priority in priorities.split(',').map(str::trim) {
            for theme in lookups.investment_priority_themes(priority) {
                let Some(indicator) = theme.short_term_outcome_indicator_outcome.as_deref() else {
                    continue;
                };
                for (name, wanted) in INDICATOR_FLAGS {
                    if indicator == wanted {
                        if let Some(ids) = flags.get_mut(name) {
                            ids.insert(id.clone());
                        }
                    }
                }
            }
        }
    }
    Ok(flags)
}

/// Keep the last row per project; indicator columns the sheet lacks are null.
fn last_meri_outcomes(table: &Table) -> PipelineResult<HashMap<String, [Option<String>; 11]>> {
    let id_col = table.require(PROJECT_ID_COLUMN)?;
    let cols: Vec<Option<usize>> = MERI_INDICATORS
        .iter()
        .map(|c| table.column_index(c))
        .collect();
    let mut out = HashMap::new();
    for row in 0..table.len() {
        let Some(id) = table.text(row, id_col) else {
            continue;
        };
        let mut values: [Option<String>; 11] = Default::default();
        for (slot, col) in values.iter_mut().zip(&cols) {
            *slot = col.and_then(|c| table.text(row, c));
        }
        out.insert(id, values);
    }
    Ok(out)
}

/// Species reported on validated fact records, per project.
fn report_species(records: &[FactRecord]) -> BTreeMap<String, String> {
    conc_pairs(records.iter().filter_map(|rec| {
        let id = rec.line.project.merit_project_id.clone()?;
        let species = rec.line.species.as_deref().map(str::trim)?;
        (!species.is_empty()).then(|| (id, species.to_string()))
    }))
}

pub fn build_fan_out(
    sources: &FanOutSources<'_>,
    records: &[FactRecord],
    lookups: &LookupStore,
) -> PipelineResult<FanOut> {
    let both = [PRIMARY_OUTCOME, SECONDARY_OUTCOME];
    Ok(FanOut {
        primary_secondary_outcomes: outcomes_of_type(sources.outcomes, &both, "outcome")?,
        primary_outcomes: outcomes_of_type(sources.outcomes, &[PRIMARY_OUTCOME], "outcome")?,
        secondary_outcomes: outcomes_of_type(sources.outcomes, &[SECONDARY_OUTCOME], "outcome")?,
        primary_secondary_investment_priorities: outcomes_of_type(
            sources.outcomes,
            &both,
            "investment_priority",
        )?,
        primary_investment_priority: outcomes_of_type(
            sources.outcomes,
            &[PRIMARY_OUTCOME],
            "investment_priority",
        )?,
        secondary_investment_priority: outcomes_of_type(
            sources.outcomes,
            &[SECONDARY_OUTCOME],
            "investment_priority",
        )?,
        assets: conc_col_by(sources.assets, PROJECT_ID_COLUMN, "asset")?,
        report_species: report_species(records),
        indicators: indicator_flags(sources.outcomes, lookups)?,
        meri_outcomes: last_meri_outcomes(sources.meri_outcomes)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use crate::types::InvestmentPriorityTheme;

    fn outcomes() -> Table {
        let mut t = Table::new(
            "RLP Outcomes",
            vec![
                PROJECT_ID_COLUMN.into(),
                "type_of_outcomes".into(),
                "outcome".into(),
                "investment_priority".into(),
            ],
        );
        t.push_row(vec!["P1".into(), PRIMARY_OUTCOME.into(), "Soil".into(), "Koala, Hunter Wetlands".into()]);
        t.push_row(vec!["P1".into(), SECONDARY_OUTCOME.into(), "Biodiversity".into(), "Koala".into()]);
        t.push_row(vec!["P1".into(), "Mid-term outcome".into(), "Ignored".into(), "Grassland".into()]);
        t.push_row(vec!["P2".into(), SECONDARY_OUTCOME.into(), "Water".into(), Cell::Empty]);
        t
    }

    fn lookups() -> LookupStore {
        LookupStore::new(
            vec![],
            vec![
                InvestmentPriorityTheme {
                    investment_priority: "Koala".into(),
                    short_term_outcome_indicator_outcome: Some("Threatened Species".into()),
                },
                InvestmentPriorityTheme {
                    investment_priority: "Hunter Wetlands".into(),
                    short_term_outcome_indicator_outcome: Some("Ramsar".into()),
                },
                InvestmentPriorityTheme {
                    investment_priority: "Grassland".into(),
                    short_term_outcome_indicator_outcome: Some("Threatened Ecological Community".into()),
                },
            ],
            vec![],
        )
    }

    fn assets() -> Table {
        let mut t = Table::new("MERI_Project Assets", vec![PROJECT_ID_COLUMN.into(), "asset".into()]);
        t.push_row(vec!["P1".into(), "Wetland".into()]);
        t.push_row(vec!["P1".into(), "Estuary".into()]);
        t
    }

    fn meri() -> Table {
        let mut t = Table::new(
            "MERI_Outcomes",
            vec![PROJECT_ID_COLUMN.into(), "threatened_species".into()],
        );
        t.push_row(vec!["P1".into(), "No".into()]);
        t.push_row(vec!["P1".into(), "Yes".into()]);
        t
    }

    #[test]
    fn outcomes_split_by_type() {
        let (o, a, m) = (outcomes(), assets(), meri());
        let sources = FanOutSources {
            outcomes: &o,
            assets: &a,
            meri_outcomes: &m,
        };
        let fan = build_fan_out(&sources, &[], &lookups()).unwrap();
        assert_eq!(fan.primary_secondary_outcomes["P1"], "Biodiversity|Soil");
        assert_eq!(fan.primary_outcomes["P1"], "Soil");
        assert_eq!(fan.secondary_outcomes["P2"], "Water");
        assert!(!fan.primary_outcomes.contains_key("P2"));
        assert_eq!(
            fan.primary_secondary_investment_priorities["P1"],
            "Koala|Koala, Hunter Wetlands"
        );
        assert!(!fan.secondary_investment_priority.contains_key("P2"));
        assert_eq!(fan.assets["P1"], "Estuary|Wetland");
        assert!(fan.report_species.is_empty());
    }

    #[test]
    fn indicators_follow_split_priorities() {
        let (o, a, m) = (outcomes(), assets(), meri());
        let sources = FanOutSources {
            outcomes: &o,
            assets: &a,
            meri_outcomes: &m,
        };
        let fan = build_fan_out(&sources, &[], &lookups()).unwrap();
        assert_eq!(fan.flag("epbc", "P1").as_deref(), Some("Y"));
        assert_eq!(fan.flag("ramsar", "P1").as_deref(), Some("Y"));
        // Mid-term outcome rows still carry priorities
        assert_eq!(fan.flag("tec", "P1").as_deref(), Some("Y"));
        assert_eq!(fan.flag("epbc", "P2"), None);
    }

    #[test]
    fn meri_outcomes_keep_last_row() {
        let (o, a, m) = (outcomes(), assets(), meri());
        let sources = FanOutSources {
            outcomes: &o,
            assets: &a,
            meri_outcomes: &m,
        };
        let fan = build_fan_out(&sources, &[], &lookups()).unwrap();
        let row = &fan.meri_outcomes["P1"];
        assert_eq!(row[1].as_deref(), Some("Yes"));
        assert_eq!(row[0], None);
    }
}
