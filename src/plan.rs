//! The fixed set of extractions run over the activity worksheets.
//!
//! Sheet names are the truncated names the reporting system writes into
//! its workbooks.

use crate::extract::Extraction;

/// Which configured workbooks a worksheet is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookSet {
    OutputReports,
    FinalReports,
}

/// One worksheet and every extraction that reads it.
#[derive(Debug, Clone)]
pub struct SheetPlan {
    pub sheet: &'static str,
    pub workbooks: WorkbookSet,
    pub extractions: Vec<Extraction>,
}

const RLP_BASELINE: &str = "RLP - Baseline da...tput Report";
const FINAL_BASELINE: &str = "Baseline data Sta...inal Report";
const RLP_ENGAGEMENT: &str = "RLP - Community e...tput Report";
const FINAL_ENGAGEMENT: &str = "Community engagem...inal Report";
const RLP_MANAGEMENT_PLAN: &str = "RLP - Management ...tput Report";
const FINAL_MANAGEMENT_PLAN: &str = "Management plan d...inal Report";

const BASELINE_SERVICE: &str = "Collecting, or synthesising baseline data";
const BASELINE_MEASURE: &str = "Number of baseline data sets collected and/or synthesised";
const BASELINE_COLUMN: &str = "number_of_baseline_data_sets_collected_and_or_synthesised";

const ENGAGEMENT_SERVICE: &str = "Community/stakeholder engagement";
const ENGAGEMENT_EVENTS: &str = "number_of_community_stakeholder_engagement_type_events";
const ENGAGEMENT_TYPE: &str = "type_of_community_stakeholder_engagement_activity";
const ENGAGEMENT_PURPOSE: &str = "purpose_of_engagement";

const PLAN_SERVICE: &str = "Developing farm/project/site management plan";

fn baseline(sheet: &str, object_class: &str) -> Extraction {
    Extraction::new(sheet, BASELINE_SERVICE, BASELINE_MEASURE, BASELINE_COLUMN).line_item(
        object_class,
        "collected and/or synthesised",
        "Total Data Sets",
    )
}

/// Community engagement events of one type, with the purpose as context.
fn engagement(sheet: &str, target_measure: &str, event_type: &str, property: &str) -> Extraction {
    Extraction::new(sheet, ENGAGEMENT_SERVICE, target_measure, ENGAGEMENT_EVENTS)
        .sub_category(ENGAGEMENT_TYPE, event_type)
        .context(ENGAGEMENT_PURPOSE)
        .line_item("Community Engagement", property, "Total Events")
}

/// (target measure, event type, line-item property) per engagement line.
const ENGAGEMENT_LINES: &[(&str, &str, &str)] = &[
    (
        "Number of on-ground trials / demonstrations",
        "On-ground trials / demonstrations",
        "On-ground trials / demonstrations",
    ),
    ("Number of on-ground works", "On-ground works", "on-ground works"),
    (
        "Number of one-on-one technical advice interactions",
        "One-on-one technical advice interactions",
        "one-on-one technical advice interactions",
    ),
    (
        "Number of training / workshop events",
        "Training / workshop events",
        "training / workshop events",
    ),
];

fn engagement_sheet(sheet: &'static str, workbooks: WorkbookSet) -> SheetPlan {
    let mut extractions = Vec::new();
    match workbooks {
        // Field days are reported without a purpose in the output reports
        WorkbookSet::OutputReports => extractions.push(
            Extraction::new(sheet, ENGAGEMENT_SERVICE, "Number of field days", ENGAGEMENT_EVENTS)
                .sub_category(ENGAGEMENT_TYPE, "Field days")
                .line_item("Community Engagement", "field days", "Total Events"),
        ),
        WorkbookSet::FinalReports => {
            extractions.push(
                Extraction::new(
                    sheet,
                    ENGAGEMENT_SERVICE,
                    "Number of conferences / seminars",
                    ENGAGEMENT_EVENTS,
                )
                .sub_category(ENGAGEMENT_TYPE, "Conferences / seminars")
                .line_item("Community Engagement", "conferences / seminars", "Total Events"),
            );
            extractions.push(engagement(
                sheet,
                "Number of field days",
                "Field days",
                "field days",
            ));
        }
    }
    for (measure, event_type, property) in ENGAGEMENT_LINES {
        extractions.push(engagement(sheet, measure, event_type, property));
    }
    SheetPlan {
        sheet,
        workbooks,
        extractions,
    }
}

fn plans_developed(sheet: &str, context: &str) -> Extraction {
    Extraction::new(
        sheet,
        PLAN_SERVICE,
        "Number of farm/project/site plans developed",
        "number_of_plans_developed",
    )
    .context(context)
    .line_item("Debris", "Removal", "Total Plans")
}

/// Every worksheet read by a run, in extraction order.
pub fn default_plan() -> Vec<SheetPlan> {
    vec![
        SheetPlan {
            sheet: RLP_BASELINE,
            workbooks: WorkbookSet::OutputReports,
            extractions: vec![baseline(RLP_BASELINE, "Baseline Data")],
        },
        SheetPlan {
            sheet: FINAL_BASELINE,
            workbooks: WorkbookSet::FinalReports,
            extractions: vec![baseline(FINAL_BASELINE, "Baseline data sets")],
        },
        engagement_sheet(RLP_ENGAGEMENT, WorkbookSet::OutputReports),
        engagement_sheet(FINAL_ENGAGEMENT, WorkbookSet::FinalReports),
        SheetPlan {
            sheet: RLP_MANAGEMENT_PLAN,
            workbooks: WorkbookSet::OutputReports,
            extractions: vec![
                Extraction::new(
                    RLP_MANAGEMENT_PLAN,
                    PLAN_SERVICE,
                    "Area (ha) covered by plan",
                    "calculatedareaha",
                )
                .facts("calculatedareaha", "areainvoicedha", "area_ha_covered_by_plan_s")
                .context("type_of_plan")
                .species("species_and_or_threatened_ecological_communities_covered_in_plan")
                .line_item("Debris", "Removal", "Total Area (Ha)"),
                plans_developed(RLP_MANAGEMENT_PLAN, "type_of_plan"),
            ],
        },
        SheetPlan {
            sheet: FINAL_MANAGEMENT_PLAN,
            workbooks: WorkbookSet::FinalReports,
            extractions: vec![plans_developed(FINAL_MANAGEMENT_PLAN, "management_plan_type")],
        },
    ]
}
