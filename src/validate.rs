//! Service validation gate.
//!
//! A line item is only a legitimate fact when its project has a catalogue
//! entry for the same service, target measure and financial year. Misses
//! are not errors; they come back as typed rejections.

use crate::lookup::LookupStore;
use crate::types::{LineItem, RejectReason, Rejection, ServiceTarget};

/// A line item that passed the gate with the targets it inherited.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub line: LineItem,
    pub target: ServiceTarget,
    pub grant_or_procurement: String,
}

#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub kept: Vec<Validated>,
    pub rejected: Vec<Rejection>,
}

/// Inner-join `lines` against the project-services catalogue.
///
/// Catalogue keys are unique, so each line matches at most once and
/// `kept.len() + rejected.len() == lines.len()`.
pub fn join_by_service_target_measure(
    lines: Vec<LineItem>,
    lookups: &LookupStore,
    source_sheetname: &str,
    grant_or_procurement: &str,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for line in lines {
        let matched = line
            .key()
            .map(|key| (lookups.service_target(&key), key));
        match matched {
            Some((Some(target), _)) => outcome.kept.push(Validated {
                line,
                target,
                grant_or_procurement: grant_or_procurement.to_string(),
            }),
            Some((None, key)) => {
                let reason = if lookups.has_services(&key.merit_project_id) {
                    RejectReason::NoServiceTarget
                } else {
                    RejectReason::UnknownProject
                };
                outcome.rejected.push(rejection(&line, source_sheetname, reason));
            }
            None => outcome.rejected.push(rejection(
                &line,
                source_sheetname,
                RejectReason::IncompleteKey,
            )),
        }
    }
    outcome
}

fn rejection(line: &LineItem, source_sheetname: &str, reason: RejectReason) -> Rejection {
    Rejection {
        source_sheetname: source_sheetname.to_string(),
        merit_project_id: line.project.merit_project_id.clone(),
        service: line.service.clone(),
        target_measure: line.target_measure.clone(),
        report_financial_year: line.report.report_financial_year.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Facts, ProjectFields, ProjectServiceEntry, ReportFields};

    const SERVICE: &str = "Community/stakeholder engagement";
    const FIELD_DAYS: &str = "Number of field days";

    fn line(id: Option<&str>, measure: &str, fy: Option<&str>) -> LineItem {
        LineItem {
            project: ProjectFields {
                merit_project_id: id.map(String::from),
                ..Default::default()
            },
            report: ReportFields {
                report_financial_year: fy.map(String::from),
                report_status: Some("Approved".into()),
                ..Default::default()
            },
            service: SERVICE.into(),
            target_measure: measure.into(),
            category: None,
            context: None,
            species: None,
            facts: Facts::default(),
        }
    }

    fn store() -> LookupStore {
        let mut store = LookupStore::default();
        store.install_project_services(
            vec![],
            vec![ProjectServiceEntry {
                merit_project_id: "P1".into(),
                service: SERVICE.into(),
                target_measure: FIELD_DAYS.into(),
                total_to_be_delivered: Some(12.0),
                report_financial_year: "2021/2022".into(),
                fy_target: Some(3.0),
            }],
        );
        store
    }

    #[test]
    fn matching_rows_inherit_targets() {
        let outcome = join_by_service_target_measure(
            vec![line(Some("P1"), FIELD_DAYS, Some("2021/2022"))],
            &store(),
            "Sheet",
            "procurement",
        );
        assert_eq!(outcome.kept.len(), 1);
        assert!(outcome.rejected.is_empty());
        let kept = &outcome.kept[0];
        assert_eq!(kept.target.total_to_be_delivered, Some(12.0));
        assert_eq!(kept.target.fy_target, Some(3.0));
        assert_eq!(kept.grant_or_procurement, "procurement");
    }

    #[test]
    fn gate_is_a_strict_filter_with_reasons() {
        let lines = vec![
            line(Some("P1"), FIELD_DAYS, Some("2021/2022")),
            line(Some("P1"), FIELD_DAYS, Some("2019/2020")),
            line(Some("P1"), "Number of on-ground works", Some("2021/2022")),
            line(Some("P9"), FIELD_DAYS, Some("2021/2022")),
            line(None, FIELD_DAYS, Some("2021/2022")),
            line(Some("P1"), FIELD_DAYS, None),
        ];
        let total = lines.len();
        let lookups = store();
        let outcome = join_by_service_target_measure(lines, &lookups, "Sheet", "procurement");
        assert!(outcome.kept.len() <= total);
        assert_eq!(outcome.kept.len() + outcome.rejected.len(), total);
        for kept in &outcome.kept {
            let key = kept.line.key().unwrap();
            assert!(lookups.service_target(&key).is_some());
        }
        let reasons: Vec<RejectReason> = outcome.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::NoServiceTarget,
                RejectReason::NoServiceTarget,
                RejectReason::UnknownProject,
                RejectReason::IncompleteKey,
                RejectReason::IncompleteKey,
            ]
        );
        assert_eq!(outcome.rejected[2].merit_project_id.as_deref(), Some("P9"));
        assert_eq!(outcome.rejected[0].source_sheetname, "Sheet");
    }
}
