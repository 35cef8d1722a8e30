use crate::types::{ProjectServiceEntry, ServicePair};

/// Target value recorded for synthesized service rows.
pub const TARGET_MISSING: f64 = 0.0;

/// Pair every project id with every catalogue service for one year.
///
/// Produces exactly `ids.len() * catalogue.len()` entries, ordered by
/// project id and then by catalogue position. Targets are the missing
/// sentinel.
pub fn ids_by_df<S: AsRef<str>>(
    ids: &[S],
    catalogue: &[ServicePair],
    financial_year: &str,
) -> Vec<ProjectServiceEntry> {
    let mut sorted: Vec<&str> = ids.iter().map(|s| s.as_ref()).collect();
    sorted.sort();
    let mut out = Vec::with_capacity(sorted.len() * catalogue.len());
    for id in sorted {
        for pair in catalogue {
            out.push(ProjectServiceEntry {
                merit_project_id: id.to_string(),
                service: pair.service.clone(),
                target_measure: pair.target_measure.clone(),
                total_to_be_delivered: Some(TARGET_MISSING),
                report_financial_year: financial_year.to_string(),
                fy_target: Some(TARGET_MISSING),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<ServicePair> {
        [
            ("Collecting, or synthesising baseline data", "Number of baseline data sets collected and/or synthesised"),
            ("Community/stakeholder engagement", "Number of field days"),
            ("Developing farm/project/site management plan", "Area (ha) covered by plan"),
        ]
        .iter()
        .map(|(s, t)| ServicePair {
            service: s.to_string(),
            target_measure: t.to_string(),
        })
        .collect()
    }

    #[test]
    fn cross_product_has_every_pair_once() {
        let rows = ids_by_df(&["p2", "p1"], &catalogue(), "2021/2022");
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.report_financial_year == "2021/2022"));
        assert!(rows.iter().all(|r| r.total_to_be_delivered == Some(0.0)));
        assert!(rows.iter().all(|r| r.fy_target == Some(0.0)));
        assert_eq!(rows[0].merit_project_id, "p1");
        assert_eq!(rows[2].merit_project_id, "p1");
        assert_eq!(rows[3].merit_project_id, "p2");
        assert_eq!(rows[4].target_measure, "Number of field days");
    }

    #[test]
    fn empty_inputs_give_no_rows() {
        let none: [&str; 0] = [];
        assert!(ids_by_df(&none, &catalogue(), "2018/2019").is_empty());
        assert!(ids_by_df(&["p1"], &[], "2018/2019").is_empty());
    }
}
