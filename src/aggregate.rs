use crate::error::PipelineResult;
use crate::table::Table;
use std::collections::{BTreeMap, BTreeSet};

/// Separator between values of a multi-value attribute.
pub const MULTI_VALUE_SEPARATOR: &str = "|";

/// One group of a fan-out attribute: key cells and the joined values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValue {
    pub key: Vec<String>,
    pub value: String,
}

/// Join already-normalized (key, value) pairs, one entry per key.
///
/// Values are compared as text, so a value repeated under a key appears
/// once. Each group is sorted before joining.
pub fn conc_pairs<K, I>(pairs: I) -> BTreeMap<K, String>
where
    K: Ord,
    I: IntoIterator<Item = (K, String)>,
{
    let mut groups: BTreeMap<K, BTreeSet<String>> = BTreeMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().insert(value);
    }
    groups
        .into_iter()
        .map(|(key, values)| {
            let joined = values.into_iter().collect::<Vec<_>>().join(MULTI_VALUE_SEPARATOR);
            (key, joined)
        })
        .collect()
}

/// Collapse many rows per key into one `|`-joined value.
///
/// Cells are trimmed and rendered as text first; rows with an empty value
/// (or an empty key cell) are dropped and duplicates are removed on the
/// rendered text. The result does not depend on input row order. Output is
/// ordered by key; a key whose rows were all dropped does not appear.
pub fn conc_col(table: &Table, group_cols: &[&str], agg_col: &str) -> PipelineResult<Vec<MultiValue>> {
    let key_idx = group_cols
        .iter()
        .map(|c| table.require(c))
        .collect::<PipelineResult<Vec<_>>>()?;
    let value_idx = table.require(agg_col)?;

    let pairs = table.rows().filter_map(|row| {
        let value = row[value_idx].as_text()?;
        let key: Vec<String> = key_idx
            .iter()
            .map(|&i| row[i].as_text())
            .collect::<Option<_>>()?;
        Some((key, value))
    });
    Ok(conc_pairs(pairs)
        .into_iter()
        .map(|(key, value)| MultiValue { key, value })
        .collect())
}

/// `conc_col` keyed by one column, as a lookup map.
pub fn conc_col_by(table: &Table, key_col: &str, agg_col: &str) -> PipelineResult<BTreeMap<String, String>> {
    Ok(conc_col(table, &[key_col], agg_col)?
        .into_iter()
        .filter_map(|mv| {
            let MultiValue { mut key, value } = mv;
            key.pop().map(|k| (k, value))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn pairs(rows: &[(&str, Option<&str>)]) -> Table {
        let mut t = Table::new("RLP Outcomes", vec!["merit_project_id".into(), "outcome".into()]);
        for (id, value) in rows {
            t.push_row(vec![
                Cell::text(*id),
                value.map(Cell::text).unwrap_or_default(),
            ]);
        }
        t
    }

    #[test]
    fn duplicates_removed_and_values_sorted() {
        let t = pairs(&[("p1", Some("B")), ("p1", Some("A")), ("p1", Some("A"))]);
        let out = conc_col(&t, &["merit_project_id"], "outcome").unwrap();
        assert_eq!(
            out,
            vec![MultiValue {
                key: vec!["p1".into()],
                value: "A|B".into()
            }]
        );
    }

    #[test]
    fn nulls_dropped_and_empty_groups_absent() {
        let t = pairs(&[("p1", None), ("p2", Some("Soil")), ("p2", None)]);
        let out = conc_col_by(&t, "merit_project_id", "outcome").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("p2").map(String::as_str), Some("Soil"));
        assert!(!out.contains_key("p1"));
    }

    #[test]
    fn order_independent_and_idempotent() {
        let forward = pairs(&[("p1", Some("C")), ("p1", Some("A")), ("p2", Some("B"))]);
        let reverse = pairs(&[("p2", Some("B")), ("p1", Some("A")), ("p1", Some("C"))]);
        let first = conc_col(&forward, &["merit_project_id"], "outcome").unwrap();
        assert_eq!(first, conc_col(&reverse, &["merit_project_id"], "outcome").unwrap());

        let again_input = pairs(
            &first
                .iter()
                .map(|mv| (mv.key[0].as_str(), Some(mv.value.as_str())))
                .collect::<Vec<_>>(),
        );
        let again = conc_col(&again_input, &["merit_project_id"], "outcome").unwrap();
        assert_eq!(first, again);
        assert!(again.len() <= 2);
    }

    #[test]
    fn composite_keys() {
        let mut t = Table::new("x", vec!["a".into(), "b".into(), "v".into()]);
        t.push_row(vec!["1".into(), "x".into(), "q".into()]);
        t.push_row(vec!["1".into(), "y".into(), "r".into()]);
        t.push_row(vec!["1".into(), "x".into(), "p".into()]);
        let out = conc_col(&t, &["a", "b"], "v").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key, vec!["1", "x"]);
        assert_eq!(out[0].value, "p|q");
    }

    #[test]
    fn duplicates_compared_after_trimming_and_rendering() {
        let mut t = Table::new("RLP Outcomes", vec!["merit_project_id".into(), "outcome".into()]);
        t.push_row(vec!["p1".into(), "A".into()]);
        t.push_row(vec!["p1".into(), "A ".into()]);
        t.push_row(vec!["p1".into(), Cell::Number(5.0)]);
        t.push_row(vec![" p1".into(), "5".into()]);
        let out = conc_col_by(&t, "merit_project_id", "outcome").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["p1"], "5|A");
    }

    #[test]
    fn pairs_join_per_key() {
        let out = conc_pairs(vec![
            ("p2".to_string(), "Koala".to_string()),
            ("p1".to_string(), "Quoll".to_string()),
            ("p2".to_string(), "Emu".to_string()),
            ("p2".to_string(), "Koala".to_string()),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out["p2"], "Emu|Koala");
        assert_eq!(out["p1"], "Quoll");
    }

    #[test]
    fn unknown_value_column_is_an_error() {
        let t = pairs(&[]);
        assert!(conc_col(&t, &["merit_project_id"], "asset").is_err());
    }
}
