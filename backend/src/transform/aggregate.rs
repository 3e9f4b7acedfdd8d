//! Build the Main List from ready rows.
//!
//! ```text
//! Ready rows                         Main List
//! ┌──────────────────────┐          ┌──────────────────────────┐
//! │ X1  qty 2  ship S1   │          │ X1 │ 5(2в одну, 3в одну) │
//! │ X1  qty 3  ship S2   │    →     │ Y7 │ 1                   │
//! │ Y7  qty 1  ship S2   │          │    │                     │  x2 spacer
//! └──────────────────────┘          │ X1 — 3; Y7 — 1           │  S2 only
//!                                   └──────────────────────────┘
//! ```
//!
//! Groups are emitted in lexical (code point) order of their key, for
//! articles and for shipments alike. Rows with an empty article are left
//! out of both sections; rows with an empty shipment number are left out
//! of the shipment section.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ArticleSummary, MainList, ReadyRow, ShipmentLine};

/// Literal suffix of a note entry: "N in one package".
pub const NOTE_SUFFIX: &str = "в одну";

/// Note for one article: distinct quantities above 1, ascending.
///
/// `[1, 1, 2, 2, 3]` → `"2в одну, 3в одну"`; all ones → `""`.
pub fn build_note<I>(quantities: I) -> String
where
    I: IntoIterator<Item = u64>,
{
    let bigger: BTreeSet<u64> = quantities.into_iter().filter(|&q| q > 1).collect();

    bigger
        .iter()
        .map(|q| format!("{}{}", q, NOTE_SUFFIX))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One summary per distinct article, sorted by article.
pub fn summarize_articles(rows: &[ReadyRow]) -> Vec<ArticleSummary> {
    let mut groups: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.article.is_empty()) {
        groups.entry(row.article.as_str()).or_default().push(row.quantity);
    }

    groups
        .into_iter()
        .map(|(article, quantities)| ArticleSummary {
            article: article.to_string(),
            total: quantities.iter().fold(0, |acc: u64, &q| acc.saturating_add(q)),
            note: build_note(quantities),
        })
        .collect()
}

/// One line per shipment that holds more than one distinct article.
pub fn multi_article_shipments(rows: &[ReadyRow]) -> Vec<ShipmentLine> {
    let mut shipments: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    for row in rows
        .iter()
        .filter(|r| !r.shipment.is_empty() && !r.article.is_empty())
    {
        let qty = shipments
            .entry(row.shipment.as_str())
            .or_default()
            .entry(row.article.as_str())
            .or_default();
        *qty = qty.saturating_add(row.quantity);
    }

    shipments
        .into_iter()
        .filter(|(_, items)| items.len() > 1)
        .map(|(shipment, items)| ShipmentLine {
            shipment: shipment.to_string(),
            items: items
                .into_iter()
                .map(|(article, qty)| (article.to_string(), qty))
                .collect(),
        })
        .collect()
}

/// Both sections of the Main List.
pub fn build_main_list(rows: &[ReadyRow]) -> MainList {
    MainList {
        articles: summarize_articles(rows),
        shipments: multi_article_shipments(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{is_shipment_line_shape, RowKind};

    fn row(article: &str, quantity: u64, shipment: &str) -> ReadyRow {
        ReadyRow::new(article, quantity, shipment)
    }

    #[test]
    fn test_note_distinct_sorted_above_one() {
        assert_eq!(build_note([1, 1, 2, 2, 3]), "2в одну, 3в одну");
        assert_eq!(build_note([3, 2, 3]), "2в одну, 3в одну");
        assert_eq!(build_note([1, 1, 1]), "");
        assert_eq!(build_note([0, 1]), "");
        assert_eq!(build_note(Vec::new()), "");
    }

    #[test]
    fn test_annotated_summary() {
        let rows: Vec<ReadyRow> = [1, 1, 2, 2, 3].iter().map(|&q| row("A", q, "S")).collect();
        let summaries = summarize_articles(&rows);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total, 9);
        assert_eq!(summaries[0].note, "2в одну, 3в одну");
        assert_eq!(summaries[0].display_quantity(), "9(2в одну, 3в одну)");
    }

    #[test]
    fn test_plain_summary_has_no_parentheses() {
        let rows = vec![row("A", 1, "S1"), row("A", 1, "S2"), row("A", 0, "S3")];
        let summaries = summarize_articles(&rows);

        assert_eq!(summaries[0].note, "");
        assert_eq!(summaries[0].display_quantity(), "2");
    }

    #[test]
    fn test_total_independent_of_row_order() {
        let mut rows = vec![
            row("B", 4, "S1"),
            row("A", 2, "S2"),
            row("B", 1, "S3"),
            row("A", 7, "S4"),
            row("B", 0, "S5"),
        ];
        let forward = summarize_articles(&rows);
        rows.reverse();
        let backward = summarize_articles(&rows);

        assert_eq!(forward, backward);
        assert_eq!(forward[0].total, 9);
        assert_eq!(forward[1].total, 5);
    }

    #[test]
    fn test_articles_sorted_lexically() {
        let rows = vec![row("b2", 1, "S1"), row("A1", 1, "S2"), row("a1", 1, "S3"), row("B1", 1, "S4")];
        let order: Vec<String> = summarize_articles(&rows).into_iter().map(|s| s.article).collect();

        assert_eq!(order, vec!["A1", "B1", "a1", "b2"]);
    }

    #[test]
    fn test_shipment_line_sums_and_sorts() {
        let rows = vec![row("B", 3, "S1"), row("A", 2, "S1"), row("A", 1, "S1")];
        let lines = multi_article_shipments(&rows);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].shipment, "S1");
        assert_eq!(lines[0].render(), "A — 3; B — 3");
    }

    #[test]
    fn test_single_article_shipment_skipped() {
        let rows = vec![row("A", 5, "S1"), row("A", 1, "S1"), row("B", 1, "S2")];
        assert!(multi_article_shipments(&rows).is_empty());
    }

    #[test]
    fn test_shipments_sorted_lexically() {
        let rows = vec![
            row("A", 1, "S2"),
            row("B", 1, "S2"),
            row("C", 1, "S10"),
            row("D", 1, "S10"),
        ];
        let order: Vec<String> = multi_article_shipments(&rows).into_iter().map(|l| l.shipment).collect();

        assert_eq!(order, vec!["S10", "S2"]);
    }

    #[test]
    fn test_missing_keys_dropped() {
        let rows = vec![
            row("", 4, "S1"),
            row("A", 1, "S1"),
            row("B", 2, ""),
            row("A", 1, ""),
        ];
        let list = build_main_list(&rows);

        assert_eq!(list.articles.len(), 2);
        assert_eq!(list.articles[0].total, 2);
        assert!(list.shipments.is_empty());
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let rows = vec![
            row("A", u64::MAX, "S1"),
            row("A", u64::MAX, "S1"),
            row("B", 1, "S1"),
        ];
        let list = build_main_list(&rows);

        assert_eq!(list.articles[0].total, u64::MAX);
        assert_eq!(list.shipments[0].items[0], ("A".to_string(), u64::MAX));
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![row("A", 2, "S1"), row("B", 3, "S1"), row("A", 1, "S2")];
        assert_eq!(build_main_list(&rows), build_main_list(&rows));
    }

    #[test]
    fn test_row_shapes() {
        let rows = vec![row("A;1", 1, "S1"), row("B—2", 2, "S1")];
        let body = build_main_list(&rows).rows();

        for out in &body {
            assert_eq!(out.kind == RowKind::Shipment, is_shipment_line_shape(&out.cells));
        }
        assert_eq!(body.last().unwrap().cells[0], "A;1 — 1; B—2 — 2");
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Only the two waiting rows of S1 are ready; the third row was filtered upstream
        let rows = vec![row("X1", 2, "S1"), row("X1", 3, "S1")];
        let list = build_main_list(&rows);
        let body = list.rows();

        assert_eq!(body.len(), 3);
        assert_eq!(body[0].cells, ["X1".to_string(), "5(2в одну, 3в одну)".into(), "".into()]);
        assert_eq!(body[1].kind, RowKind::Spacer);
        assert_eq!(body[2].kind, RowKind::Spacer);
        assert!(list.shipments.is_empty());
    }
}
