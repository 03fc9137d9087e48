use crate::document::CellValue;
use crate::locator::NamedRow;

/// Labels of total/average lines in exported reports.
pub const SUMMARY_KEYWORDS: &[&str] = &[
    "totaal",
    "total",
    "gemiddeld",
    "average",
    "gemiddelde",
    "subtotaal",
    "weektotaal",
    "maandtotaal",
];

/// The subset of [`SUMMARY_KEYWORDS`] that marks a total, not an average.
pub const TOTAL_KEYWORDS: &[&str] = &["totaal", "total", "subtotaal", "weektotaal", "maandtotaal"];

fn label_contains_any(cell: &CellValue, keywords: &[&str]) -> bool {
    let Some(text) = cell.as_text() else {
        return false;
    };
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

pub fn is_summary_label(cell: &CellValue) -> bool {
    label_contains_any(cell, SUMMARY_KEYWORDS)
}

pub fn is_total_label(cell: &CellValue) -> bool {
    label_contains_any(cell, TOTAL_KEYWORDS)
}

/// True for total/average rows. Only the date cell and the first cell are
/// inspected, so a free-text column (manager, notes) cannot trigger it.
pub fn is_summary_row(row: &NamedRow) -> bool {
    row.date_cell().is_some_and(is_summary_label) || is_summary_label(row.first_cell())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawSheet;
    use crate::locator::{locate, DEFAULT_HEADER_KEYWORDS};

    fn rows(data: &[Vec<&str>]) -> Vec<NamedRow> {
        locate(&RawSheet::from_strings("t", data), DEFAULT_HEADER_KEYWORDS).rows
    }

    #[test]
    fn test_summary_rows_by_date_or_first_cell() {
        let rows = rows(&[
            vec!["Week", "Datum", "Omzet", "Manager"],
            vec!["9", "01-03-2026", "100", "Totaalbeer"],
            vec!["9", "TOTAAL", "700", ""],
            vec!["Gemiddelde", "01-03-2026", "100", ""],
            vec!["9", "Weektotaal 9", "700", ""],
            vec!["Average", "", "100", ""],
        ]);

        assert!(!is_summary_row(&rows[0]));
        assert!(is_summary_row(&rows[1]));
        assert!(is_summary_row(&rows[2]));
        assert!(is_summary_row(&rows[3]));
        assert!(is_summary_row(&rows[4]));
    }

    #[test]
    fn test_numbers_are_never_summary_labels() {
        assert!(!is_summary_label(&CellValue::Number(1.0)));
        assert!(!is_summary_label(&CellValue::Empty));
        assert!(is_summary_label(&CellValue::text("Maandtotaal maart")));
    }

    #[test]
    fn test_averages_are_not_totals() {
        assert!(is_total_label(&CellValue::text("Subtotaal vers")));
        assert!(is_total_label(&CellValue::text("TOTAL")));
        assert!(!is_total_label(&CellValue::text("Gemiddelde")));
        assert!(!is_total_label(&CellValue::text("Average")));
        assert!(is_summary_label(&CellValue::text("Gemiddelde")));
    }
}
