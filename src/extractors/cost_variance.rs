//! Food cost variance report: actual versus ideal cost per product category.

use crate::classifier::{is_summary_label, is_total_label};
use crate::document::{decode_document, CellValue, RawSheet};
use crate::error::Result;
use crate::header_map::HeaderMap;
use crate::locator::{locate, NamedRow, DEFAULT_HEADER_KEYWORDS};
use crate::schema::CostVarianceSummary;
use crate::utils::{non_negative, round2};
use crate::values::parse_locale_number;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostVarianceField {
    Category,
    Actual,
    Ideal,
}

const COST_VARIANCE_ALIASES: &[(CostVarianceField, &[&str])] = &[
    (
        CostVarianceField::Category,
        &["Categorie", "Groep", "Omschrijving", "Category", "Description"],
    ),
    (
        CostVarianceField::Actual,
        &["Werkelijk", "Werkelijke Kosten", "Werkelijk Verbruik", "Actual", "Actual Cost"],
    ),
    (
        CostVarianceField::Ideal,
        &["Ideaal", "Ideale Kosten", "Theoretisch", "Ideal", "Ideal Cost"],
    ),
];

pub const COST_VARIANCE_HEADERS: HeaderMap<CostVarianceField> =
    HeaderMap::new(COST_VARIANCE_ALIASES);

const COST_VARIANCE_HEADER_KEYWORDS: &[&str] =
    &["categorie", "category", "werkelijk", "actual", "ideaal", "ideal"];

fn category_label(row: &NamedRow) -> &CellValue {
    COST_VARIANCE_HEADERS
        .resolve(row, CostVarianceField::Category)
        .unwrap_or_else(|| row.first_cell())
}

fn costs(row: &NamedRow) -> (f64, f64) {
    let amount = |field| {
        COST_VARIANCE_HEADERS
            .resolve(row, field)
            .and_then(parse_locale_number)
            .unwrap_or(0.0)
    };
    (
        amount(CostVarianceField::Actual),
        amount(CostVarianceField::Ideal),
    )
}

/// Actual and ideal cost for the whole report. The report's own total row is
/// used when present (the last one, so a grand total beats subtotals);
/// otherwise the category rows are summed. Average rows count as neither.
/// `None` when actual cost is zero.
pub fn extract_cost_variance(bytes: &[u8]) -> Result<Option<CostVarianceSummary>> {
    let sheets = decode_document(bytes)?;
    Ok(extract_cost_variance_sheets(&sheets))
}

pub fn extract_cost_variance_sheets(sheets: &[RawSheet]) -> Option<CostVarianceSummary> {
    let keywords: Vec<&str> = DEFAULT_HEADER_KEYWORDS
        .iter()
        .chain(COST_VARIANCE_HEADER_KEYWORDS)
        .copied()
        .collect();

    let mut total_row: Option<(f64, f64)> = None;
    let mut summed = (0.0, 0.0);
    let mut category_rows = 0usize;
    let mut average_rows = 0usize;

    for sheet in sheets {
        let table = locate(sheet, &keywords);
        for row in &table.rows {
            let (actual, ideal) = costs(row);
            let label = category_label(row);
            if is_total_label(label) {
                total_row = Some((actual, ideal));
            } else if is_summary_label(label) {
                average_rows += 1;
            } else {
                summed.0 += actual;
                summed.1 += ideal;
                category_rows += 1;
            }
        }
    }

    let from_total_row = total_row.is_some();
    let (actual, ideal) = total_row.unwrap_or(summed);
    debug!(
        "Cost variance: {} category rows, {} average rows, total row {}",
        category_rows,
        average_rows,
        if from_total_row { "found" } else { "absent" }
    );

    let actual_cost = round2(non_negative(actual));
    let ideal_cost = round2(non_negative(ideal));
    if actual_cost == 0.0 {
        info!("Cost variance report has no actual cost");
        return None;
    }

    let variance_pct = if ideal_cost > 0.0 {
        round2((actual_cost - ideal_cost) / ideal_cost * 100.0)
    } else {
        0.0
    };

    Some(CostVarianceSummary {
        actual_cost,
        ideal_cost,
        variance: round2(actual_cost - ideal_cost),
        variance_pct,
        from_total_row,
    })
}
