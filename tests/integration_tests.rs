use chrono::NaiveDate;
use kpi_history_builder::*;
use rust_xlsxwriter::Workbook;

enum Cell {
    S(&'static str),
    N(f64),
    E,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Spreadsheet serial number of `date`, as a workbook stores an unformatted date.
fn serial(date: NaiveDate) -> f64 {
    (date - ymd(1899, 12, 30)).num_days() as f64
}

fn workbook(sheets: &[(&str, Vec<Vec<Cell>>)]) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::S(s) => {
                        worksheet.write_string(r as u32, c as u16, *s)?;
                    }
                    Cell::N(n) => {
                        worksheet.write_number(r as u32, c as u16, *n)?;
                    }
                    Cell::E => {}
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn assert_strictly_ascending(entries: &[DailyEntry]) {
    assert!(
        entries.windows(2).all(|w| w[0].date < w[1].date),
        "Entries should be strictly ascending by date"
    );
}

#[test]
fn test_operational_scenario_from_csv() -> anyhow::Result<()> {
    let csv = "\
KPI rapport;;;;;
Vestiging Utrecht;;;;;
;;;;;
Datum;Dag;Netto Omzet;Arbeidskosten;% Arbeidskosten;Orders
01-03-2026;Zondag;1050,00;260,00;24,8;45
Totaal;;1050,00;260,00;24,8;45
";
    let entries = extract_operational(csv.as_bytes())?;

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.date, ymd(2026, 3, 1));
    assert_eq!(entry.day_name, "Zondag");
    assert_eq!(entry.net_revenue, 1050.0);
    assert_eq!(entry.labour_cost, 260.0);
    assert_eq!(entry.labour_pct, 24.8);
    assert_eq!(entry.order_count, 45);
    assert!(entry.cash_difference.is_none());
    assert!(entry.planned_labour_pct.is_none());
    Ok(())
}

#[test]
fn test_operational_scenario_from_workbook() -> anyhow::Result<()> {
    use Cell::*;

    let bytes = workbook(&[(
        "Maart",
        vec![
            vec![S("KPI rapport")],
            vec![S("Vestiging Utrecht")],
            vec![],
            vec![
                S("Datum"),
                S("Dag"),
                S("Netto Omzet"),
                S("Arbeidskosten"),
                S("% Arbeidskosten"),
                S("Orders"),
            ],
            vec![
                N(serial(ymd(2026, 3, 1))),
                S("Zondag"),
                N(1050.0),
                N(260.0),
                N(0.248),
                N(45.0),
            ],
            vec![S("Totaal"), E, N(1050.0), N(260.0), N(0.248), N(45.0)],
        ],
    )])?;

    let entries = extract_operational(&bytes)?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date, ymd(2026, 3, 1));
    assert_eq!(entries[0].net_revenue, 1050.0);
    assert_eq!(entries[0].labour_pct, 24.8);
    assert_eq!(entries[0].order_count, 45);
    Ok(())
}

#[test]
fn test_multi_tab_operational_is_sorted_and_unique() -> anyhow::Result<()> {
    use Cell::*;

    let bytes = workbook(&[
        (
            "Week 10",
            vec![
                vec![S("Datum"), S("Netto Omzet"), S("Manager")],
                vec![S("05-03-2026"), N(900.0), S("Totaalbeer")],
                vec![S("03-03-2026"), N(700.0), S("De Vries")],
                vec![S("03-03-2026"), N(750.0), S("De Vries")],
            ],
        ),
        (
            "Week 9",
            vec![
                vec![S("Datum"), S("Netto Omzet"), S("Manager")],
                vec![S("01-03-2026"), N(500.0), S("Bakker")],
                vec![S("03-03-2026"), N(800.0), S("Bakker")],
                vec![S("Gemiddeld"), N(650.0), E],
            ],
        ),
    ])?;

    let entries = extract_operational(&bytes)?;
    assert_strictly_ascending(&entries);

    let dates: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![ymd(2026, 3, 1), ymd(2026, 3, 3), ymd(2026, 3, 5)]);

    // Later tab wins for a shared date.
    assert_eq!(entries[1].net_revenue, 800.0);
    assert_eq!(entries[1].manager, "Bakker");
    // A surname containing "totaal" is not a summary row.
    assert_eq!(entries[2].manager, "Totaalbeer");
    Ok(())
}

#[test]
fn test_windows_1252_csv() -> anyhow::Result<()> {
    let bytes = b"Datum;Netto Omzet;Manager\n01-03-2026;\x80 1.050,00;Jos\xe9\n";
    let entries = extract_operational(bytes)?;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].net_revenue, 1050.0);
    assert_eq!(entries[0].manager, "Jos\u{e9}");
    Ok(())
}

#[test]
fn test_empty_input_for_every_extractor() -> anyhow::Result<()> {
    assert!(extract_operational(&[])?.is_empty());
    assert!(extract_monthly_service(&[])?.is_none());
    assert!(extract_timekeeping_daily(&[])?.is_empty());
    assert!(extract_timekeeping_rate(&[])?.is_none());
    assert!(extract_cost_variance(&[])?.is_none());

    let config = ReconciliationConfig::default();
    assert!(KpiHistoryProcessor::reconcile_month(&[], &[], None, &config)?.is_empty());
    Ok(())
}

#[test]
fn test_metadata_only_document_is_empty_not_error() -> anyhow::Result<()> {
    let csv = "Rapport gegenereerd op 01-04-2026\nFiliaal: Utrecht\n";
    assert!(extract_operational(csv.as_bytes())?.is_empty());
    assert!(extract_monthly_service(csv.as_bytes())?.is_none());
    Ok(())
}

#[test]
fn test_malformed_documents_are_errors() {
    let binary = [0x00, 0x01, 0x02, 0xFF, 0x00, 0x10];
    assert!(matches!(
        extract_operational(&binary),
        Err(IngestError::MalformedDocument(_))
    ));

    let broken_zip = b"PK\x03\x04this is not a workbook";
    assert!(extract_timekeeping_daily(broken_zip).is_err());
}

fn service_workbook() -> anyhow::Result<Vec<u8>> {
    use Cell::*;

    workbook(&[
        (
            "Delivery",
            vec![
                vec![S("Besteldatum"), S("Bedrag"), S("Wachttijd")],
                vec![N(serial(ymd(2026, 3, 2))), N(40.0), N(20.0)],
                vec![N(serial(ymd(2026, 3, 2))), N(60.0), N(30.0)],
                vec![N(serial(ymd(2026, 3, 3))), N(100.0), N(40.0)],
                vec![N(serial(ymd(2026, 3, 3))), N(0.0), N(10.0)],
            ],
        ),
        (
            "Pickup",
            vec![
                vec![S("Besteldatum"), S("Bedrag"), S("Wachttijd")],
                vec![N(serial(ymd(2026, 3, 3))), N(50.0), N(5.0)],
            ],
        ),
    ])
}

const TIMEKEEPING_CSV: &str = "\
Medewerker;Datum;Uren
Jan;02-03-2026;6
Piet;02-03-2026;4
Jan;03-03-2026;15
Totaal;;25
";

const RATE_CSV: &str = "\
Medewerker,Uren,Kosten
\"Jansen, P.\",10,200
Piet,15,\"300\"
Totaal,25,500
";

#[test]
fn test_monthly_service_from_workbook() -> anyhow::Result<()> {
    let aggregate = extract_monthly_service(&service_workbook()?)?.expect("aggregate");

    assert_eq!(aggregate.month, Some(ymd(2026, 3, 1)));
    assert_eq!(aggregate.order_count, 4);
    assert_eq!(aggregate.delivery_orders, 3);
    assert_eq!(aggregate.pickup_orders, 1);
    assert_eq!(aggregate.gross_revenue, 250.0);
    assert_eq!(aggregate.on_time_delivery_mins, 30.0);
    assert_eq!(aggregate.delivery_rate_30min, 66.67);
    assert_eq!(aggregate.delivery_rate_20min, Some(33.33));
    Ok(())
}

#[test]
fn test_reconcile_month_end_to_end() -> anyhow::Result<()> {
    let config = ReconciliationConfig::default();
    let entries = KpiHistoryProcessor::reconcile_month(
        &service_workbook()?,
        TIMEKEEPING_CSV.as_bytes(),
        Some(RATE_CSV.as_bytes()),
        &config,
    )?;

    assert_eq!(entries.len(), 2);
    assert_strictly_ascending(&entries);

    // 10 and 15 hours: weights 0.4 and 0.6
    assert_eq!(entries[0].gross_revenue, 100.0);
    assert_eq!(entries[1].gross_revenue, 150.0);
    let total: f64 = entries.iter().map(|e| e.gross_revenue).sum();
    assert!((total - 250.0).abs() <= 0.02);

    // 500 cost over 25 hours
    assert_eq!(entries[0].labour_cost, 200.0);
    assert_eq!(entries[1].labour_cost, 300.0);

    for entry in &entries {
        assert_eq!(entry.on_time_delivery_mins, 30.0);
        assert_eq!(entry.delivery_rate_30min, 66.67);
    }
    Ok(())
}

#[test]
fn test_reconcile_month_uses_fallback_rate() -> anyhow::Result<()> {
    let config = ReconciliationConfig::from_json(r#"{"fallbackHourlyRate": 18.0}"#)?;
    let entries = KpiHistoryProcessor::reconcile_month(
        &service_workbook()?,
        TIMEKEEPING_CSV.as_bytes(),
        None,
        &config,
    )?;

    assert_eq!(entries[0].labour_cost, 180.0);
    assert_eq!(entries[1].labour_cost, 270.0);
    Ok(())
}

#[test]
fn test_imported_entries_override_allocated_history() -> anyhow::Result<()> {
    let config = ReconciliationConfig::default();
    let allocated = KpiHistoryProcessor::reconcile_month(
        &service_workbook()?,
        TIMEKEEPING_CSV.as_bytes(),
        Some(RATE_CSV.as_bytes()),
        &config,
    )?;

    let operational = extract_operational(
        "Datum;Netto Omzet;Arbeidskosten\n02-03-2026;120,00;210,00\n".as_bytes(),
    )?;

    let history = KpiHistoryProcessor::build_history(operational, vec![allocated], &config)?;
    assert_eq!(history.len(), 2);
    assert_strictly_ascending(&history);

    let imported_day = &history[0];
    assert_eq!(imported_day.net_revenue, 120.0);
    assert_eq!(imported_day.labour_cost, 210.0);
    // Carried over from the allocated entry.
    assert_eq!(imported_day.gross_revenue, 100.0);
    assert_eq!(imported_day.on_time_delivery_mins, 30.0);
    assert_eq!(imported_day.worked_hours, 10.0);

    assert_eq!(history[1].net_revenue, 150.0);
    Ok(())
}

#[test]
fn test_cost_variance_from_csv() -> anyhow::Result<()> {
    let csv = "\
Categorie;Werkelijk;Ideaal
Vlees;\"1.250,00\";\"1.100,00\"
Groente;400,00;420,00
Totaal;\u{20ac} 1.650,00;\u{20ac} 1.520,00
";
    let summary = extract_cost_variance(csv.as_bytes())?.expect("summary");
    assert!(summary.from_total_row);
    assert_eq!(summary.actual_cost, 1650.0);
    assert_eq!(summary.ideal_cost, 1520.0);
    assert_eq!(summary.variance, 130.0);
    assert_eq!(summary.variance_pct, 8.55);
    Ok(())
}

#[test]
fn test_timekeeping_rate_report() -> anyhow::Result<()> {
    let summary = extract_timekeeping_rate(RATE_CSV.as_bytes())?.expect("rate");
    assert_eq!(summary.total_hours, 25.0);
    assert_eq!(summary.total_cost, 500.0);
    assert_eq!(summary.avg_hourly_rate, 20.0);
    Ok(())
}

#[test]
fn test_daily_entry_json_output() -> anyhow::Result<()> {
    let csv = "Datum;Netto Omzet;Kasverschil\n01-03-2026;1050,00;-2,50\n";
    let entries = extract_operational(csv.as_bytes())?;
    let json = serde_json::to_value(&entries)?;

    assert_eq!(json[0]["date"], "2026-03-01");
    assert_eq!(json[0]["netRevenue"], 1050.0);
    assert_eq!(json[0]["cashDifference"], -2.5);
    assert_eq!(json[0]["isoWeekNumber"], 9);
    Ok(())
}
