use crate::error::ExportError;
use crate::report::{format_amount, Report};

/// Flat CSV of a report: title lines, KPI totals, then each table with its
/// header row. Amount cells keep their display text.
pub(crate) fn render(report: &Report) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record([report.title.as_str(), report.subtitle.as_str()])?;
    writer.write_record([report.generated.as_str()])?;

    if let Some(totals) = &report.totals {
        let values = [totals.income, totals.expense, totals.profit];
        for (label, value) in report.kpi_labels.iter().zip(values) {
            let amount = format!("{} {}", format_amount(value), report.currency);
            writer.write_record([label.as_str(), amount.as_str()])?;
        }
    }

    for section in &report.sections {
        writer.write_record([""])?;
        writer.write_record(&section.headers)?;
        for row in &section.rows {
            writer.write_record(&row.cells)?;
        }
    }
    if let Some(note) = &report.note {
        writer.write_record([note.as_str()])?;
    }

    writer.into_inner().map_err(|err| err.into_error().into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::labels::{Labels, Lang};
    use crate::model::{Database, Expense};
    use crate::period::Period;

    #[test]
    fn analysis_csv_lists_kpis_and_breakdowns() {
        let labels = Labels::for_lang(Lang::Ru);
        let mut db = Database::default();
        db.expenses.push(Expense {
            id: 1,
            date: "2024-03-04".to_string(),
            time: "09:00".to_string(),
            category: "Rent, office".to_string(),
            amount: 2500.0,
            description: String::new(),
        });
        let period = Period::month("2024-03").unwrap();
        let report = crate::report::analysis_report(&db, &period, labels, "now");

        let text = String::from_utf8(render(&report).unwrap()).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect();

        assert_eq!(rows[0][0], labels.analysis_title);
        assert!(rows.contains(&vec![
            labels.kpi_expense.to_string(),
            "2 500 c.".to_string()
        ]));
        assert!(rows.contains(&vec!["Rent, office".to_string(), "2 500 c.".to_string()]));
    }
}
