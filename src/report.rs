use std::cmp::Ordering;

use serde::Serialize;

use crate::aggregate::{self, Breakdown, PeriodTotals};
use crate::labels::Labels;
use crate::model::{Database, Expense, Processing, RecordId, RecordKind, Trade, TradeSide};
use crate::period::{Period, ViewMode};
use crate::stock::StockMap;

/// One row of the combined journal, borrowing the underlying record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerEntry<'a> {
    Trade(&'a Trade),
    Processing(&'a Processing),
    Expense(&'a Expense),
}

/// Journal kinds in sort precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Buy,
    Processing,
    Sell,
    Expense,
}

impl EntryKind {
    pub fn label(self, labels: &Labels) -> &'static str {
        match self {
            EntryKind::Buy => labels.kind_buy,
            EntryKind::Processing => labels.kind_processing,
            EntryKind::Sell => labels.kind_sell,
            EntryKind::Expense => labels.kind_expense,
        }
    }
}

impl<'a> LedgerEntry<'a> {
    pub fn id(&self) -> RecordId {
        match self {
            LedgerEntry::Trade(t) => t.id,
            LedgerEntry::Processing(p) => p.id,
            LedgerEntry::Expense(e) => e.id,
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            LedgerEntry::Trade(_) => RecordKind::Trade,
            LedgerEntry::Processing(_) => RecordKind::Processing,
            LedgerEntry::Expense(_) => RecordKind::Expense,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            LedgerEntry::Trade(t) => match t.side {
                TradeSide::Buy => EntryKind::Buy,
                TradeSide::Sell => EntryKind::Sell,
            },
            LedgerEntry::Processing(_) => EntryKind::Processing,
            LedgerEntry::Expense(_) => EntryKind::Expense,
        }
    }

    pub fn date(&self) -> &'a str {
        match self {
            LedgerEntry::Trade(t) => &t.date,
            LedgerEntry::Processing(p) => &p.date,
            LedgerEntry::Expense(e) => &e.date,
        }
    }

    pub fn time(&self) -> &'a str {
        match self {
            LedgerEntry::Trade(t) => &t.time,
            LedgerEntry::Processing(p) => &p.time,
            LedgerEntry::Expense(e) => &e.time,
        }
    }

    /// Material for trades, source material for conversions, category for
    /// expenses.
    pub fn details_key(&self) -> &'a str {
        match self {
            LedgerEntry::Trade(t) => &t.material,
            LedgerEntry::Processing(p) => &p.from,
            LedgerEntry::Expense(e) => &e.category,
        }
    }

    /// Cash effect as shown in the journal. Conversions move no money.
    pub fn signed_value(&self) -> f64 {
        match self {
            LedgerEntry::Trade(t) => match t.side {
                TradeSide::Buy => -t.total,
                TradeSide::Sell => t.total,
            },
            LedgerEntry::Processing(_) => 0.0,
            LedgerEntry::Expense(e) => -e.amount,
        }
    }

    pub fn mentions_material(&self, material: &str) -> bool {
        match self {
            LedgerEntry::Trade(t) => t.material == material,
            LedgerEntry::Processing(p) => p.from == material || p.to == material,
            LedgerEntry::Expense(_) => false,
        }
    }

    fn compare(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::DateTime => (self.date(), self.time()).cmp(&(other.date(), other.time())),
            SortKey::Kind => self.kind().cmp(&other.kind()),
            SortKey::Details => self.details_key().cmp(other.details_key()),
            SortKey::Value => self.signed_value().total_cmp(&other.signed_value()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DateTime,
    Kind,
    Details,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::DateTime,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Re-selecting the active ascending key flips to descending; anything
    /// else starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { key, direction }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub material: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &LedgerEntry<'_>) -> bool {
        if self.kind.is_some_and(|kind| kind != entry.kind()) {
            return false;
        }
        match &self.material {
            Some(material) => entry.mentions_material(material),
            None => true,
        }
    }
}

/// Period records as journal entries: trades, then conversions, then
/// expenses, each in stored order.
pub fn collect_entries<'a>(
    db: &'a Database,
    period: &Period,
    filter: &EntryFilter,
) -> Vec<LedgerEntry<'a>> {
    let records = period.select(db);
    records
        .trades
        .into_iter()
        .map(LedgerEntry::Trade)
        .chain(records.processing.into_iter().map(LedgerEntry::Processing))
        .chain(records.expenses.into_iter().map(LedgerEntry::Expense))
        .filter(|entry| filter.matches(entry))
        .collect()
}

/// Stable in both directions: equal keys keep encounter order.
pub fn sort_entries(entries: &mut [LedgerEntry<'_>], state: SortState) {
    entries.sort_by(|a, b| match state.direction {
        SortDirection::Asc => a.compare(b, state.key),
        SortDirection::Desc => b.compare(a, state.key),
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub cells: Vec<String>,
    /// Signed money amount behind the last cell, when there is one.
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Journal,
    Stock,
    Analysis,
}

/// A printable document: header, optional KPI totals, then tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub brand: String,
    pub title: String,
    pub subtitle: String,
    /// `<generated label>: dd.MM.yyyy HH:MM`
    pub generated: String,
    pub currency: String,
    pub kpi_labels: [String; 3],
    pub totals: Option<PeriodTotals>,
    pub sections: Vec<ReportSection>,
    /// Shown instead of empty tables.
    pub note: Option<String>,
}

impl Report {
    fn new(
        kind: ReportKind,
        title: &str,
        subtitle: String,
        labels: &Labels,
        generated_at: &str,
    ) -> Self {
        Self {
            kind,
            brand: labels.app_title.to_string(),
            title: title.to_string(),
            subtitle,
            generated: format!("{}: {generated_at}", labels.generated),
            currency: labels.currency.to_string(),
            kpi_labels: [
                labels.kpi_income.to_string(),
                labels.kpi_expense.to_string(),
                labels.kpi_profit.to_string(),
            ],
            totals: None,
            sections: Vec::new(),
            note: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|section| section.rows.is_empty())
    }
}

/// Journal of the period with KPI totals. `generated_at` is the
/// pre-formatted generation timestamp.
pub fn journal_report(
    db: &Database,
    period: &Period,
    filter: &EntryFilter,
    sort: SortState,
    labels: &Labels,
    generated_at: &str,
) -> Report {
    let mut entries = collect_entries(db, period, filter);
    sort_entries(&mut entries, sort);

    let first_column = match period.mode() {
        ViewMode::Day => labels.col_time,
        ViewMode::Month => labels.col_date,
    };
    let rows = entries
        .iter()
        .map(|entry| journal_row(entry, period.mode(), labels))
        .collect();

    let mut report = Report::new(
        ReportKind::Journal,
        labels.journal_title,
        period.title(labels),
        labels,
        generated_at,
    );
    report.totals = Some(aggregate::summarize(db, period));
    report.sections.push(ReportSection {
        headers: vec![
            first_column.to_string(),
            labels.col_type.to_string(),
            labels.col_details.to_string(),
            labels.col_sum.to_string(),
        ],
        rows,
    });
    report
}

pub fn journal_row(entry: &LedgerEntry<'_>, mode: ViewMode, labels: &Labels) -> ReportRow {
    let when = match mode {
        ViewMode::Day => entry.time().to_string(),
        ViewMode::Month => format!("{} {}", short_date(entry.date()), entry.time()),
    };
    let currency = labels.currency;
    let (kind, details, sum, amount) = match entry {
        LedgerEntry::Trade(t) => {
            let mut kind = entry.kind().label(labels).to_string();
            if t.is_deferred() {
                kind.push_str(&format!(" ({})", labels.method_debt));
            }
            let sign = match t.side {
                TradeSide::Buy => '-',
                TradeSide::Sell => '+',
            };
            (
                kind,
                format!("{} - {}", t.material, t.client),
                format!("{sign}{} {currency}", format_amount(t.total)),
                Some(entry.signed_value()),
            )
        }
        LedgerEntry::Processing(p) => (
            entry.kind().label(labels).to_string(),
            format!(
                "{} -> {} ({}kg -> {}kg)",
                p.from, p.to, p.qty_in, p.qty_out
            ),
            "-".to_string(),
            None,
        ),
        LedgerEntry::Expense(e) => (
            entry.kind().label(labels).to_string(),
            format!("{} ({})", labels.category_name(&e.category), e.description),
            format!("-{} {currency}", format_amount(e.amount)),
            Some(entry.signed_value()),
        ),
    };
    ReportRow {
        cells: vec![when, kind, details, sum],
        amount,
    }
}

/// Materials currently on hand, two decimals.
pub fn stock_report(stock: &StockMap, labels: &Labels, generated_at: &str) -> Report {
    let rows: Vec<ReportRow> = stock
        .positive()
        .map(|(material, qty)| ReportRow {
            cells: vec![material.to_string(), format!("{qty:.2} kg")],
            amount: None,
        })
        .collect();

    let mut report = Report::new(
        ReportKind::Stock,
        labels.stock_title,
        String::new(),
        labels,
        generated_at,
    );
    if rows.is_empty() {
        report.note = Some(labels.stock_empty.to_string());
    }
    report.sections.push(ReportSection {
        headers: vec![labels.material.to_string(), labels.weight.to_string()],
        rows,
    });
    report
}

/// KPI table, sales per material, expenses per category.
pub fn analysis_report(
    db: &Database,
    period: &Period,
    labels: &Labels,
    generated_at: &str,
) -> Report {
    let totals = aggregate::summarize(db, period);
    let currency = labels.currency;
    let money = |value: f64| ReportRow {
        cells: Vec::new(),
        amount: Some(value),
    };
    let kpi_rows = [
        (labels.kpi_income, totals.income),
        (labels.kpi_expense, totals.expense),
        (labels.kpi_profit, totals.profit),
    ]
    .into_iter()
    .map(|(name, value)| ReportRow {
        cells: vec![name.to_string(), format!("{} {currency}", format_amount(value))],
        ..money(value)
    })
    .collect();

    let breakdown_rows = |items: Vec<Breakdown>| -> Vec<ReportRow> {
        items
            .into_iter()
            .map(|item| ReportRow {
                cells: vec![
                    labels.category_name(&item.name).to_string(),
                    format!("{} {currency}", format_amount(item.value)),
                ],
                ..money(item.value)
            })
            .collect()
    };

    let mut report = Report::new(
        ReportKind::Analysis,
        labels.analysis_title,
        period.title(labels),
        labels,
        generated_at,
    );
    report.totals = Some(totals);
    report.sections = vec![
        ReportSection {
            headers: vec!["KPI".to_string(), labels.amount.to_string()],
            rows: kpi_rows,
        },
        ReportSection {
            headers: vec![labels.sales_by_material.to_string(), labels.amount.to_string()],
            rows: breakdown_rows(aggregate::sales_by_material(db, period)),
        },
        ReportSection {
            headers: vec![
                labels.expenses_by_category.to_string(),
                labels.amount.to_string(),
            ],
            rows: breakdown_rows(aggregate::expenses_by_category(db, period)),
        },
    ];
    report
}

/// `YYYY-MM-DD` to `dd.MM`; anything unparsable is shown as stored.
fn short_date(date: &str) -> String {
    match crate::period::parse_day(date) {
        Some(day) => day.format("%d.%m").to_string(),
        None => date.to_string(),
    }
}

/// Money with space-grouped thousands and at most two decimals.
pub fn format_amount(value: f64) -> String {
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    let sign = if value < 0.0 && rounded > 0.0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::labels::Lang;
    use crate::model::PaymentMethod;
    use crate::stock::project_stock;

    fn trade(id: RecordId, time: &str, side: TradeSide, material: &str, total: f64) -> Trade {
        Trade {
            id,
            date: "2024-03-15".to_string(),
            time: time.to_string(),
            side,
            material: material.to_string(),
            qty: 1.0,
            price: total,
            client: "Plastmash".to_string(),
            method: PaymentMethod::Cash,
            total,
            is_paid: true,
            date_repaid: None,
        }
    }

    fn sample_db() -> Database {
        let mut db = Database::default();
        db.transactions
            .push(trade(1, "09:00", TradeSide::Buy, "Bottles (Dirty)", 100.0));
        db.transactions
            .push(trade(2, "11:00", TradeSide::Sell, "Flakes (Clean)", 200.0));
        db.expenses.push(Expense {
            id: 3,
            date: "2024-03-15".to_string(),
            time: "10:00".to_string(),
            category: "Fuel".to_string(),
            amount: 50.0,
            description: "truck".to_string(),
        });
        db.processing.push(Processing {
            id: 4,
            date: "2024-03-15".to_string(),
            time: "10:30".to_string(),
            from: "Bottles (Dirty)".to_string(),
            qty_in: 80.0,
            to: "Flakes (Clean)".to_string(),
            qty_out: 72.5,
        });
        db
    }

    fn ids(entries: &[LedgerEntry<'_>]) -> Vec<RecordId> {
        entries.iter().map(LedgerEntry::id).collect()
    }

    #[test]
    fn ascending_value_sort_puts_buy_before_expense_before_sell() {
        let mut db = sample_db();
        db.processing.clear();
        let period = Period::day("2024-03-15").unwrap();
        let mut entries = collect_entries(&db, &period, &EntryFilter::default());
        sort_entries(&mut entries, SortState::new(SortKey::Value, SortDirection::Asc));
        assert_eq!(ids(&entries), vec![1, 3, 2]);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let db = sample_db();
        let period = Period::day("2024-03-15").unwrap();
        let mut entries = collect_entries(&db, &period, &EntryFilter::default());
        sort_entries(&mut entries, SortState::default());
        assert_eq!(ids(&entries), vec![2, 4, 3, 1]);
    }

    #[test]
    fn kind_sort_follows_precedence_and_keeps_ties_stable() {
        let mut db = sample_db();
        db.transactions
            .push(trade(5, "08:00", TradeSide::Buy, "Caps (Raw)", 10.0));
        let period = Period::day("2024-03-15").unwrap();
        let mut entries = collect_entries(&db, &period, &EntryFilter::default());

        sort_entries(&mut entries, SortState::new(SortKey::Kind, SortDirection::Asc));
        assert_eq!(ids(&entries), vec![1, 5, 4, 2, 3]);

        sort_entries(&mut entries, SortState::new(SortKey::Kind, SortDirection::Desc));
        assert_eq!(ids(&entries), vec![3, 2, 4, 1, 5]);
    }

    #[test]
    fn toggle_cycles_direction_on_active_key_only() {
        let state = SortState::default();
        let date_asc = state.toggle(SortKey::DateTime);
        assert_eq!(date_asc.direction, SortDirection::Asc);
        assert_eq!(date_asc.toggle(SortKey::DateTime).direction, SortDirection::Desc);

        let value = date_asc.toggle(SortKey::Value);
        assert_eq!(value, SortState::new(SortKey::Value, SortDirection::Asc));
    }

    #[test]
    fn material_filter_keeps_trades_and_conversions_touching_it() {
        let db = sample_db();
        let period = Period::day("2024-03-15").unwrap();
        let filter = EntryFilter {
            kind: None,
            material: Some("Flakes (Clean)".to_string()),
        };
        let entries = collect_entries(&db, &period, &filter);
        assert_eq!(ids(&entries), vec![2, 4]);

        let expenses_only = EntryFilter {
            kind: Some(EntryKind::Expense),
            material: None,
        };
        assert_eq!(ids(&collect_entries(&db, &period, &expenses_only)), vec![3]);
    }

    #[test]
    fn journal_rows_render_each_kind() {
        let labels = Labels::for_lang(Lang::Ru);
        let mut db = sample_db();
        db.transactions[1].method = PaymentMethod::Deferred;
        let period = Period::month("2024-03").unwrap();
        let report = journal_report(
            &db,
            &period,
            &EntryFilter::default(),
            SortState::new(SortKey::DateTime, SortDirection::Asc),
            labels,
            "15.03.2024 18:00",
        );

        let section = &report.sections[0];
        assert_eq!(section.headers[0], labels.col_date);
        let rows: Vec<&Vec<String>> = section.rows.iter().map(|r| &r.cells).collect();
        assert_eq!(rows[0][0], "15.03 09:00");
        assert_eq!(rows[0][2], "Bottles (Dirty) - Plastmash");
        assert_eq!(rows[0][3], "-100 c.");
        assert_eq!(rows[1][2], "Fuel (truck)");
        assert_eq!(rows[1][3], "-50 c.");
        assert_eq!(
            rows[2][2],
            "Bottles (Dirty) -> Flakes (Clean) (80kg -> 72.5kg)"
        );
        assert_eq!(rows[2][3], "-");
        assert_eq!(section.rows[2].amount, None);
        assert_eq!(rows[3][1], format!("{} ({})", labels.kind_sell, labels.method_debt));
        assert_eq!(rows[3][3], "+200 c.");

        let totals = report.totals.unwrap();
        assert_eq!(totals.income, 0.0);
        assert_eq!(totals.expense, 150.0);
    }

    #[test]
    fn stock_report_lists_positive_levels_only() {
        let labels = Labels::for_lang(Lang::Ru);
        let db = sample_db();
        let stock = project_stock(&db);
        assert!(stock.level("Bottles (Dirty)") < 0.0);

        let report = stock_report(&stock, labels, "now");
        let rows: Vec<&Vec<String>> = report.sections[0].rows.iter().map(|r| &r.cells).collect();
        assert_eq!(
            rows,
            vec![&vec!["Flakes (Clean)".to_string(), "71.50 kg".to_string()]]
        );
        assert_eq!(report.note, None);

        let empty = stock_report(&project_stock(&Database::default()), labels, "now");
        assert!(empty.is_empty());
        assert_eq!(empty.note.as_deref(), Some(labels.stock_empty));
    }

    #[test]
    fn analysis_report_translates_salary_and_orders_breakdowns() {
        let labels = Labels::for_lang(Lang::Ru);
        let mut db = sample_db();
        db.expenses.push(Expense {
            id: 9,
            date: "2024-03-15".to_string(),
            time: "17:00".to_string(),
            category: "Salary".to_string(),
            amount: 1500.0,
            description: "Driver".to_string(),
        });
        let period = Period::day("2024-03-15").unwrap();
        let report = analysis_report(&db, &period, labels, "now");

        assert_eq!(report.sections.len(), 3);
        let kpi = &report.sections[0].rows;
        assert_eq!(kpi[0].cells[1], "200 c.");
        assert_eq!(kpi[2].cells[1], "-1 450 c.");
        let expenses = &report.sections[2].rows;
        assert_eq!(expenses[0].cells[0], labels.salary);
        assert_eq!(expenses[0].cells[1], "1 500 c.");
    }

    #[test]
    fn amounts_group_thousands_and_trim_decimals() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1234567.5), "1 234 567.5");
        assert_eq!(format_amount(-1000.256), "-1 000.26");
        assert_eq!(format_amount(-0.001), "0");
    }
}
