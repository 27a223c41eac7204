use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Utc};

use crate::error::LedgerError;
use crate::labels::Labels;
use crate::model::{Database, Expense, Processing, RecordId, Trade};

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Day,
    Month,
}

/// A day (`YYYY-MM-DD`) or month (`YYYY-MM`) window over record dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    mode: ViewMode,
    reference: String,
}

impl Period {
    pub fn day(reference: &str) -> Result<Self, LedgerError> {
        let reference = reference.trim();
        parse_day(reference).ok_or_else(|| LedgerError::InvalidDate(reference.to_string()))?;
        Ok(Self {
            mode: ViewMode::Day,
            reference: reference.to_string(),
        })
    }

    pub fn month(reference: &str) -> Result<Self, LedgerError> {
        let reference = reference.trim();
        if reference.len() != 7 || parse_day(&format!("{reference}-01")).is_none() {
            return Err(LedgerError::InvalidMonth(reference.to_string()));
        }
        Ok(Self {
            mode: ViewMode::Month,
            reference: reference.to_string(),
        })
    }

    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            mode: ViewMode::Day,
            reference: date.format(DAY_FORMAT).to_string(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Day mode matches the exact date; month mode matches the `YYYY-MM` prefix.
    pub fn contains(&self, date: &str) -> bool {
        match self.mode {
            ViewMode::Day => date == self.reference,
            ViewMode::Month => date.starts_with(&self.reference),
        }
    }

    /// Switch between day and month view. A month becomes its first day.
    pub fn toggled(&self) -> Self {
        match self.mode {
            ViewMode::Day => Self {
                mode: ViewMode::Month,
                reference: self.reference.chars().take(7).collect(),
            },
            ViewMode::Month => Self {
                mode: ViewMode::Day,
                reference: format!("{}-01", self.reference),
            },
        }
    }

    /// Date stamped on a record created while this period is active. Month
    /// views never leak a partial date onto a record.
    pub fn entry_date(&self, today: NaiveDate) -> String {
        match self.mode {
            ViewMode::Day => self.reference.clone(),
            ViewMode::Month => today.format(DAY_FORMAT).to_string(),
        }
    }

    /// `dd.MM.yyyy` for a day, `<month name> yyyy` for a month.
    pub fn title(&self, labels: &Labels) -> String {
        match self.mode {
            ViewMode::Day => match parse_day(&self.reference) {
                Some(day) => day.format("%d.%m.%Y").to_string(),
                None => self.reference.clone(),
            },
            ViewMode::Month => match parse_day(&format!("{}-01", self.reference)) {
                Some(first) => {
                    let name = labels.months[first.month0() as usize];
                    format!("{name} {}", first.year())
                }
                None => self.reference.clone(),
            },
        }
    }

    pub fn select<'a>(&self, db: &'a Database) -> PeriodRecords<'a> {
        PeriodRecords {
            trades: db
                .transactions
                .iter()
                .filter(|t| self.contains(&t.date))
                .collect(),
            processing: db
                .processing
                .iter()
                .filter(|p| self.contains(&p.date))
                .collect(),
            expenses: db
                .expenses
                .iter()
                .filter(|e| self.contains(&e.date))
                .collect(),
        }
    }
}

/// Records whose own date falls inside a period, in encounter order.
#[derive(Debug, Default)]
pub struct PeriodRecords<'a> {
    pub trades: Vec<&'a Trade>,
    pub processing: Vec<&'a Processing>,
    pub expenses: Vec<&'a Expense>,
}

/// Id and date/time assigned to a record at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStamp {
    pub id_hint: RecordId,
    pub date: String,
    pub time: String,
}

impl EntryStamp {
    pub fn at(period: &Period, now: NaiveDateTime) -> Self {
        Self {
            id_hint: now.and_utc().timestamp_millis(),
            date: period.entry_date(now.date()),
            time: now.format("%H:%M").to_string(),
        }
    }

    pub fn now(period: &Period) -> Self {
        let local = Local::now().naive_local();
        Self {
            id_hint: Utc::now().timestamp_millis(),
            ..Self::at(period, local)
        }
    }
}

pub fn parse_day(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DAY_FORMAT).ok()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
