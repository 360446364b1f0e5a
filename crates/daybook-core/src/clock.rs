use std::{cell::Cell, rc::Rc};

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of the current instant and calendar day.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day used by the daily reset policy.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; days follow the local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock for tests. Clones share the same instant, so a test can
/// advance time after handing a clone to the store.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Clock pinned to midday UTC on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc();
        Self::new(noon)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn set_date(&self, date: NaiveDate) {
        self.set(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc());
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}
