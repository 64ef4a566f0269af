use jiff::civil::Date;
use log::info;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;

use crate::db::config::DbConfig;
use crate::utils::flatten::flatten;

/// One row of the `base_stats` table.  At most one per calendar date.
#[derive(Debug, PartialEq, Serialize)]
pub struct BaseStatsRow {
    pub date: Date,
    pub states: i32,
    pub total_cases: i64,
    pub total_tested: i64,
}

/// One row of the `outcome_stats` table.  The date is only used to look
/// up the owning `base_stats` row at insert time.
#[derive(Debug, PartialEq, Serialize)]
pub struct OutcomeStatsRow {
    pub total_hospitalized: i64,
    pub total_hospitalized_in_icu: i64,
    pub total_hospitalized_on_ventilator: i64,
    pub total_deaths: i64,
    pub date: Date,
}

/// What happened to an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

impl BaseStatsRow {
    pub fn from_flattened(flat: &Map<String, Value>) -> Result<BaseStatsRow, Box<dyn Error>> {
        Ok(BaseStatsRow {
            date: get_str(flat, "date")?.parse()?,
            states: get_i64(flat, "states")? as i32,
            total_cases: get_i64(flat, "cases_total")?,
            total_tested: get_i64(flat, "testing_total")?,
        })
    }
}

impl OutcomeStatsRow {
    pub fn from_flattened(flat: &Map<String, Value>) -> Result<OutcomeStatsRow, Box<dyn Error>> {
        Ok(OutcomeStatsRow {
            total_hospitalized: get_i64(flat, "outcomes_hospitalized_currently")?,
            total_hospitalized_in_icu: get_i64(flat, "outcomes_hospitalized_in_icu_currently")?,
            total_hospitalized_on_ventilator: get_i64(
                flat,
                "outcomes_hospitalized_on_ventilator_currently",
            )?,
            total_deaths: get_i64(flat, "outcomes_death_total")?,
            date: get_str(flat, "date")?.parse()?,
        })
    }
}

fn get_str<'a>(flat: &'a Map<String, Value>, key: &str) -> Result<&'a str, Box<dyn Error>> {
    match flat.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(v) => Err(format!("field {} is not a string: {}", key, v).into()),
        None => Err(format!("no field {} in the flattened response", key).into()),
    }
}

fn get_i64(flat: &Map<String, Value>, key: &str) -> Result<i64, Box<dyn Error>> {
    match flat.get(key) {
        Some(v) => v
            .as_i64()
            .ok_or_else(|| format!("field {} is not an integer: {}", key, v).into()),
        None => Err(format!("no field {} in the flattened response", key).into()),
    }
}

#[derive(Clone)]
pub struct CovidDailyArchive {
    pub endpoint: String,
    pub db: DbConfig,
}

impl CovidDailyArchive {
    /// Return the url serving the simplified national stats for the day.
    pub fn url(&self, day: &Date) -> String {
        format!("{}/{}/simple.json", self.endpoint, day)
    }

    /// Get the `data` object for the day.  Days the API has nothing for
    /// come back as an empty object.
    pub fn fetch(&self, day: &Date) -> Result<Value, Box<dyn Error>> {
        let response: Value = reqwest::blocking::get(self.url(day))?.json()?;
        Ok(data_field(response))
    }

    /// Insert one row into `base_stats`, creating the table first if it
    /// doesn't exist yet.  A date already in the table is left alone.
    pub fn write_base_stats(&self, row: &BaseStatsRow) -> Result<InsertOutcome, Box<dyn Error>> {
        let mut client = self.db.connect()?;
        client.batch_execute(
            r#"
CREATE TABLE IF NOT EXISTS base_stats (
    base_id serial PRIMARY KEY,
    date date UNIQUE,
    states int,
    total_cases bigint,
    total_tested bigint
);
            "#,
        )?;
        let count = client.execute(
            r#"
INSERT INTO base_stats (date, states, total_cases, total_tested)
VALUES ($1, $2, $3, $4)
ON CONFLICT (date) DO NOTHING;
            "#,
            &[&row.date, &row.states, &row.total_cases, &row.total_tested],
        )?;
        if count == 0 {
            info!("date {} already in base_stats, skipping", row.date);
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Insert one row into `outcome_stats`, creating the table first if
    /// it doesn't exist yet.  The owning `base_stats` row is resolved by
    /// date; a date with no base row inserts a null `base_id`.
    pub fn write_outcome_stats(&self, row: &OutcomeStatsRow) -> Result<(), Box<dyn Error>> {
        let mut client = self.db.connect()?;
        client.batch_execute(
            r#"
CREATE TABLE IF NOT EXISTS outcome_stats (
    outcome_id serial PRIMARY KEY,
    total_hospitalized bigint,
    total_hospitalized_in_icu bigint,
    total_hospitalized_on_ventilator bigint,
    total_deaths bigint,
    base_id int
);
            "#,
        )?;
        client.execute(
            r#"
INSERT INTO outcome_stats
    (total_hospitalized, total_hospitalized_in_icu, total_hospitalized_on_ventilator,
     total_deaths, base_id)
VALUES ($1, $2, $3, $4, (SELECT base_id FROM base_stats WHERE date = $5));
            "#,
            &[
                &row.total_hospitalized,
                &row.total_hospitalized_in_icu,
                &row.total_hospitalized_on_ventilator,
                &row.total_deaths,
                &row.date,
            ],
        )?;
        Ok(())
    }

    /// Pull the stats for one day and load both tables.
    pub fn update(&self, day: Date) -> Result<(), Box<dyn Error>> {
        info!("updating covid stats for day {} ...", day);
        let data = self.fetch(&day)?;
        let flat = flatten(&data, "_");
        let base_row = BaseStatsRow::from_flattened(&flat)?;
        self.write_base_stats(&base_row)?;
        let outcome_row = OutcomeStatsRow::from_flattened(&flat)?;
        self.write_outcome_stats(&outcome_row)?;
        Ok(())
    }

    /// Process every day from `start_date` to `end_date`, both inclusive.
    /// Stops at the first day that fails.
    pub fn backfill(&self, start_date: Date, end_date: Date) -> Result<(), Box<dyn Error>> {
        for day in days_up_to(start_date, end_date)? {
            info!("backfilling {}", day);
            self.update(day)?;
        }
        Ok(())
    }
}

/// The `data` object of an API response body, or an empty object when
/// the body has none.
fn data_field(response: Value) -> Value {
    match response {
        Value::Object(mut fields) => fields
            .remove("data")
            .unwrap_or_else(|| Value::Object(Map::new())),
        _ => Value::Object(Map::new()),
    }
}

/// All the days from `start` to `end`, both inclusive, in ascending order.
pub fn days_up_to(start: Date, end: Date) -> Result<Vec<Date>, Box<dyn Error>> {
    if start > end {
        return Err(format!("start date {} is after end date {}", start, end).into());
    }
    let mut days: Vec<Date> = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        current = current.tomorrow()?;
    }
    Ok(days)
}
