use std::{error::Error, path::Path, thread, time::Duration};

use clap::Parser;
use covtrack::db::{config::DbConfig, prod_db::ProdDb};
use jiff::{ToSpan, Zoned};
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,
}

const SCHEDULE_TZ: &str = "Africa/Johannesburg";

/// Pull yesterday's national stats every day at 22:00 Johannesburg time.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    dotenvy::from_path(Path::new(format!(".env/{}.env", args.env).as_str())).unwrap();

    let archive = ProdDb::covid_daily(DbConfig::from_env()?);

    let now = Zoned::now().timestamp().in_tz(SCHEDULE_TZ)?;
    // TODO: recompute the pull date at trigger time; a process that stays
    // up past midnight keeps re-pulling this same date.
    let day_to_pull = now.date() - 1.day();

    let mut next_run = now.date().at(22, 0, 0, 0).to_zoned(now.time_zone().clone())?;
    if next_run.timestamp() <= now.timestamp() {
        next_run = next_run.saturating_add(1.day());
    }
    info!("pulling data for {}, first run at {}", day_to_pull, next_run);

    loop {
        if Zoned::now().timestamp() >= next_run.timestamp() {
            archive.update(day_to_pull)?;
            next_run = next_run.saturating_add(1.day());
            info!("next run at {}", next_run);
        }
        thread::sleep(Duration::from_secs(5));
    }
}
