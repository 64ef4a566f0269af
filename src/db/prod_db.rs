use crate::db::config::DbConfig;
use crate::db::covidtracking::daily_archive::CovidDailyArchive;

pub struct ProdDb {}

impl ProdDb {
    pub fn covid_daily(db: DbConfig) -> CovidDailyArchive {
        CovidDailyArchive {
            endpoint: "https://api.covidtracking.com/v2/us/daily".to_string(),
            db,
        }
    }
}
