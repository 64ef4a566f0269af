use std::{env, error::Error};

use postgres::{Client, NoTls};

/// Connection settings for the stats database.  Host, port and user are
/// fixed by the deployment; database name and password come from the
/// environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
    pub password: String,
}

impl DbConfig {
    /// Read `POSTGRES_DB` and `POSTGRES_PASSWORD` from the environment.
    /// Call after the `.env` file for the environment has been loaded.
    pub fn from_env() -> Result<DbConfig, Box<dyn Error>> {
        Ok(DbConfig {
            host: "db".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            dbname: env::var("POSTGRES_DB")?,
            password: env::var("POSTGRES_PASSWORD")?,
        })
    }

    /// Open a new connection.  Closed when the returned client drops.
    pub fn connect(&self) -> Result<Client, Box<dyn Error>> {
        let client = postgres::Config::new()
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.dbname)
            .connect(NoTls)?;
        Ok(client)
    }
}
