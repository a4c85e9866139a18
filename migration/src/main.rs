#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug)]

use std::env;

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    if env::var("DATABASE_URL").is_err() {
        let database = lib::config::load_database_config().unwrap();
        env::set_var("DATABASE_URL", database.url.as_str());
    }
    cli::run_cli(migration::Migrator).await;
}
