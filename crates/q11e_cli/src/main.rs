//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `q11e_core` linkage without arguments.
//! - Look up one questionnaire response by address: `q11e_cli <address>`.

use clap::Parser;
use q11e_core::db::open_db;
use q11e_core::{
    init_logging, Q11eConfig, Q11eRepository, RequestContext, SqliteQ11eRepository,
};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "q11e_cli")]
#[command(about = "Questionnaire store smoke check and address lookup", long_about = None)]
struct Cli {
    /// Respondent address to look up; prints ping/version when omitted
    address: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Some(address) = cli.address else {
        println!("q11e_core ping={}", q11e_core::ping());
        println!("q11e_core version={}", q11e_core::core_version());
        return ExitCode::SUCCESS;
    };

    match lookup(&address) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_lookup module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn lookup(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Q11eConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref().and_then(|dir| dir.to_str()) {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let repo = SqliteQ11eRepository::try_new(&conn)?;
    let ctx = RequestContext::background();

    match repo.check_and_get_exists_by_addr(&ctx, address)? {
        (true, Some(record)) => println!("{}", serde_json::to_string_pretty(&record)?),
        _ => println!("not found"),
    }
    Ok(())
}
