//! `jcl-extract`: reads the fixed-default-path configuration, processes the
//! entry member, writes it to the database, and prints one success line per
//! project (§6).

use clap::Parser;

use jclnorm::config::Config;
use jclnorm::error::JclError;
use jclnorm::persist::PostgresAdapter;
use jclnorm::project;

/// Extracts a normalized job/step/DD model from a JCL deck into a
/// relational store. No flags: configuration is read from a fixed path.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli;

fn main() {
    tracing_subscriber::fmt::init();
    Cli::parse();

    if let Err(e) = run() {
        eprintln!("jcl-extract: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), JclError> {
    let Some(cfg) = Config::load_default()? else {
        return Ok(());
    };

    let mut adapter = connect(&cfg)?;
    if let Some(summary) = project::process(&cfg, &mut adapter)? {
        let name = cfg.project.as_deref().unwrap_or("");
        println!("extracted project {name}: {} steps", summary.step_count);
    }
    Ok(())
}

fn connect(cfg: &Config) -> Result<PostgresAdapter, JclError> {
    let conninfo = format!(
        "dbname={} user={} password={}",
        cfg.database.as_deref().unwrap_or(""),
        cfg.user.as_deref().unwrap_or(""),
        cfg.password.as_deref().unwrap_or(""),
    );
    PostgresAdapter::connect(&conninfo, cfg.drop_tables).map_err(JclError::from)
}
