use crate::{error::CliError, ship::ShipReport};
use std::path::Path;

pub async fn write_report(report: &ShipReport, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_report(report: &ShipReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}
