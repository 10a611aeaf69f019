//! Print the sales dashboard for the configured CRM instance
//!
//! Usage:
//!   crm_report [--config PATH] [--json]

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use crm_lib::reports::{has_source_data, DashboardData, DashboardReport};
use crm_lib::CrmConfig;

fn euros(value: f64) -> String {
    format!("{:.0} €", value)
}

fn print_report(report: &DashboardReport) {
    println!("=== KPI ===");
    match report.hit_rate {
        Some(rate) => println!("Hit rate:        {}%", rate),
        None => println!("Hit rate:        -"),
    }
    println!("Pipeline value:  {}", euros(report.pipeline_value));
    println!("Won value:       {}", euros(report.won_value));
    println!("Average deal:    {}", euros(report.average_deal));
    println!("Projects total:  {}", euros(report.project_total));

    println!("\n=== Forecast ({}) ===", report.generated_at.format("%Y-%m"));
    println!(
        "{} from {} projects",
        euros(report.monthly_forecast.total),
        report.monthly_forecast.projects.len()
    );
    for project in &report.monthly_forecast.projects {
        println!("  {:<30} {}", project.name, euros(project.price));
    }

    println!("\n=== Customers by stage ({}) ===", report.customer_count);
    for stage in &report.by_stage {
        println!("  {:<10} {}", stage.status.as_str(), stage.count);
    }

    println!("\n=== Upcoming deadlines ===");
    for project in &report.upcoming_deadlines {
        let deadline = project
            .deadline
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_default();
        println!(
            "  {}  {:<30} {}",
            deadline,
            project.name,
            project.customer_name().unwrap_or("-")
        );
    }

    println!("\n=== Churn risk (no contact in 60+ days) ===");
    if report.churn_risk.is_empty() {
        println!("  none");
    }
    for risk in &report.churn_risk {
        println!("  {:<30} {:<8} {} d", risk.name, risk.status.as_str(), risk.days_since_update);
    }

    println!("\n=== Lead sources ===");
    if has_source_data(&report.lead_sources) {
        for share in &report.lead_sources {
            println!("  {:<15} {}", share.label, share.count);
        }
    } else {
        println!("  no sources recorded");
    }

    println!("\n=== Segments ===");
    for share in &report.segments {
        println!("  {:<15} {}", share.label, share.count);
    }

    if report.overdue_reminders > 0 {
        println!("\n{} reminders overdue", report.overdue_reminders);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path = None;
    let mut json = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            "--json" => json = true,
            other => bail!("unknown argument {}", other),
        }
    }

    let config = CrmConfig::load(config_path.as_deref()).context("Failed to load config")?;
    let client = config
        .connect()
        .await
        .with_context(|| format!("Cannot reach {}", config.pocketbase_url))?;

    let data = DashboardData::fetch(&client).await?;
    let report = data.report(Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
