use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use community_pulse::auth::{AdminCapability, TokenIdentity};
use community_pulse::collector::ResponseCollector;
use community_pulse::config::AppConfig;
use community_pulse::dashboard::{load_mental_health_dashboard, load_phobia_dashboard};
use community_pulse::db::{self, PgRecordStore};
use community_pulse::export::{export_table, ExportFormat, ExportRequest};
use community_pulse::models::{AgeGroup, PhobiaType, SurveyTable};
use community_pulse::report;
use community_pulse::store::{QueryFilter, TimeWindow};
use community_pulse::summary::load_admin_summary;
use community_pulse::telemetry;

#[derive(Parser)]
#[command(name = "community-pulse")]
#[command(about = "Anonymous community mental-health and phobia surveys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demonstration submissions
    Seed,
    /// Record one anonymous survey response
    Submit {
        #[command(subcommand)]
        survey: SubmitSurvey,
    },
    /// Render a public dashboard as markdown
    Dashboard {
        #[command(subcommand)]
        view: DashboardView,
    },
    /// Admin overview across every survey table
    Summary {
        #[arg(long, default_value = "all")]
        window: TimeWindow,
        #[arg(long)]
        admin_token: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export one survey table as CSV or JSON
    Export {
        /// `mental_health` or a phobia id such as `acrophobia`
        #[arg(long)]
        data_type: SurveyTable,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Wrap JSON output with export metadata
        #[arg(long)]
        metadata: bool,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long)]
        admin_token: Option<String>,
    },
}

#[derive(Args)]
struct Respondent {
    /// Comma separated answers on the 1-5 scale, in question order
    #[arg(long, value_delimiter = ',', required = true)]
    answers: Vec<u8>,
    #[arg(long)]
    region: String,
    #[arg(long)]
    age_group: AgeGroup,
}

#[derive(Subcommand)]
enum SubmitSurvey {
    MentalHealth {
        #[command(flatten)]
        respondent: Respondent,
    },
    Phobia {
        #[arg(long)]
        phobia: PhobiaType,
        #[arg(long)]
        duration_months: u32,
        #[command(flatten)]
        respondent: Respondent,
    },
}

#[derive(Subcommand)]
enum DashboardView {
    MentalHealth {
        #[arg(long, default_value = "all")]
        window: TimeWindow,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Phobia {
        #[arg(long, default_value = "all")]
        window: TimeWindow,
        /// Phobia type for the regional drill-down
        #[arg(long)]
        phobia: Option<PhobiaType>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database.url()?)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgRecordStore::new(pool);
    let timeout = config.dashboard.fetch_timeout;

    match cli.command {
        Commands::InitDb => {
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&store).await?;
            println!("Seed data inserted ({inserted} new rows).");
        }
        Commands::Submit { survey } => {
            let (mut collector, duration_months, respondent) = match survey {
                SubmitSurvey::MentalHealth { respondent } => {
                    (ResponseCollector::mental_health(), None, respondent)
                }
                SubmitSurvey::Phobia {
                    phobia,
                    duration_months,
                    respondent,
                } => {
                    let mut collector = ResponseCollector::phobia();
                    collector.select_phobia(phobia)?;
                    (collector, Some(duration_months), respondent)
                }
            };

            let (_, expected) = collector.progress();
            if respondent.answers.len() != expected {
                bail!(
                    "expected {expected} answers for the {} survey, got {}",
                    collector.survey().label(),
                    respondent.answers.len()
                );
            }
            for value in respondent.answers {
                collector.answer(value)?;
            }
            collector.set_region(respondent.region)?;
            collector.set_age_group(respondent.age_group)?;
            if let Some(months) = duration_months {
                collector.set_duration_months(months)?;
            }

            let (_, receipt) = collector.submit(&store).await?;
            print!("{}", report::render_receipt(&receipt));
        }
        Commands::Dashboard { view } => {
            let now = Utc::now();
            let (markdown, out) = match view {
                DashboardView::MentalHealth { window, out } => {
                    let dashboard =
                        load_mental_health_dashboard(&store, window, now, timeout).await;
                    (report::render_mental_health_dashboard(&dashboard), out)
                }
                DashboardView::Phobia {
                    window,
                    phobia,
                    out,
                } => {
                    let dashboard =
                        load_phobia_dashboard(&store, window, now, phobia, timeout).await;
                    (report::render_phobia_dashboard(&dashboard), out)
                }
            };
            emit(markdown, out)?;
        }
        Commands::Summary {
            window,
            admin_token,
            out,
        } => {
            let admin = admin_capability(&config, admin_token)?;
            let filter = QueryFilter::for_window(window, Utc::now());
            let summary = load_admin_summary(&store, &admin, filter, timeout).await;
            emit(report::render_admin_summary(&summary), out)?;
        }
        Commands::Export {
            data_type,
            format,
            metadata,
            out_dir,
            admin_token,
        } => {
            let admin = admin_capability(&config, admin_token)?;
            let request = ExportRequest {
                table: data_type,
                format,
                with_metadata: metadata,
            };
            let file = export_table(&store, &admin, request, Utc::now()).await?;
            let path = out_dir.join(&file.filename);
            std::fs::write(&path, &file.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(records = file.record_count, mime = file.mime_type, "export written");
            println!(
                "Exported {} records to {}.",
                file.record_count,
                path.display()
            );
        }
    }

    Ok(())
}

fn admin_capability(config: &AppConfig, presented: Option<String>) -> anyhow::Result<AdminCapability> {
    let identity = TokenIdentity::new(config.admin_token.clone(), presented);
    AdminCapability::issue(&identity)
        .context("admin access required: pass --admin-token matching PULSE_ADMIN_TOKEN")
}

fn emit(markdown: String, out: Option<PathBuf>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, markdown)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}
