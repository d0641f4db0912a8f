use barbershop_admin::{
    config::{database, settings},
    core::{
        barber::{self, DeactivationAction, DeactivationOutcome, PendingWork},
        migration::{self, MigrationSummary},
        package::{self, PackageWithServices},
    },
    errors::Result,
    notify,
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "barbershop-admin")]
#[command(about = "Barbershop administration: packages, barbers and legacy data")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables
    InitDb,
    /// Convert legacy single-service subscriptions into packages
    MigrateLegacy,
    /// Show the appointments and subscriptions still assigned to a barber
    PendingWork {
        #[arg(long)]
        barber_id: i64,
    },
    /// Deactivate a barber, transferring or cancelling their pending work
    DeactivateBarber {
        #[arg(long)]
        barber_id: i64,
        /// `transfer` or `cancel`
        #[arg(long)]
        action: String,
        #[arg(long)]
        target_barber_id: Option<i64>,
    },
    /// List packages with their services
    Packages {
        #[arg(long)]
        active: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load settings
    let settings = settings::load_settings(&cli.config)
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect
    let db = database::create_connection(&settings)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;

    match cli.command {
        Commands::InitDb => {
            database::create_tables(&db).await?;
            info!("Tables created");
            if cli.json {
                print_json(&serde_json::json!({ "initialized": true }))?;
            } else {
                println!("Database initialized");
            }
        }
        Commands::MigrateLegacy => {
            let summary = migration::run_legacy_migration(&db).await?;
            if cli.json {
                print_json(&summary)?;
            } else {
                print_migration(&summary);
            }
        }
        Commands::PendingWork { barber_id } => {
            let work = barber::get_pending_work(&db, barber_id).await?;
            if cli.json {
                print_json(&work)?;
            } else {
                print_pending_work(barber_id, &work);
            }
        }
        Commands::DeactivateBarber {
            barber_id,
            action,
            target_barber_id,
        } => {
            let action = DeactivationAction::parse(&action, target_barber_id)?;
            let notifier = notify::dispatcher_from_settings(&settings.notifications);
            let outcome =
                barber::deactivate_with_action(&db, barber_id, action, notifier.as_ref()).await?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                print_deactivation(&outcome);
            }
        }
        Commands::Packages { active } => {
            let packages = package::list_packages(&db, active).await?;
            if cli.json {
                print_json(&packages)?;
            } else {
                print_packages(&packages);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_migration(summary: &MigrationSummary) {
    println!("Packages created:             {}", summary.packages_created);
    println!("Packages reused:              {}", summary.packages_reused);
    println!("Subscriptions migrated:       {}", summary.subscriptions_migrated);
    println!("Subscriptions pending:        {}", summary.subscriptions_pending);
    println!(
        "Appointment services created: {}",
        summary.appointment_services_created
    );
}

fn print_pending_work(barber_id: i64, work: &PendingWork) {
    println!(
        "Barber {barber_id}: {} pending appointment(s), {} live subscription(s)",
        work.appointments.len(),
        work.subscriptions.len()
    );
    for details in &work.appointments {
        let client = details.client.as_ref().map_or("?", |c| c.name.as_str());
        println!(
            "  appointment #{} {} {:?} {}",
            details.appointment.id,
            details.appointment.date.format("%Y-%m-%d %H:%M"),
            details.appointment.status,
            client
        );
    }
    for details in &work.subscriptions {
        let client = details.client.as_ref().map_or("?", |c| c.name.as_str());
        let plan = details
            .package
            .as_ref()
            .map(|p| p.name.as_str())
            .or_else(|| details.service.as_ref().map(|s| s.name.as_str()))
            .unwrap_or("?");
        println!(
            "  subscription #{} {:?} {} {}",
            details.subscription.id, details.subscription.status, plan, client
        );
    }
}

fn print_deactivation(outcome: &DeactivationOutcome) {
    println!(
        "Barber {} ({}) deactivated with action {}",
        outcome.barber.id,
        outcome.barber.name,
        outcome.action.name()
    );
    if let Some(target) = outcome.target_barber_id {
        println!("  work transferred to barber {target}");
    }
    println!("  appointments affected:  {}", outcome.appointments_affected);
    println!("  subscriptions affected: {}", outcome.subscriptions_affected);
}

fn print_packages(packages: &[PackageWithServices]) {
    for entry in packages {
        let package = &entry.package;
        println!(
            "#{} {} [{}] base {} - discount {} = {}{}",
            package.id,
            package.name,
            package.plan_type.label(),
            package.base_price,
            package.discount_amount,
            package.final_price,
            if package.is_active { "" } else { " (inactive)" }
        );
        for service in &entry.services {
            println!("    - {} ({} min) {}", service.name, service.duration, service.price);
        }
    }
}
