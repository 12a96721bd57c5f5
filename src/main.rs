mod api;
mod changes;
mod config;
mod dashboard;
mod export;
mod models;
mod normalize;
mod notify;
mod tui;

#[cfg(test)]
mod testing;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use api::{ApiClient, JobStore};
use changes::parse_changes;
use config::Config;
use dashboard::{
    description_snippet, direct_optimize, optimized_on_local, ActionError, ChangesView, Dashboard,
    DirectForm, JobForm, Panel, CONFIRM_DELETE, CONFIRM_OPTIMIZE, EMPTY_DASHBOARD, REOPTIMIZE_NOTICE,
};
use export::{DirectoryTarget, ExportOutcome, SaveTarget};
use models::Job;
use notify::ConsoleNotifier;
use tui::truncate;

#[derive(Parser)]
#[command(name = "resume-dash")]
#[command(about = "Manage job cards and run resume optimization against the job service")]
struct Cli {
    /// Base URL of the job service API (overrides RESUME_DASH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List job cards
    List,

    /// Show a job card
    Show {
        /// Job ID
        id: String,
    },

    /// Create a job card and its base resume
    Add {
        /// Client name
        #[arg(long)]
        client: String,

        /// Company name
        #[arg(long)]
        company: String,

        /// Position title
        #[arg(long)]
        position: String,

        /// File containing the job description
        #[arg(long)]
        description_file: PathBuf,

        /// File containing the base resume text
        #[arg(long)]
        resume_file: Option<PathBuf>,

        /// Job application link
        #[arg(long)]
        link: Option<String>,
    },

    /// Edit a job card; omitted fields keep their current values
    Edit {
        /// Job ID
        id: String,

        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        description_file: Option<PathBuf>,

        #[arg(long)]
        resume_file: Option<PathBuf>,

        #[arg(long)]
        link: Option<String>,
    },

    /// Delete a job card
    Delete {
        /// Job ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Optimize the job's resume with the AI backend
    Optimize {
        /// Job ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the change summary and both resume versions
    Changes {
        /// Job ID
        id: String,

        /// Save both resumes as PDFs
        #[arg(long)]
        export: bool,

        /// Directory for exported PDFs (defaults to Downloads)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Optimize a resume against a job description without saving anything
    Direct {
        /// Client name
        #[arg(long)]
        client: String,

        /// File containing the job description
        #[arg(long)]
        description_file: PathBuf,

        /// File containing the base resume text
        #[arg(long)]
        resume_file: PathBuf,

        /// Write the optimized resume to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive dashboard
    Browse {
        /// Directory for exported PDFs (defaults to Downloads)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn dashboard_log_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "resume-dash")
        .map(|dirs| dirs.data_local_dir().join("dashboard.log"))
        .unwrap_or_else(|| PathBuf::from("resume-dash.log"))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

fn find_job(dashboard: &mut Dashboard, id: &str) -> Result<Job> {
    dashboard.refresh()?;
    dashboard
        .job(id)
        .cloned()
        .ok_or_else(|| anyhow!("Job {} not found", id))
}

fn save_target(config: &Config, out_dir: Option<PathBuf>) -> Option<DirectoryTarget> {
    out_dir
        .or_else(|| config.resolve_download_dir())
        .map(DirectoryTarget::new)
}

fn print_card(job: &Job) {
    println!("{}  [{}]", job.position, job.status);
    println!("ID: {}", job.id);
    println!("Client: {}", job.client_name);
    println!("Company: {}", job.company_name);
    if let Some(link) = &job.job_link {
        println!("Link: {}", link);
    }
    if let Some(when) = optimized_on_local(job) {
        println!("Optimized On: {}", when);
    }
    println!("\nJob Description:\n{}", textwrap::fill(&description_snippet(&job.job_description), 80));
}

fn print_summary(summary: Option<&str>) {
    println!("--- Summary of Changes ---");
    let categories = parse_changes(summary.unwrap_or_default());
    if categories.is_empty() {
        println!("{}", changes::NO_SUMMARY_PLACEHOLDER);
    }
    for category in categories {
        println!("\n{}", category.title);
        println!("{}", textwrap::indent(&textwrap::fill(&category.description, 76), "  "));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = matches!(cli.command, Commands::Browse { .. }).then(dashboard_log_path);
    if let Err(e) = init_logging(log_file.as_deref()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let Err(e) = run(cli) else {
        return ExitCode::SUCCESS;
    };
    match e.downcast_ref::<ActionError>() {
        // Already shown to the user by the notifier.
        Some(failed) => tracing::debug!(action = ?failed.action, "command failed"),
        None => eprintln!("Error: {:#}", e),
    }
    ExitCode::FAILURE
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?.with_api_url(cli.api_url);
    let client = ApiClient::new(&config)?;
    tracing::debug!(api_url = client.base_url(), "configured job service");

    let notifier = ConsoleNotifier;
    let store: &dyn JobStore = &client;
    let mut dashboard = Dashboard::new(store, &notifier);

    match cli.command {
        Commands::List => {
            dashboard.refresh()?;
            let jobs = dashboard.jobs();
            if jobs.is_empty() {
                println!("{}", EMPTY_DASHBOARD);
            } else {
                println!(
                    "{:<26} {:<12} {:<28} {:<20} {:<16}",
                    "ID", "STATUS", "POSITION", "COMPANY", "CLIENT"
                );
                println!("{}", "-".repeat(104));
                for job in jobs {
                    println!(
                        "{:<26} {:<12} {:<28} {:<20} {:<16}",
                        truncate(&job.id, 26),
                        job.status.as_str(),
                        truncate(&job.position, 28),
                        truncate(&job.company_name, 20),
                        truncate(&job.client_name, 16)
                    );
                }
            }
        }

        Commands::Show { id } => {
            let job = find_job(&mut dashboard, &id)?;
            print_card(&job);
            if job.is_optimized() {
                println!();
                print_summary(job.changes.as_deref());
            }
        }

        Commands::Add {
            client,
            company,
            position,
            description_file,
            resume_file,
            link,
        } => {
            let form = JobForm {
                client_name: client,
                company_name: company,
                position,
                job_description: read_text(&description_file)?,
                job_link: link.unwrap_or_default(),
                base_resume: match resume_file {
                    Some(path) => read_text(&path)?,
                    None => String::new(),
                },
            };
            let job = dashboard.create_job(&form)?;
            println!("Job ID: {}", job.id);
        }

        Commands::Edit {
            id,
            client,
            company,
            position,
            description_file,
            resume_file,
            link,
        } => {
            let job = find_job(&mut dashboard, &id)?;
            let mut form = JobForm::from_job(store, &job);
            if let Some(v) = client {
                form.client_name = v;
            }
            if let Some(v) = company {
                form.company_name = v;
            }
            if let Some(v) = position {
                form.position = v;
            }
            if let Some(path) = description_file {
                form.job_description = read_text(&path)?;
            }
            if let Some(path) = resume_file {
                form.base_resume = read_text(&path)?;
            }
            if let Some(v) = link {
                form.job_link = v;
            }

            dashboard.update_job(&id, &form)?;
            if dashboard.flags(&id).needs_reoptimization {
                println!("{}", REOPTIMIZE_NOTICE);
            }
        }

        Commands::Delete { id, yes } => {
            if yes || confirm(CONFIRM_DELETE)? {
                dashboard.delete_job(&id)?;
            }
        }

        Commands::Optimize { id, yes } => {
            if yes || confirm(CONFIRM_OPTIMIZE)? {
                println!("Optimizing...");
                dashboard.optimize(&id)?;
                if let Some(job) = dashboard.job(&id) {
                    println!("Status: {}", job.status);
                }
            }
        }

        Commands::Changes { id, export, out_dir } => {
            let job = find_job(&mut dashboard, &id)?;
            if !job.is_optimized() {
                return Err(anyhow!("Job {} has not been optimized yet", id));
            }
            let view = ChangesView::load(store, &job);

            print_summary(job.changes.as_deref());
            if !view.has_comparison() {
                return Ok(());
            }
            for panel in [Panel::Original, Panel::Optimized] {
                println!("\n--- {} ---", panel.title());
                println!("{}", view.panel(panel).unwrap_or_default());
            }

            if export {
                let target = save_target(&config, out_dir);
                let target = target.as_ref().map(|t| t as &dyn SaveTarget);
                for panel in [Panel::Original, Panel::Optimized] {
                    match view.export(panel, target, &notifier) {
                        ExportOutcome::Saved(path) => println!("Saved {}", path.display()),
                        ExportOutcome::Skipped => {
                            println!("No download directory available; use --out-dir.")
                        }
                        ExportOutcome::Failed => {}
                    }
                }
            }
        }

        Commands::Direct {
            client,
            description_file,
            resume_file,
            output,
        } => {
            let form = DirectForm {
                client_name: client,
                job_description: read_text(&description_file)?,
                base_resume: read_text(&resume_file)?,
            };
            println!("Optimizing...");
            let result = direct_optimize(store, &notifier, &form)?;

            println!("\n--- Changes Made ---");
            println!("{}", result.changes.as_deref().unwrap_or_default());

            match output {
                Some(path) => {
                    std::fs::write(&path, &result.optimized_resume)
                        .with_context(|| format!("Failed to write to {}", path.display()))?;
                    println!("\nOptimized resume saved to: {}", path.display());
                }
                None => println!("\n--- Optimized Resume ---\n{}", result.optimized_resume),
            }
        }

        Commands::Browse { out_dir } => {
            let target = save_target(&config, out_dir);
            tui::run_dashboard(store, target.as_ref().map(|t| t as &dyn SaveTarget))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_api_url() {
        let cli = Cli::try_parse_from(["resume-dash", "delete", "abc", "--yes", "--api-url", "http://x/api"])
            .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
        assert!(matches!(cli.command, Commands::Delete { ref id, yes: true } if id == "abc"));
    }

    #[test]
    fn test_add_requires_description_file() {
        let result = Cli::try_parse_from([
            "resume-dash", "add", "--client", "Ada", "--company", "Acme", "--position", "Eng",
        ]);
        assert!(result.is_err());
    }
}
