//! Thin CLI over the Helmsman core. All state-machine logic lives in the
//! library; this surface only parses flags, calls the core's public
//! operations, and renders results.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use helmsman::core::fs::{OsFs, WorkContext};
use helmsman::core::output;
use helmsman::core::persist;
use helmsman::types;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "helmsman", about = "Track multi-phase agent projects as validated state files.")]
struct Cli {
    /// Working root containing (or receiving) state.yaml.
    #[clap(long, default_value = ".")]
    root: PathBuf,
    /// Output format for this invocation.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new project from a branch name.
    Create {
        /// Branch name; `<type>/<rest>` selects the project type.
        #[clap(value_name = "BRANCH")]
        branch: String,
        #[clap(long, default_value = "")]
        description: String,
    },
    /// Show the project's current state, phases, and tasks.
    Status,
    /// Ask the project type's determiner for the next event and fire it.
    Advance,
    /// Add a gap-numbered task to a phase.
    Task {
        #[clap(value_name = "PHASE")]
        phase: String,
        #[clap(value_name = "NAME")]
        name: String,
        #[clap(long, default_value = "")]
        agent: String,
    },
    /// Approve a phase's output artifact of the given type.
    Approve {
        #[clap(value_name = "PHASE")]
        phase: String,
        #[clap(value_name = "ARTIFACT_TYPE")]
        artifact_type: String,
    },
}

fn print_status(project: &helmsman::core::project::Project, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "name": project.record.name,
                "type": project.record.project_type,
                "branch": project.record.branch,
                "current_state": project.state().as_str(),
                "updated_at": project.record.updated_at,
            });
            println!("{}", body);
        }
        OutputFormat::Text => {
            println!(
                "{} ({}) on {} — state {}",
                project.record.name.bold(),
                project.record.project_type,
                project.record.branch,
                project.state().as_str().cyan()
            );
            for (name, phase) in &project.record.phases {
                println!(
                    "  {} {} [iter {}]",
                    output::phase_glyph(phase.status),
                    name,
                    phase.iteration
                );
                for task in &phase.tasks {
                    println!(
                        "    {} {} {}",
                        output::task_glyph(task.status),
                        task.id,
                        output::compact_line(&task.name, 60)
                    );
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = types::builtin_registry();
    let ctx = WorkContext::new(&cli.root);
    let fs = OsFs;

    match cli.command {
        Command::Create {
            branch,
            description,
        } => {
            let project = persist::create(&ctx, &fs, &registry, &branch, &description)?;
            println!(
                "created project '{}' (type {}) at state {}",
                project.record.name,
                project.record.project_type,
                project.state()
            );
        }
        Command::Status => {
            let project = persist::load(&ctx, &fs, &registry)?;
            print_status(&project, cli.format);
        }
        Command::Advance => {
            let mut project = persist::load(&ctx, &fs, &registry)?;
            let event = project.advance()?;
            persist::save(&ctx, &fs, &mut project)?;
            println!("fired {} -> {}", event, project.state().as_str().cyan());
        }
        Command::Task { phase, name, agent } => {
            let mut project = persist::load(&ctx, &fs, &registry)?;
            let id = project.add_task(&phase, &name, &agent)?;
            persist::save(&ctx, &fs, &mut project)?;
            println!("added task {} to phase '{}'", id, phase);
        }
        Command::Approve {
            phase,
            artifact_type,
        } => {
            let mut project = persist::load(&ctx, &fs, &registry)?;
            project.approve_output(&phase, &artifact_type)?;
            persist::save(&ctx, &fs, &mut project)?;
            println!("approved {} output '{}'", phase, artifact_type);
        }
    }
    Ok(())
}
