//! Command-line interface for decisioncrew

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use crew_llm::providers::OpenAIProvider;
use crew_runtime::{AgentRuntime, RuntimeConfig};
use crew_utils::Settings;
use crew_workflow::{
    ConfigLoader, FieldValidation, IntelligenceCrew, ResultPolicy, WargamesCrew, WorkflowOptions,
    WorkflowRun,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "decisioncrew")]
#[command(about = "Run intelligence and wargames crews defined in YAML", long_about = None)]
struct Cli {
    /// Workflows directory (overrides DECISIONCREW_WORKFLOWS_DIR)
    #[arg(long, global = true)]
    workflows_dir: Option<PathBuf>,

    #[command(flatten)]
    assembly: AssemblyArgs,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AssemblyArgs {
    /// Fail on missing agent or task fields
    #[arg(long, global = true, conflicts_with = "lenient")]
    strict: bool,

    /// Fill missing agent or task fields with placeholders
    #[arg(long, global = true)]
    lenient: bool,

    /// Return every task's output instead of only the last one
    #[arg(long, global = true)]
    aggregate: bool,
}

impl AssemblyArgs {
    fn options(&self, family_default: WorkflowOptions) -> WorkflowOptions {
        let validation = if self.strict {
            FieldValidation::Strict
        } else if self.lenient {
            FieldValidation::Lenient
        } else {
            family_default.validation
        };
        let policy = if self.aggregate {
            ResultPolicy::Concatenate
        } else {
            family_default.result_policy
        };
        family_default
            .with_validation(validation)
            .with_result_policy(policy)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the intelligence workflows that can be run
    List,
    /// Run an intelligence workflow on a topic
    Analyze {
        /// Workflow to run (defaults to `combined`, then `osint`)
        #[arg(short, long)]
        workflow: Option<String>,
        /// Topic to analyse
        #[arg(short, long)]
        topic: String,
    },
    /// Wargame an action against prior intelligence
    Wargame {
        /// Intelligence context, or `@path` to read it from a file
        #[arg(short, long)]
        context: String,
        /// Action to play out
        #[arg(short, long)]
        action: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    crew_utils::init_tracing(if cli.verbose { "debug" } else { "info" });

    let mut settings = Settings::from_env()?;
    if let Some(dir) = cli.workflows_dir.clone() {
        settings.workflows_dir = dir;
    }
    let loader = ConfigLoader::new(&settings.workflows_dir);

    match &cli.command {
        Command::List => {
            let available = IntelligenceCrew::available(&loader)
                .with_context(|| format!("listing {}", settings.workflows_dir.display()))?;
            let default = IntelligenceCrew::default_workflow(&available);
            for id in &available {
                let marker = if Some(id.as_str()) == default { " (default)" } else { "" };
                println!("{id}{marker}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Analyze { workflow, topic } => {
            if topic.trim().is_empty() {
                bail!("topic must not be empty");
            }
            let workflow_id = match workflow {
                Some(id) => id.clone(),
                None => {
                    let available = IntelligenceCrew::available(&loader)?;
                    IntelligenceCrew::default_workflow(&available)
                        .map(str::to_string)
                        .with_context(|| {
                            format!("no workflows found in {}", settings.workflows_dir.display())
                        })?
                }
            };
            let runtime = runtime(&settings)?;
            info!(workflow = %workflow_id, model = %settings.model, "Running intelligence crew");

            let options = cli.assembly.options(WorkflowOptions::lenient());
            let result = match IntelligenceCrew::with_options(&workflow_id, loader, runtime, options) {
                Ok(crew) => crew.run(topic).await,
                Err(e) => Err(e),
            };
            Ok(report(result, "crew"))
        }

        Command::Wargame { context, action } => {
            let context = read_context(context)?;
            if context.trim().is_empty() {
                bail!("intelligence context must not be empty");
            }
            if action.trim().is_empty() {
                bail!("action must not be empty");
            }
            let runtime = runtime(&settings)?;
            info!(model = %settings.model, "Running wargames crew");

            let options = cli.assembly.options(WorkflowOptions::strict());
            let result = match WargamesCrew::with_options(loader, runtime, options) {
                Ok(crew) => crew.run(&context, action).await,
                Err(e) => Err(e),
            };
            Ok(report(result, "wargames"))
        }
    }
}

/// Build the shared runtime around an OpenAI-compatible client
fn runtime(settings: &Settings) -> anyhow::Result<AgentRuntime> {
    let provider = OpenAIProvider::from_env()
        .context("OPENAI_API_KEY must be set (in the environment or a .env file)")?;
    let config = RuntimeConfig {
        model: settings.model.clone(),
        max_iterations: settings.max_iterations,
        ..RuntimeConfig::default()
    };
    Ok(AgentRuntime::new(Arc::new(provider), config))
}

fn read_context(arg: &str) -> anyhow::Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading context from {path}")),
        None => Ok(arg.to_string()),
    }
}

/// Print the run or its error and pick the exit code
fn report(result: crew_core::Result<WorkflowRun>, scope: &str) -> ExitCode {
    match result {
        Ok(run) => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Task", "Agent", "Duration", "Characters"]);
            for output in &run.outputs {
                table.add_row(vec![
                    output.task.clone(),
                    output.agent.clone(),
                    format!("{:.1}s", output.duration.as_secs_f64()),
                    output.output.chars().count().to_string(),
                ]);
            }
            eprintln!("{table}");
            println!("{}", run.final_result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.to_marked_string(scope));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from(["decisioncrew", "--strict", "analyze", "--topic", "ports"]).unwrap();
        assert!(cli.assembly.strict);
        assert!(matches!(cli.command, Command::Analyze { ref topic, workflow: None } if topic == "ports"));
    }

    #[test]
    fn test_strict_and_lenient_conflict() {
        assert!(Cli::try_parse_from(["decisioncrew", "--strict", "--lenient", "list"]).is_err());
    }

    #[test]
    fn test_options_follow_family_default() {
        let args = AssemblyArgs {
            strict: false,
            lenient: false,
            aggregate: true,
        };
        let options = args.options(WorkflowOptions::strict());
        assert_eq!(options.validation, FieldValidation::Strict);
        assert_eq!(options.result_policy, ResultPolicy::Concatenate);

        let args = AssemblyArgs {
            strict: false,
            lenient: true,
            aggregate: false,
        };
        assert_eq!(args.options(WorkflowOptions::strict()).validation, FieldValidation::Lenient);
    }

    #[test]
    fn test_read_context_inline() {
        assert_eq!(read_context("fleet massing").unwrap(), "fleet massing");
        assert!(read_context("@/definitely/not/here.txt").is_err());
    }
}
