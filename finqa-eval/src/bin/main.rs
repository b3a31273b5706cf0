//! Command-line entry point for the finqa evaluation harness.
//!
//! `finqa-eval infer` answers a question file with a responder and writes a
//! record-set; `finqa-eval grade` judges every record-set in a directory.

use clap::{Parser, Subcommand, ValueEnum};
use finqa_code_interpreter::finance_tools;
use finqa_core::tool::ToolSet;
use finqa_core::{
    AgenticConfig, AgenticResponder, DirectResponder, LlmClient, LlmConfig, Responder,
    DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL,
};
use finqa_eval::{
    judge_llm_config, track, BackendToml, DurationTracker, FileOutcome, FinqaConfig,
    GradingConfig, GradingOrchestrator, GradingProgress, GradingReport, InferenceRun,
    JsonFileDataset, LlmJudge, RunProgress, RunReport, DEFAULT_JUDGE_MODEL, DEFAULT_PROJECT_NAME,
    DEFAULT_QUESTION_TYPE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Finance QA evaluation harness.
#[derive(Parser, Debug)]
#[command(name = "finqa-eval")]
#[command(about = "Answer finance questions with local models and grade the answers with an LLM judge")]
#[command(version)]
struct Cli {
    /// Config file (default: ./finqa.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer every question of a dataset and write the responses
    Infer(InferArgs),
    /// Judge every record-set in a directory and write graded copies
    Grade(GradeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// One model call per question
    Direct,
    /// Tool-use loop with the code interpreter and calculator
    Agentic,
}

#[derive(clap::Args, Debug)]
struct InferArgs {
    /// Question file (JSON array or JSON Lines)
    #[arg(long, short = 'd')]
    dataset: PathBuf,

    /// Only answer questions of this type
    #[arg(long, default_value = DEFAULT_QUESTION_TYPE)]
    question_type: String,

    /// Responder mode
    #[arg(long, short = 'm', value_enum, default_value_t = Mode::Direct)]
    mode: Mode,

    /// Model name, e.g. llama3.1:8b
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL (default: local Ollama)
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the responder endpoint
    #[arg(long, env = "FINQA_RESPONDER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output file (default: <model>_output[_simple].json)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Maximum model calls per question in agentic mode
    #[arg(long)]
    max_steps: Option<usize>,

    /// Offer only this tool in agentic mode (repeatable; default: all)
    #[arg(long = "tool", value_name = "NAME")]
    tools: Vec<String>,

    /// Number of questions to answer (default: all)
    #[arg(long, short = 's')]
    sample: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// CSV file receiving one row per run (default: <model>_simple_eco.csv or <model>_agent_eco.csv)
    #[arg(long)]
    tracking_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GradeArgs {
    /// Directory of record-sets to grade
    input_dir: PathBuf,

    /// Directory receiving graded files
    output_dir: PathBuf,

    /// Judge model (default: gpt-4o)
    #[arg(long)]
    judge_model: Option<String>,

    /// Judge base URL (default: OpenAI)
    #[arg(long)]
    base_url: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum judge calls in flight (default: available parallelism)
    #[arg(long, short = 'c')]
    concurrency: Option<usize>,
}

impl Cli {
    /// Validate CLI arguments.
    fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Infer(args) => {
                if args.question_type.trim().is_empty() {
                    return Err("question-type cannot be empty".to_string());
                }
                if args.max_steps == Some(0) {
                    return Err("max-steps must be greater than 0".to_string());
                }
                if args.timeout == Some(0) {
                    return Err("timeout must be greater than 0".to_string());
                }
                if args.max_steps.is_some() && args.mode == Mode::Direct {
                    log::warn!("--max-steps has no effect in direct mode");
                }
                if !args.tools.is_empty() && args.mode == Mode::Direct {
                    log::warn!("--tool has no effect in direct mode");
                }
            }
            Command::Grade(args) => {
                if args.concurrency == Some(0) {
                    return Err("concurrency must be greater than 0".to_string());
                }
                if args.input_dir == args.output_dir {
                    return Err("output-dir must differ from input-dir".to_string());
                }
            }
        }
        Ok(())
    }
}

impl InferArgs {
    /// Model from the command line, else from the config file.
    fn resolved_model(&self, file: &BackendToml) -> Result<String, String> {
        self.model
            .clone()
            .or_else(|| file.model.clone())
            .ok_or_else(|| {
                "No model given. Pass --model or set [responder] model in finqa.toml".to_string()
            })
    }

    /// Build the responder backend config (CLI > file > defaults).
    fn llm_config(&self, model: &str, file: &BackendToml) -> LlmConfig {
        let mut config = LlmConfig::ollama(model).with_base_url(
            self.base_url
                .clone()
                .or_else(|| file.base_url.clone())
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
        );
        if let Some(temperature) = file.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = file.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(secs) = self.timeout.or(file.timeout_secs) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }

    fn output_path(&self, model: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(model, self.mode))
    }

    fn tracking_path(&self, model: &str) -> PathBuf {
        self.tracking_file
            .clone()
            .unwrap_or_else(|| default_tracking_path(model, self.mode))
    }
}

impl GradeArgs {
    /// Build the judge backend config (CLI > file > defaults).
    fn llm_config(&self, file: &BackendToml) -> LlmConfig {
        let mut config = judge_llm_config(self.api_key.clone())
            .with_model(
                self.judge_model
                    .clone()
                    .or_else(|| file.model.clone())
                    .unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
            )
            .with_base_url(
                self.base_url
                    .clone()
                    .or_else(|| file.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            );
        if let Some(temperature) = file.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = file.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(secs) = file.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn grading_config(&self, file: &FinqaConfig) -> GradingConfig {
        match self.concurrency.or(file.grading().concurrency) {
            Some(concurrency) => GradingConfig::new().with_concurrency(concurrency),
            None => GradingConfig::new(),
        }
    }
}

/// Model name with `:` replaced so it can be used in file names.
fn safe_model_name(model: &str) -> String {
    model.replace(':', "_")
}

fn default_output_path(model: &str, mode: Mode) -> PathBuf {
    let safe = safe_model_name(model);
    match mode {
        Mode::Direct => PathBuf::from(format!("{}_output_simple.json", safe)),
        Mode::Agentic => PathBuf::from(format!("{}_output.json", safe)),
    }
}

fn default_tracking_path(model: &str, mode: Mode) -> PathBuf {
    let safe = safe_model_name(model);
    match mode {
        Mode::Direct => PathBuf::from(format!("{}_simple_eco.csv", safe)),
        Mode::Agentic => PathBuf::from(format!("{}_agent_eco.csv", safe)),
    }
}

fn experiment_description(model: &str, mode: Mode) -> String {
    match mode {
        Mode::Direct => format!("Inference with model {} without agent.", model),
        Mode::Agentic => format!("Inference with model {}", model),
    }
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let bar = ProgressBar::new(0);
    bar.set_style(style);
    bar
}

fn build_responder(
    args: &InferArgs,
    llm_config: LlmConfig,
    file: &BackendToml,
) -> Result<Box<dyn Responder>, String> {
    let client =
        LlmClient::new(llm_config).map_err(|e| format!("Failed to create client: {}", e))?;
    let backend = Arc::new(client);

    match args.mode {
        Mode::Direct => Ok(Box::new(DirectResponder::new(backend))),
        Mode::Agentic => {
            let registry = finance_tools();
            let mut config = AgenticConfig::default();
            if let Some(max_steps) = args.max_steps.or(file.max_steps) {
                config = config.with_max_steps(max_steps);
            }
            if !args.tools.is_empty() {
                let unknown = args
                    .tools
                    .iter()
                    .find(|name| !registry.contains(name.as_str()));
                if let Some(unknown) = unknown {
                    return Err(format!(
                        "Unknown tool '{}'. Available: {}",
                        unknown,
                        registry.list().join(", ")
                    ));
                }
                config = config.with_tool_set(ToolSet::Specific(args.tools.clone()));
            }
            let responder = AgenticResponder::new(backend, Arc::new(registry), config)
                .map_err(|e| format!("Failed to create agentic responder: {}", e))?;
            Ok(Box::new(responder))
        }
    }
}

async fn run_infer(args: &InferArgs, config: &FinqaConfig) -> Result<RunReport, String> {
    let file = config.responder();
    let model = args.resolved_model(&file)?;

    if !args.dataset.exists() {
        return Err(format!(
            "Dataset file not found: {}",
            args.dataset.display()
        ));
    }

    let llm_config = args.llm_config(&model, &file);
    let responder = build_responder(args, llm_config, &file)?;
    let dataset =
        JsonFileDataset::new(args.dataset.clone()).with_question_type(args.question_type.clone());
    let output = args.output_path(&model);

    eprintln!("=== Finqa Inference ===");
    eprintln!("Dataset: {}", args.dataset.display());
    eprintln!("Question type: {}", args.question_type);
    eprintln!("Model: {}", model);
    eprintln!("Responder: {}", responder.name());
    eprintln!("Output: {}", output.display());
    eprintln!();

    let mut tracker = DurationTracker::new(
        DEFAULT_PROJECT_NAME,
        experiment_description(&model, args.mode),
        args.tracking_path(&model),
    );

    let bar = progress_bar();
    let run = InferenceRun::new(output);
    let result = track(
        &mut tracker,
        run.run_with_progress(responder.as_ref(), &dataset, args.sample, |progress| {
            match progress {
                RunProgress::Started { total } => {
                    bar.set_length(total as u64);
                    bar.set_message("Answering...");
                }
                RunProgress::QuestionCompleted {
                    completed, failed, ..
                } => {
                    bar.set_position(completed as u64);
                    if failed {
                        bar.set_message("(some failures)");
                    }
                }
                _ => {}
            }
        }),
    )
    .await;

    bar.finish_with_message("Complete");
    result.map_err(|e| format!("Inference failed: {}", e))
}

async fn run_grade(args: &GradeArgs, config: &FinqaConfig) -> Result<GradingReport, String> {
    let llm_config = args.llm_config(&config.judge());
    if llm_config.api_key.is_none() {
        log::warn!("No OPENAI_API_KEY set; judge requests will be unauthenticated");
    }
    let client =
        LlmClient::new(llm_config).map_err(|e| format!("Failed to create judge client: {}", e))?;
    let judge = Arc::new(LlmJudge::new(Arc::new(client)));
    let orchestrator = GradingOrchestrator::new(judge, args.grading_config(config));

    eprintln!("=== Finqa Grading ===");
    eprintln!("Input: {}", args.input_dir.display());
    eprintln!("Output: {}", args.output_dir.display());
    eprintln!("Concurrency: {}", orchestrator.config().concurrency);
    eprintln!();

    let bar = progress_bar();
    let report = orchestrator
        .grade_dir_with_progress(&args.input_dir, &args.output_dir, |progress| {
            match progress {
                GradingProgress::FileStarted { file, total } => {
                    bar.reset();
                    bar.set_length(total as u64);
                    bar.set_message(file);
                }
                GradingProgress::RecordJudged { completed, .. } => {
                    bar.set_position(completed as u64);
                }
                GradingProgress::FileCompleted { file, summary } => {
                    bar.println(format!(
                        "{}: {} correct, {} incorrect, accuracy {}",
                        file, summary.correct, summary.incorrect, summary.accuracy
                    ));
                }
                GradingProgress::FileSkipped { file, reason } => {
                    bar.println(format!("Skipping {}: {}", file, reason));
                }
                _ => {}
            }
        })
        .await
        .map_err(|e| format!("Grading failed: {}", e))?;

    bar.finish_and_clear();
    Ok(report)
}

fn print_grading_report(report: &GradingReport, output_dir: &Path) {
    let unavailable: usize = report
        .files
        .iter()
        .map(|outcome| match outcome {
            FileOutcome::Graded {
                judge_unavailable, ..
            } => *judge_unavailable,
            FileOutcome::Skipped { .. } => 0,
        })
        .sum();

    println!(
        "Graded {} files into {} ({} skipped)",
        report.graded(),
        output_dir.display(),
        report.skipped()
    );
    if unavailable > 0 {
        println!(
            "{} records could not be judged and were counted as incorrect",
            unavailable
        );
    }
}

async fn run(cli: &Cli) -> Result<(), String> {
    let config = FinqaConfig::discover(cli.config.as_deref()).map_err(|e| e.to_string())?;

    match &cli.command {
        Command::Infer(args) => {
            let report = run_infer(args, &config).await?;
            println!(
                "Wrote {} responses to {} in {:.1}s ({} failed)",
                report.total,
                report.output_path.display(),
                report.duration.as_secs_f64(),
                report.failed
            );
        }
        Command::Grade(args) => {
            let report = run_grade(args, &config).await?;
            print_grading_report(&report, &args.output_dir);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; credentials may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
