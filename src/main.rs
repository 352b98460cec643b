//! NovelSeg CLI - split novels into segments and translate them.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use novelseg::config::Config;
use novelseg::console::Console;
use novelseg::driver::{self, DriverOptions, RangeSpec};
use novelseg::prompts::load_prompt;
use novelseg::records;
use novelseg::segmenter;
use novelseg::translator::OpenAiTranslator;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Plain-text novel segmenter and translator.
#[derive(Parser, Debug)]
#[command(name = "novelseg")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a novel into chapters and length-bounded segments.
    Split(SplitArgs),

    /// Translate a range of segments one at a time.
    Translate(TranslateArgs),
}

#[derive(ClapArgs, Debug)]
struct SplitArgs {
    /// UTF-8 text file of the novel.
    input: PathBuf,

    /// Segment file to write.
    #[arg(short, long, default_value = "output_segments.yaml")]
    output: PathBuf,

    /// Segment budget in non-whitespace characters (overrides config).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_chars: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct TranslateArgs {
    /// Segment file to translate.
    #[arg(short, long, default_value = "content.yaml")]
    input: PathBuf,

    /// File for translated segments.
    #[arg(short, long, default_value = "output.yaml")]
    output: PathBuf,

    /// First segment to translate (1-based).
    #[arg(long, default_value_t = 1)]
    start: usize,

    /// Last segment to translate (1-based, inclusive). Defaults to the last segment.
    #[arg(long)]
    end: Option<usize>,

    /// File holding the system prompt.
    #[arg(long, default_value = "system.txt")]
    system_prompt: PathBuf,

    /// File holding the assistant prompt.
    #[arg(long, default_value = "assistant.txt")]
    assistant_prompt: PathBuf,

    /// Run log file (overrides config).
    #[arg(long)]
    log: Option<PathBuf>,

    /// Seconds to wait after each segment (overrides config).
    #[arg(long)]
    delay: Option<f64>,

    /// Ask for every setting on the terminal.
    #[arg(long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.step("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;

    match args.command {
        Command::Split(split) => run_split(split, config, &console),
        Command::Translate(translate) => run_translate(translate, config, &console).await,
    }
}

fn run_split(args: SplitArgs, mut config: Config, console: &Console) -> Result<()> {
    console.section("NovelSeg - Split");

    if let Some(max_chars) = args.max_chars {
        config.segmentation.max_chars = usize::try_from(max_chars)
            .context("--max-chars is too large for this platform")?;
    }
    config.validate_segmentation().context("Invalid configuration")?;

    console.step(&format!("Reading {}...", args.input.display()));
    let text = segmenter::read_text(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let segmentation = segmenter::segment_document(&text, &config.segmentation);
    console.success(&format!(
        "Found {} chapters, {} segments (max {} chars)",
        console.count(segmentation.chapters.len()),
        console.count(segmentation.records.len()),
        config.segmentation.max_chars
    ));

    if segmentation.chapters.is_empty() {
        console.warning("No chapter headers were recognized; the segment file will be empty");
    }

    records::save(&args.output, &segmentation.records).context("Failed to save segments")?;
    console.success(&format!("Saved segments to '{}'", args.output.display()));

    Ok(())
}

async fn run_translate(mut args: TranslateArgs, mut config: Config, console: &Console) -> Result<()> {
    console.section("NovelSeg - Translate");

    if args.interactive {
        ask_translate_args(&mut args, console)?;
    }

    if args.interactive || !config.api.is_configured() {
        let key = console.ask("API key", None).context("Failed to read API key")?;
        if !key.is_empty() {
            config.api.key = key;
        }
    }

    if let Some(delay) = args.delay {
        config.translation.delay_between_requests_sec = delay;
    }
    if let Some(log) = args.log.take() {
        config.paths.log_file = log;
    }

    if !config.api.is_configured() {
        let config_path = Config::config_path()?;
        console.warning(&format!(
            "API key not configured. Please edit: {}",
            config_path.display()
        ));
    }
    config.validate_translation().context("Invalid configuration")?;
    console.success("Configuration loaded");

    let system_instruction = load_prompt(&args.system_prompt).context("Failed to load system prompt")?;
    let assistant_instruction =
        load_prompt(&args.assistant_prompt).context("Failed to load assistant prompt")?;

    console.step(&format!("Loading {}...", args.input.display()));
    let segments = records::load(&args.input).context("Failed to load segments")?;

    let range = RangeSpec {
        start: args.start,
        end: args.end,
    };
    let resolved = range.resolve(segments.len());
    if resolved.is_empty() {
        console.warning("The requested range selects no segments");
    } else {
        console.info(&format!(
            "Processing segments {} to {} of {}",
            resolved.start + 1,
            resolved.end,
            segments.len()
        ));
    }

    let options = DriverOptions {
        range,
        output: args.output,
        log_file: config.paths.log_file.clone(),
        delay: Duration::from_secs_f64(config.translation.delay_between_requests_sec),
        system_instruction,
        assistant_instruction,
    };

    let translator = OpenAiTranslator::new(config.api.clone(), config.translation.clone());
    let summary = driver::run(&translator, &segments, &options, console).await?;

    console.section("Done!");
    console.info(&format!(
        "{} translated, {} failed",
        console.count(summary.succeeded),
        console.count(summary.failed)
    ));
    console.info(&format!("Results saved to '{}'", options.output.display()));
    console.info(&format!("Log saved to '{}'", options.log_file.display()));

    Ok(())
}

/// Asks for each translate setting, keeping the current value on blank input.
fn ask_translate_args(args: &mut TranslateArgs, console: &Console) -> Result<()> {
    args.input = ask_path(console, "Segment file to translate", &args.input)?;
    args.output = ask_path(console, "File for translated segments", &args.output)?;

    args.start = console
        .ask("First segment", Some(args.start.to_string().as_str()))?
        .parse()
        .context("First segment must be a number")?;

    let end_default = args.end.map(|end| end.to_string());
    let end = console.ask(
        "Last segment (blank to translate to the end)",
        end_default.as_deref(),
    )?;
    args.end = if end.is_empty() {
        None
    } else {
        Some(end.parse().context("Last segment must be a number")?)
    };

    args.system_prompt = ask_path(console, "System prompt file", &args.system_prompt)?;
    args.assistant_prompt = ask_path(console, "Assistant prompt file", &args.assistant_prompt)?;

    Ok(())
}

fn ask_path(console: &Console, question: &str, current: &Path) -> Result<PathBuf> {
    let default = current.display().to_string();
    Ok(console.ask(question, Some(default.as_str()))?.into())
}
