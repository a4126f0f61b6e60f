//! CLI definition and command dispatch for mpbio.
//!
//! ## Configuration Precedence
//!
//! 1. CLI flags (`--config`, `--verbose`, ...)
//! 2. Environment variables (`MPBIO_CONFIG`, `MPBIO_VERBOSE`, ...)
//! 3. Config file (`~/.mpbio/config.yaml` or the path from `--config`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::ui::{format, table, ColorMode, MessageType, Progress, ProgressMode, Style};

use mpbio_core::{
    load_exemplars, read_notes, BioEngine, BioError, BiographyDraft, BiographyRequest, CancellationToken,
    DateWindow, GlobalConfig, Resolution, ResolvedIdentity, ScoredCandidate,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Evidence-backed biographies of UK Members of Parliament
#[derive(Parser, Debug)]
#[command(name = "mpbio")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "MPBIO_VERBOSE")]
    pub verbose: bool,

    /// Suppress spinners
    #[arg(short, long, global = true, env = "MPBIO_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.mpbio/config.yaml)
    #[arg(long, global = true, env = "MPBIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, env = "MPBIO_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// The member a command is about.
#[derive(Args, Debug)]
pub struct MemberArgs {
    /// Member name, e.g. "Keir Starmer" or "Sir Ed Davey"
    pub query: String,

    /// Roster id picked from an earlier list of suggestions
    #[arg(long, value_name = "ID")]
    pub member: Option<u32>,
}

/// Free-text notes added to the evidence.
#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Extra information about the member
    #[arg(long, value_name = "TEXT", conflicts_with = "notes_file")]
    pub notes: Option<String>,

    /// Read extra information from a text file or a PDF brief
    #[arg(long, value_name = "PATH")]
    pub notes_file: Option<PathBuf>,
}

/// Legislative record search limits.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Start of the search window (YYYY-MM-DD; default: window_months before --to)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// End of the search window (YYYY-MM-DD; default: today)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Maximum number of contributions (default: search.result_cap)
    #[arg(long, value_name = "N")]
    pub cap: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a name to a sitting MP
    #[command(after_help = r#"EXAMPLES:
    mpbio resolve "Keir Starmer"

    # Pick a member from an ambiguous list
    mpbio resolve "Smith" --member 4823

    mpbio resolve "Rt Hon Dame Jane Doe" --json
"#)]
    Resolve {
        #[command(flatten)]
        member: MemberArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Gather verified evidence about a member
    #[command(after_help = r#"EXAMPLES:
    mpbio evidence "Keir Starmer"

    mpbio evidence "Keir Starmer" --notes "Former Director of Public Prosecutions"
"#)]
    Evidence {
        #[command(flatten)]
        member: MemberArgs,

        #[command(flatten)]
        notes: NotesArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Search a member's spoken contributions on a topic
    #[command(after_help = r#"EXAMPLES:
    mpbio search "Keir Starmer" --topic housing

    mpbio search "Keir Starmer" --topic "net zero" --from 2024-01-01 --cap 5
"#)]
    Search {
        #[command(flatten)]
        member: MemberArgs,

        /// Topic to search for
        #[arg(long)]
        topic: String,

        #[command(flatten)]
        window: WindowArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate a cited biography draft
    #[command(after_help = r#"EXAMPLES:
    mpbio generate "Keir Starmer"

    # Include recent contributions on a topic and house-style examples
    mpbio generate "Keir Starmer" --topic housing --exemplars ./exemplars

    # Print the draft as JSON without saving it
    mpbio generate "Keir Starmer" --no-save --json
"#)]
    Generate {
        #[command(flatten)]
        member: MemberArgs,

        #[command(flatten)]
        notes: NotesArgs,

        /// Topic to search the legislative record for
        #[arg(long)]
        topic: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Directory of example biographies (.txt/.md) to imitate
        #[arg(long, value_name = "DIR", env = "MPBIO_EXEMPLARS")]
        exemplars: Option<PathBuf>,

        /// Directory for the saved draft (default: ~/.mpbio/drafts)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Do not save the draft
        #[arg(long, conflicts_with = "output")]
        no_save: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show, locate or validate the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved configuration (file merged with defaults)
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the configuration file path
    Path,

    /// Validate the configuration and report warnings
    Validate {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Run function
// ============================================================================

/// Parse arguments, load configuration and dispatch.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!(
        "mpbio_core={0},mpbio_utils={0},mpbio_cli={0}",
        log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let style = Style::new(cli.color);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your config at ~/.mpbio/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context("Failed to load configuration", Some(&e.to_string()), Some(&hint))
            );
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Config { action } => handle_config(&style, &config, cli.config.as_deref(), action),
        command => {
            let exemplars = match &command {
                Command::Generate { exemplars, .. } => exemplars.clone(),
                _ => None,
            };
            let engine = match build_engine(config, exemplars.as_deref()) {
                Ok(engine) => engine,
                Err(e) => {
                    eprintln!(
                        "{}",
                        style.error_with_context(
                            "Failed to initialize mpbio",
                            Some(&format!("{:#}", e)),
                            None,
                        )
                    );
                    return ExitCode::FAILURE;
                }
            };
            dispatch(&style, &engine, command, cli.quiet)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&style, &e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<GlobalConfig, BioError> {
    match path {
        Some(path) => GlobalConfig::from_path(path),
        None => GlobalConfig::load_default(),
    }
}

fn build_engine(config: GlobalConfig, exemplars: Option<&Path>) -> anyhow::Result<BioEngine> {
    let engine = BioEngine::from_config(config)?;
    match exemplars {
        Some(dir) => {
            let exemplars = load_exemplars(dir)
                .with_context(|| format!("Failed to load exemplars from {}", dir.display()))?;
            Ok(engine.with_exemplars(exemplars))
        }
        None => Ok(engine),
    }
}

fn dispatch(style: &Style, engine: &BioEngine, command: Command, quiet: bool) -> Result<(), BioError> {
    match command {
        Command::Resolve { member, json } => {
            handle_resolve(style, engine, &member, json, ProgressMode::detect(quiet, json))
        }
        Command::Evidence { member, notes, json } => handle_evidence(
            style,
            engine,
            &member,
            &notes,
            json,
            ProgressMode::detect(quiet, json),
        ),
        Command::Search {
            member,
            topic,
            window,
            json,
        } => handle_search(
            style,
            engine,
            &member,
            &topic,
            &window,
            json,
            ProgressMode::detect(quiet, json),
        ),
        Command::Generate {
            member,
            notes,
            topic,
            window,
            output,
            no_save,
            json,
            ..
        } => {
            let save = if no_save {
                SaveTarget::Skip
            } else {
                output.map(SaveTarget::Dir).unwrap_or(SaveTarget::Default)
            };
            handle_generate(
                style,
                engine,
                GenerateArgs {
                    member: &member,
                    notes: &notes,
                    topic: topic.as_deref(),
                    window: &window,
                    save,
                    json,
                },
                ProgressMode::detect(quiet, json),
            )
        }
        Command::Config { .. } => unreachable!("config commands are handled before the engine is built"),
    }
}

fn report_error(style: &Style, err: &BioError) {
    match err {
        BioError::Ambiguous { query, suggestions } => {
            eprintln!("{}", suggestions_message(style, query, suggestions));
        }
        BioError::InvalidConfiguration { message, hint } => {
            eprintln!("{}", style.error_with_context(message, None, Some(hint.as_str())));
        }
        BioError::Cancelled(_) => {
            eprintln!("{}", style.message(MessageType::Warn, &err.to_string()));
        }
        _ => eprintln!("{}", style.message(MessageType::Err, &err.to_string())),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), BioError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate, BioError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        BioError::InvalidArgument(format!("Invalid date `{}`, expected YYYY-MM-DD", value))
    })
}

impl WindowArgs {
    /// `None` when neither bound is given (the engine default applies).
    fn window(&self, months: u32) -> Result<Option<DateWindow>, BioError> {
        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }
        let end = match &self.to {
            Some(to) => parse_date(to)?,
            None => Local::now().date_naive(),
        };
        let start = match &self.from {
            Some(from) => parse_date(from)?,
            None => DateWindow::trailing_months(end, months).start,
        };
        DateWindow::new(start, end).map(Some)
    }
}

impl NotesArgs {
    fn read(&self) -> Result<Option<String>, BioError> {
        let text = match (&self.notes, &self.notes_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_notes(path)?,
            (None, None) => return Ok(None),
        };
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }
}

fn suggestions_message(style: &Style, query: &str, suggestions: &[ScoredCandidate]) -> String {
    let mut out = style.message(
        MessageType::Warn,
        &format!(
            "`{}` matches {}",
            query,
            format::plural(suggestions.len(), "member")
        ),
    );
    out.push_str("\n\n");
    out.push_str(&table::render_suggestions_table(suggestions, style));
    out.push_str("\n\n");
    out.push_str(&style.message(MessageType::Hint, "Pick one with --member <ID>"));
    out
}

fn print_identity(style: &Style, identity: &ResolvedIdentity) {
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("{} (id {})", identity.name(), identity.id())
        )
    );
    let candidate = identity.candidate();
    println!("{}", style.message_detail("Party", candidate.party_label()));
    println!(
        "{}",
        style.message_detail("Constituency", candidate.constituency_label())
    );
}

/// Resolve to exactly one member, honouring `--member`.
fn resolve_member(engine: &BioEngine, member: &MemberArgs, mode: ProgressMode) -> Result<ResolvedIdentity, BioError> {
    let progress = Progress::spinner(&format!("Resolving `{}`...", member.query), mode);
    let identity = match member.member {
        Some(id) => engine.resolve_choice(&member.query, id),
        None => engine.resolve(&member.query).into_identity(&member.query),
    };
    progress.finish_clear();
    identity
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_resolve(
    style: &Style,
    engine: &BioEngine,
    member: &MemberArgs,
    json: bool,
    mode: ProgressMode,
) -> Result<(), BioError> {
    let resolution = match member.member {
        Some(_) => Resolution::Confirmed(resolve_member(engine, member, mode)?),
        None => {
            let progress = Progress::spinner(&format!("Resolving `{}`...", member.query), mode);
            let resolution = engine.resolve(&member.query);
            progress.finish_clear();
            resolution
        }
    };

    if json {
        print_json(&resolution)?;
    }
    match resolution {
        Resolution::Confirmed(identity) => {
            if !json {
                print_identity(style, &identity);
            }
            Ok(())
        }
        Resolution::Suggestions(ranked) => {
            if !json {
                println!("{}", suggestions_message(style, &member.query, &ranked));
            }
            Ok(())
        }
        Resolution::NoMatch(message) => Err(BioError::NotFound { what: message }),
    }
}

fn handle_evidence(
    style: &Style,
    engine: &BioEngine,
    member: &MemberArgs,
    notes: &NotesArgs,
    json: bool,
    mode: ProgressMode,
) -> Result<(), BioError> {
    let supplied = notes.read()?;
    let identity = resolve_member(engine, member, mode)?;

    let progress = Progress::spinner(&format!("Gathering evidence for {}...", identity.name()), mode);
    let bundle = engine.aggregate(&identity, supplied.as_deref());
    progress.finish_clear();

    if json {
        return print_json(&bundle);
    }

    print_identity(style, &identity);
    println!();
    println!("{}", style.section("EVIDENCE"));
    println!("{}", bundle.text);
    println!();
    println!("{}", style.section("SOURCES"));
    println!("{}", table::render_sources_table(&bundle.sources, style));
    println!();

    for outcome in bundle.degraded_sources() {
        println!(
            "{}",
            style.message(
                MessageType::Warn,
                &format!("{}: {}", outcome.source, outcome.status)
            )
        );
    }
    if bundle.is_empty() {
        println!(
            "{}",
            style.message(MessageType::Warn, "No source returned usable evidence")
        );
    } else {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format::plural(bundle.evidence.len(), "evidence item")
            )
        );
    }
    Ok(())
}

fn handle_search(
    style: &Style,
    engine: &BioEngine,
    member: &MemberArgs,
    topic: &str,
    window: &WindowArgs,
    json: bool,
    mode: ProgressMode,
) -> Result<(), BioError> {
    let cap = window.cap;
    let window = window.window(engine.config().search.window_months)?;
    let identity = resolve_member(engine, member, mode)?;

    let progress = Progress::spinner("Planning search phrases...", mode);
    let plan = engine.plan_topic(topic, identity.name());
    progress.set_message(&format!(
        "Searching {} for {}...",
        format::plural(plan.expanded_terms.len(), "phrase"),
        identity.name()
    ));
    let report = engine.search_records(&identity, &plan, window, cap);
    progress.finish_clear();

    if json {
        return print_json(&report);
    }

    println!(
        "{}",
        style.message(
            MessageType::Info,
            &format!(
                "{} on \"{}\", {}",
                identity.name(),
                plan.original_topic,
                format::format_window(&report.window)
            )
        )
    );
    println!(
        "{}",
        style.message_detail("Phrases", &plan.expanded_terms.join(", "))
    );
    println!();

    if report.records.is_empty() {
        println!(
            "{}",
            style.message(MessageType::Info, "No contributions found")
        );
    } else {
        println!("{}", table::render_records_table(&report.records));
        println!();
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format::plural(report.records.len(), "contribution")
            )
        );
    }

    if let Some(err) = report.partial_error() {
        println!("{}", style.message(MessageType::Warn, &err.to_string()));
        println!("{}", table::render_phrases_table(&report.phrases));
    }
    Ok(())
}

/// Where `generate` writes its draft.
enum SaveTarget {
    Skip,
    Default,
    Dir(PathBuf),
}

struct GenerateArgs<'a> {
    member: &'a MemberArgs,
    notes: &'a NotesArgs,
    topic: Option<&'a str>,
    window: &'a WindowArgs,
    save: SaveTarget,
    json: bool,
}

fn handle_generate(
    style: &Style,
    engine: &BioEngine,
    args: GenerateArgs<'_>,
    mode: ProgressMode,
) -> Result<(), BioError> {
    let window = args.window.window(engine.config().search.window_months)?;
    let request = BiographyRequest {
        query: args.member.query.clone(),
        member_id: args.member.member,
        supplied: args.notes.read()?,
        topic: args.topic.map(str::to_string),
        window,
        result_cap: args.window.cap,
    };
    let token = CancellationToken::new();

    let progress = Progress::spinner(
        &format!("Generating a biography for `{}`...", request.query),
        mode,
    );
    let draft = engine.generate(&request, &token);
    match &draft {
        Ok(draft) => progress.finish_with_message(&style.message(
            MessageType::Ok,
            &format!(
                "Drafted a biography of {} in {:.1}s",
                draft.member.name(),
                progress.elapsed().as_secs_f64()
            ),
        )),
        Err(_) => progress.finish_clear(),
    }
    let draft = draft?;

    let saved = match &args.save {
        SaveTarget::Skip => None,
        SaveTarget::Default => Some(engine.save_draft(&draft, None, &token)?),
        SaveTarget::Dir(dir) => Some(engine.save_draft(&draft, Some(dir.as_path()), &token)?),
    };

    if args.json {
        return print_json(&draft);
    }

    println!("{}", draft.to_markdown());
    println!();
    print_draft_summary(style, &draft);
    if let Some(path) = saved {
        println!(
            "{}",
            style.message(MessageType::Ok, &format!("Draft saved to {}", path.display()))
        );
    }
    Ok(())
}

fn print_draft_summary(style: &Style, draft: &BiographyDraft) {
    let total = draft.citations.len();
    let unresolved = draft.unresolved_citations();
    println!(
        "{}",
        style.message(
            MessageType::Info,
            &format!(
                "{} ({} resolved) from {}",
                format::plural(total, "citation"),
                total - unresolved,
                format::plural(draft.evidence.len(), "evidence item")
            )
        )
    );
    if unresolved > 0 {
        println!("{}", table::render_citations_table(&draft.citations, style));
    }
    for outcome in draft.sources.iter().filter(|o| o.status.is_degraded()) {
        println!(
            "{}",
            style.message(
                MessageType::Warn,
                &format!("{}: {}", outcome.source, outcome.status)
            )
        );
    }
    if !draft.failed_phrases.is_empty() {
        println!(
            "{}",
            style.message(
                MessageType::Warn,
                &format!("Search failed for: {}", draft.failed_phrases.join(", "))
            )
        );
    }
}

fn handle_config(
    style: &Style,
    config: &GlobalConfig,
    explicit_path: Option<&Path>,
    action: ConfigAction,
) -> Result<(), BioError> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .or_else(GlobalConfig::default_path);

    match action {
        ConfigAction::Show { json } => {
            if json {
                return print_json(config);
            }
            if let Some(path) = &path {
                let origin = if path.exists() { "" } else { " (not found, defaults)" };
                println!(
                    "{}",
                    style.message(
                        MessageType::Info,
                        &format!("Configuration from {}{}", path.display(), origin)
                    )
                );
            }
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(())
        }
        ConfigAction::Path => match path {
            Some(path) => {
                println!("{}", path.display());
                Ok(())
            }
            None => Err(BioError::InvalidArgument(
                "Could not determine home directory; pass --config".to_string(),
            )),
        },
        ConfigAction::Validate { json } => {
            let warnings = config.validate()?;
            if json {
                return print_json(&serde_json::json!({
                    "valid": true,
                    "path": path,
                    "warnings": warnings,
                }));
            }
            println!("{}", style.message(MessageType::Ok, "Configuration is valid"));
            for warning in &warnings {
                println!("{}", style.message(MessageType::Warn, warning));
            }
            Ok(())
        }
    }
}
