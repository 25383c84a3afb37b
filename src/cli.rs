use crate::config::config::PortalConfig;
use crate::config::types::{Cohort, PortalError};
use crate::config::validator::validate_config;
use crate::identity::provider_from_config;
use crate::judge::SubmissionDispatcher;
use crate::progression::{Pointer, ProgressState, ProgressionEngine, RoundPhase, SubmissionOutcome};
use crate::puzzle::PuzzleCatalog;
use crate::session::{ParticipantSession, SubmissionReport};
use crate::store::{FileStore, ProgressStore};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Debugging-puzzle portal engine", long_about = None)]
struct Cli {
    /// Portal configuration file (JSON). Defaults to ./riftgate.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct AuthArgs {
    /// Participant email
    #[arg(long)]
    email: String,
    /// One-time verification code
    #[arg(long)]
    code: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List a cohort's puzzles (hints and buggy source)
    Puzzles {
        /// Cohort: a | b
        #[arg(long, default_value = "a")]
        cohort: String,
        /// Include the buggy source of every puzzle
        #[arg(long)]
        show_source: bool,
    },
    /// Request a verification code, or verify one and open the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: Option<String>,
    },
    /// Show the participant's progress
    Status {
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Judge a source file against the current puzzle
    Submit {
        #[command(flatten)]
        auth: AuthArgs,
        /// Source file with the fixed program
        #[arg(long)]
        file: PathBuf,
        /// Navigate to this puzzle index before submitting
        #[arg(long)]
        puzzle: Option<usize>,
    },
    /// Answer the scrambled-word side challenge
    Unscramble {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(long)]
        answer: String,
    },
    /// Submit the final secret
    Final {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(long)]
        answer: String,
    },
    /// Validate the configuration and catalogue
    CheckConfig,
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let emit_metrics = cli.metrics;
    let outcome = execute(cli);

    if emit_metrics {
        eprint!("{}", crate::observability::metrics::get_metrics().export_prometheus());
    }

    match outcome {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if let Some(portal) = e.downcast_ref::<PortalError>() {
                eprintln!("Error: {}", portal);
                std::process::exit(portal.exit_code());
            }
            Err(e)
        }
    }
}

/// Process exit status: 0 on success, 1 when the participant's answer failed
fn exit_status(succeeded: bool) -> i32 {
    if succeeded {
        0
    } else {
        1
    }
}

fn submission_status(outcome: &SubmissionOutcome) -> i32 {
    exit_status(matches!(outcome, SubmissionOutcome::Accepted { .. }))
}

/// Run one command, returning the process exit status
fn execute(cli: Cli) -> Result<i32> {
    let config = PortalConfig::load(cli.config.as_deref())?;

    if let Err(e) = crate::observability::audit::init_audit_logger(config.audit_log.clone()) {
        eprintln!("Failed to initialize audit logger: {}", e);
        return Ok(1);
    }

    let catalog = PuzzleCatalog::from_config(&config)?;
    let validation = validate_config(&config, &catalog.raw_sets())?;

    match cli.command {
        Commands::CheckConfig => {
            let json_result = serde_json::json!({
                "status": "OK",
                "judge": config.judge.base_url,
                "identity": format!("{:?}", config.identity.mode).to_lowercase(),
                "store": config.store.dir,
                "puzzles": Cohort::ALL
                    .iter()
                    .map(|c| catalog.for_cohort(*c).map(|s| (c.key(), s.len())))
                    .collect::<std::result::Result<std::collections::BTreeMap<_, _>, _>>()?,
                "warnings": validation.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&json_result)?);
            Ok(0)
        }
        Commands::Puzzles {
            cohort,
            show_source,
        } => {
            let cohort: Cohort = cohort.parse()?;
            let set = catalog.for_cohort(cohort)?;
            let puzzles: Vec<_> = set
                .puzzles()
                .iter()
                .map(|p| {
                    let mut entry = serde_json::json!({
                        "index": p.index,
                        "language": p.language,
                        "hint": p.hint,
                        "visible": p.visible,
                        "hidden_cases": p.hidden.len(),
                    });
                    if show_source {
                        entry["buggy_source"] = serde_json::json!(p.buggy_source);
                    }
                    entry
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "cohort": cohort,
                    "puzzles": puzzles,
                }))?
            );
            Ok(0)
        }
        Commands::Login { email, code } => match code {
            None => {
                let provider = provider_from_config(&config.identity);
                provider.request_code(&email).map_err(PortalError::from)?;
                eprintln!("Verification code requested for {}", email.trim());
                Ok(0)
            }
            Some(code) => {
                let session = open_session(&config, &catalog, &email, &code)?;
                print_status(&session)?;
                Ok(0)
            }
        },
        Commands::Status { auth } => {
            let session = open_session(&config, &catalog, &auth.email, &auth.code)?;
            print_status(&session)?;
            Ok(0)
        }
        Commands::Submit { auth, file, puzzle } => {
            let session = open_session(&config, &catalog, &auth.email, &auth.code)?;
            if let Some(target) = puzzle {
                navigate_to(&session, target)?;
            }
            let code = read_source(&file)?;
            let report = session.submit(&code)?;
            print_report(&session, &report)?;
            Ok(submission_status(&report.outcome))
        }
        Commands::Unscramble { auth, answer } => {
            let session = open_session(&config, &catalog, &auth.email, &auth.code)?;
            let solved = session.solve_side_challenge(&answer)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "solved": solved,
                    "message": (if solved { "The finale is open" } else { "Not quite. Try again" }),
                }))?
            );
            Ok(exit_status(solved))
        }
        Commands::Final { auth, answer } => {
            let session = open_session(&config, &catalog, &auth.email, &auth.code)?;
            let accepted = session.submit_final(&answer)?;
            let state = session.state()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "accepted": accepted,
                    "attempts": state.final_attempts,
                    "sealed_at": state.sealed_at,
                }))?
            );
            Ok(exit_status(accepted))
        }
    }
}

fn open_session(
    config: &PortalConfig,
    catalog: &PuzzleCatalog,
    email: &str,
    code: &str,
) -> Result<ParticipantSession> {
    let provider = provider_from_config(&config.identity);
    log::debug!("Verifying {} via {} identity provider", email.trim(), provider.name());
    let identity = provider.verify(email, code).map_err(PortalError::from)?;

    let set = catalog.for_cohort(identity.cohort)?;
    let engine = ProgressionEngine::from_config(set, config);
    let dispatcher = SubmissionDispatcher::from_config(&config.judge);
    let store: Arc<dyn ProgressStore> = Arc::new(FileStore::open(&config.store.dir)?);

    Ok(ParticipantSession::open(identity, engine, dispatcher, store)?)
}

/// Step the pointer toward `target` through incomplete puzzles only
fn navigate_to(session: &ParticipantSession, target: usize) -> Result<()> {
    let set_len = session.engine().puzzle_set().len();
    if target >= set_len {
        return Err(PortalError::Phase(format!(
            "puzzle {} does not exist (set has {})",
            target, set_len
        ))
        .into());
    }
    if session.state()?.is_complete(target) {
        return Err(PortalError::Phase(format!("puzzle {} is already complete", target)).into());
    }

    loop {
        let state = session.state()?;
        let current = match state.pointer {
            Pointer::Active(i) if i == target => return Ok(()),
            Pointer::Active(i) => i,
            Pointer::AllComplete => return Ok(()),
        };
        let next = if current < target {
            session.advance()?
        } else {
            session.retreat()?
        };
        if next.pointer == state.pointer {
            return Ok(());
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read source file {}: {}", path.display(), e))
}

fn phase_name(state: &ProgressState) -> &'static str {
    match state.phase() {
        RoundPhase::Puzzles => "puzzles",
        RoundPhase::SideChallenge => "side_challenge",
        RoundPhase::Finale => "finale",
        RoundPhase::Sealed => "sealed",
    }
}

fn print_status(session: &ParticipantSession) -> Result<()> {
    let state = session.state()?;
    let current = session.current_puzzle()?;
    let mut status = serde_json::json!({
        "participant": session.identity().participant_id.short(),
        "cohort": state.cohort,
        "phase": phase_name(&state),
        "completed": state.completed,
        "fragments": state.fragments,
        "puzzle_count": state.puzzle_count,
        "final_attempts": state.final_attempts,
    });
    if let Some(puzzle) = current {
        status["current_puzzle"] = serde_json::json!({
            "index": puzzle.index,
            "language": puzzle.language,
            "hint": puzzle.hint,
            "buggy_source": puzzle.buggy_source,
            "visible": puzzle.visible,
        });
    }
    if state.phase() == RoundPhase::SideChallenge {
        if let Some(challenge) = &state.side_challenge {
            status["scrambled"] = serde_json::json!(challenge.scrambled);
        }
    }
    if state.phase() == RoundPhase::Finale {
        status["clues"] = serde_json::json!(session.finale_clues());
    }
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_report(session: &ParticipantSession, report: &SubmissionReport) -> Result<()> {
    let state = session.state()?;
    let (outcome, message) = match &report.outcome {
        SubmissionOutcome::Accepted { all_complete: true, .. } => {
            ("accepted", "All tests passed. Every puzzle is complete".to_string())
        }
        SubmissionOutcome::Accepted { fragment, .. } => {
            ("accepted", format!("All tests passed. Fragment {} collected", fragment))
        }
        SubmissionOutcome::Rejected { .. } => ("rejected", "Some tests failed".to_string()),
        SubmissionOutcome::AlreadyCompleted { .. } => {
            ("already_completed", "Puzzle already complete; progress unchanged".to_string())
        }
        SubmissionOutcome::Unjudged { error, .. } => (
            "unjudged",
            format!("Could not be judged, try again: {}", error),
        ),
        SubmissionOutcome::Discarded { .. } => {
            ("discarded", "Result discarded after navigation".to_string())
        }
    };

    let mut output = serde_json::json!({
        "outcome": outcome,
        "message": message,
        "phase": phase_name(&state),
        "fragments": state.fragments,
    });
    if let Some(result) = &report.result {
        output["submission_id"] = serde_json::json!(result.submission_id);
        output["visible"] = serde_json::json!(result.visible());
        output["hidden"] = serde_json::json!({
            "passed": result.hidden_passed(),
            "total": result.hidden().len(),
        });
        output["diagnostic"] = serde_json::json!(result.diagnostic);
    }
    if let SubmissionOutcome::Unjudged { error, .. } = &report.outcome {
        output["error_kind"] = serde_json::json!(error.kind());
        output["diagnostic"] = serde_json::json!(error.diagnostic());
    }
    if let Pointer::Active(index) = state.pointer {
        output["next_puzzle"] = serde_json::json!(index);
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
