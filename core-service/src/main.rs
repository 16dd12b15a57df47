//! Transaction Monitor - CLI Entry Point

use std::path::PathBuf;

use txn_monitor_core::constants::{APP_NAME, APP_VERSION};
use txn_monitor_core::logic::events::LogSink;
use txn_monitor_core::logic::probe::ProbeInput;
use txn_monitor_core::logic::remote::client::{HttpRemote, RemoteConfig};
use txn_monitor_core::logic::remote::BatchFile;
use txn_monitor_core::logic::scenario::presets::{preset, PRESET_NAMES};
use txn_monitor_core::logic::scenario::LogScenarioSink;
use txn_monitor_core::logic::view::{DisplayConfig, SortKey};
use txn_monitor_core::logic::{MonitorConfig, MonitorResult, ScenarioOrchestrator, SessionController};

const USAGE: &str = "\
Usage: txn-monitor [BATCH.csv] [options]

Batch options:
  --flagged-only            show flagged rows only
  --search <owner>          filter rows by owner
  --sort <key>              id | owner | amount | timestamp | score | status
  --profile <owner>         print the owner's profile after the batch

Probe options:
  --amount <n> --location <city> --owner <id> [--item-id <id>] [--timestamp <ts>]
  --judge                   probe the input once
  --scenario <name>         switch-device | change-location | increase-amount | escalation";

#[derive(Debug, Default)]
struct CliArgs {
    batch: Option<PathBuf>,
    display: DisplayConfig,
    profile_owner: Option<String>,
    probe_input: ProbeInput,
    judge: bool,
    scenario: Option<String>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));

            match arg.as_str() {
                "--flagged-only" => parsed.display.flagged_only = true,
                "--search" => parsed.display.search_term = value("--search")?,
                "--sort" => {
                    let raw = value("--sort")?;
                    parsed.display.sort_key =
                        SortKey::parse(&raw).ok_or_else(|| format!("unknown sort key '{}'", raw))?;
                }
                "--profile" => parsed.profile_owner = Some(value("--profile")?),
                "--amount" => {
                    let raw = value("--amount")?;
                    let amount = raw.parse().map_err(|_| format!("invalid amount '{}'", raw))?;
                    parsed.probe_input.amount = Some(amount);
                }
                "--location" => parsed.probe_input.location = value("--location")?,
                "--owner" => parsed.probe_input.owner_key = value("--owner")?,
                "--item-id" => parsed.probe_input.item_id = value("--item-id")?,
                "--timestamp" => parsed.probe_input.timestamp = value("--timestamp")?,
                "--judge" => parsed.judge = true,
                "--scenario" => {
                    let name = value("--scenario")?;
                    if !PRESET_NAMES.contains(&name.as_str()) {
                        return Err(format!("unknown scenario '{}'", name));
                    }
                    parsed.scenario = Some(name);
                }
                "-h" | "--help" => return Err(String::new()),
                flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
                path => parsed.batch = Some(PathBuf::from(path)),
            }
        }

        if parsed.batch.is_none() && parsed.scenario.is_none() && !parsed.judge {
            return Err("nothing to do".to_string());
        }
        Ok(parsed)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {}\n", msg);
            }
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> MonitorResult<()> {
    let config = MonitorConfig::default();
    log::debug!("Config: {:?}", config);

    if let Some(path) = &args.batch {
        let remote = HttpRemote::new(RemoteConfig::from(&config))?;
        let mut session = SessionController::new(remote, LogSink::new(), config.clone())
            .with_display_config(args.display.clone());

        let file = BatchFile::from_path(path)?;
        let summary = session.run(&file).await?;
        print_json(&summary);

        if let Some(owner) = &args.profile_owner {
            match session.owner_profile(owner) {
                Some(profile) => print_json(&profile),
                None => log::warn!("No records for owner '{}'", owner),
            }
        }
    }

    if args.scenario.is_none() && !args.judge {
        return Ok(());
    }

    let probe = HttpRemote::new(RemoteConfig::from(&config))?;
    let orchestrator = ScenarioOrchestrator::new(probe, LogScenarioSink, &config);
    orchestrator.set_input(args.probe_input.clone());

    if args.judge {
        let result = orchestrator.judge().await?;
        log::info!("{} ({:.1}%)", result.verdict(), result.score * 100.0);
        print_json(&result);
    }

    if let Some(name) = &args.scenario {
        let steps = preset(name, orchestrator.step_delay()).unwrap_or_default();
        let run = orchestrator.run(name.as_str(), steps);
        tokio::pin!(run);

        // Ctrl-C resets; the run notices at its next checkpoint
        let outcome = tokio::select! {
            outcome = &mut run => outcome,
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted, resetting scenario state");
                orchestrator.reset().await;
                run.await
            }
        };
        log::info!("Scenario '{}' finished: {:?}", name, outcome);
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}
