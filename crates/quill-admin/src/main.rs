use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use quill_core::QuillConfig;
use quill_slug::SlugKind;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    Command::new("quill-admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Quill maintenance: slug preview, legacy backfill and duplicate audit")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Quill configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("slugify")
                .about("Print the canonical token for a text")
                .arg(Arg::new("text").required(true).help("Title or display name"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .default_value("post")
                        .value_parser(["post", "user"])
                        .help("Record kind, selects the fallback token"),
                ),
        )
        .subcommand(
            Command::new("backfill")
                .about("Assign stored tokens to legacy posts and profiles in a snapshot")
                .arg(
                    Arg::new("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot JSON file"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Save the backfilled snapshot in place"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("List tokens held by more than one record")
                .arg(
                    Arg::new("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot JSON file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn setup_tracing(json: bool) {
    // stdout carries command output; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quill_core=info,quill_store=info,warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn load_config(matches: &ArgMatches) -> Result<QuillConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(QuillConfig::load(path).await?),
        None => Ok(QuillConfig::new()),
    }
}

fn snapshot_arg(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("snapshot").cloned().unwrap_or_default()
}

async fn run(matches: ArgMatches) -> Result<bool> {
    let config = load_config(&matches).await?;

    match matches.subcommand() {
        Some(("slugify", args)) => {
            let text = args.get_one::<String>("text").map(String::as_str).unwrap_or_default();
            let kind = match args.get_one::<String>("kind").map(String::as_str) {
                Some("user") => SlugKind::User,
                _ => SlugKind::Post,
            };
            println!("{}", commands::slugify(text, kind, &config));
            Ok(true)
        }
        Some(("backfill", args)) => {
            let write = args.get_flag("write");
            let summary = commands::backfill(&snapshot_arg(args), write, config).await?;
            println!("{}", commands::render_backfill(&summary));
            Ok(true)
        }
        Some(("audit", args)) => {
            let report = commands::audit(&snapshot_arg(args), config).await?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", commands::render_audit(&report));
            }
            Ok(report.is_clean())
        }
        _ => Ok(true),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    setup_tracing(matches.get_flag("log-json"));

    match run(matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn slugify_parses_kind() {
        let matches = cli()
            .try_get_matches_from(["quill-admin", "slugify", "Hello", "--kind", "user"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "slugify");
        assert_eq!(args.get_one::<String>("kind").map(String::as_str), Some("user"));
    }

    #[test]
    fn rejects_unknown_kind() {
        let result =
            cli().try_get_matches_from(["quill-admin", "slugify", "Hello", "--kind", "tag"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["quill-admin", "audit", "data.json", "--json", "--log-json"])
            .unwrap();
        assert!(matches.get_flag("log-json"));
    }
}
