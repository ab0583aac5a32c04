// esu - ElasticSearch Utility for managing an Elasticsearch cluster
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

mod client;
mod commands;
mod config;
mod input;
mod models;
mod output;
mod table;

use crate::client::EsClient;
use crate::commands::{Session, UsageError, cluster, indices, ping};
use crate::config::{ConnectionFlags, Scope};
use anyhow::{Context, Result, anyhow};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "esu",
    version,
    about = "ElasticSearch Utility: a tool for configuring and managing an Elasticsearch cluster",
    disable_help_flag = true,
    disable_help_subcommand = true,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        short = 'h',
        global = true,
        value_name = "HOST",
        help = "Cluster host [env: ESU_HOST] [default: localhost]"
    )]
    host: Option<String>,

    #[arg(
        long,
        short = 'p',
        global = true,
        value_name = "PORT",
        help = "Cluster HTTP port [env: ESU_PORT] [default: 9200]"
    )]
    port: Option<String>,

    #[arg(long, short = 's', global = true, help = "Connect over HTTPS [env: ESU_SSL]")]
    ssl: bool,

    #[arg(long, global = true, help = "Disable colored output (also honours NO_COLOR)")]
    no_color: bool,

    #[arg(long, short = 'v', global = true, help = "Log requests to stderr")]
    verbose: bool,

    #[arg(long, global = true, action = ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ping the cluster to see if it's available
    #[command(visible_alias = "p", disable_help_flag = true)]
    Ping,
    /// Get information about the connected cluster
    #[command(
        subcommand,
        visible_alias = "c",
        disable_help_flag = true,
        arg_required_else_help = true
    )]
    Cluster(ClusterCommand),
    /// Create, read, update and delete indices
    #[command(
        subcommand,
        visible_aliases = ["i", "indices", "indexes"],
        disable_help_flag = true,
        arg_required_else_help = true
    )]
    Index(IndexCommand),
    /// Show help for esu or one of its commands
    #[command(visible_alias = "man", disable_help_flag = true)]
    Help {
        #[arg(value_name = "COMMAND")]
        command: Vec<String>,
    },
    /// Persist the given --host/--port/--ssl as defaults
    #[command(disable_help_flag = true)]
    Configure {
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (user config dir or ./.esu.yaml)"
        )]
        scope: ScopeArg,
        #[arg(long, help = "Store plain HTTP as the default")]
        no_ssl: bool,
    },
    /// Show the resolved connection settings
    #[command(disable_help_flag = true)]
    ConfigShow,
    /// Generate shell completion scripts
    #[command(disable_help_flag = true)]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Subcommand)]
enum ClusterCommand {
    /// Get health information about the cluster
    #[command(visible_alias = "h", disable_help_flag = true)]
    Health,
    /// Get cluster-wide statistics, including indices, storage and nodes
    #[command(visible_alias = "s", disable_help_flag = true)]
    Stats,
    /// Get information on the nodes in the cluster
    #[command(visible_alias = "n", disable_help_flag = true)]
    Nodes,
    /// Update the cluster settings via JSON
    #[command(
        visible_alias = "u",
        disable_help_flag = true,
        long_about = "Update the cluster settings via JSON.\n\nPATH is a JSON document to update with. Alternatively, JSON can be piped into this command."
    )]
    Update {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum IndexCommand {
    /// List out info about any or all indices in the cluster
    #[command(visible_alias = "l", disable_help_flag = true)]
    List {
        #[arg(value_name = "INDEX")]
        names: Vec<String>,
    },
    /// Create a new index, optionally with settings/mappings JSON from PATH or stdin
    #[command(visible_alias = "c", disable_help_flag = true)]
    Create {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Get stats about a single index
    #[command(visible_alias = "s", disable_help_flag = true)]
    Stats {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete index(es) permanently
    #[command(visible_alias = "d", disable_help_flag = true)]
    Delete {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

/// Per-invocation settings shared by every command.
struct Invocation {
    cwd: PathBuf,
    flags: ConnectionFlags,
    styled: bool,
}

impl Invocation {
    fn report<F>(&self, handler: F) -> Result<()>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let connection = config::connection(&self.cwd, &self.flags)?;
        debug!(%connection, "resolved cluster address");
        let client = EsClient::new(connection.base_url()?)?;

        let mut stdout = io::stdout().lock();
        let mut session = Session::new(client, &mut stdout, self.styled);
        handler(&mut session)?;
        session.out.flush().context("flushing output")
    }
}

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => return parse_failure(&err, &args),
    };

    init_tracing(cli.verbose);
    // Styling is decided per stream below, so colored must not second-guess it.
    colored::control::set_override(true);
    let styled_errors = output::color_enabled(cli.no_color, io::stderr().is_terminal());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(usage) = err.downcast_ref::<UsageError>() {
                debug!(error = %usage, "usage error");
                let _ = print_command_help(usage.command.as_slice(), &mut io::stderr());
            } else {
                eprintln!("{}", output::error_line(&err, styled_errors));
            }
            ExitCode::FAILURE
        }
    }
}

/// Reports arguments clap rejected. Bad positionals show the help of the
/// command they were passed to, bare `esu` shows the top-level help.
fn parse_failure(err: &clap::Error, args: &[OsString]) -> ExitCode {
    let path = subcommand_path(args);
    let shown = match err.kind() {
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand if path.is_empty() => {
            return match print_command_help(path.as_slice(), &mut io::stdout()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        ErrorKind::MissingRequiredArgument
        | ErrorKind::TooManyValues
        | ErrorKind::WrongNumberOfValues
        | ErrorKind::UnknownArgument
            if !path.is_empty() && !rejected_flag(err) =>
        {
            print_command_help(path.as_slice(), &mut io::stderr()).is_ok()
        }
        _ => false,
    };

    if !shown {
        let _ = err.print();
        if !err.use_stderr() {
            return ExitCode::SUCCESS;
        }
    }
    ExitCode::FAILURE
}

/// True when clap choked on an unknown `--flag` rather than a stray value.
fn rejected_flag(err: &clap::Error) -> bool {
    matches!(
        err.get(ContextKind::InvalidArg),
        Some(ContextValue::String(arg)) if arg.starts_with('-')
    )
}

/// Canonical names of the subcommands named in `args`, skipping option
/// values and stopping at the first positional.
fn subcommand_path(args: &[OsString]) -> Vec<String> {
    let mut root = Cli::command();
    root.build();

    let mut path = Vec::new();
    let mut current = &root;
    let mut words = args.iter().skip(1).filter_map(|arg| arg.to_str());
    while let Some(word) = words.next() {
        let takes_value = |matches: &dyn Fn(&clap::Arg) -> bool| {
            current
                .get_arguments()
                .any(|arg| matches(arg) && arg.get_action().takes_values())
        };
        if let Some(long) = word.strip_prefix("--") {
            let by_long = |arg: &clap::Arg| arg.get_long() == Some(long);
            if !long.contains('=') && takes_value(&by_long) {
                words.next();
            }
        } else if let Some(short) = word.strip_prefix('-') {
            let mut chars = short.chars();
            if let (Some(flag), None) = (chars.next(), chars.next()) {
                if takes_value(&|arg: &clap::Arg| arg.get_short() == Some(flag)) {
                    words.next();
                }
            }
        } else {
            match current.find_subcommand(word) {
                Some(sub) => {
                    path.push(sub.get_name().to_string());
                    current = sub;
                }
                None => break,
            }
        }
    }
    path
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "esu=debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let invocation = Invocation {
        cwd: std::env::current_dir().context("reading current directory")?,
        flags: ConnectionFlags {
            host: cli.host,
            port: cli.port,
            ssl: cli.ssl,
        },
        styled: output::color_enabled(cli.no_color, io::stdout().is_terminal()),
    };

    match cli.command {
        Commands::Ping => invocation.report(ping::run),
        Commands::Cluster(command) => match command {
            ClusterCommand::Health => invocation.report(cluster::health),
            ClusterCommand::Stats => invocation.report(cluster::stats),
            ClusterCommand::Nodes => invocation.report(cluster::nodes),
            ClusterCommand::Update { path } => {
                let settings = input::payload_from(path.as_deref(), input::stdin_source)?
                    .ok_or_else(|| UsageError::new(&["cluster", "update"]))?;
                invocation.report(|session| cluster::update(session, &settings))
            }
        },
        Commands::Index(command) => match command {
            IndexCommand::List { names } => {
                invocation.report(|session| indices::list(session, &names))
            }
            IndexCommand::Create { name, path } => {
                let body = input::payload_from(path.as_deref(), input::stdin_source)?;
                invocation.report(|session| indices::create(session, &name, body.as_ref()))
            }
            IndexCommand::Stats { name } => {
                invocation.report(|session| indices::stats(session, &name))
            }
            IndexCommand::Delete { names } => {
                invocation.report(|session| indices::delete(session, &names))
            }
        },
        Commands::Help { command } => print_command_help(command.as_slice(), &mut io::stdout()),
        Commands::Configure { scope, no_ssl } => configure(&invocation, scope.into(), no_ssl),
        Commands::ConfigShow => {
            let connection = config::connection(&invocation.cwd, &invocation.flags)?;
            let url = connection.to_string();
            let shown = json!({
                "host": connection.host,
                "port": connection.port,
                "ssl": connection.ssl,
                "url": url,
            });
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(())
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            let mut out = io::stdout();
            match shell {
                CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin, &mut out),
                CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut out),
                CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin, &mut out),
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut out)
                }
            }
            Ok(())
        }
    }
}

fn configure(invocation: &Invocation, scope: Scope, no_ssl: bool) -> Result<()> {
    let flags = &invocation.flags;
    let ssl = match (flags.ssl, no_ssl) {
        (true, true) => return Err(anyhow!("use only one of --ssl or --no-ssl")),
        (true, false) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    if flags.host.is_none() && flags.port.is_none() && ssl.is_none() {
        return Err(anyhow!(
            "nothing to save; pass --host, --port, --ssl or --no-ssl"
        ));
    }

    let mut existing = config::load_scope(scope, &invocation.cwd)?;
    if let Some(host) = flags.host.clone() {
        existing.host = Some(host);
    }
    if let Some(port) = flags.port.clone() {
        existing.port = Some(port);
    }
    if ssl.is_some() {
        existing.ssl = ssl;
    }

    let path = config::save(scope, &existing, &invocation.cwd)?;
    println!("Saved connection defaults to {}", path.display());
    Ok(())
}

/// Writes the help of the command at `path` (empty for the top level).
fn print_command_help<S, W>(path: &[S], out: &mut W) -> Result<()>
where
    S: AsRef<str>,
    W: Write + ?Sized,
{
    let mut root = Cli::command().bin_name("esu");
    root.build();

    let mut target = &mut root;
    for name in path {
        let name = name.as_ref();
        target = target
            .find_subcommand_mut(name)
            .ok_or_else(|| anyhow!("no help topic for `{name}`"))?;
    }

    write!(out, "{}", target.render_long_help()).context("writing help")?;
    out.flush().context("writing help")
}
