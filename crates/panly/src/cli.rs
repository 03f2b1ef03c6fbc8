//! Clap derive structures for the `panly` CLI.
//!
//! One subcommand per XML API request family, plus local config and
//! completion helpers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panly -- PAN-OS XML API from the command line
#[derive(Debug, Parser)]
#[command(
    name = "panly",
    version,
    about = "Drive PAN-OS firewalls and Panorama through the XML API",
    long_about = "Send XML API requests to a PAN-OS firewall or Panorama.\n\n\
        Connection details come from a profile in the config file,\n\
        overridable per invocation with the global flags below.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "PANLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Firewall or Panorama hostname (overrides profile)
    #[arg(long, short = 'H', env = "PANLY_HOSTNAME", global = true)]
    pub hostname: Option<String>,

    /// Port (overrides profile)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Managed firewall serial, to proxy requests through Panorama
    #[arg(long, global = true)]
    pub serial: Option<String>,

    /// API key
    #[arg(long, env = "PANLY_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Username for keygen
    #[arg(long, env = "PANLY_API_USERNAME", global = true)]
    pub api_username: Option<String>,

    /// Password for keygen
    #[arg(long, env = "PANLY_API_PASSWORD", global = true, hide_env = true)]
    pub api_password: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PANLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Use http instead of https
    #[arg(long, global = true)]
    pub http: bool,

    /// Send requests with GET instead of POST
    #[arg(long, global = true)]
    pub get: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "PANLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// What to print from the response
    #[arg(long, short = 'o', default_value = "result", global = true)]
    pub output: OutputMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the status line on stderr
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Children of the `result` element
    Result,
    /// The whole response document
    Root,
    /// The status detail message only
    Detail,
    /// Nothing
    None,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an API key from username and password
    Keygen,

    /// Show active configuration
    Show(XpathArgs),

    /// Get candidate configuration
    Get(XpathArgs),

    /// Delete a configuration node
    Delete(XpathArgs),

    /// Merge an element into the configuration
    Set(ElementArgs),

    /// Replace a configuration node
    Edit(ElementArgs),

    /// Override a template value
    Override(ElementArgs),

    /// Move a rule or entry
    Move(MoveArgs),

    /// Rename a configuration node
    Rename(RenameArgs),

    /// Clone a configuration node
    Clone(CloneArgs),

    /// Apply several configuration actions in one request
    MultiConfig(MultiConfigArgs),

    /// Run an operational command
    Op(OpArgs),

    /// Send a User-ID message
    UserId(UserIdArgs),

    /// Commit the candidate configuration
    Commit(CommitArgs),

    /// Retrieve logs
    Log(LogArgs),

    /// Generate a report
    Report(ReportArgs),

    /// Export a file
    Export(ExportArgs),

    /// Import a file
    Import(ImportArgs),

    /// Wait for a job to finish
    Wait(WaitArgs),

    /// Send a raw query string
    AdHoc(AdHocArgs),

    /// Inspect the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// Short name used in the status line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keygen => "keygen",
            Self::Show(_) => "show",
            Self::Get(_) => "get",
            Self::Delete(_) => "delete",
            Self::Set(_) => "set",
            Self::Edit(_) => "edit",
            Self::Override(_) => "override",
            Self::Move(_) => "move",
            Self::Rename(_) => "rename",
            Self::Clone(_) => "clone",
            Self::MultiConfig(_) => "multi-config",
            Self::Op(_) => "op",
            Self::UserId(_) => "user-id",
            Self::Commit(_) => "commit",
            Self::Log(_) => "log",
            Self::Report(_) => "report",
            Self::Export(_) => "export",
            Self::Import(_) => "import",
            Self::Wait(_) => "wait",
            Self::AdHoc(_) => "ad-hoc",
            Self::Config(_) => "config",
            Self::Completions(_) => "completions",
        }
    }
}

// ── Config action arguments ──────────────────────────────────────────

#[derive(Debug, Args)]
pub struct XpathArgs {
    /// XPath of the configuration node
    pub xpath: Option<String>,
}

#[derive(Debug, Args)]
pub struct ElementArgs {
    pub xpath: String,

    /// XML element, or @FILE to read it from a file
    pub element: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    pub xpath: String,

    /// top, bottom, before or after
    #[arg(long = "where")]
    pub r#where: String,

    /// Reference entry for before/after
    #[arg(long)]
    pub dst: Option<String>,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub xpath: String,
    pub newname: String,
}

#[derive(Debug, Args)]
pub struct CloneArgs {
    /// Parent XPath the copy is created under
    pub xpath: String,

    /// XPath of the node to copy
    #[arg(long)]
    pub from: String,

    pub newname: String,
}

#[derive(Debug, Args)]
pub struct MultiConfigArgs {
    /// `<multi-configure-request>` document, or @FILE
    pub element: String,

    /// Roll back every action if one fails
    #[arg(long)]
    pub strict: bool,
}

// ── Operational arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OpArgs {
    /// Command as XML, or CLI text with --cmd-xml
    pub cmd: String,

    /// Convert CLI-style text (`show system info`) to XML first
    #[arg(long, short = 'x')]
    pub cmd_xml: bool,

    #[arg(long)]
    pub vsys: Option<String>,
}

#[derive(Debug, Args)]
pub struct UserIdArgs {
    /// `<uid-message>` document, or @FILE
    pub cmd: String,

    #[arg(long)]
    pub vsys: Option<String>,
}

// ── Job arguments ────────────────────────────────────────────────────

/// Polling controls shared by job commands.
#[derive(Debug, Args)]
pub struct PollArgs {
    /// Seconds between job status checks
    #[arg(long)]
    pub interval: Option<f64>,

    /// Seconds to wait for the job; 0 waits forever
    #[arg(long = "job-timeout")]
    pub job_timeout: Option<f64>,
}

#[derive(Debug, Args)]
pub struct CommitArgs {
    /// `<commit>` document; omit to commit everything
    #[arg(long)]
    pub cmd: Option<String>,

    /// Commit action, e.g. `all` on Panorama
    #[arg(long)]
    pub action: Option<String>,

    /// Wait for the commit job to finish
    #[arg(long, short = 's')]
    pub sync: bool,

    /// Poll by resubmitting the commit (servers without job queries)
    #[arg(long)]
    pub legacy: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// traffic, threat, config, system, ...
    #[arg(long)]
    pub log_type: Option<String>,

    #[arg(long)]
    pub nlogs: Option<u32>,

    #[arg(long)]
    pub skip: Option<u32>,

    /// Log filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// forward or backward
    #[arg(long)]
    pub dir: Option<String>,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// dynamic, predefined or custom
    #[arg(long)]
    pub reporttype: Option<String>,

    #[arg(long)]
    pub reportname: Option<String>,

    #[arg(long)]
    pub vsys: Option<String>,

    #[arg(long)]
    pub cmd: Option<String>,

    /// Extra query parameter as NAME=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    pub job_id: String,

    /// How the job is checked
    #[arg(long, default_value = "op")]
    pub kind: JobKind,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    /// `show jobs id` (commit and other op jobs)
    Op,
    /// `type=log&action=get`
    Log,
    /// `type=report&action=get`
    Report,
}

// ── File arguments ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,

    /// Extra query parameter as NAME=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    /// Where to save an attachment (defaults to its filename)
    #[arg(long, short = 'O')]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(long)]
    pub category: String,

    pub file: PathBuf,

    /// Extra query parameter as NAME=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct AdHocArgs {
    /// Query string, e.g. `type=op&cmd=<show><clock/></show>`
    pub query: Option<String>,

    #[arg(long)]
    pub xpath: Option<String>,

    /// Add xpath, key, credentials and target from the profile
    #[arg(long, short = 'm')]
    pub modify: bool,
}

// ── Local commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the effective configuration (secrets masked)
    Show,
    /// List profile names
    Profiles,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}
