//! termcanon CLI
//!
//! Thin host around the `termcanon` library:
//! - `encode`: export table (JSON) → canonical module s-expression
//! - `sharing`: subterm revisit statistics per declaration
//! - `name`: encode a single dotted name

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use termcanon::export_table::load_module_json;
use termcanon::{
    count_subterms, Declaration, DeclKind, Expr, ModuleData, ModuleEncoder, Name, SharingReport,
    SubtermTally, ToSexp,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "termcanon")]
#[command(
    author,
    version,
    about = "Canonical s-expression export of compiled terms and modules"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a module export table as `(:module ...)`.
    Encode {
        /// Export table JSON (`-` for stdin).
        input: PathBuf,
        /// Write here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Keep compiler-generated declarations (`_private`, `_aux`, ...).
        #[arg(long)]
        include_internal: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Sexp)]
        format: OutputFormat,
    },

    /// Report how much each declaration's terms are shared.
    Sharing {
        /// Export table JSON (`-` for stdin).
        input: PathBuf,
        /// Most revisited nodes to list per declaration.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Print the encoding of one dotted name (e.g. `Nat.add`).
    Name { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Rendered s-expression text
    Sexp,
    /// The `Sexp` tree as JSON
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read export table from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

fn load_module(path: &Path) -> Result<ModuleData> {
    let text = read_input(path)?;
    let module = load_module_json(&text)
        .with_context(|| format!("failed to load export table `{}`", path.display()))?;
    info!(
        module = %module.name,
        declarations = module.declarations.len(),
        "loaded module"
    );
    Ok(module)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write `{}`", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn render_module(module: &ModuleData, include_internal: bool, format: OutputFormat) -> Result<String> {
    let encoded = ModuleEncoder::new()
        .include_internal(include_internal)
        .encode(module);
    let mut text = match format {
        OutputFormat::Sexp => encoded.render(),
        OutputFormat::Json => serde_json::to_string(&encoded)?,
    };
    text.push('\n');
    Ok(text)
}

fn cmd_encode(
    input: &Path,
    out: Option<&Path>,
    include_internal: bool,
    format: OutputFormat,
) -> Result<()> {
    let module = load_module(input)?;
    let text = render_module(&module, include_internal, format)?;
    debug!(bytes = text.len(), "rendered module");
    write_output(out, &text)
}

/// One tally per declaration: its type, value, and constructor types.
fn declaration_tally(decl: &Declaration) -> SubtermTally {
    let mut tally = count_subterms(SubtermTally::new(), &decl.ty);
    if let Some(value) = decl.kind.value() {
        tally = count_subterms(tally, value);
    }
    if let DeclKind::Inductive { constructors } = &decl.kind {
        for ctor in constructors {
            tally = count_subterms(tally, &ctor.ty);
        }
    }
    tally
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::BVar(_) => "var",
        Expr::FVar(_) => "fvar",
        Expr::MVar(_) => "meta",
        Expr::Sort(_) => "sort",
        Expr::Const(..) => "const",
        Expr::App(..) => "apply",
        Expr::Lam(..) => "lambda",
        Expr::Pi(..) => "pi",
        Expr::Let(..) => "let",
        Expr::Lit(_) => "literal",
        Expr::MData(..) => "mdata",
        Expr::Proj(..) => "proj",
    }
}

fn format_report(name: &Name, kind: &str, report: &SharingReport) -> String {
    let mut out = format!(
        "{name} ({kind}): tracked={} shared={} revisits={}\n",
        report.tracked, report.shared, report.total_revisits
    );
    for (expr, count) in &report.top {
        out.push_str(&format!(
            "  {:<7} x{count} (children: {})\n",
            expr_kind(expr),
            expr.children().len()
        ));
    }
    out
}

fn cmd_sharing(input: &Path, top: usize) -> Result<()> {
    let module = load_module(input)?;
    let mut text = String::new();
    for decl in &module.declarations {
        let report = declaration_tally(decl).report(top);
        text.push_str(&format_report(&decl.name, decl.kind.label(), &report));
    }
    write_output(None, &text)
}

fn render_name(name: &str) -> Result<String> {
    let parsed: Name = name
        .parse()
        .with_context(|| format!("`{name}` is not a dotted name"))?;
    Ok(format!("{}\n", parsed.to_sexp()))
}

fn cmd_name(name: &str) -> Result<()> {
    write_output(None, &render_name(name)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            out,
            include_internal,
            format,
        } => cmd_encode(&input, out.as_deref(), include_internal, format),
        Commands::Sharing { input, top } => cmd_sharing(&input, top),
        Commands::Name { name } => cmd_name(&name),
    }
}
