//! Command line shell: list models and data files, run a model, apply scripts and print the
//! report.

use clap::{Args, Parser, Subcommand, ValueEnum};
use modelrun_core::config::RunConfig;
use modelrun_core::loader::discover_data_files;
use modelrun_core::registry::{qualified_name, MODEL_REGISTRY};
use modelrun_core::report::{ReportTable, RoundingPolicy};
use modelrun_core::results::ResultsStore;
use modelrun_core::script::script_engine_names;
use modelrun_core::session::Session;
use modelrun_core::timeseries::Years;
use modelrun_core::{ModelRunError, ModelRunResult};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "modelrun", version)]
#[command(about = "Run time-series models against LATA data files and post-process the results")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the models in the configured namespace
    Models,
    /// List the registered script engines
    Engines,
    /// List the data files in a directory
    Data {
        /// Directory to search instead of the configured data directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Run a model against a data file and print the report
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model name, qualified with the configured namespace unless it contains a `.`
    #[arg(short, long)]
    pub model: String,

    /// Data file, looked up in the data directory when not found as given
    #[arg(short, long)]
    pub data: PathBuf,

    /// Script file applied after the run, looked up in the scripts directory when not
    /// found as given. Repeatable
    #[arg(short, long = "script")]
    pub scripts: Vec<PathBuf>,

    /// Inline script text applied after the script files. Repeatable
    #[arg(short, long = "eval")]
    pub evals: Vec<String>,

    /// Read further scripts from stdin before printing the report
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,

    /// Override the configured rounding
    #[arg(long, value_enum)]
    pub rounding: Option<Rounding>,

    /// Override the configured script engine
    #[arg(long)]
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab separated report
    Tsv,
    /// Column aligned report
    Aligned,
    /// Years and results as JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Rounding {
    Grouped,
    Plain,
}

impl From<Rounding> for RoundingPolicy {
    fn from(value: Rounding) -> Self {
        match value {
            Rounding::Grouped => RoundingPolicy::Grouped,
            Rounding::Plain => RoundingPolicy::Plain,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    model: &'a str,
    years: &'a Years,
    results: &'a ResultsStore,
}

/// Run a parsed command line, reading interactive scripts from `input` and writing
/// listings and reports to `out`.
pub fn execute(cli: Cli, input: &mut impl BufRead, out: &mut impl Write) -> ModelRunResult<()> {
    let config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Command::Models => list_models(&config, out),
        Command::Engines => {
            for name in script_engine_names() {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
        Command::Data { dir } => list_data(dir.as_deref().unwrap_or(&config.data_dir), out),
        Command::Run(args) => run(config, args, input, out),
    }
}

fn list_models(config: &RunConfig, out: &mut impl Write) -> ModelRunResult<()> {
    let prefix = qualified_name(&config.model_namespace, "");
    for entry in MODEL_REGISTRY.list() {
        if let Some(name) = entry.name.strip_prefix(&prefix) {
            writeln!(out, "{}\t{}", name, entry.description)?;
        }
    }
    Ok(())
}

fn list_data(dir: &Path, out: &mut impl Write) -> ModelRunResult<()> {
    for path in discover_data_files(dir)? {
        let name = path.file_name().unwrap_or(path.as_os_str());
        writeln!(out, "{}", Path::new(name).display())?;
    }
    Ok(())
}

/// `path` as given if it exists, otherwise inside `dir` if it exists there.
fn resolve(path: &Path, dir: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = dir.join(path);
    if candidate.exists() {
        candidate
    } else {
        path.to_path_buf()
    }
}

fn run(
    mut config: RunConfig,
    args: RunArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> ModelRunResult<()> {
    if let Some(rounding) = args.rounding {
        config.report.rounding = rounding.into();
    }
    if let Some(engine) = args.engine {
        config.script.engine = engine;
    }

    let data = resolve(&args.data, &config.data_dir);
    let mut session = Session::open(&config, &args.model, &data)?;
    session.run_model()?;

    for script in &args.scripts {
        let path = resolve(script, &config.scripts_dir);
        let summary = session.run_script_file(&path)?;
        info!(
            "{}: added {:?}, updated {:?}",
            path.display(),
            summary.added,
            summary.updated
        );
    }
    for source in &args.evals {
        session.run_script(source)?;
    }

    if args.interactive {
        interactive(&mut session, args.format, input, out)?;
    }
    write_report(&session, args.format, out)
}

/// Apply scripts read from `input` until it ends or a `:quit` line.
///
/// Lines accumulate until a blank line, then run as one script. `:report` prints the current
/// report. A failing script is reported and leaves the results as they were.
fn interactive(
    session: &mut Session,
    format: OutputFormat,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> ModelRunResult<()> {
    let mut pending = String::new();
    for line in input.lines() {
        let line = line?;
        match line.trim() {
            ":quit" => break,
            ":report" => {
                apply_pending(session, &mut pending, out)?;
                write_report(session, format, out)?;
            }
            "" => apply_pending(session, &mut pending, out)?,
            _ => {
                pending.push_str(&line);
                pending.push('\n');
            }
        }
    }
    apply_pending(session, &mut pending, out)
}

fn apply_pending(
    session: &mut Session,
    pending: &mut String,
    out: &mut impl Write,
) -> ModelRunResult<()> {
    if pending.trim().is_empty() {
        pending.clear();
        return Ok(());
    }
    match session.run_script(pending) {
        Ok(summary) => debug!("Interactive script changed {:?}", summary),
        Err(ModelRunError::Script { cause, .. }) => writeln!(out, "Error: {cause}")?,
        Err(e) => return Err(e),
    }
    pending.clear();
    Ok(())
}

fn write_report(session: &Session, format: OutputFormat, out: &mut impl Write) -> ModelRunResult<()> {
    match format {
        OutputFormat::Tsv => write!(out, "{}", session.report()?)?,
        OutputFormat::Aligned => {
            write!(out, "{}", ReportTable::parse(&session.report()?).to_aligned())?
        }
        OutputFormat::Json => {
            let results = session.results().ok_or_else(|| ModelRunError::ModelExecution {
                model: session.model_name().to_string(),
                cause: "model has not been run".to_string(),
            })?;
            let report = JsonReport {
                model: session.model_name(),
                years: session.years(),
                results,
            };
            serde_json::to_writer_pretty(&mut *out, &report).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("doubler.txt"), "LATA 2020 2021 2022\nX 1 2\n").unwrap();
        fs::write(dir.path().join("notes.md"), "not data").unwrap();
        dir
    }

    fn execute_args(args: &[&str], stdin: &str) -> ModelRunResult<String> {
        let cli = Cli::try_parse_from(std::iter::once("modelrun").chain(args.iter().copied()))
            .unwrap();
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let mut out = Vec::new();
        execute(cli, &mut input, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_resolve_falls_back_to_directory() {
        let dir = data_dir();
        assert_eq!(
            resolve(Path::new("doubler.txt"), dir.path()),
            dir.path().join("doubler.txt")
        );
        assert_eq!(
            resolve(Path::new("missing.txt"), dir.path()),
            PathBuf::from("missing.txt")
        );
    }

    #[test]
    fn test_list_data() {
        let dir = data_dir();
        let out = execute_args(&["data", "--dir", dir.path().to_str().unwrap()], "").unwrap();
        assert_eq!(out, "doubler.txt\n");
    }

    #[test]
    fn test_run_with_eval() {
        let dir = data_dir();
        let data = dir.path().join("doubler.txt");
        let out = execute_args(
            &["run", "-m", "Doubler", "-d", data.to_str().unwrap(), "-e", "H = Y / 2"],
            "",
        )
        .unwrap();
        assert_eq!(out, "LATA\t2020\t2021\t2022\nY\t2\t4\t4\nH\t1\t2\t2\n");
    }

    #[test]
    fn test_interactive() {
        let dir = data_dir();
        let data = dir.path().join("doubler.txt");
        let stdin = "H = Y +\n\nH = Y + 1\n:report\nG = H * 0.5\n";
        let out = execute_args(
            &["run", "-m", "Doubler", "-d", data.to_str().unwrap(), "-i"],
            stdin,
        )
        .unwrap();

        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("Error: line 1: syntax error"));
        assert_eq!(
            out.lines().skip(1).collect::<Vec<_>>(),
            vec![
                "LATA\t2020\t2021\t2022",
                "Y\t2\t4\t4",
                "H\t3\t5\t5",
                "LATA\t2020\t2021\t2022",
                "Y\t2\t4\t4",
                "H\t3\t5\t5",
                "G\t1,5\t2,5\t2,5",
            ]
        );
    }

    #[test]
    fn test_list_models_in_namespace() {
        let out = execute_args(&["models"], "").unwrap();
        assert!(out.contains("Doubler\tY = 2 * X\n"));
        assert!(out.contains("GdpComponents\t"));
        assert!(!out.contains("models."));

        let dir = TempDir::new().unwrap();
        let config = dir.path().join("modelrun.toml");
        fs::write(&config, "model_namespace = \"elsewhere\"\n").unwrap();
        let out = execute_args(&["-c", config.to_str().unwrap(), "models"], "").unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_interactive_session_survives_oversized_series() {
        let dir = data_dir();
        let data = dir.path().join("doubler.txt");
        let stdin = "T = zeros(1e13)\n\nH = Y + 1\n";
        let out = execute_args(
            &["run", "-m", "Doubler", "-d", data.to_str().unwrap(), "-i"],
            stdin,
        )
        .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Error: line 1: length 10000000000000 exceeds"));
        assert_eq!(
            lines[1..].to_vec(),
            vec!["LATA\t2020\t2021\t2022", "Y\t2\t4\t4", "H\t3\t5\t5"]
        );
    }

    #[test]
    fn test_json_output() {
        let dir = data_dir();
        let data = dir.path().join("doubler.txt");
        let out = execute_args(
            &["run", "-m", "Doubler", "-d", data.to_str().unwrap(), "-f", "json"],
            "",
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["model"], "models.Doubler");
        assert_eq!(value["years"], serde_json::json!([2020, 2021, 2022]));
        assert_eq!(value["results"]["Y"], serde_json::json!([2.0, 4.0, 4.0]));
    }

    #[test]
    fn test_unknown_engine() {
        let dir = data_dir();
        let data = dir.path().join("doubler.txt");
        let err = execute_args(
            &[
                "run",
                "-m",
                "Doubler",
                "-d",
                data.to_str().unwrap(),
                "--engine",
                "lua",
                "-e",
                "H = Y",
            ],
            "",
        )
        .unwrap_err();
        assert!(err.to_string().contains("no script engine named 'lua'"));
    }
}
