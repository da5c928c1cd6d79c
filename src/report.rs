//! Output formatting for annotation runs.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output, including the generated source on dry runs
//! - JSON: one structured report written when the run finishes
//! - Quiet: no output at all; failures still reach the log

use std::io::{self, Write};
use std::path::Path;

use colored::*;
use serde::Serialize;

use crate::runner::{RunParams, RunSummary};

/// Kind of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Success,
    Info,
    Error,
}

/// Receives progress of a run.
pub trait Presenter {
    fn run_header(&mut self, params: &RunParams) -> io::Result<()>;
    fn class_header(&mut self, fqn: &str, path: &Path) -> io::Result<()>;
    fn message(&mut self, text: &str, status: MessageStatus) -> io::Result<()>;
    /// Full text of a processed file.
    fn source(&mut self, path: &Path, text: &str) -> io::Result<()>;
    fn separator(&mut self) -> io::Result<()>;
    fn run_footer(&mut self, summary: &RunSummary) -> io::Result<()>;
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pretty" => Some(Format::Pretty),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Build the presenter for a format, writing to stdout.
pub fn presenter_for(format: Format, quiet: bool) -> Box<dyn Presenter> {
    match (format, quiet) {
        (_, true) => Box::new(QuietPresenter),
        (Format::Pretty, false) => Box::new(PrettyPresenter::new(io::stdout())),
        (Format::Json, false) => Box::new(JsonPresenter::new(io::stdout())),
    }
}

/// Parameter line in the form `| dataClass: All | dryRun: true | ... |`.
pub fn params_line(params: &RunParams) -> String {
    let entries = [
        format!("dataClass: {}", params.data_class.as_deref().unwrap_or("All")),
        format!("dryRun: {}", params.dry_run),
        format!("addUseStatements: {}", params.add_use_statements),
        format!("createBackupFile: {}", params.create_backup_file),
        format!("quiet: {}", params.quiet),
    ];
    format!("| {} |", entries.join(" | "))
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Human-readable output.
pub struct PrettyPresenter<W: Write> {
    out: W,
}

impl<W: Write> PrettyPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for PrettyPresenter<W> {
    fn run_header(&mut self, params: &RunParams) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "  {} v{}",
            "model-annotations".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "  {}{}", "Params: ".dimmed(), params_line(params))
    }

    fn class_header(&mut self, fqn: &str, path: &Path) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  {}", fqn.bold())?;
        writeln!(self.out, "  {}", path.display().to_string().blue())
    }

    fn message(&mut self, text: &str, status: MessageStatus) -> io::Result<()> {
        match status {
            MessageStatus::Success => writeln!(self.out, "    {} {}", "✓".green(), text),
            MessageStatus::Info => writeln!(self.out, "    {} {}", "•".dimmed(), text),
            MessageStatus::Error => writeln!(self.out, "    {} {}", "✗".red(), text.red()),
        }
    }

    fn source(&mut self, path: &Path, text: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  {}", format!("--- {}", path.display()).dimmed())?;
        writeln!(self.out, "{}", text)
    }

    fn separator(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  {}", "-----------------------".dimmed())
    }

    fn run_footer(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "  Processed: {}", summary.processed)?;
        write!(self.out, "  Changed: {}", summary.changed.to_string().green())?;
        write!(self.out, "  Written: {}", summary.written)?;
        if summary.has_failures() {
            write!(self.out, "  Failed: {}", summary.failed.to_string().red())?;
        } else {
            write!(self.out, "  Failed: {}", summary.failed)?;
        }
        writeln!(self.out)?;

        if summary.dry_run && summary.changed > 0 {
            writeln!(
                self.out,
                "  {}",
                "(dry run, no files were written; pass --write to apply)".dimmed()
            )?;
        }

        writeln!(self.out)?;
        writeln!(self.out, "  Task finished")?;
        writeln!(self.out)
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub params: &'a RunParams,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
}

/// Collects the run and writes one JSON document at the end.
pub struct JsonPresenter<W: Write> {
    out: W,
    params: Option<RunParams>,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, params: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn run_header(&mut self, params: &RunParams) -> io::Result<()> {
        self.params = Some(params.clone());
        Ok(())
    }

    fn class_header(&mut self, _fqn: &str, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn message(&mut self, _text: &str, _status: MessageStatus) -> io::Result<()> {
        Ok(())
    }

    fn source(&mut self, _path: &Path, _text: &str) -> io::Result<()> {
        Ok(())
    }

    fn separator(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn run_footer(&mut self, summary: &RunSummary) -> io::Result<()> {
        let params = self.params.clone().unwrap_or(RunParams {
            data_class: None,
            dry_run: summary.dry_run,
            add_use_statements: false,
            create_backup_file: false,
            quiet: false,
        });
        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            params: &params,
            summary,
        };

        let json = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
        writeln!(self.out, "{}", json)
    }
}

// =============================================================================
// Quiet
// =============================================================================

/// Discards everything.
pub struct QuietPresenter;

impl Presenter for QuietPresenter {
    fn run_header(&mut self, _params: &RunParams) -> io::Result<()> {
        Ok(())
    }

    fn class_header(&mut self, _fqn: &str, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn message(&mut self, _text: &str, _status: MessageStatus) -> io::Result<()> {
        Ok(())
    }

    fn source(&mut self, _path: &Path, _text: &str) -> io::Result<()> {
        Ok(())
    }

    fn separator(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn run_footer(&mut self, _summary: &RunSummary) -> io::Result<()> {
        Ok(())
    }
}
