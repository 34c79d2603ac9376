//! # LispCanvas Command Line
//!
//! Headless access to the design modules, driven through the same shell as
//! the GUI.
//!
//! # Usage
//!
//! ```bash
//! # List modules in navigation order
//! lispcanvas list
//!
//! # Show a module's parameters
//! lispcanvas schema staircase
//!
//! # Draw a lintel from its defaults with one override and write DXF
//! lispcanvas render lintel --defaults --param span=1000 --output lintel.dxf
//!
//! # Print design results for parameters stored in JSON
//! lispcanvas summary sunshed --params sunshed.json --json
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use canvas_core::params::ModuleParameterState;
use canvas_core::registry::REGISTRY;
use canvas_core::settings::{ShellSettings, CONFIG_ENV_VAR};
use canvas_core::shell::{Shell, ShellEffect, ShellEvent};

#[derive(Parser)]
#[command(name = "lispcanvas")]
#[command(version)]
#[command(about = "Civil-engineering design drawings from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered modules
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show the parameters of a module
    Schema {
        /// Module id, e.g. `bridge`
        module: String,

        #[arg(long)]
        json: bool,
    },

    /// Draw a module and export it
    Render {
        #[command(flatten)]
        input: DesignArgs,

        #[arg(long, value_enum, default_value = "dxf")]
        format: OutputFormat,

        /// Output file; `-` writes to stdout. Defaults to `<module>.<ext>`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print design results and checks
    Summary {
        #[command(flatten)]
        input: DesignArgs,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct DesignArgs {
    /// Module id
    module: String,

    /// Start from every schema default
    #[arg(long)]
    defaults: bool,

    /// JSON object of parameter values, applied after defaults
    #[arg(long)]
    params: Option<PathBuf>,

    /// `name=value` override, applied last; repeatable
    #[arg(short, long = "param", value_parser = parse_assignment)]
    param: Vec<(String, String)>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Dxf,
    Svg,
    Pdf,
}

impl OutputFormat {
    fn event(self) -> ShellEvent {
        match self {
            OutputFormat::Dxf => ShellEvent::GenerateDxf,
            OutputFormat::Svg => ShellEvent::ExportSvg,
            OutputFormat::Pdf => ShellEvent::ExportPdf,
        }
    }
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvas_core=warn,lispcanvas=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ShellSettings::load_or_default(cli.config.as_deref()).context("loading settings")?;

    match cli.command {
        Commands::List { json } => list(json),
        Commands::Schema { module, json } => schema(&module, json),
        Commands::Render { input, format, output } => {
            let mut shell = prepare(settings, &input)?;
            render(&mut shell, format, output)
        }
        Commands::Summary { input, json } => {
            let mut shell = prepare(settings, &input)?;
            summary(&mut shell, json)
        }
    }
}

fn list(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = REGISTRY
            .iter()
            .map(|d| serde_json::json!({ "id": d.id, "display_name": d.display_name }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for d in &REGISTRY {
            println!("{:<20} {}", d.id, d.display_name);
        }
    }
    Ok(())
}

fn schema(module: &str, json: bool) -> Result<()> {
    let kind = Shell::require_module(module)?;
    if json {
        let rows: Vec<_> = kind
            .parameters()
            .iter()
            .map(|spec| {
                serde_json::json!({
                    "name": spec.name,
                    "label": spec.label,
                    "unit": spec.unit,
                    "default": spec.default_value(),
                    "accepts": spec.hint(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{} ({})", kind.display_name(), kind.id());
        for spec in kind.parameters() {
            println!(
                "  {:<22} {:<10} {:<6} {:<40} {}",
                spec.name,
                spec.default_value().to_string(),
                spec.unit,
                spec.label,
                spec.hint()
            );
        }
    }
    Ok(())
}

/// A shell with `input.module` active and its parameters applied.
fn prepare(settings: ShellSettings, input: &DesignArgs) -> Result<Shell> {
    let kind = Shell::require_module(&input.module)?;
    let mut shell = Shell::new(settings);
    shell.select_module(kind.id());

    if input.defaults {
        shell.handle(ShellEvent::LoadDefaults)?;
    }

    if let Some(path) = &input.params {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let state: ModuleParameterState =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        for (name, value) in state {
            shell.handle(ShellEvent::SetValue { name, value })?;
        }
    }

    for (name, value) in &input.param {
        shell.handle(ShellEvent::SetParameter {
            name: name.clone(),
            value: value.clone(),
        })?;
    }

    debug!(module = kind.id(), "parameters applied");
    Ok(shell)
}

fn render(shell: &mut Shell, format: OutputFormat, output: Option<PathBuf>) -> Result<()> {
    let ShellEffect::Exported(artifact) = shell.handle(format.event())? else {
        bail!("no module is active");
    };

    let path = output.unwrap_or_else(|| PathBuf::from(artifact.file_name()));
    if path.as_os_str() == "-" {
        io::stdout().write_all(&artifact.bytes)?;
    } else {
        fs::write(&path, &artifact.bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = artifact.bytes.len(), "wrote {}", artifact.format);
    }
    Ok(())
}

fn summary(shell: &mut Shell, json: bool) -> Result<()> {
    shell.handle(ShellEvent::Render)?;
    let Some(design) = shell.active_session().and_then(|s| s.design()) else {
        bail!("render produced no design");
    };

    if json {
        let report = serde_json::json!({
            "title": design.drawing.title,
            "passes": design.passes(),
            "summary": design.summary,
            "checks": design.checks,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", design.drawing.title);
    println!();
    for item in &design.summary {
        println!("  {:<40} {:>12} {}", item.label, item.formatted(), item.unit);
    }
    println!();
    for check in &design.checks {
        println!(
            "  {:<40} {:>12} {:>14}  [{}]",
            check.name,
            check.actual,
            check.limit,
            check.status()
        );
    }
    println!();
    println!("RESULT: {}", if design.passes() { "ADEQUATE" } else { "INADEQUATE" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::params::ParamValue;
    use canvas_core::registry::ModuleKind;
    use tempfile::TempDir;

    fn args(module: &str) -> DesignArgs {
        DesignArgs {
            module: module.to_string(),
            defaults: false,
            params: None,
            param: Vec::new(),
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("span = 1200").unwrap(), ("span".to_string(), "1200".to_string()));
        assert_eq!(parse_assignment("mark=").unwrap(), ("mark".to_string(), String::new()));
        assert!(parse_assignment("span").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prepare_applies_layers_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lintel.json");
        fs::write(&path, r#"{ "span": 900, "opening_type": "window" }"#).unwrap();

        let mut input = args("lintel");
        input.defaults = true;
        input.params = Some(path);
        input.param = vec![("span".to_string(), "1000".to_string())];

        let shell = prepare(ShellSettings::default(), &input).unwrap();
        let session = shell.session(ModuleKind::Lintel).unwrap();
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1000.0)));
        assert_eq!(
            session.parameters().get("opening_type"),
            Some(&ParamValue::Text("Window".to_string()))
        );
    }

    #[test]
    fn test_prepare_rejects_unknown_module() {
        let err = prepare(ShellSettings::default(), &args("gantry")).unwrap_err();
        assert!(err.to_string().contains("gantry"));
    }

    #[test]
    fn test_render_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("column.dxf");
        let mut input = args("rectangle_column");
        input.defaults = true;

        let mut shell = prepare(ShellSettings::default(), &input).unwrap();
        render(&mut shell, OutputFormat::Dxf, Some(output.clone())).unwrap();
        let dxf = fs::read_to_string(output).unwrap();
        assert!(dxf.ends_with("EOF\n"));
    }

    #[test]
    fn test_render_without_parameters_fails() {
        let mut shell = prepare(ShellSettings::default(), &args("sunshed")).unwrap();
        let err = render(&mut shell, OutputFormat::Svg, None).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("nothing to export"));
    }
}
