use narwhal::{Diagnostic, Graph, GraphSpec, LayoutOptions, Strategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout(narwhal::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<narwhal::Error> for CliError {
    fn from(value: narwhal::Error) -> Self {
        Self::Layout(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Levels,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    options: Option<String>,
    strategy: Option<Strategy>,
    iterations: Option<usize>,
}

/// Input document: a graph description plus optional layout options.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(flatten)]
    graph: GraphSpec,
    #[serde(default)]
    options: Option<Value>,
}

fn usage() -> &'static str {
    "narwhal\n\
\n\
USAGE:\n\
  narwhal [layout] [--pretty] [--options <path>] [--strategy row|radial] [--iterations <n>] [<path>|-]\n\
  narwhal levels [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON object with `nodes`, `dependencies`, `relations` and an optional `options` object.\n\
  - Options are applied in order: defaults, the document's `options`, --options, then flags.\n\
  - Diagnostics (skipped records, cycles, unknown options, unmet constraints) are written to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "levels" => args.command = Command::Levels,
            "--pretty" => args.pretty = true,
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.options = Some(path.clone());
            }
            "--strategy" => {
                let Some(strategy) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.strategy = Some(
                    strategy
                        .parse::<Strategy>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--iterations" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.iterations = Some(n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("warning: {diagnostic}");
    }
}

fn build_options(args: &Args, document: Option<&Value>) -> Result<LayoutOptions, CliError> {
    let mut opts = LayoutOptions::default();
    if let Some(value) = document {
        report(&opts.merge_json(value)?);
    }
    if let Some(path) = args.options.as_deref() {
        let value: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        report(&opts.merge_json(&value)?);
    }
    if let Some(strategy) = args.strategy {
        opts.strategy = strategy;
    }
    if let Some(iterations) = args.iterations {
        opts.iterations = iterations;
    }
    opts.validate()?;
    Ok(opts)
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let document: Document = serde_json::from_str(&text)?;
    let mut graph = Graph::from_spec(&document.graph);

    match args.command {
        Command::Layout => {
            let opts = build_options(&args, document.options.as_ref())?;
            let result = graph.layout(&opts)?;
            report(&result.diagnostics);
            write_json(result, args.pretty)
        }
        Command::Levels => {
            let leveling = narwhal::assign_levels(&graph);
            report(graph.diagnostics());
            report(leveling.cycle.as_slice());
            let rings: Vec<Vec<&str>> = leveling
                .rings
                .iter()
                .map(|ring| {
                    ring.iter()
                        .filter_map(|&idx| graph.node(idx).map(|node| node.id.as_str()))
                        .collect()
                })
                .collect();
            write_json(&rings, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
