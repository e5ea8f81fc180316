use nautilus::{
    Algorithm, CoulombOptions, DeterministicTextMeasurer, GraphSpec, InputEvent, InputOptions,
    InputState, LayoutStats, Scene, SceneOptions, ViewMapping,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Scene(nautilus::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Scene(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<nautilus::Error> for CliError {
    fn from(value: nautilus::Error) -> Self {
        Self::Scene(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    View,
    Stats,
}

#[derive(Debug, Clone, Copy, Default)]
enum AlgorithmKind {
    #[default]
    Coulomb,
    Preset,
}

impl FromStr for AlgorithmKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coulomb" => Ok(Self::Coulomb),
            "preset" => Ok(Self::Preset),
            _ => Err(()),
        }
    }
}

/// Tunables read from `--config`; every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Config {
    scene: SceneOptions,
    input: InputOptions,
    coulomb: CoulombOptions,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    events: Option<String>,
    pretty: bool,
    verbose: u8,
    algorithm: AlgorithmKind,
    seed: Option<u64>,
    viewport_width: f64,
    viewport_height: f64,
    drags: Vec<(f64, f64)>,
    wheels: Vec<f64>,
    cursor: Option<(f64, f64)>,
    out: Option<String>,
}

#[derive(Serialize)]
struct StatsOut {
    clusters: usize,
    leaves: usize,
    links: usize,
    root: String,
    layout: LayoutStats,
    view_mapping: ViewMapping,
}

fn usage() -> &'static str {
    "nautilus-cli\n\
\n\
USAGE:\n\
  nautilus-cli [layout] [--algorithm coulomb|preset] [--seed <n>] [--viewport-width <w>] [--viewport-height <h>] [--config <path>] [--pretty] [--out <path>] [<path>|-]\n\
  nautilus-cli view [--drag <dx>,<dy>]... [--wheel <delta>]... [--cursor <x>,<y>] [--events <path>] [layout flags] [<path>|-]\n\
  nautilus-cli stats [layout flags] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the scene description is read from stdin.\n\
  - layout prints the frame right after placement; view applies input first.\n\
  - --events reads a JSON array of input events, applied after --drag and --wheel.\n\
  - --wheel zooms around --cursor, which defaults to the viewport centre.\n\
  - -v / -vv log debug / trace output to stderr.\n\
"
}

fn parse_pair(raw: &str) -> Result<(f64, f64), CliError> {
    let (a, b) = raw.split_once(',').ok_or(CliError::Usage(usage()))?;
    let a = a.trim().parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    let b = b.trim().parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    Ok((a, b))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        viewport_width: 800.0,
        viewport_height: 600.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "view" => args.command = Command::View,
            "stats" => args.command = Command::Stats,
            "--pretty" => args.pretty = true,
            "-v" => args.verbose = args.verbose.max(1),
            "-vv" => args.verbose = 2,
            "--algorithm" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.algorithm = kind
                    .parse::<AlgorithmKind>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--seed" => {
                let Some(seed) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--viewport-width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.viewport_width = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--viewport-height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.viewport_height = h.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--events" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.events = Some(path.clone());
            }
            "--drag" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.drags.push(parse_pair(raw)?);
            }
            "--wheel" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.wheels
                    .push(raw.parse::<f64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--cursor" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.cursor = Some(parse_pair(raw)?);
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
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
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
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

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            if pretty {
                serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
            } else {
                serde_json::to_writer(std::io::stdout().lock(), value)?;
            }
        }
        Some(path) => {
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            if pretty {
                serde_json::to_writer_pretty(file, value)?;
            } else {
                serde_json::to_writer(file, value)?;
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => return,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => serde_json::from_str::<Config>(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.coulomb.random_seed = seed;
    }

    let spec: GraphSpec = serde_json::from_str(&read_input(args.input.as_deref())?)?;
    let mut scene = Scene::from_spec(
        &spec,
        args.viewport_width,
        args.viewport_height,
        config.scene,
        Box::new(DeterministicTextMeasurer::default()),
    )?;

    let algorithm = match args.algorithm {
        AlgorithmKind::Coulomb => Algorithm::Coulomb(config.coulomb),
        AlgorithmKind::Preset => Algorithm::Preset,
    };
    let stats = nautilus::layout(&mut scene, algorithm);

    match args.command {
        Command::Layout => write_json(&scene.frame(), args.pretty, args.out.as_deref()),
        Command::Stats => {
            let out = StatsOut {
                clusters: scene.clusters().len(),
                leaves: scene.leaves().len(),
                links: scene.links().len(),
                root: scene.cluster(scene.root()).id.clone(),
                layout: stats,
                view_mapping: scene.view_mapping(),
            };
            write_json(&out, args.pretty, args.out.as_deref())
        }
        Command::View => {
            let mut input = InputState::new(config.input);
            for (dx, dy) in &args.drags {
                input.drag(&mut scene, *dx, *dy);
            }
            let (cx, cy) = args
                .cursor
                .unwrap_or((args.viewport_width / 2.0, args.viewport_height / 2.0));
            for delta in &args.wheels {
                input.handle(
                    &mut scene,
                    &InputEvent::Wheel {
                        delta: *delta,
                        x: cx,
                        y: cy,
                    },
                );
            }
            if let Some(path) = args.events.as_deref() {
                let events: Vec<InputEvent> =
                    serde_json::from_str(&std::fs::read_to_string(path)?)?;
                for event in &events {
                    input.handle(&mut scene, event);
                }
            }
            write_json(&scene.frame(), args.pretty, args.out.as_deref())
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

    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
