use std::{
    collections::BTreeSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "propel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a composition at one frame and print the result as JSON.
    Eval(EvalArgs),
    /// Print the renderer actions a set of changes calls for.
    Actions(ActionsArgs),
    /// Print the value of a keyframe timeline at one frame.
    ValueAt(ValueAtArgs),
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Composition to evaluate.
    #[arg(long)]
    composition: String,

    /// Frame index; fractional frames are allowed.
    #[arg(long, allow_negative_numbers = true)]
    frame: f64,

    /// Skip nested sub-compositions.
    #[arg(long)]
    no_recursive: bool,

    /// Evaluate graphs on the calling thread only.
    #[arg(long)]
    serial: bool,

    /// Upper bound for array-modifier counts.
    #[arg(long)]
    max_array_count: Option<u32>,
}

#[derive(Parser, Debug)]
struct ActionsArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Composition evaluated for `--frame-tick`.
    #[arg(long)]
    composition: String,

    /// Changed property, compound or group id (repeatable).
    #[arg(long = "property")]
    properties: Vec<String>,

    /// Changed flow node id (repeatable).
    #[arg(long = "node")]
    nodes: Vec<String>,

    /// Changed layer id (repeatable).
    #[arg(long = "layer")]
    layers: Vec<String>,

    /// Treat the change as an undo or backwards scrub.
    #[arg(long)]
    backward: bool,

    /// Report what a frame-index change alone requires instead.
    #[arg(long)]
    frame_tick: bool,

    /// Frame the tick is evaluated at; defaults to the composition's current frame.
    #[arg(long, allow_negative_numbers = true)]
    frame: Option<f64>,
}

#[derive(Parser, Debug)]
struct ValueAtArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index; fractional frames are allowed.
    #[arg(long, allow_negative_numbers = true)]
    frame: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Eval(args) => cmd_eval(args),
        Command::Actions(args) => cmd_actions(args),
        Command::ValueAt(args) => cmd_value_at(args),
    }
}

fn read_scene(path: &Path) -> anyhow::Result<propel::Scene> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let scene = propel::Scene::from_reader(BufReader::new(f))
        .with_context(|| format!("parse scene '{}'", path.display()))?;
    scene.validate().context("validate scene")?;
    Ok(scene)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    let mut opts = propel::EvalOptions {
        recursive: !args.no_recursive,
        parallel_graphs: !args.serial,
        ..propel::EvalOptions::default()
    };
    if let Some(max) = args.max_array_count {
        opts.max_array_count = max;
    }

    let evaluator = propel::Evaluator::new(&scene, opts)?;
    let comp = propel::CompositionId::from(args.composition.as_str());
    let out = evaluator
        .eval_frame(&comp, args.frame)
        .with_context(|| format!("evaluate composition '{comp}' at frame {}", args.frame))?;
    for err in out.all_errors() {
        eprintln!("warning: {err}");
    }
    print_json(&out)
}

fn cmd_actions(args: ActionsArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.in_path)?;
    let registry = propel::PerformableRegistry::build(&scene);

    let actions = if args.frame_tick {
        let comp_id = propel::CompositionId::from(args.composition.as_str());
        let comp = scene.composition(&comp_id)?;
        let frame = args.frame.unwrap_or(comp.frame_index as f64);
        let out = propel::Evaluator::new(&scene, propel::EvalOptions::default())?
            .eval_frame(&comp_id, frame)
            .with_context(|| format!("evaluate composition '{comp_id}' at frame {frame}"))?;
        let mut dependent = BTreeSet::new();
        collect_frame_dependent(&out, &mut dependent);
        registry.actions_on_frame_index_change(&dependent)
    } else {
        let changes = propel::ChangeSet {
            properties: args.properties.iter().map(|s| s.as_str().into()).collect(),
            nodes: args.nodes.iter().map(|s| s.as_str().into()).collect(),
            layers: args.layers.iter().map(|s| s.as_str().into()).collect(),
            direction: if args.backward {
                propel::ChangeDirection::Backward
            } else {
                propel::ChangeDirection::Forward
            },
        };
        registry.actions_for(&scene, &changes)
    };
    print_json(&actions)
}

fn collect_frame_dependent(out: &propel::FrameOutput, acc: &mut BTreeSet<propel::PropertyId>) {
    acc.extend(out.frame_dependent.iter().cloned());
    for sub in out.composition_layers.values().flatten() {
        collect_frame_dependent(sub, acc);
    }
}

fn cmd_value_at(args: ValueAtArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.frame.is_finite(), "frame {} is not finite", args.frame);
    let f = File::open(&args.in_path)
        .with_context(|| format!("open timeline '{}'", args.in_path.display()))?;
    let timeline: propel::Timeline =
        serde_json::from_reader(BufReader::new(f)).context("parse timeline JSON")?;
    timeline.validate()?;
    println!("{}", timeline.value_at(args.frame));
    Ok(())
}
