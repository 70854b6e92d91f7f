use boxtree::{
    BoxNode, BoxTree, FourCC, NodeKind, ParseOptions, Registry,
    api::{parse_file, to_json_node},
    default_registry,
    util::hex_dump,
};
use clap::{ArgAction, Parser};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(version, about = "Dump the box tree of ISOBMFF/JUMBF files")]
struct Args {
    /// Files to parse; a failure on one file does not stop the others
    #[arg(required = true)]
    paths: Vec<String>,

    /// Only print the subtree at a dotted path (e.g. jumb.jumd or moov.trak[1])
    #[arg(long = "filter")]
    filter: Option<String>,

    /// Emit JSON instead of a human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Hex-dump the raw payload of boxes with an unregistered type
    #[arg(long, action = ArgAction::SetTrue)]
    hex: bool,

    /// Leaf types whose payload is skipped instead of decoded
    #[arg(long = "skip-data", default_value = "mdat")]
    skip_data: Vec<FourCC>,

    /// Decode every leaf, ignoring --skip-data
    #[arg(long, action = ArgAction::SetTrue)]
    no_skip: bool,

    /// Maximum container nesting depth
    #[arg(long, default_value_t = boxtree::parser::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut options = ParseOptions::default().with_max_depth(args.max_depth);
    if !args.no_skip {
        for typ in &args.skip_data {
            options = options.with_skip_data(*typ);
        }
    }
    let reg = default_registry()?;

    let mut failed = 0usize;
    for path in &args.paths {
        let tree = match parse_file(path, &reg, &options) {
            Ok(tree) => tree,
            Err(e) => {
                eprintln!("error: {path}: {e:#}");
                failed += 1;
                continue;
            }
        };
        if let Err(e) = print_tree(&args, path, &tree, &reg) {
            eprintln!("error: {path}: {e:#}");
            failed += 1;
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_tree(args: &Args, path: &str, tree: &BoxTree, reg: &Registry) -> anyhow::Result<()> {
    let targets: Vec<&BoxNode> = match &args.filter {
        Some(sel) => match tree.find(sel) {
            Some(node) => vec![node],
            None => anyhow::bail!("no box matches {sel:?}"),
        },
        None => tree.boxes().iter().collect(),
    };

    if args.json {
        let nodes: Vec<_> = targets.iter().map(|b| to_json_node(b, reg)).collect();
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    println!("{path} ({} bytes)", tree.size);
    for b in targets {
        print_box(b, 1, args.hex);
    }
    println!();
    Ok(())
}

// ---------- Human-readable tree ----------

fn print_box(b: &BoxNode, depth: usize, hex: bool) {
    let indent = "  ".repeat(depth);
    let hdr = &b.hdr;
    println!(
        "{indent}[{}] offset={:#x} size={} ({})",
        display_type(b),
        hdr.start,
        hdr.size,
        b.kind_name()
    );

    if let NodeKind::Container(children) = &b.kind {
        for c in children {
            print_box(c, depth + 1, hex);
        }
        return;
    }

    match b.display_properties() {
        Ok(props) => {
            for (label, value) in props {
                let mut lines = value.lines();
                println!("{indent}  {label}: {}", lines.next().unwrap_or(""));
                for line in lines {
                    println!("{indent}    {line}");
                }
            }
        }
        Err(e) => println!("{indent}  <display error: {e:#}>"),
    }

    if hex {
        if let Some(data) = b.raw_data() {
            for line in hex_dump(data, hdr.payload_offset()).lines() {
                println!("{indent}  {line}");
            }
        }
    }
}

fn display_type(b: &BoxNode) -> String {
    match b.hdr.uuid {
        Some(u) => format!("uuid:{}", hex::encode(u)),
        None => b.hdr.typ.to_string(),
    }
}
