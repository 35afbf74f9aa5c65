use std::io::prelude::*;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use argp::FromArgs;
use env_logger::Builder;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use subleq_linker::link;
use subleq_linker::mif::{self, DataWidth};
use subleq_linker::object::profile32::{ObjectFile32, Variant};
use subleq_linker::object::profile64::ObjectFile64;
use subleq_linker::{raw, stub};

/// Top-level command.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(description = "A static linker for SUBLEQ object files, emitting an Altera MIF memory image.")]
struct Args {
    #[argp(option, short = 'v', default = "0")]
    #[argp(description = "Logging level (0 = Off, 1 = Error, 2 = Warn, 3 = Info, 4 = Debug, 5 = Trace)")]
    verbose: usize,

    #[argp(option, short = 'p', default = "String::from(\"32a\")")]
    #[argp(description = "target machine profile: one of `32a`, `32b`, `hybrid`, or `64`")]
    profile: String,

    #[argp(switch, long = "exec")]
    #[argp(description = "hybrid profile only: prepend a startup stub and resolve `start` as the entry point, instead of writing a merged relinkable object")]
    exec: bool,

    #[argp(option, short = 'o')]
    #[argp(description = "path to write the linked MIF image to")]
    output: PathBuf,

    #[argp(positional)]
    #[argp(description = "object files to link, in load order")]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Profile {
    Profile32(Variant),
    Profile64,
}

fn parse_profile(value: &str) -> Result<Profile> {
    match value {
        "32a" => Ok(Profile::Profile32(Variant::A)),
        "32b" => Ok(Profile::Profile32(Variant::B)),
        "hybrid" => Ok(Profile::Profile32(Variant::Hybrid)),
        "64" => Ok(Profile::Profile64),
        other => bail!("unknown profile `{other}`, expected one of: 32a, 32b, hybrid, 64"),
    }
}

fn color_level(level: Level) -> String {
    match level {
        Level::Error => level.red().to_string(),
        Level::Warn => level.yellow().to_string(),
        Level::Info => level.green().to_string(),
        Level::Debug => level.blue().to_string(),
        Level::Trace => level.purple().to_string(),
    }
}

const fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        // default to off
        _ => LevelFilter::Off,
    }
}

/// `exec` only matters for `Variant::Hybrid`, where it selects between merging inputs as a
/// relinkable object (no stub) and producing an executable image (stub prepended). The other two
/// variants have no such mode switch: `Variant::A`/`Variant::B` always produce an executable
/// image, so the stub is always prepended.
fn link_profile32(variant: Variant, exec: bool, inputs: &[PathBuf]) -> Result<link::profile32::LinkedImage32> {
    let mut files = Vec::with_capacity(inputs.len() + 1);
    let prepend_stub = match variant {
        Variant::A | Variant::B => true,
        Variant::Hybrid => exec,
    };
    if prepend_stub {
        files.push(stub::profile32(variant));
    }
    for path in inputs {
        log::info!("Parsing object file {}", path.display());
        files.push(ObjectFile32::read_from_path(variant, path)?);
    }
    Ok(link::profile32::link(variant, files)?)
}

/// Profile-64 has no object-vs-executable mode switch: every link always produces an executable
/// image, so the stub is always prepended.
fn link_profile64(inputs: &[PathBuf]) -> Result<Vec<u64>> {
    let mut files = Vec::with_capacity(inputs.len() + 1);
    files.push(stub::profile64());
    for path in inputs {
        log::info!("Parsing object file {}", path.display());
        files.push(ObjectFile64::read_from_path(path)?);
    }
    let image = link::profile64::link(files)?;
    Ok(image.mem)
}

fn main() -> Result<()> {
    let args: Args = argp::parse_args_or_exit(argp::DEFAULT);

    if args.verbose != 0 {
        Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {} {}",
                    subleq_core::time::current_time(),
                    color_level(record.level()),
                    record.args()
                )
            })
            .filter(None, level_filter(args.verbose))
            .init();
    }

    if args.inputs.is_empty() {
        bail!("no input object files given");
    }

    let profile = parse_profile(&args.profile)?;

    match profile {
        Profile::Profile32(Variant::Hybrid) if !args.exec => {
            let image = link_profile32(Variant::Hybrid, false, &args.inputs)?;
            log::info!(
                "Merged {} files into {} words with {} unresolved symbol(s), writing {}",
                args.inputs.len(),
                image.mem.len(),
                image.unresolved.len(),
                args.output.display()
            );
            let merged = image.into_object();
            std::fs::write(&args.output, merged.serialize())
                .with_context(|| format!("failed to write merged object file {}", args.output.display()))?;
        }
        Profile::Profile32(variant) => {
            let image = link_profile32(variant, args.exec, &args.inputs)?;
            image.ensure_resolved().context("link failed")?;
            log::info!("Linked {} words, writing {}", image.mem.len(), args.output.display());

            if variant == Variant::Hybrid {
                // `-exec` mode: the raw linked binary goes to `<out>`, the MIF to `<out>.mif`.
                raw::write_to_path(&args.output, &image.mem).context("failed to write linked binary")?;
                let mut mif_path = args.output.clone().into_os_string();
                mif_path.push(".mif");
                let words: Vec<u64> = image.mem.into_iter().map(u64::from).collect();
                mif::write_to_path(PathBuf::from(mif_path), &words, DataWidth::Word32)
                    .context("failed to write MIF output")?;
            } else {
                let words: Vec<u64> = image.mem.into_iter().map(u64::from).collect();
                mif::write_to_path(&args.output, &words, DataWidth::Word32)
                    .context("failed to write MIF output")?;
            }
        }
        Profile::Profile64 => {
            let mem = link_profile64(&args.inputs)?;
            log::info!("Linked {} words, writing {}", mem.len(), args.output.display());
            mif::write_to_path(&args.output, &mem, DataWidth::Word64)
                .context("failed to write MIF output")?;
        }
    }

    Ok(())
}
