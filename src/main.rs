use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use podfeed::config::Config;
use podfeed::error::{FeedError, Result};
use podfeed::logging;
use podfeed::model::FeedVariant;
use podfeed::pipeline::{FeedPipeline, FeedStore};
use podfeed::resolver::RewriteResolver;
use podfeed::source;

/// podfeed - rebuild the public and ad-free podcast feeds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Episode records: a JSON file, or an http(s) URL serving a JSON array
    source: String,

    /// TOML configuration file (channel header, ad-free rewrite, logging)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Feed printed to stdout when --out-dir is not given
    #[arg(short = 'v', long = "variant", value_enum, default_value_t = Variant::Public)]
    variant: Variant,

    /// Write public.xml and private.xml into this directory instead of stdout
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Timeout in milliseconds for HTTP sources (overrides the config file)
    #[arg(short = 't', long = "timeout-ms")]
    timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Variant {
    Public,
    Private,
}

impl From<Variant> for FeedVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Public => FeedVariant::Public,
            Variant::Private => FeedVariant::Private,
        }
    }
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("feed rebuild failed: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(4);
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    logging::init(&config.logging.level);

    let timeout_ms = args.timeout_ms.unwrap_or(config.source.timeout_ms);
    let resolver = RewriteResolver::from_config(&config.audio)?;
    let variant = FeedVariant::from(args.variant);
    if !resolver.is_configured() && (args.out_dir.is_some() || variant == FeedVariant::Private) {
        return Err(FeedError::Config(
            "the private feed needs audio.ad_free_from and audio.ad_free_to".to_string(),
        ));
    }
    let source = source::open(&args.source, timeout_ms)?;
    let pipeline = FeedPipeline::new(source.as_ref(), resolver, config.channel.clone());

    match &args.out_dir {
        Some(dir) => {
            let store = FeedStore::new();
            let seq = pipeline.run_and_publish(&store)?;
            let feeds = store
                .latest()
                .ok_or_else(|| FeedError::Config(format!("run {} produced no feeds", seq)))?;
            write_both(dir, &feeds.public, &feeds.private)?;
            info!("wrote feeds to {}", dir.display());
        }
        None => {
            let xml = pipeline.run_variant(variant)?;
            let mut stdout = io::stdout();
            stdout.write_all(xml.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

// Both temp files are fully written before either is renamed into place. If a
// rename fails, files already replaced get their previous contents back and no
// temp file is left behind.
fn write_both(dir: &Path, public: &str, private: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let targets = [(dir.join("public.xml"), public), (dir.join("private.xml"), private)];

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(targets.len());
    for (path, body) in &targets {
        let tmp = path.with_extension("xml.tmp");
        if let Err(e) = fs::write(&tmp, body.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(e.into());
        }
        staged.push((tmp, path.as_path()));
    }

    let mut replaced: Vec<(&Path, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (i, (tmp, path)) in staged.iter().enumerate() {
        let previous = fs::read(path).ok();
        if let Err(e) = fs::rename(tmp, path) {
            warn!("could not move {} into place, restoring previous feeds", path.display());
            discard(&staged[i..]);
            for (path, previous) in replaced.into_iter().rev() {
                restore(path, previous);
            }
            return Err(e.into());
        }
        replaced.push((*path, previous));
    }
    Ok(())
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn restore(path: &Path, previous: Option<Vec<u8>>) {
    let result = match previous {
        Some(bytes) => fs::write(path, bytes),
        None => fs::remove_file(path),
    };
    if let Err(e) = result {
        error!("could not restore {}: {}", path.display(), e);
    }
}
