use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tree_atlas_core::config::{DescriptionFormat, SortOrder};
use tree_atlas_core::{PackerConfig, SourceImage, pack_images, write_atomic, write_outputs};
use walkdir::WalkDir;

const MIN_RESOLUTION: u32 = 64;
const MAX_RESOLUTION: u32 = 16384;
const MAX_MARGIN: u32 = 100;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tree-atlas",
    about = "Pack png images into a texture atlas and write its description",
    version,
    author,
    disable_help_flag = true
)]
struct Cli {
    // Input
    /// Images to pack (only when neither --input-dir nor --src-images is used)
    #[arg(help_heading = "Input")]
    images: Vec<PathBuf>,
    /// Directory containing source images (.png)
    #[arg(short = 'i', long, help_heading = "Input")]
    input_dir: Option<PathBuf>,
    /// Search depth for --input-dir (1 = no subdirectories)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=7), help_heading = "Input")]
    depth: u32,
    /// Explicit list of images to pack
    #[arg(short = 's', long, num_args = 1.., help_heading = "Input")]
    src_images: Vec<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input")]
    exclude: Vec<String>,
    /// Skip unreadable or non-png inputs instead of failing
    #[arg(short = 'f', long, default_value_t = false, help_heading = "Input")]
    force_skip: bool,

    // Layout
    /// Atlas width
    #[arg(short = 'w', long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(MIN_RESOLUTION as i64..=MAX_RESOLUTION as i64), help_heading = "Layout")]
    width: u32,
    /// Atlas height
    #[arg(short = 'h', long, default_value_t = 2048, value_parser = clap::value_parser!(u32).range(MIN_RESOLUTION as i64..=MAX_RESOLUTION as i64), help_heading = "Layout")]
    height: u32,
    /// Margin around every source image
    #[arg(short = 'm', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(0..=MAX_MARGIN as i64), help_heading = "Layout")]
    margin: u32,
    /// Insertion order: diagonal_asc | diagonal_desc | none
    #[arg(long, default_value = "diagonal_asc", help_heading = "Layout")]
    sort: String,
    /// YAML config file (overrides layout and format options)
    #[arg(long, help_heading = "Layout")]
    config: Option<PathBuf>,

    // Output
    /// Output atlas file (.png is appended when missing)
    #[arg(short = 'a', long, default_value = "atlas.png", help_heading = "Output")]
    atlas_name: PathBuf,
    /// Output description file (extension appended when missing) [default: description.<format>]
    #[arg(short = 'd', long, help_heading = "Output")]
    description_name: Option<PathBuf>,
    /// Description format: xml | json
    #[arg(long, default_value = "xml", value_parser = ["xml", "json"], help_heading = "Output")]
    format: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Output")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Output")]
    print_config: bool,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Output")]
    dry_run: bool,

    // Logging/UX
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
    /// Print help
    #[arg(long, action = ArgAction::Help, help_heading = "Logging/UX")]
    help: Option<bool>,
}

/// Merged settings printed by --print-config.
#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    packer: &'a PackerConfig,
    format: DescriptionFormat,
    atlas: &'a Path,
    description: &'a Path,
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    margin: Option<u32>,
    sort_order: Option<String>,
    format: Option<String>,
}

impl YamlConfig {
    fn apply(self, cfg: &mut PackerConfig, format: &mut DescriptionFormat) -> anyhow::Result<()> {
        if let Some(v) = self.width {
            cfg.width = check_resolution("width", v)?;
        }
        if let Some(v) = self.height {
            cfg.height = check_resolution("height", v)?;
        }
        if let Some(v) = self.margin {
            if v > MAX_MARGIN {
                anyhow::bail!("margin must be in [0..{}], got {}", MAX_MARGIN, v);
            }
            cfg.margin = v;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.format {
            *format = parse_format(&v)?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let (cfg, format) = build_config(cli)?;
    let atlas_path = with_default_extension(&cli.atlas_name, "png");
    let description_path = with_default_extension(
        cli.description_name
            .as_deref()
            .unwrap_or_else(|| Path::new("description")),
        format.extension(),
    );

    if cli.print_config {
        let effective = EffectiveConfig {
            packer: &cfg,
            format,
            atlas: &atlas_path,
            description: &description_path,
        };
        println!("{}", serde_json::to_string_pretty(&effective)?);
        return Ok(());
    }

    let paths = collect_inputs(cli)?;
    let inputs = load_images_with_progress(&paths, cli.force_skip, cli.progress && !cli.quiet)?;
    info!(count = inputs.len(), "loaded input images");

    let out = pack_images(inputs, cfg)?;
    let stats = out.stats();
    info!(
        placed = stats.num_placed,
        unplaced = stats.num_unplaced,
        occupancy = %format!("{:.2}%", stats.occupancy * 100.0),
        waste = %format!("{:.2}%", stats.waste_percentage()),
        "stats"
    );
    if !out.is_complete() {
        warn!(
            names = ?out.unplaced,
            "{} image(s) did not fit; enlarge the atlas or reduce the margin",
            out.unplaced.len()
        );
    }

    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }

    write_outputs(&out, &atlas_path, &description_path, format).with_context(|| {
        format!(
            "write {} and {}",
            atlas_path.display(),
            description_path.display()
        )
    })?;
    info!(atlas = ?atlas_path, description = ?description_path, "atlas written");

    if let Some(stats_path) = &cli.export_stats {
        write_atomic(stats_path, serde_json::to_string_pretty(&stats)?.as_bytes())
            .with_context(|| format!("write {}", stats_path.display()))?;
        info!(?stats_path, "stats exported");
    }
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<(PackerConfig, DescriptionFormat)> {
    let mut cfg = PackerConfig {
        width: cli.width,
        height: cli.height,
        margin: cli.margin,
        sort_order: parse_sort_order(&cli.sort)?,
    };
    let mut format = parse_format(&cli.format)?;
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.apply(&mut cfg, &mut format)?;
    }
    cfg.validate()?;
    Ok((cfg, format))
}

fn check_resolution(what: &str, v: u32) -> anyhow::Result<u32> {
    if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&v) {
        anyhow::bail!(
            "{} must be in [{}..{}], got {}",
            what,
            MIN_RESOLUTION,
            MAX_RESOLUTION,
            v
        );
    }
    Ok(v)
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

fn parse_format(s: &str) -> anyhow::Result<DescriptionFormat> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown description format: {}", s))
}

/// Appends `ext` when `path` has no extension.
fn with_default_extension(path: &Path, ext: &str) -> PathBuf {
    let mut p = path.to_path_buf();
    if p.extension().is_none() {
        p.set_extension(ext);
    }
    p
}

/// Resolve the list of image files from --input-dir, --src-images or the
/// positional arguments.
fn collect_inputs(cli: &Cli) -> anyhow::Result<Vec<PathBuf>> {
    let explicit_sources = cli.input_dir.is_some() || !cli.src_images.is_empty();
    if explicit_sources && !cli.images.is_empty() {
        anyhow::bail!(
            "unexpected positional inputs together with --input-dir/--src-images; see --help"
        );
    }

    let include = build_globset(&cli.include)?;
    let exclude = build_globset(&cli.exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();

    if let Some(dir) = &cli.input_dir {
        if dir.is_dir() {
            let found = gather_dir(dir, cli.depth as usize, include.as_ref(), exclude.as_ref());
            if found.is_empty() && !cli.force_skip {
                anyhow::bail!("{} does not contain .png files", dir.display());
            }
            list.extend(found);
        } else if cli.force_skip {
            warn!(?dir, "input directory does not exist, skipping");
        } else {
            anyhow::bail!("'{}' does not exist or is not a directory", dir.display());
        }
    }

    for p in cli.src_images.iter().chain(cli.images.iter()) {
        if should_skip(p, include.as_ref(), exclude.as_ref()) {
            continue;
        }
        if p.is_file() && is_png(p) {
            list.push(p.clone());
        } else if cli.force_skip {
            warn!(?p, "not a png image, skipping");
        } else {
            anyhow::bail!("{} is not a png image", p.display());
        }
    }

    if list.is_empty() {
        if cli.force_skip {
            warn!("no input images; writing an empty atlas");
        } else {
            anyhow::bail!("no input files");
        }
    }
    Ok(list)
}

fn gather_dir(
    dir: &Path,
    depth: usize,
    include: Option<&GlobSet>,
    exclude: Option<&GlobSet>,
) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_png(p) && !should_skip(p, include, exclude))
        .collect()
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_png(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Image name used in the description: the file name without its extension.
fn image_name(p: &Path) -> String {
    p.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.to_string_lossy().into_owned())
}

fn load_images_with_progress(
    paths: &[PathBuf],
    force_skip: bool,
    progress: bool,
) -> anyhow::Result<Vec<SourceImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut names: HashSet<String> = HashSet::new();
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => {
                let name = image_name(p);
                if !names.insert(name.clone()) {
                    warn!(?p, %name, "duplicate image name");
                }
                list.push(SourceImage::from_dynamic(name, img));
            }
            Err(e) if force_skip => {
                error!(?p, error = %e, "skip image");
            }
            Err(e) => {
                if let Some(b) = &bar {
                    b.finish_and_clear();
                }
                return Err(e.context(format!("load {}", p.display())));
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<image::DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
