use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use filechooser_cache::ThumbnailConfig;
use filechooser_render::{probe_dimensions, Pixmap, PortableBackend};
use filechooser_ui::{FileItem, IconProvider, SoftwareUploader, ThumbnailState, ViewMode};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "filechooser-thumbs")]
#[command(about = "File chooser thumbnail generator")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate thumbnails for the images in a directory.
    Generate {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Icon view mode to generate thumbnails for.
        #[arg(long, value_enum, default_value_t = ModeArg::Medium)]
        mode: ModeArg,
        /// Write ready thumbnails as PNG files into this directory.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the cache capacity.
        #[arg(long)]
        capacity: Option<usize>,
        /// Give up on unfinished thumbnails after this many milliseconds.
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
        /// Read settings from this TOML file instead of the default location.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print image dimensions read from the file header.
    Probe {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Small,
    Medium,
    Big,
}

impl From<ModeArg> for ViewMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Small => ViewMode::SmallIcons,
            ModeArg::Medium => ViewMode::MediumIcons,
            ModeArg::Big => ViewMode::BigIcons,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateOutput {
    failed: usize,
    items: usize,
    pending: usize,
    thumbnails: usize,
    written: usize,
}

#[derive(Debug, Serialize)]
struct ProbeOutput {
    format: &'static str,
    height: u32,
    width: u32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Generate {
            dir,
            mode,
            output,
            capacity,
            timeout_ms,
            config,
        } => {
            let config = load_config(config.as_deref(), capacity)?;
            run_generate(
                &dir,
                mode.into(),
                output.as_deref(),
                config,
                Duration::from_millis(timeout_ms),
            )
        }
        Commands::Probe { file } => run_probe(&file),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Defaults, then the config file, then environment, then flags
fn load_config(path: Option<&Path>, capacity: Option<usize>) -> Result<ThumbnailConfig> {
    let config = match path {
        Some(path) => ThumbnailConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => {
            let default_path = ThumbnailConfig::default_config_path();
            if default_path.is_file() {
                log::debug!("using config {}", default_path.display());
                ThumbnailConfig::from_file(&default_path)
                    .with_context(|| format!("failed to read config {}", default_path.display()))?
            } else {
                ThumbnailConfig::default()
            }
        }
    };

    let mut config = config
        .apply_env()
        .context("invalid thumbnail environment override")?;
    if let Some(capacity) = capacity {
        config = config.with_capacity(capacity);
    }
    config.validate().context("invalid thumbnail configuration")?;
    Ok(config)
}

fn run_generate(
    dir: &Path,
    mode: ViewMode,
    output: Option<&Path>,
    config: ThumbnailConfig,
    timeout: Duration,
) -> Result<()> {
    ensure_dir_exists(dir)?;
    let items = list_directory(dir)?;

    let mut provider = IconProvider::new(PortableBackend::new(), SoftwareUploader::new(), config)
        .context("failed to start thumbnail provider")?
        .with_view_mode(mode);

    let deadline = Instant::now() + timeout;
    loop {
        provider.process_completions();
        for item in &items {
            provider.get_icon(item);
        }

        let pending = count_state(&provider, &items, ThumbnailState::Pending);
        let now = Instant::now();
        if pending == 0 || now >= deadline {
            break;
        }
        provider.wait_for_completions((deadline - now).min(Duration::from_millis(100)));
    }

    let written = match output {
        Some(output) => write_thumbnails(&provider, &items, mode, output)?,
        None => 0,
    };

    let payload = GenerateOutput {
        failed: count_state(&provider, &items, ThumbnailState::Failed),
        items: items.len(),
        pending: count_state(&provider, &items, ThumbnailState::Pending),
        thumbnails: count_state(&provider, &items, ThumbnailState::Ready),
        written,
    };
    log::debug!("{:?}", provider.stats());
    provider.dispose();

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_probe(file: &Path) -> Result<()> {
    ensure_file_exists(file)?;

    let probe = probe_dimensions(file)
        .with_context(|| format!("failed to read image header of {}", file.display()))?;

    let payload = ProbeOutput {
        format: probe.format.name(),
        height: probe.size.height,
        width: probe.size.width,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

/// Directory entries sorted by name
fn list_directory(dir: &Path) -> Result<Vec<FileItem>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            items.push(FileItem::directory(path));
        } else {
            items.push(FileItem::file(path));
        }
    }
    items.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(items)
}

fn count_state<B, U>(
    provider: &IconProvider<B, U>,
    items: &[FileItem],
    state: ThumbnailState,
) -> usize
where
    B: filechooser_render::ThumbnailBackend,
    U: filechooser_ui::TextureUploader,
{
    items
        .iter()
        .filter(|item| provider.state(item) == state)
        .count()
}

fn write_thumbnails(
    provider: &IconProvider<PortableBackend, SoftwareUploader>,
    items: &[FileItem],
    mode: ViewMode,
    output: &Path,
) -> Result<usize> {
    let Some(tier) = mode.tier() else {
        return Ok(0);
    };

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let mut written = 0;
    for item in items {
        let pixmap = provider
            .cache()
            .lookup(&item.source)
            .and_then(|record| record.texture(tier))
            .and_then(|texture| texture.handle::<Pixmap>());
        let Some(pixmap) = pixmap else {
            continue;
        };

        let path = output.join(thumbnail_file_name(&item.source));
        pixmap
            .to_rgba8()
            .save(&path)
            .with_context(|| format!("failed to write image to {}", path.display()))?;
        written += 1;
    }

    Ok(written)
}

fn thumbnail_file_name(source: &Path) -> String {
    let stem = source.file_stem().and_then(|name| name.to_str()).unwrap_or("thumbnail");
    let ext = source.extension().and_then(|ext| ext.to_str()).unwrap_or("img");

    format!("{stem}.{ext}.png")
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("directory does not exist: {}", path.display());
    }

    if !path.is_dir() {
        anyhow::bail!("path is not a directory: {}", path.display());
    }

    Ok(())
}
