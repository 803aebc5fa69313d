use clap::{Parser, Subcommand};
use hugallery::{config, generate, output, process, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that process images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the processing cache and re-encode every image
    #[arg(long)]
    no_cache: bool,
}

/// Shared flags for commands that write Hugo content.
#[derive(clap::Args, Clone)]
struct WriteArgs {
    /// Overwrite content files that hugallery did not generate
    #[arg(long)]
    force: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("HUGALLERY_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("HUGALLERY_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "hugallery")]
#[command(about = "Generate a static photo gallery for Hugo (http://gohugo.io/)")]
#[command(long_about = "\
Generate a static photo gallery for Hugo (http://gohugo.io/)

Directories become albums, photos are ordered by numeric prefix, and every
album becomes a Hugo page bundle listing its photos in the front matter.

Photo structure:

  photos/
  ├── hugallery.toml               # Config (optional, cascades to children)
  ├── 010-Landscapes/              # Album (numbered = listed, weight 10)
  │   ├── hugallery.toml           # Per-album config (overrides parent)
  │   ├── description.md           # Album description (priority over .txt)
  │   ├── 001-dawn.jpg             # Cover photo (lowest number)
  │   ├── 001-dawn.txt             # Photo sidecar description
  │   └── 010-mountains.jpg        # Non-contiguous numbering OK
  ├── 020-Travel/                  # Group (has subdirs, not photos)
  │   ├── 010-Japan/
  │   └── 020-Italy/
  └── wip-drafts/                  # No number prefix = built but unlisted

Output in the Hugo site:

  static/galleries/landscapes/001-dawn-800.jpg   # Renditions and thumbnails
  content/gallery/_index.md                      # Section page
  content/gallery/landscapes/index.md            # Album page bundle

Metadata resolution (first available wins):
  Title:       IPTC object name → filename (001-Dusk.jpg → \"Dusk\")
  Description: sidecar .txt → IPTC caption

Run 'hugallery gen-config' to print a documented hugallery.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Photo directory
    #[arg(long, default_value = "photos", global = true)]
    source: PathBuf,

    /// Hugo site root (the directory holding content/ and static/)
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Directory for intermediate manifests
    #[arg(long, default_value = ".hugallery-temp", global = true)]
    temp_dir: PathBuf,

    /// More diagnostics on stderr (-v debug, -vv trace). RUST_LOG wins.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the photo directory into a manifest
    Scan,
    /// Write renditions and thumbnails into the site's static/ tree
    Process(CacheArgs),
    /// Write Hugo content files from processed photos
    Generate(WriteArgs),
    /// Run the full pipeline: scan → process → generate
    Build {
        #[command(flatten)]
        cache: CacheArgs,
        #[command(flatten)]
        write: WriteArgs,
    },
    /// Validate the photo directory without building
    Check,
    /// Print a stock hugallery.toml with all options documented
    GenConfig,
}

const SCAN_MANIFEST: &str = "manifest.json";
const PROCESSED_MANIFEST: &str = "processed.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Scan => {
            let manifest = run_scan(&cli.source, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Process(cache_args) => {
            let scan_manifest_path = cli.temp_dir.join(SCAN_MANIFEST);
            let manifest_content = std::fs::read_to_string(&scan_manifest_path)?;
            let manifest: scan::Manifest = serde_json::from_str(&manifest_content)?;
            run_process(&cli, &manifest.config, cache_args)?;
        }
        Command::Generate(write_args) => {
            run_generate(&cli, write_args)?;
        }
        Command::Build { cache, write } => {
            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = run_scan(&cli.source, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Processing photos");
            run_process(&cli, &manifest.config, cache)?;

            let content_dir = cli
                .site
                .join("content")
                .join(&manifest.config.hugo.section);
            println!("==> Stage 3: Generating content → {}", content_dir.display());
            run_generate(&cli, write)?;

            println!("==> Build complete: {}", cli.site.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            output::print_scan_output(&manifest, &cli.source);
            println!("==> Photos are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stage output on stdout stays clean.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_scan(source: &Path, temp_dir: &Path) -> Result<scan::Manifest, Box<dyn std::error::Error>> {
    let manifest = scan::scan(source)?;
    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(temp_dir.join(SCAN_MANIFEST), json)?;
    Ok(manifest)
}

fn run_process(
    cli: &Cli,
    site_config: &config::SiteConfig,
    cache_args: &CacheArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&site_config.processing);
    let images_root = process::images_root(&cli.site, site_config);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(
        &cli.temp_dir.join(SCAN_MANIFEST),
        &cli.source,
        &images_root,
        !cache_args.no_cache,
        Some(tx),
    );
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let result = result?;

    let json = serde_json::to_string_pretty(&result.manifest)?;
    std::fs::write(cli.temp_dir.join(PROCESSED_MANIFEST), json)?;
    println!(
        "{}",
        output::format_process_summary(&result.manifest, &result.cache_stats)
    );
    Ok(())
}

fn run_generate(cli: &Cli, write_args: &WriteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let summary = generate::generate(
        &cli.temp_dir.join(PROCESSED_MANIFEST),
        &cli.site,
        write_args.force,
    )?;
    output::print_generate_output(&summary);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
