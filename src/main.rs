use clap::Parser;
use imgpipe::batch::{BatchResult, BatchRunner};
use imgpipe::imaging::RustBackend;
use imgpipe::policy::{PolicyCatalog, PolicyName};
use imgpipe::session::{Session, SessionStore};
use imgpipe::types::{CancelFlag, EncodeOverrides, InputImage};
use imgpipe::{output, session};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgpipe")]
#[command(about = "Batch convert images to responsive AVIF variants")]
#[command(long_about = "\
Batch convert images to responsive AVIF variants

Each input resolves to a policy (HERO, CARD, GENERAL, ICON, LOGO) from
its filename, or from --policy. A policy is a list of target widths plus
encode options; every width yields one output file:

  photo_hero.jpg   → hero/photo_hero-400.avif … photo_hero-1440.avif
  icon_app.png     → icon/icon_app-16.ico … icon_app-128.ico

Filename hints (first match wins):
  _hero  _card  _icon/icon_  _logo/logo_  _general   (default GENERAL)

Images are never upscaled: a target wider than the source encodes at the
source's native width, keeping the nominal width in the filename.")]
#[command(version)]
struct Cli {
    /// Input image file or directory of images
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    out: PathBuf,

    /// Simulate conversion without generating files
    #[arg(long)]
    dry_run: bool,

    /// Clean the output directory before processing
    #[arg(long)]
    clean: bool,

    /// Max width override; larger policy widths are skipped
    #[arg(long)]
    cap: Option<String>,

    /// Override encode quality (0-100)
    #[arg(short, long)]
    quality: Option<String>,

    /// Override encode effort (0-9)
    #[arg(short, long)]
    effort: Option<String>,

    /// Force one policy for every input instead of filename inference
    #[arg(long)]
    policy: Option<String>,

    /// Group outputs under a session namespace and build its archive
    #[arg(long)]
    bundle: bool,

    /// Emit the full batch result as JSON instead of the summary block
    #[arg(long)]
    json: bool,

    /// Worker threads (defaults to the number of CPU cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Warnings and errors are visible by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let explicit_policy = match cli.policy.as_deref() {
        Some(raw) => match PolicyName::parse(raw) {
            Some(name) => Some(name),
            None => return Err(format!("unknown policy '{raw}'").into()),
        },
        None => None,
    };

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let images = collect_inputs(&cli.input, explicit_policy)?;
    if images.is_empty() {
        return Err(format!("no images found under {}", cli.input.display()).into());
    }
    if !cli.json {
        println!("Found {} images.", images.len());
    }

    let overrides = EncodeOverrides::from_raw(
        cli.quality.as_deref(),
        cli.effort.as_deref(),
        cli.cap.as_deref(),
        cli.dry_run,
    );

    if cli.clean && !cli.dry_run && cli.out.exists() {
        std::fs::remove_dir_all(&cli.out)?;
    }
    if cli.dry_run && !cli.json {
        println!("DRY RUN: no files will be generated.");
    }

    let catalog = PolicyCatalog::standard();
    let backend = RustBackend::new();
    let runner = BatchRunner::new(&catalog, &backend);

    let (result, bundled) = if cli.bundle {
        let store = SessionStore::new(&cli.out);
        let mut session = store.create_session()?;
        session.begin_population();
        let result = run_batch(&runner, &images, session.root(), &overrides, cli.json)?;
        let archive = if cli.dry_run {
            None
        } else {
            Some(store.build_archive(&mut session)?)
        };
        (result, Some((session, archive)))
    } else {
        (
            run_batch(&runner, &images, &cli.out, &overrides, cli.json)?,
            None,
        )
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if result.summary.inputs_with_errors > 0 {
            println!();
            output::print_error_report(&result.files);
        }
        println!();
        output::print_summary(&result.summary);
    }

    if let Some((session, archive)) = bundled
        && !cli.json
    {
        println!();
        println!("Session: {}", session.id());
        for file in &result.files {
            for variant in file.variants.iter().filter(|v| !v.is_error()) {
                println!(
                    "    {}",
                    Session::relative_variant_path(file.policy, variant)
                );
            }
        }
        if let Some(archive) = archive {
            println!("Archive: {}", archive.display());
        } else {
            println!("Archive: skipped ({})", session::ARCHIVE_FILE_NAME);
        }
    }

    Ok(())
}

/// Run the batch with a printer thread draining progress events, so
/// per-file lines appear as rayon workers finish them. `quiet` drops the
/// progress stream entirely (JSON mode owns stdout).
fn run_batch(
    runner: &BatchRunner<'_, RustBackend>,
    images: &[InputImage],
    output_root: &Path,
    overrides: &EncodeOverrides,
    quiet: bool,
) -> Result<BatchResult, Box<dyn std::error::Error>> {
    if quiet {
        return Ok(runner.run(images, output_root, overrides, None, &CancelFlag::new())?);
    }
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            println!("{}", output::format_event(&event));
        }
    });
    let result = runner.run(images, output_root, overrides, Some(tx), &CancelFlag::new())?;
    printer.join().ok();
    Ok(result)
}

/// Resolve the input path to `(identity, bytes)` tuples: a single file,
/// or a non-recursive scan of a directory for decodable raster files.
fn collect_inputs(
    input: &Path,
    explicit_policy: Option<PolicyName>,
) -> std::io::Result<Vec<InputImage>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && has_supported_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
    } else {
        paths.push(input.to_path_buf());
    }

    paths
        .into_iter()
        .map(|path| {
            let identity = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(InputImage {
                identity,
                bytes: std::fs::read(&path)?,
                explicit_policy,
            })
        })
        .collect()
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            imgpipe::imaging::rust_backend::supported_input_extensions()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}
