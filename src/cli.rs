// ============================================================================
// SwankyPaint CLI - headless rendering of project files
// ============================================================================
//
// Usage examples:
//   SwankyPaint -i scene.swp -o scene.png
//   SwankyPaint -i scene.swp -o big.png --zoom 8 --grid
//   SwankyPaint -i "art/*.swp" --output-dir renders/ --cycle-ms 1500
//
// Each project is loaded, optionally advanced through color cycling, then
// rendered at the requested zoom and written as PNG.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use crate::io::export_png;
use crate::session::EditorSession;
use crate::view::ZoomLevel;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// SwankyPaint headless renderer.
#[derive(Parser, Debug)]
#[command(
    name = "SwankyPaint",
    version,
    about = "Render SwankyPaint projects to PNG",
    long_about = "Load .swp projects and write their pixels as PNG images at an\n\
                  integer zoom, optionally with the pixel grid and with palette\n\
                  color cycling advanced by a fixed amount of time.\n\n\
                  Example:\n  \
                  SwankyPaint -i scene.swp -o scene.png --zoom 4\n  \
                  SwankyPaint -i \"art/*.swp\" --output-dir renders/ --cycle-ms 500"
)]
pub struct CliArgs {
    /// Input project(s). Glob patterns accepted (e.g. "art/*.swp").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output PNG path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch rendering. Files keep the input stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Zoom factor: 1, 2, 4, 8, 16 or 32.
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    pub zoom: u32,

    /// Draw the pixel grid (zoom 2 and up).
    #[arg(short, long)]
    pub grid: bool,

    /// Advance palette color cycling by this many milliseconds before rendering.
    #[arg(long, value_name = "MS")]
    pub cycle_ms: Option<u64>,

    /// Print per-file timing and mirror the session log to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings shared by every file in one run.
#[derive(Clone, Copy, Debug)]
struct RenderSettings {
    zoom: ZoomLevel,
    grid: bool,
    cycle: Option<Duration>,
}

/// One input project and the PNG it renders to.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RenderJob {
    input: PathBuf,
    output: PathBuf,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Render every input and return an exit code: success only when every
/// file rendered.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo(args.verbose);

    let Some(zoom) = ZoomLevel::from_factor(args.zoom) else {
        eprintln!(
            "error: unsupported zoom {} (use 1, 2, 4, 8, 16 or 32).",
            args.zoom
        );
        return ExitCode::FAILURE;
    };
    let settings = RenderSettings {
        zoom,
        grid: args.grid,
        cycle: args.cycle_ms.map(Duration::from_millis),
    };

    let jobs = match plan_jobs(&args) {
        Ok(jobs) => jobs,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let report_each = jobs.len() > 1 || args.verbose;
    let mut failed = 0usize;
    for (n, job) in jobs.iter().enumerate() {
        if report_each {
            println!("[{}/{}] {}", n + 1, jobs.len(), job.input.display());
        }
        let started = Instant::now();
        match run_one(&job.input, &job.output, settings) {
            Ok(()) if report_each => println!(
                "  → {} ({:.0}ms)",
                job.output.display(),
                started.elapsed().as_secs_f64() * 1000.0
            ),
            Ok(()) => {}
            Err(e) => {
                crate::log_err!("{}: {}", job.input.display(), e);
                eprintln!("  error: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        crate::log_warn!("{} of {} renders failed", failed, jobs.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve inputs and pair each with its output path. Fails before any
/// rendering starts when the arguments cannot describe a full batch.
fn plan_jobs(args: &CliArgs) -> Result<Vec<RenderJob>, String> {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        return Err("no input files matched the given pattern(s).".to_string());
    }
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        return Err(format!(
            "{} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch rendering.",
            inputs.len()
        ));
    }
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            format!(
                "could not create output directory '{}': {}",
                dir.display(),
                e
            )
        })?;
    }

    inputs
        .into_iter()
        .map(|input| {
            let output =
                build_output_path(&input, args.output.as_deref(), args.output_dir.as_deref())
                    .ok_or_else(|| {
                        format!("cannot determine output path for '{}'.", input.display())
                    })?;
            Ok(RenderJob { input, output })
        })
        .collect()
}

// ============================================================================
// Per-file pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, settings: RenderSettings) -> Result<(), String> {
    let mut session = EditorSession::open(input).map_err(|e| format!("load failed: {}", e))?;

    session.set_zoom(settings.zoom.factor());
    session.toggle_grid(Some(settings.grid));
    if let Some(elapsed) = settings.cycle {
        session.set_cycle_animation_enabled(true);
        session.tick(elapsed);
    }

    let surface = session.render();
    export_png(surface, output).map_err(|e| format!("save failed: {}", e))?;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Paths named by one `-i` argument: the path itself when it exists,
/// otherwise its glob matches.
fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let literal = Path::new(pattern);
    if literal.exists() {
        return vec![literal.to_path_buf()];
    }
    match glob::glob(pattern) {
        Ok(entries) => {
            let matches: Vec<PathBuf> = entries.flatten().collect();
            if matches.is_empty() {
                crate::log_warn!("Pattern '{}' matched no files", pattern);
                eprintln!("warning: pattern '{}' matched no files.", pattern);
            }
            matches
        }
        Err(e) => {
            crate::log_warn!("Invalid glob '{}': {}", pattern, e);
            eprintln!("warning: invalid glob '{}': {}", pattern, e);
            Vec::new()
        }
    }
}

/// Expand every pattern, keeping first-seen order and dropping repeats.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    patterns
        .iter()
        .flat_map(|pattern| expand_pattern(pattern))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Output path for one input.
///
/// Priority:
/// 1. `--output`
/// 2. `--output-dir` joined with the input stem
/// 3. Next to the input with a `.png` extension
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}.png", stem)))
}
