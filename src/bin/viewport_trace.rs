use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use chart_viewport::api::{Cursor, ManualScheduler, ViewportConfig, ViewportController};
use chart_viewport::core::Viewport;
use chart_viewport::render::NullRenderer;
use chart_viewport::series::{Series, SeriesOptions};
use chart_viewport::telemetry::{TracingOptions, init_tracing};
use serde::Deserialize;
use serde_json::Value;

const USAGE: &str = "usage: viewport_trace --input <scenario.json> --output <snapshots.json> [--verbose]";

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    verbose: bool,
}

/// Replayable scenario: a config, inline series and a list of steps. One
/// snapshot is captured after every step.
#[derive(Debug, Deserialize)]
struct TraceFile {
    #[serde(default)]
    config: Option<ViewportConfig>,
    series: Vec<TraceSeries>,
    steps: Vec<TraceStep>,
}

#[derive(Debug, Deserialize)]
struct TraceSeries {
    name: String,
    data: Value,
    #[serde(default)]
    options: Option<SeriesOptions>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TraceStep {
    Resize { width: u32, height: u32, #[serde(default = "default_ratio")] pixel_ratio: f64 },
    ZoomTo { min_x: f64, max_x: f64 },
    Pan { delta_px: f64, now_ms: f64 },
    ZoomAt { anchor_px: f64, factor: f64, now_ms: f64 },
    Cursor { pixel_x: f64, pixel_y: f64 },
    ClearCursor,
    Back,
    Forward,
    ResetZoom,
}

fn default_ratio() -> f64 {
    1.0
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    if args.verbose {
        let _ = init_tracing(&TracingOptions {
            default_filter: "chart_viewport=debug".to_owned(),
            with_target: true,
        });
    }

    let raw = fs::read_to_string(&args.input)
        .map_err(|err| format!("failed to read `{}`: {err}", args.input.display()))?;
    let trace: TraceFile = serde_json::from_str(&raw).map_err(|err| format!("invalid json: {err}"))?;

    let config = trace.config.unwrap_or_default();
    let scheduler = ManualScheduler::new();
    let mut controller = ViewportController::new(NullRenderer::default(), config, scheduler)
        .map_err(|err| err.to_string())?;

    let mut series = Vec::with_capacity(trace.series.len());
    for item in trace.series {
        let mut built = Series::from_json(item.name, item.data).map_err(|err| err.to_string())?;
        if let Some(options) = item.options {
            built = built.with_options(options);
        }
        series.push(Rc::new(built));
    }
    controller.set_series(series).map_err(|err| err.to_string())?;
    controller.process_frame().map_err(|err| err.to_string())?;

    let mut snapshots = Vec::with_capacity(trace.steps.len() + 1);
    snapshots.push(snapshot_value(&controller)?);
    for step in trace.steps {
        apply_step(&mut controller, step)?;
        controller.process_frame().map_err(|err| err.to_string())?;
        snapshots.push(snapshot_value(&controller)?);
    }

    let output = serde_json::to_string_pretty(&snapshots)
        .map_err(|err| format!("failed to serialize snapshots: {err}"))?;
    fs::write(&args.output, output)
        .map_err(|err| format!("failed to write `{}`: {err}", args.output.display()))
}

fn apply_step(
    controller: &mut ViewportController<NullRenderer>,
    step: TraceStep,
) -> Result<(), String> {
    let result = match step {
        TraceStep::Resize {
            width,
            height,
            pixel_ratio,
        } => controller.set_size(Viewport::new(width, height).with_pixel_ratio(pixel_ratio)),
        TraceStep::ZoomTo { min_x, max_x } => controller.zoom_to(min_x, max_x),
        TraceStep::Pan { delta_px, now_ms } => controller.pan_by_pixels(delta_px, now_ms),
        TraceStep::ZoomAt {
            anchor_px,
            factor,
            now_ms,
        } => controller.zoom_at_pixel(anchor_px, factor, now_ms),
        TraceStep::Cursor { pixel_x, pixel_y } => {
            controller.set_cursor(Some(Cursor::new(pixel_x, pixel_y)));
            Ok(())
        }
        TraceStep::ClearCursor => {
            controller.set_cursor(None);
            Ok(())
        }
        TraceStep::Back => {
            controller.back();
            Ok(())
        }
        TraceStep::Forward => {
            controller.forward();
            Ok(())
        }
        TraceStep::ResetZoom => {
            controller.reset_zoom();
            Ok(())
        }
    };
    result.map_err(|err| err.to_string())
}

fn snapshot_value(controller: &ViewportController<NullRenderer>) -> Result<Value, String> {
    let json = controller
        .snapshot_json_contract_v1_pretty()
        .map_err(|err| err.to_string())?;
    serde_json::from_str(&json).map_err(|err| format!("invalid snapshot json: {err}"))
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut input = None::<PathBuf>;
    let mut output = None::<PathBuf>;
    let mut verbose = false;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--input" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --input".to_owned())?;
                input = Some(PathBuf::from(value));
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => return Err(USAGE.to_owned()),
            _ => return Err(format!("unknown argument `{flag}`")),
        }
    }

    Ok(CliArgs {
        input: input.ok_or_else(|| "missing --input".to_owned())?,
        output: output.ok_or_else(|| "missing --output".to_owned())?,
        verbose,
    })
}
