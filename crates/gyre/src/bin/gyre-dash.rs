//! Gyre terminal dashboard.
//!
//! Renders the reference particle model as a scatter plot on stdout and
//! reads one command per line from stdin:
//!
//! ```text
//! p            play / pause
//! r            reset with the current settings
//! n <count>    particle count for the next reset
//! b <bounds>   placement bounds for the next reset (the plot follows at once)
//! d <dt>       time delta for the next reset
//! q            quit
//! ```

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::Parser;
use gyre::engine::{ControllerConfig, Dashboard, DashboardConfig, DashboardError};
use gyre::model::ParticleSystemFactory;
use gyre::plot::{ScatterPlot, SharedBounds, TerminalView};
use gyre::types::{ConfigError, ParamLimits, RunParams};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gyre-dash")]
#[command(about = "Play, pause and reset a gravitational particle model", long_about = None)]
struct Args {
    /// Number of particles, including the central body
    #[arg(short = 'n', long, default_value = "100")]
    particles: usize,

    /// Half-width of the square particles are placed in
    #[arg(short, long, default_value = "100")]
    bounds: f64,

    /// Simulated seconds per tick
    #[arg(short = 'd', long, default_value = "0.1")]
    time_delta: f64,

    /// Ticks per second while playing
    #[arg(long, default_value = "30")]
    tick_rate: f64,

    /// Seed for particle placement
    #[arg(short, long, default_value = "1337")]
    seed: u64,

    /// Plot width in characters
    #[arg(long, default_value = "64")]
    width: usize,

    /// Plot height in characters
    #[arg(long, default_value = "32")]
    height: usize,

    /// Hide the axes through the origin
    #[arg(long)]
    no_grid: bool,

    /// Append frames instead of redrawing in place
    #[arg(long)]
    no_clear: bool,
}

impl Args {
    fn params(&self, limits: &ParamLimits) -> Result<RunParams, ConfigError> {
        Ok(RunParams {
            particle_count: limits.check_particle_count(self.particles)?,
            bounds: limits.check_bounds(self.bounds)?,
            time_delta: limits.check_time_delta(self.time_delta)?,
        })
    }
}

// ── Input ────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Input {
    PlayPause,
    Reset,
    Count(usize),
    Bounds(f64),
    TimeDelta(f64),
    Quit,
}

/// Parse one stdin line. Blank lines yield `None`.
fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments: {line:?}"));
    }
    let input = match (cmd, arg) {
        ("p", None) => Input::PlayPause,
        ("r", None) => Input::Reset,
        ("q", None) => Input::Quit,
        ("n", Some(v)) => Input::Count(v.parse().map_err(|e| format!("count {v:?}: {e}"))?),
        ("b", Some(v)) => Input::Bounds(v.parse().map_err(|e| format!("bounds {v:?}: {e}"))?),
        ("d", Some(v)) => Input::TimeDelta(v.parse().map_err(|e| format!("dt {v:?}: {e}"))?),
        _ => return Err(format!("unknown command {line:?} (p, r, n <count>, b <bounds>, d <dt>, q)")),
    };
    Ok(Some(input))
}

fn apply(dash: &Dashboard, view_bounds: &SharedBounds, input: Input) -> Result<(), DashboardError> {
    match input {
        Input::PlayPause => {
            let state = dash.play_or_pause()?;
            info!(%state, "toggled");
        }
        Input::Reset => {
            dash.reset()?;
        }
        Input::Count(n) => dash.set_particle_count(n)?,
        Input::Bounds(b) => {
            dash.set_bounds(b)?;
            view_bounds.set(b);
        }
        Input::TimeDelta(dt) => dash.set_time_delta(dt)?,
        Input::Quit => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Frames go to stdout; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = DashboardConfig {
        controller: ControllerConfig {
            tick_rate_hz: args.tick_rate,
            ..ControllerConfig::default()
        },
        ..DashboardConfig::default()
    };
    let params = match args.params(&config.controller.limits) {
        Ok(params) => params,
        Err(e) => {
            error!(error = %e, "invalid starting parameters");
            return ExitCode::FAILURE;
        }
    };

    let view_bounds = SharedBounds::new(params.bounds);
    let plot = ScatterPlot::new(args.width, args.height).with_grid(!args.no_grid);
    let view = TerminalView::new(plot, view_bounds.clone(), io::stdout()).clearing(!args.no_clear);
    let factory = ParticleSystemFactory::with_seed(args.seed);

    let mut dash = match Dashboard::spawn(factory, params, config, view) {
        Ok(dash) => dash,
        Err(e) => {
            error!(error = %e, "failed to start dashboard");
            return ExitCode::FAILURE;
        }
    };

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(msg) => {
                warn!("{msg}");
                continue;
            }
        };
        if input == Input::Quit {
            break;
        }
        if let Err(e) = apply(&dash, &view_bounds, input) {
            warn!(error = %e, "command rejected");
        }
        if let Ok(Some(fault)) = dash.take_fault() {
            warn!(%fault, "simulation halted; reset to continue");
        }
    }

    let report = dash.shutdown();
    info!(total_ms = report.total_ms, "bye");
    if report.control_joined && report.delivery_joined {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
