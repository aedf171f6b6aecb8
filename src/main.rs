// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod data;
mod error;
mod events;
mod framer;
mod pipeline;
mod source;
mod ui;

use app::App;
use config::MonitorConfig;
use data::Metric;
use pipeline::{Pipeline, PipelineHandle};
use source::{ReplaySource, SerialSource};

#[derive(Parser, Debug)]
#[command(name = "airwatch")]
#[command(about = "Live TUI for air quality sensor readings over a serial connection")]
struct Args {
    /// Serial port to read from (e.g. /dev/ttyUSB0, COM3)
    port: Option<String>,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Samples retained per metric
    #[arg(long)]
    capacity: Option<usize>,

    /// Snapshot cadence in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Replay a recorded capture file instead of opening a port
    #[arg(long, conflicts_with = "port")]
    replay: Option<PathBuf>,

    /// Print one JSON snapshot summary per tick instead of the TUI
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        return list_ports();
    }

    // Layer config file and environment, then apply CLI overrides on top.
    let mut config = MonitorConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(capacity) = args.capacity {
        config.window_capacity = capacity;
    }
    if let Some(tick) = args.tick_ms {
        config.tick_period_ms = tick;
    }

    if args.replay.is_none() && config.port.is_none() {
        let ports = SerialSource::list_ports();
        if ports.is_empty() {
            bail!("no serial port given and none detected; pass a port or use --replay");
        }
        bail!("no serial port given; available: {}", ports.join(", "));
    }

    if args.headless {
        init_tracing();
        return run_headless(&config, args.replay.as_deref());
    }

    run_tui(&config, args.replay.as_deref())
}

/// Print the serial ports currently visible on the system.
fn list_ports() -> Result<()> {
    let ports = SerialSource::list_ports();
    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available ports:");
        for port in ports {
            println!("  {port}");
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("airwatch=info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// Open the byte source and start the pipeline inside the given runtime.
fn start_pipeline(
    rt: &tokio::runtime::Runtime,
    config: &MonitorConfig,
    replay: Option<&Path>,
) -> Result<PipelineHandle> {
    rt.block_on(async {
        let pipeline = match replay {
            Some(path) => {
                let source = ReplaySource::from_file(path)
                    .with_context(|| format!("failed to open capture {}", path.display()))?;
                Pipeline::new(Box::new(source), config)
            }
            None => Pipeline::open_serial(config)?,
        };
        Ok::<_, anyhow::Error>(pipeline.spawn())
    })
}

/// Run the interactive TUI over a live or replayed stream.
fn run_tui(config: &MonitorConfig, replay: Option<&Path>) -> Result<()> {
    // The pipeline tasks live on this runtime while the TUI runs on the
    // main thread.
    let rt = tokio::runtime::Runtime::new()?;
    let handle = start_pipeline(&rt, config, replay)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(handle);
    app.force_refresh();

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Stop the pipeline and release the byte source before reporting.
    let mut handle = app.into_handle();
    handle.shutdown();
    rt.block_on(handle.join());

    result?;
    if let Some(fault) = handle.fault() {
        bail!("stream faulted: {fault}");
    }
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 40;
    const MIN_HEIGHT: u16 = 14;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, area);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Metric panels
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::charts::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Pick up the latest snapshot tick
        app.refresh();
    }

    Ok(())
}

/// Run without a terminal UI: print one JSON summary per snapshot tick.
fn run_headless(config: &MonitorConfig, replay: Option<&Path>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let handle = start_pipeline(&rt, config, replay)?;

    rt.block_on(async {
        let mut snapshots = handle.subscribe();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, shutting down");
                    break;
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = snapshots.borrow_and_update().clone();
                    if let Some(snapshot) = latest {
                        println!("{}", snapshot_line(&snapshot));
                    }
                    if handle.state().is_terminal() {
                        break;
                    }
                }
            }
        }
    });

    let mut handle = handle;
    handle.shutdown();
    rt.block_on(handle.join());

    if let Some(fault) = handle.fault() {
        bail!("stream faulted: {fault}");
    }
    Ok(())
}

/// One compact JSON object describing a snapshot.
fn snapshot_line(snapshot: &data::Snapshot) -> String {
    let mut object = serde_json::Map::new();
    object.insert(
        "samples".to_string(),
        serde_json::json!(snapshot.total_samples()),
    );

    for metric in Metric::ALL {
        let value = match snapshot.metric(metric) {
            Some(series) => serde_json::json!({
                "count": series.len(),
                "latest": series.latest(),
                "min": series.finite_range().map(|(min, _)| min),
                "max": series.finite_range().map(|(_, max)| max),
            }),
            None => serde_json::Value::Null,
        };
        object.insert(metric.key().to_string(), value);
    }

    serde_json::Value::Object(object).to_string()
}
