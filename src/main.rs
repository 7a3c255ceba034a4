// traceds: step through the data structures of a traced program

use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use traceds::config::{Cli, Config};
use traceds::session::{LoadOutcome, TraceSession};
use traceds::ui::App;

/// Logs go to `--log-file`, or stderr in dump mode. The TUI owns the terminal
/// otherwise, so nothing is logged.
fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("traceds=info"))
    };

    if let Some(path) = &config.log_file {
        let file = File::create(path)?;
        tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    } else if config.dump {
        tracing_subscriber::registry()
            .with(filter())
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }
    Ok(())
}

/// Print every step's view as one JSON line
fn dump(session: &mut TraceSession, source: &str) -> Result<(), Box<dyn Error>> {
    match session.load_trace_blocking(source) {
        LoadOutcome::Loaded { frames } => {
            for index in 0..frames {
                session.seek(index);
                if let Some(view) = session.current_view() {
                    println!("{}", serde_json::to_string(&view)?);
                }
            }
            Ok(())
        }
        LoadOutcome::Empty => {
            eprintln!("The tracer returned no steps");
            Ok(())
        }
        LoadOutcome::Failed(err) => Err(err.into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    init_logging(&config)?;

    let source = match fs::read_to_string(&config.source_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!(
                "Error: cannot read '{}': {}",
                config.source_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let tracer = config.build_tracer()?;
    let mut session = TraceSession::new(tracer);
    session.set_speed(config.speed, std::time::Instant::now())?;
    info!(file = %config.source_path.display(), tracer = ?config.tracer, "starting");

    if config.dump {
        if let Err(e) = dump(&mut session, &source) {
            error!(error = %e, "dump failed");
            eprintln!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(session, source);
    app.start();
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
