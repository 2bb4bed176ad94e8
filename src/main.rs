use clap::Parser;
use color_eyre::Result;
use ggcdash::{logging, App, AppConfig, AppEvent, Args, CacheManager, ConfigManager, Theme};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::Duration;

/// Command-line values take precedence over the config file.
fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(path) = &args.path {
        config.workbook.path = path.clone();
    }
    if let Some(dir) = &args.export_dir {
        config.export.directory = Some(dir.clone());
    }
    if args.debug {
        config.debug.enabled = true;
    }
    if let Some(log_file) = &args.log_file {
        config.debug.log_file = Some(log_file.clone());
    }
}

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig, theme: Theme) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let path = config.workbook.path.clone();

    let mut app = App::new_with_config(theme, config);
    if let Some(sheet) = &args.sheet {
        app.set_initial_sheet(sheet.clone());
    }
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Open(path))?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    tracing::info!("exiting");
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(ggcdash::APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.generate_config {
        match ConfigManager::new(ggcdash::APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Configuration written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing configuration: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(ggcdash::APP_NAME)?;
    apply_args(&mut config, &args);
    let theme = Theme::from_config(&config.theme)?;

    let cache = CacheManager::new(ggcdash::APP_NAME).ok();
    if let Some(log_path) = logging::log_path(
        config.debug.enabled,
        config.debug.log_file.as_deref(),
        cache.as_ref(),
    ) {
        logging::init(&log_path, config.debug.enabled)?;
    }

    let terminal = ratatui::init();
    let result = run(terminal, &args, config, theme);
    ratatui::restore();
    if let Err(e) = result {
        tracing::error!(error = %e, "fatal");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
