//! Terminal UI for ecoponto that lets users pick a city and browse nearby collection points.

mod app;
mod config;
mod input;
mod ui;

use std::{fs::File, io, path::Path, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context as _, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ecoponto_core::{
    backend::Backend,
    discovery::Navigation,
    service::EcopontoService,
};
use ecoponto_provider_api as api;
use ecoponto_provider_geo as geo;
use ecoponto_provider_ibge as ibge;
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::Config;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_file)?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent("ecoponto/0.1")
        .timeout(config.timeout())
        .build()?;

    let (catalog, points) = api::ports(client.clone(), &config.api_url);
    let geolocation = geo::locator(
        client.clone(),
        &config.geoip_url,
        config.position,
        config.no_location,
        config.timeout(),
    );
    let directory = ibge::directory(client, &config.regions_url);
    let service = Arc::new(EcopontoService::new(
        directory,
        Backend::new(catalog, points, geolocation),
    ));
    info!(api = %config.api_url, "starting ecoponto");

    // App state
    let mut app = App::new(service);
    match app.service.states().await {
        Ok(states) => app.states = states,
        Err(err) => {
            warn!(%err, "failed to load states");
            app.error_message = Some(format!("Failed to load states: {err}"));
        }
    }
    if let Some(region) = config.region() {
        app.navigate(Navigation::Points(region));
    }

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, &mut app).await;
    app.close_session();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up finished loads, then draw current UI
        app.sync_session();
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::Navigate(navigation) => {
                    app.error_message = None;
                    app.navigate(navigation);
                }
                Action::LoadCities(state) => {
                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, app))?;

                    let res = app.service.cities(&state).await;
                    app.finish_city_load(&state, res);
                }
            }
        }
    }

    Ok(())
}
