use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use taskdeck::app::App;
use taskdeck::cli::{self, Cli, Commands, Services};
use taskdeck::config::Settings;
use taskdeck::drag::DragController;
use taskdeck::telemetry;
use taskdeck::ui;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(url) = args.api_url {
        settings.api.base_url = url;
    }
    let _guard = telemetry::init(&settings.log.directory, &settings.log.level)?;
    info!(api = %settings.api.base_url, "starting taskdeck");

    let mut services = Services::new(&settings)?;
    match args.command {
        None | Some(Commands::Board) => run_board(&services, &settings).await,
        Some(command) => {
            let result = cli::execute(command, &mut services).await;
            if let Err(err) = &result {
                error!(error = %err, "command failed");
            }
            result
        }
    }
}

async fn run_board(services: &Services, settings: &Settings) -> Result<()> {
    let gateway = services.gateway()?;
    let board = DragController::new(gateway).with_policy(settings.board.unrecognized_status());
    let mut app = App::new(board, services.session.user().cloned()).with_auth(services.auth());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "board exited with an error");
    }
    result.context("running the board")
}
