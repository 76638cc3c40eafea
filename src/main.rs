//! usradmin binary entry point.
//!
//! Parses flags, sets up file logging, initializes the terminal in raw
//! mode, runs the TUI event loop, and restores the terminal on exit.
//!
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usradmin::api::{GraphqlUserApi, InMemoryUserApi, UserApi};
use usradmin::app::keymap::{KEYBINDS_FILE, Keymap};
use usradmin::app::{AppState, THEME_FILE, Theme};
use usradmin::auth::{CurrentUser, Session};
use usradmin::config::{AppConfig, CONFIG_FILE};
use usradmin::controller::UserListController;
use usradmin::error::{Context, Result, simple_error};

/// Manage user accounts on a remote GraphQL user API.
#[derive(Parser, Debug)]
#[command(name = "usradmin", version, about)]
struct Args {
    /// Configuration file (key = value).
    #[arg(long, default_value = CONFIG_FILE, env = "USRADMIN_CONFIG")]
    config: String,

    /// GraphQL endpoint; overrides the config file.
    #[arg(long, env = "USRADMIN_ENDPOINT")]
    endpoint: Option<String>,

    /// Page size of the list query; overrides the config file.
    #[arg(long, env = "USRADMIN_LIMIT")]
    limit: Option<usize>,

    /// Acting user name. Without it the session starts signed out.
    #[arg(long, env = "USRADMIN_USER")]
    user: Option<String>,

    /// Comma separated roles of the acting user, e.g. `admin,editor`.
    #[arg(long, default_value = "admin", env = "USRADMIN_ROLES")]
    roles: String,

    /// Error policy override per write kind, e.g. `--errors edit=record`.
    #[arg(long = "errors")]
    errors: Vec<String>,

    /// Log file; overrides the config file.
    #[arg(long, env = "USRADMIN_LOG")]
    log_file: Option<String>,

    /// Use an in-memory API seeded with sample users.
    #[arg(long)]
    demo: bool,
}

fn init_logging(cfg: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_ctx(|| format!("open log file {}", cfg.log_file))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| simple_error(format!("init logging: {e}")))?;
    Ok(())
}

fn demo_api() -> InMemoryUserApi {
    let api = InMemoryUserApi::new().with_latency(Duration::from_millis(400));
    api.seed("Ann", "ann@example.com", &["admin"]);
    api.seed("Bo", "bo@example.com", &["editor"]);
    api.seed("Cy", "cy@example.com", &[]);
    api
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = AppConfig::load(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(limit) = args.limit.filter(|n| *n > 0) {
        cfg.page_limit = limit;
    }
    if let Some(log_file) = args.log_file {
        cfg.log_file = log_file;
    }
    for spec in &args.errors {
        if !cfg.override_errors(spec) {
            return Err(simple_error(format!("invalid --errors value: {spec}")));
        }
    }
    init_logging(&cfg)?;

    let session = match args.user {
        Some(name) => Session::signed_in(CurrentUser {
            name,
            roles: Session::parse_roles(&args.roles),
        }),
        None => Session::signed_out(),
    };
    let auth = Arc::new(session);

    let (api, endpoint): (Arc<dyn UserApi>, String) = if args.demo {
        (Arc::new(demo_api()), "demo (in-memory)".to_string())
    } else {
        (
            Arc::new(GraphqlUserApi::new(cfg.endpoint.clone())),
            cfg.endpoint.clone(),
        )
    };
    info!(%endpoint, limit = cfg.page_limit, policy = ?cfg.policy, "starting");

    let controller = UserListController::new(auth.clone(), cfg.page_limit, cfg.policy);
    let app = AppState::new(controller, auth, endpoint)
        .with_theme(Theme::load_or_init(THEME_FILE))
        .with_keymap(Keymap::load_or_init(KEYBINDS_FILE));

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = usradmin::app::run(&mut terminal, app, api).await;

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
    }
    Ok(())
}
