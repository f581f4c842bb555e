use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mathsprint::{
    app::App,
    clock::SystemClock,
    config::{ConfigOverrides, ConfigStore, FileConfigStore},
    error::ConfigError,
    runtime::{Runner, TerminalEventSource},
    ui::format_ledger,
    GameConfig, Session,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::Level;

/// timed multiplication quiz: judge each equation right or wrong against the clock
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Pick how many questions to answer, then judge a run of multiplication equations as right or wrong as fast as you can. Every misjudged equation adds a time penalty; the best time per question count is kept for the session."
)]
pub struct Cli {
    /// milliseconds added to the final time for each misjudged equation
    #[clap(short = 'p', long)]
    penalty: Option<u64>,

    /// question counts to offer, comma separated (e.g. 10,25,50,99)
    #[clap(short = 'q', long, value_delimiter = ',')]
    questions: Option<Vec<u32>>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// seed for the equation generator, for repeatable rounds
    #[clap(long)]
    seed: Option<u64>,

    /// write logs to this file (the terminal is taken by the game)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(long)]
    debug: bool,

    /// write the effective penalty and question counts to the config file and exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            penalty: self.penalty,
            questions: self.questions.clone(),
        }
    }

    fn store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }

    /// Defaults, then the config file, then command line flags.
    fn game_config(&self) -> Result<GameConfig, ConfigError> {
        let from_file = self.store().load()?;
        GameConfig::merged(&from_file.layered(self.overrides()))
    }

    /// Fold the command line flags into the config file.
    fn save_config(&self) -> Result<PathBuf, ConfigError> {
        let store = self.store();
        let overrides = store.load()?.layered(self.overrides());
        GameConfig::merged(&overrides)?;
        store.save(&overrides)?;
        Ok(store.path().to_path_buf())
    }
}

fn init_logging(cli: &Cli) -> io::Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.save_config {
        init_logging(&cli)?;
        match cli.save_config() {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved config");
                println!("saved config to {}", path.display());
                return Ok(());
            }
            Err(err) => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, err).exit();
            }
        }
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli)?;

    let config = match cli.game_config() {
        Ok(config) => config,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err).exit();
        }
    };
    tracing::info!(penalty = config.penalty, questions = ?config.questions, "starting");

    let rng = cli
        .seed
        .map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy);
    let mut app = App::new(Session::with_parts(config, SystemClock, rng));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome?;

    println!("best times: {}", format_ledger(&app.session.state().score));
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::with_default_tick(TerminalEventSource::new());

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    while !app.should_quit {
        if app.on_event(runner.step()) {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    tracing::info!("quit");
    Ok(())
}
