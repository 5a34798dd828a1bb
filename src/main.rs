use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use keydrill::{
    app_dirs::AppDirs,
    history::TrainingLog,
    runtime::{map_key, CrosstermEventSource, Runner, TrainerEvent},
    session::{Session, SessionConfig, SourceSpec},
    typing_policy::TypingPolicy,
};

const TICK_RATE_MS: u64 = 50;

/// terminal typing trainer with three correction modes
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// name recorded in the session log
    #[clap(short, long)]
    user: Option<String>,

    /// text file to type through, start to finish
    #[clap(short, long, conflicts_with = "vocab")]
    text: Option<PathBuf>,

    /// vocabulary file for an endless stream of random words
    #[clap(short = 'r', long)]
    vocab: Option<PathBuf>,

    /// how wrong keys are handled
    #[clap(short, long, value_enum, default_value_t = TypingPolicy::Strict)]
    policy: TypingPolicy,

    /// seconds before the session times out (0 = unbounded)
    #[clap(short = 's', long, default_value_t = 0.0)]
    timeout: f64,

    /// words shown on each side of the cursor in random mode
    #[clap(long, default_value_t = 10)]
    half_window: usize,

    /// session log location (defaults to the state directory)
    #[clap(short, long)]
    log_file: Option<PathBuf>,

    /// print best runs from the session log and exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    fn resolved_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn resolved_log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .or_else(AppDirs::log_path)
            .unwrap_or_else(|| PathBuf::from("train.log"))
    }

    fn source_spec(&self) -> Option<SourceSpec> {
        if let Some(text) = &self.text {
            Some(SourceSpec::File(text.clone()))
        } else {
            self.vocab.as_ref().map(|vocab| SourceSpec::Random {
                vocab: vocab.clone(),
                half_window: self.half_window,
            })
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.history {
        return print_history(&cli);
    }

    let Some(source) = cli.source_spec() else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "either --text or --vocab is required",
        )
        .exit();
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut session = Session::new(SessionConfig {
        user: cli.resolved_user(),
        policy: cli.policy,
        source,
        timeout_secs: cli.timeout,
        log_path: cli.resolved_log_path(),
    });
    session.start()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, session: &mut Session) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*session, f.area()))?;

    loop {
        match runner.step() {
            TrainerEvent::Key(key) => {
                match key.code {
                    KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char('r') if session.is_ended() => {
                        session.restart()?;
                    }
                    _ => {
                        session.handle_key(map_key(&key))?;
                    }
                }
                if session.take_redraw() {
                    terminal.draw(|f| f.render_widget(&*session, f.area()))?;
                }
            }
            TrainerEvent::Tick => {
                session.tick()?;
                // Redraw each tick while the countdown is visible
                let timer_active = session.is_running() && session.config().timeout_secs > 0.0;
                if session.take_redraw() || timer_active {
                    terminal.draw(|f| f.render_widget(&*session, f.area()))?;
                }
            }
            TrainerEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*session, f.area()))?;
            }
        }
    }

    Ok(())
}

fn print_history(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let log_path = cli.resolved_log_path();
    let log = TrainingLog::load(&log_path)?;
    let user = cli.resolved_user();

    println!("{} sessions in {}", log.entries.len(), log_path.display());

    let best = log.user_best(&user);
    if best.is_empty() {
        println!("no saved runs for {user}");
        return Ok(());
    }

    println!("best runs for {user}:");
    for (tag, entry) in best.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        println!(
            "  {:<40} {:>6.1} wpm  {:>6.1} cpm  {} words  {} errors",
            tag,
            entry.wpm(),
            entry.cpm(),
            entry.word_count,
            entry.error_count,
        );
    }

    Ok(())
}
