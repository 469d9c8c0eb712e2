//! Bounce Log entry point
//!
//! Native builds run a headless session against a file-backed log; the web
//! build wires the library from its own host page.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;
    use std::time::Duration;

    use clap::{Parser, Subcommand};

    use bounce_log::clock::SystemClock;
    use bounce_log::persistence::{FileStore, LogStore};
    use bounce_log::platform::{FixedBounds, LogRenderer, ManualScheduler};
    use bounce_log::session::Session;
    use bounce_log::settings::{Settings, SinkMode};
    use bounce_log::sim::Bounds;
    use bounce_log::sink::LineFileSink;
    use bounce_log::view::LogView;

    /// Two bouncing squares with a durable event log
    #[derive(Parser)]
    #[command(name = "bounce-log")]
    #[command(about = "Run the bouncing-squares simulation and inspect its event log")]
    pub struct Cli {
        /// Directory holding the persisted log buffer
        #[arg(short, long, default_value = "./bounce_data")]
        pub data_dir: PathBuf,

        /// Settings JSON file
        #[arg(short, long)]
        pub settings: Option<PathBuf>,

        /// Pipe-delimited file acting as the remote log sink
        #[arg(long)]
        pub sink_file: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Option<Commands>,
    }

    #[derive(Subcommand)]
    pub enum Commands {
        /// Run one session until collision or the tick limit
        Run {
            /// Maximum ticks before stopping
            #[arg(long, default_value = "500")]
            ticks: u64,
            #[arg(long, default_value = "200")]
            width: f32,
            #[arg(long, default_value = "200")]
            height: f32,
            /// Start-position seed (overrides settings)
            #[arg(long)]
            seed: Option<u64>,
            /// Sleep the tick interval between ticks
            #[arg(long)]
            realtime: bool,
        },
        /// Print the persisted client log
        ShowLog,
        /// Print the records stored in the sink file
        ServerLog,
    }

    pub fn main() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let cli = Cli::parse();

        let settings = match &cli.settings {
            Some(path) => Settings::load_from(path),
            None => Settings::default(),
        };

        match cli.command.unwrap_or(Commands::Run {
            ticks: 500,
            width: 200.0,
            height: 200.0,
            seed: None,
            realtime: false,
        }) {
            Commands::Run {
                ticks,
                width,
                height,
                seed,
                realtime,
            } => {
                let settings = Settings {
                    seed: seed.or(settings.seed),
                    ..settings
                };
                run(&cli.data_dir, cli.sink_file, settings, ticks, Bounds::new(width, height), realtime)
            }
            Commands::ShowLog => {
                let log = open_log(&cli.data_dir, &settings);
                print!("{}", LogView::new(log.drain()));
                ExitCode::SUCCESS
            }
            Commands::ServerLog => {
                let Some(path) = cli.sink_file else {
                    log::error!("--sink-file is required for server-log");
                    return ExitCode::FAILURE;
                };
                match LineFileSink::new(path).read_lines() {
                    Ok(records) => {
                        print!("{}", LogView::new(records));
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        log::error!("Could not read sink file: {}", e);
                        ExitCode::FAILURE
                    }
                }
            }
        }
    }

    fn open_log(data_dir: &std::path::Path, settings: &Settings) -> LogStore {
        let mut log = LogStore::new(
            Box::new(FileStore::new(data_dir)),
            Box::new(SystemClock),
            settings.storage_key.clone(),
            settings.max_log_size,
        );
        log.load_persisted();
        log
    }

    fn run(
        data_dir: &std::path::Path,
        sink_file: Option<PathBuf>,
        settings: Settings,
        max_ticks: u64,
        bounds: Bounds,
        realtime: bool,
    ) -> ExitCode {
        let log = open_log(data_dir, &settings);
        let mut session = Session::new(
            &settings,
            log,
            ManualScheduler::new(),
            Box::new(FixedBounds(bounds)),
            Box::new(LogRenderer),
        );
        match sink_file {
            Some(path) => session = session.with_sink(Box::new(LineFileSink::new(path))),
            None if settings.sink_mode != SinkMode::Off => {
                log::warn!("Sink mode {} set but no --sink-file given", settings.sink_mode.as_str());
            }
            None => {}
        }

        session.open();
        if !session.start() {
            log::error!("Session could not start with bounds {}x{}", bounds.width, bounds.height);
            return ExitCode::FAILURE;
        }

        while session.ticks() < max_ticks {
            let ran = session.run_next(|delay_ms| {
                if realtime {
                    std::thread::sleep(Duration::from_millis(u64::from(delay_ms)));
                }
            });
            if ran.is_none() {
                break;
            }
        }
        session.stop();

        log::info!(
            "Session ended in {:?} after {} ticks",
            session.state(),
            session.ticks()
        );
        let view = session.close();
        println!("{}", session.status_line());
        println!("{} records in log", view.records.len());
        if let Some(warning) = session.log().warning() {
            log::warn!("Log not fully persisted: {:?}", warning);
        }
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host page drives the library directly
    bounce_log::platform::web::init_logging();
}
