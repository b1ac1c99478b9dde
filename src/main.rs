use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use logfollow::{
    Config, FeedClient, FeedCursor, HttpFeedSource, PollControl, PollScheduler, SchedulerOptions,
    TerminalSink,
};

/// Exit value for configuration problems.
const EXIT_USAGE: u8 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load configuration
    let path = Config::resolve_path(std::env::args().nth(1));
    let config = match Config::load_with_env(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = logfollow::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        logfollow::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    let source = match HttpFeedSource::new(&config.feed, config.filter.clone()) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to set up feed client: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    info!("Following {}", config.feed.status_url);

    let (control, flag) = PollControl::new(config.follow.enabled);
    let cursor = FeedCursor::new(
        config.follow.initial_last_id,
        config.follow.initial_last_modified,
    );
    let mut scheduler = PollScheduler::new(
        FeedClient::new(source),
        TerminalSink::new(std::io::stdout(), &config.display),
        flag,
        SchedulerOptions::from(&config.follow),
    )
    .with_cursor(cursor);

    tokio::spawn(read_commands(control));

    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    info!("Exiting at last id {}", scheduler.cursor().last_seen_id);
    ExitCode::SUCCESS
}

/// Toggle following from stdin: `pause` / `resume`.
///
/// Keeps the control alive after stdin closes so following continues.
async fn read_commands(control: PollControl) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match line.trim() {
                "pause" | "p" => control.set_active(false),
                "resume" | "r" => control.set_active(true),
                "" => {}
                other => warn!("Unknown command: {} (use pause or resume)", other),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read command: {}", e);
                break;
            }
        }
    }

    std::future::pending::<()>().await;
}
