//! CLI evgate.
//!
//! Генерирует файлы кадров, воспроизводит их через шлюз (в том числе из
//! нескольких потоков, с ожидающими на каждый `async_id`) и разбирает
//! отдельные конверты.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use evgate::{
    event::{envelope, frames},
    init_logging, ErrorExt, Event, EventBroker, EventKind, Gateway, LogFormat, Settings,
    StatsSnapshot, StatusCode,
};
use serde::Serialize;
use tracing::{debug, info};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Parser)]
#[command(name = "evgate")]
#[command(version = VERSION)]
#[command(about = "Event-correlation broker tooling", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// TOML-файл настроек; без него берётся `evgate.toml`, если он есть
    #[arg(short, long, global = true, env = "EVGATE_CONFIG")]
    config: Option<PathBuf>,
    /// Уровень логирования (перекрывает настройки)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Формат логов: pretty, compact, json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Записать файл из N кадров
    Gen {
        file: PathBuf,
        #[arg(short = 'n', long, default_value_t = 1000)]
        count: u64,
        /// Вид события (snake_case), по умолчанию rpc_response
        #[arg(short, long, value_parser = parse_kind, default_value = "rpc_response")]
        kind: EventKind,
    },
    /// Прогнать файл кадров через шлюз и напечатать статистику в JSON
    Replay {
        file: PathBuf,
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
        /// Перед прогоном зарегистрировать ожидающего на каждый `async_id`
        #[arg(short, long)]
        wait: bool,
        /// Таймаут ожидающих, мс (по умолчанию из настроек)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Разобрать один конверт, заданный в hex
    Decode { hex: String },
}

#[derive(Debug, Default, Serialize)]
struct ReplayReport {
    frames: usize,
    malformed_frames: usize,
    elapsed_ms: u64,
    waiters: usize,
    matched: usize,
    timed_out: usize,
    broker: StatsSnapshot,
}

/// Отчёт `decode` о некорректном конверте.
#[derive(Debug, Serialize)]
struct DecodeFailure {
    status_code: StatusCode,
    error: String,
}

fn parse_kind(s: &str) -> Result<EventKind, String> {
    EventKind::from_name(s)
        .or_else(|| s.parse::<u16>().ok().and_then(|c| EventKind::try_from(c).ok()))
        .ok_or_else(|| format!("unknown event kind '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::load().context("failed to load settings")?,
    };
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    let logging = init_logging(settings.logging.clone()).context("failed to init logging")?;

    let result = match cli.command {
        Commands::Gen { file, count, kind } => generate(&file, count, kind),
        Commands::Replay {
            file,
            threads,
            wait,
            timeout_ms,
        } => replay(&settings, &file, threads, wait, timeout_ms.map(Duration::from_millis)).await,
        Commands::Decode { hex } => decode(&hex),
    };

    logging.shutdown();
    result
}

fn generate(
    path: &Path,
    count: u64,
    kind: EventKind,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for i in 1..=count {
        let event = Event::new(kind, format!("event-{i}")).with_async_id(i);
        frames::write_frame(&mut out, &envelope::encode(&event))?;
    }
    out.flush()?;

    info!(path = %path.display(), count, %kind, "Frame file written");
    Ok(())
}

async fn replay(
    settings: &Settings,
    path: &Path,
    threads: usize,
    wait: bool,
    timeout: Option<Duration>,
) -> Result<()> {
    if threads == 0 {
        bail!("--threads must be at least 1");
    }
    let data = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut report = ReplayReport::default();
    let mut envelopes = Vec::new();
    for frame in frames::split_frames(&data) {
        match frame {
            Ok(frame) => envelopes.push(frame.to_vec()),
            Err(e) => {
                report.malformed_frames += 1;
                debug!(error = %e, "Frame file has a truncated tail");
            }
        }
    }
    report.frames = envelopes.len();

    let broker = Arc::new(EventBroker::new(settings.broker.clone()));
    let gateway = Gateway::new(broker.clone(), settings.gateway.clone());

    let mut waiters = Vec::new();
    if wait {
        let ids: Vec<u64> = envelopes
            .iter()
            .filter_map(|raw| envelope::decode(raw).ok()?.async_id())
            .collect();
        for id in ids {
            let broker = broker.clone();
            waiters.push(tokio::spawn(async move {
                broker.wait_for_async_id(id, timeout).await
            }));
        }
        report.waiters = waiters.len();
        // короткий таймаут может снять ожидающего раньше, чем встанут остальные
        while broker.pending_waiters() + waiters.iter().filter(|w| w.is_finished()).count()
            < report.waiters
        {
            tokio::task::yield_now().await;
        }
    }

    let started = Instant::now();
    let feeder = gateway.clone();
    tokio::task::spawn_blocking(move || feed(&feeder, &envelopes, threads))
        .await
        .context("replay worker panicked")?;
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    for waiter in waiters {
        match waiter.await.context("waiter task panicked")? {
            Ok(_) => report.matched += 1,
            Err(_) => report.timed_out += 1,
        }
    }
    report.broker = broker.stats();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Раздаёт кадры `threads` потокам по кругу.
fn feed(
    gateway: &Gateway,
    envelopes: &[Vec<u8>],
    threads: usize,
) {
    thread::scope(|scope| {
        for worker in 0..threads {
            scope.spawn(move || {
                for raw in envelopes.iter().skip(worker).step_by(threads) {
                    gateway.on_event(raw);
                }
            });
        }
    });
}

fn decode(input: &str) -> Result<()> {
    let raw = hex::decode(input.trim()).context("input is not valid hex")?;
    match envelope::decode(&raw) {
        Ok(event) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Err(err) => {
            let failure = DecodeFailure {
                status_code: err.status_code(),
                error: err.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&failure)?);
            bail!("malformed envelope: {err}")
        }
    }
}
