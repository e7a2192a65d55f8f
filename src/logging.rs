use chrono::Local;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Once;

pub const LEVEL_ENV: &str = "PAYMENTS_LOG_LEVEL";
pub const DIR_ENV: &str = "PAYMENTS_LOG_DIR";

static INIT: Once = Once::new();

/// Where records go and how verbose they are.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Extra daily file sink next to stderr.
    pub dir: Option<PathBuf>,
}

impl LogSettings {
    /// Explicit values win; otherwise `PAYMENTS_LOG_LEVEL`, then `RUST_LOG`,
    /// then `info`. The directory falls back to `PAYMENTS_LOG_DIR`, where
    /// `off`, `none` or an empty value disable the file sink.
    pub fn resolve(level: Option<&str>, dir: Option<PathBuf>) -> Self {
        Self::resolve_with(level, dir, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        level: Option<&str>,
        dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let level = level
            .map(str::to_string)
            .or_else(|| env(LEVEL_ENV))
            .or_else(|| env("RUST_LOG"))
            .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);

        let dir = dir.or_else(|| match env(DIR_ENV).as_deref().map(str::trim) {
            None | Some("") | Some("off") | Some("none") => None,
            Some(path) => Some(PathBuf::from(path)),
        });

        Self { level, dir }
    }
}

/// Installs the global logger once; later calls are no-ops.
///
/// Records go to stderr because stdout carries the ledger CSV.
pub fn init_logging(app_name: &str, settings: &LogSettings) -> Result<(), String> {
    let mut init_result: Result<(), String> = Ok(());
    INIT.call_once(|| {
        if let Err(err) = install(app_name, settings) {
            init_result = Err(err);
        }
    });
    init_result
}

fn install(app_name: &str, settings: &LogSettings) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new()
        .level(settings.level)
        // reqwest/hyper chatter drowns the saga at debug.
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Info)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} | {:<5} | {} | {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    if let Some(dir) = &settings.dir {
        std::fs::create_dir_all(dir).map_err(|err| format!("{}: {err}", dir.display()))?;
        let file_path = dir.join(format!("{app_name}-{}.log", Local::now().format("%Y_%m_%d")));
        let file = fern::log_file(&file_path)
            .map_err(|err| format!("{}: {err}", file_path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().map_err(|err| err.to_string())
}
