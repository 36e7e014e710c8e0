use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// コマンドラインのフラグからログレベルを決める。
///
/// `quiet`が指定された場合はログを出力しない。
pub fn level_filter(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (_, true) => LevelFilter::Off,
        (true, false) => LevelFilter::Debug,
        (false, false) => LevelFilter::Info,
    }
}

/// 標準エラー出力にログを出力するロガーを初期化する。
///
/// time entryの一覧は標準出力に出すため、ログと混ざらないようにしている。
pub fn init_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level.min(LevelFilter::Warn))
        .level_for("toggl_entries", level)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}
