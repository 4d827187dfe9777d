use slog::{Drain, Level, Logger};
use std::fs::File;
use std::path::PathBuf;

/// Where log records go.
pub enum LoggingMode {
    /// Undecorated output to STDERR.
    Stderr,

    /// STDERR as well as a file, like `triton ... |& tee /some/file.txt`.
    Tee(PathBuf),

    /// Only to a file.
    File(PathBuf),
}

/// Prints the level for warnings and worse, then the bare message.
pub struct TritonFormat<D>
where
    D: slog_term::Decorator,
{
    decorator: D,
}

impl<D: slog_term::Decorator> TritonFormat<D> {
    pub fn new(decorator: D) -> TritonFormat<D> {
        TritonFormat { decorator }
    }
}

impl<D: slog_term::Decorator> slog::Drain for TritonFormat<D> {
    type Ok = ();
    type Err = std::io::Error;

    fn log(
        &self,
        record: &slog::Record<'_>,
        values: &slog::OwnedKVList,
    ) -> Result<Self::Ok, Self::Err> {
        self.decorator.with_record(record, values, |decorator| {
            if record.level() <= slog::Level::Warning {
                decorator.start_level()?;
                write!(decorator, "{}: ", record.level().as_str())?;
                // start_whitespace resets to normal coloring after printing the level
                decorator.start_whitespace()?;
            }

            decorator.start_msg()?;
            write!(decorator, "{}", record.msg())?;

            decorator.start_whitespace()?;
            writeln!(decorator)?;

            decorator.flush()?;
            Ok(())
        })
    }
}

fn create_drain(mode: LoggingMode) -> std::io::Result<Logger> {
    let logger = match mode {
        LoggingMode::Stderr => {
            let decorator = slog_term::TermDecorator::new().stderr().build();
            let drain = TritonFormat::new(decorator).fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::File(out) => {
            let file = File::create(out)?;
            let decorator = slog_term::PlainDecorator::new(file);
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::Tee(out) => Logger::root(
            slog::Duplicate::new(
                create_drain(LoggingMode::Stderr)?,
                create_drain(LoggingMode::File(out))?,
            )
            .fuse(),
            slog::o!(),
        ),
    };
    Ok(logger)
}

/// A negative `verbose_level` silences warnings, then errors, then everything.
pub fn create_root_logger(verbose_level: i64, mode: LoggingMode) -> std::io::Result<Logger> {
    let log_level = match verbose_level {
        -3 => Level::Critical,
        -2 => Level::Error,
        -1 => Level::Warning,
        0 => Level::Info,
        1 => Level::Debug,
        x if x > 0 => Level::Trace,
        _ => return Ok(Logger::root(slog::Discard, slog::o!())),
    };

    let drain = slog::LevelFilter::new(create_drain(mode)?, log_level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(Logger::root(
        drain,
        slog::o!("version" => env!("CARGO_PKG_VERSION")),
    ))
}
