use crate::logger::severity::LogSeverity;
use crate::logger::time::now;
use once_cell::sync::OnceCell;

static MIN_SEVERITY: OnceCell<LogSeverity> = OnceCell::new();

/// Installs the minimum severity that gets printed. Only the first call has an effect.
/// Without a call, everything from `Info` up is printed.
pub fn init(min_severity: LogSeverity) {
    let _ = MIN_SEVERITY.set(min_severity);
}

/// Whether a message of the given severity would currently be printed.
pub fn enabled(log_severity: LogSeverity) -> bool {
    log_severity >= *MIN_SEVERITY.get().unwrap_or(&LogSeverity::Info)
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if !enabled(log_severity) {
        return;
    }
    match log_severity {
        LogSeverity::Error | LogSeverity::Fatal => {
            eprintln!("[{}] {} {}", log_severity, now(), msg)
        }
        _ => println!("[{}] {} {}", log_severity, now(), msg),
    }
}
