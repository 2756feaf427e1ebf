//! Log records, caller locations, and the one-line text format.
//!
//! Every sink writes records in the same shape:
//!
//! ```text
//! [2024-01-01 12:00:00][INFO][main.rs  handle_request  42行]request served
//! ```
//!
//! Tooling greps this format, so it must not change.

use std::panic::Location;

use chrono::{DateTime, Local, NaiveDateTime, Timelike};

use crate::level::Level;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a log call came from. Resolution is best-effort: a missing piece is
/// an empty string or line 0, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caller {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl Caller {
    /// `file` may be a full path; only its base name is kept.
    pub fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file: base_name(file),
            function,
            line,
        }
    }

    /// Location of a `#[track_caller]` call site. The function name is not
    /// available this way and is left empty.
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), "", location.line())
    }
}

fn base_name(path: &'static str) -> &'static str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Reduces a `std::any::type_name` path of a nested helper fn (see
/// [`caller!`](crate::caller)) to the name of the function that encloses it.
#[doc(hidden)]
pub fn short_function_name(type_name: &'static str) -> &'static str {
    let mut name = type_name.strip_suffix("::f").unwrap_or(type_name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Name of the enclosing function, without its module path.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::record::short_function_name(type_name_of(f))
    }};
}

/// [`Caller`] for the macro's call site: file, enclosing function, line.
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(file!(), $crate::__function_name!(), line!())
    };
}

/// One log call, captured once and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    level: Level,
    caller: Caller,
    message: String,
}

impl LogRecord {
    /// Stamps the record with the current local time, truncated to the second.
    pub fn new(level: Level, caller: Caller, message: String) -> Self {
        Self::at(Local::now(), level, caller, message)
    }

    pub fn at(timestamp: DateTime<Local>, level: Level, caller: Caller, message: String) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            timestamp,
            level,
            caller,
            message,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn caller(&self) -> Caller {
        self.caller
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Renders the record as one line, without a line terminator.
    pub fn render(&self) -> String {
        format!(
            "[{}][{}][{}  {}  {}行]{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.caller.file,
            self.caller.function,
            self.caller.line,
            self.message
        )
    }
}

/// A line read back from a log file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub timestamp: NaiveDateTime,
    pub level: Level,
    pub file: String,
    pub function: String,
    pub line: u32,
    pub message: String,
}

/// Inverse of [`LogRecord::render`]. Returns `None` for anything that is not
/// a well-formed record line.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let rest = line.strip_prefix('[')?;
    let (ts, rest) = rest.split_once("][")?;
    let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()?;
    let (level, rest) = rest.split_once("][")?;
    let level = Level::parse(level).ok()?;
    let (location, message) = rest.split_once("行]")?;

    let mut parts = location.rsplitn(3, "  ");
    let line_no = parts.next()?.parse().ok()?;
    let function = parts.next()?;
    let file = parts.next()?;

    Some(ParsedLine {
        timestamp,
        level,
        file: file.to_string(),
        function: function.to_string(),
        line: line_no,
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 7, 5, 1).unwrap()
    }

    #[test]
    fn render_matches_line_format() {
        let record = LogRecord::at(
            fixed_time(),
            Level::Warn,
            Caller::new("src/server/main.rs", "serve", 42),
            "disk almost full".to_string(),
        );
        assert_eq!(
            record.render(),
            "[2024-06-15 07:05:01][WARN][main.rs  serve  42行]disk almost full"
        );
    }

    #[test]
    fn timestamp_is_truncated_to_the_second() {
        let ts = fixed_time().with_nanosecond(987_654_321).unwrap();
        let record = LogRecord::at(ts, Level::Info, Caller::default(), String::new());
        assert_eq!(record.timestamp(), fixed_time());
    }

    #[test]
    fn parse_recovers_rendered_fields() {
        let record = LogRecord::new(
            Level::Fatal,
            Caller::new("/a/b/worker.rs", "run_job", 1234),
            "job [7] failed: 行] in message".to_string(),
        );
        let parsed = parse_line(&format!("{}\n", record.render())).unwrap();
        assert_eq!(parsed.timestamp, record.timestamp().naive_local());
        assert_eq!(parsed.level, Level::Fatal);
        assert_eq!(parsed.file, "worker.rs");
        assert_eq!(parsed.function, "run_job");
        assert_eq!(parsed.line, 1234);
        assert_eq!(parsed.message, "job [7] failed: 行] in message");
    }

    #[test]
    fn parse_handles_empty_function() {
        let record = LogRecord::at(
            fixed_time(),
            Level::Debug,
            Caller::new("lib.rs", "", 9),
            "x".to_string(),
        );
        let parsed = parse_line(&record.render()).unwrap();
        assert_eq!(parsed.file, "lib.rs");
        assert_eq!(parsed.function, "");
        assert_eq!(parsed.line, 9);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_line("").is_none());
        assert!(parse_line("hello world").is_none());
        assert!(parse_line("[2024-06-15 07:05:01][NOPE][a.rs  f  1行]m").is_none());
        assert!(parse_line("[yesterday][INFO][a.rs  f  1行]m").is_none());
        assert!(parse_line("[2024-06-15 07:05:01][INFO][a.rs  f  x行]m").is_none());
    }

    #[test]
    fn caller_macro_names_enclosing_function() {
        let caller = crate::caller!();
        assert_eq!(caller.file, "record.rs");
        assert_eq!(caller.function, "caller_macro_names_enclosing_function");
        assert!(caller.line > 0);
    }

    #[test]
    fn caller_macro_skips_closures() {
        let caller = (|| crate::caller!())();
        assert_eq!(caller.function, "caller_macro_skips_closures");
    }

    #[test]
    fn short_function_name_strips_paths() {
        assert_eq!(short_function_name("app::db::connect::f"), "connect");
        assert_eq!(short_function_name("app::main::{{closure}}::f"), "main");
        assert_eq!(short_function_name("f"), "f");
    }
}
