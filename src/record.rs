//! Line-oriented record format.
//!
//! One event per line, comma-separated:
//!
//! ```text
//! id,name,date,startTime,endTime[,depId]*
//! ```
//!
//! Trailing integers are the ids the event depends on, written in
//! ascending order so that serialize → parse → serialize is byte-stable.
//! Fields are not escaped; names must not contain commas or line breaks.

use std::io::{BufRead, Write};

use crate::error::{Result, ScheduleError};
use crate::models::{Event, EventId};

/// Formats one event as a record line (without the trailing newline).
pub fn format_record(event: &Event) -> String {
    let mut line = format!(
        "{},{},{},{},{}",
        event.id, event.name, event.date, event.start_time, event.end_time
    );
    for dep in &event.dependencies {
        line.push(',');
        line.push_str(&dep.to_string());
    }
    line
}

/// Parses one record line. `line_no` is 1-based and only used in errors.
pub fn parse_record(line: &str, line_no: usize) -> Result<Event> {
    let malformed = |reason: String| ScheduleError::Record {
        line: line_no,
        reason,
    };

    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let mut fields = line.split(',');

    let id_field = fields.next().unwrap_or_default();
    let id = id_field
        .trim()
        .parse::<EventId>()
        .map_err(|_| malformed(format!("invalid event id '{id_field}'")))?;

    let mut next_field = |name: &str| {
        fields
            .next()
            .map(str::to_string)
            .ok_or_else(|| malformed(format!("missing {name}")))
    };
    let name = next_field("name")?;
    let date = next_field("date")?;
    let start_time = next_field("start time")?;
    let end_time = next_field("end time")?;

    let mut event = Event::new(id, name, date, start_time, end_time);
    for token in fields {
        let dep = token
            .trim()
            .parse::<EventId>()
            .map_err(|_| malformed(format!("invalid dependency id '{token}'")))?;
        event.dependencies.insert(dep);
    }
    Ok(event)
}

/// Writes events as record lines. Returns the number of lines written.
pub fn write_records<'a, W, I>(writer: &mut W, events: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Event>,
{
    let mut count = 0;
    for event in events {
        writeln!(writer, "{}", format_record(event))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Reads every record line. Blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(parse_record(&line, idx + 1)?);
    }
    Ok(events)
}
