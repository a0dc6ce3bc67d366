use owo_colors::{OwoColorize, Stream};
use sf_core::{DisplayRecord, FeedView, Severity};
use std::io::{self, Write};

const LABEL_MAX: usize = 12;
const LABEL_KEEP: usize = 10;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Source labels longer than 12 characters are cut to 10 plus `..`.
pub fn label(source: &str) -> String {
    if source.chars().count() > LABEL_MAX {
        let kept: String = source.chars().take(LABEL_KEEP).collect();
        format!("{kept}..")
    } else {
        source.to_string()
    }
}

pub fn draw<W: Write>(out: &mut W, view: &FeedView) -> io::Result<()> {
    write!(out, "{CLEAR_SCREEN}")?;
    let title = "LIVE OPERATIONS FEED";
    if view.connection_state().is_live() {
        writeln!(
            out,
            "{}  {}",
            title.if_supports_color(Stream::Stdout, |text| text.cyan()),
            "LIVE".if_supports_color(Stream::Stdout, |text| text.green())
        )?;
    } else {
        writeln!(
            out,
            "{}  {}",
            title.if_supports_color(Stream::Stdout, |text| text.cyan()),
            "DEMO".if_supports_color(Stream::Stdout, |text| text.yellow())
        )?;
    }
    for record in view.records() {
        write_line(out, &record)?;
    }
    out.flush()
}

fn write_line<W: Write>(out: &mut W, record: &DisplayRecord) -> io::Result<()> {
    let label = format!("{:<width$}", label(&record.source), width = LABEL_MAX);
    match record.severity {
        Severity::Warning => writeln!(
            out,
            "{}  {}",
            label.if_supports_color(Stream::Stdout, |text| text.yellow()),
            record.text
        ),
        Severity::Success => writeln!(
            out,
            "{}  {}",
            label.if_supports_color(Stream::Stdout, |text| text.green()),
            record.text
        ),
        Severity::Info => writeln!(
            out,
            "{}  {}",
            label.if_supports_color(Stream::Stdout, |text| text.blue()),
            record.text
        ),
    }
}
