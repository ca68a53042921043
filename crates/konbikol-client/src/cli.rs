//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use konbikol_core::{CalendarEvent, LocalDateTime};

/// Accepted `--start`/`--end` layouts, tried in order.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%d.%m.%Y %H:%M"];

/// konbikol - turn a train or plane ticket into a calendar event
#[derive(Debug, Parser)]
#[command(name = "konbikol")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "KONBIKOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Path to the server socket
    #[arg(long, env = "KONBIKOL_SOCKET")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract the text of a ticket's first page
    Parse {
        /// The ticket to read
        #[arg(default_value = "ticket.pdf")]
        file: PathBuf,

        /// Print the fragments as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Ask the server to save an event as a calendar file
    Event {
        #[command(flatten)]
        event: EventArgs,
    },

    /// Write the calendar file for an event without a server
    Ics {
        #[command(flatten)]
        event: EventArgs,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Check that the server is running
    Ping,

    /// Start the server in the foreground
    Server {
        /// Directory calendar files are saved to
        #[arg(long)]
        download_dir: Option<PathBuf>,

        /// Open each saved calendar file with the default application
        #[arg(long)]
        open: bool,

        /// Text engine to load
        #[arg(long)]
        engine: Option<String>,

        /// Log as JSON lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

/// The event to turn into a calendar file.
#[derive(Debug, Clone, Args)]
pub struct EventArgs {
    /// Calendar identifier; random when omitted
    #[arg(long)]
    pub uid: Option<String>,

    /// Event title, also used as the file name
    #[arg(long)]
    pub subject: String,

    /// Departure, local Warsaw time ("2024-05-01 10:00")
    #[arg(long, value_parser = parse_local_datetime)]
    pub start: LocalDateTime,

    /// Arrival, local Warsaw time
    #[arg(long, value_parser = parse_local_datetime)]
    pub end: LocalDateTime,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub location: String,
}

impl EventArgs {
    pub fn into_event(self) -> CalendarEvent {
        let uid = self
            .uid
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        CalendarEvent::new(uid, self.subject, self.start, self.end)
            .with_description(self.description)
            .with_location(self.location)
    }
}

/// Parses a wall-clock date and time.
pub fn parse_local_datetime(value: &str) -> Result<LocalDateTime, String> {
    let value = value.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(LocalDateTime::from)
        .ok_or_else(|| format!("expected a date and time like \"2024-05-01 10:00\", got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_layouts() {
        let expected = LocalDateTime::new(2024, 5, 1, 10, 0);
        assert_eq!(parse_local_datetime("2024-05-01 10:00"), Ok(expected));
        assert_eq!(parse_local_datetime("2024-05-01T10:00"), Ok(expected));
        assert_eq!(parse_local_datetime("01.05.2024 10:00"), Ok(expected));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(parse_local_datetime("2024-02-30 10:00").is_err());
        assert!(parse_local_datetime("tomorrow").is_err());
    }

    #[test]
    fn event_command_parses() {
        let cli = Cli::try_parse_from([
            "konbikol",
            "event",
            "--uid",
            "abc",
            "--subject",
            "Flight AB123",
            "--start",
            "2024-05-01 10:00",
            "--end",
            "2024-05-01 12:30",
        ])
        .unwrap();

        let Command::Event { event } = cli.command else {
            panic!("expected event command");
        };
        let event = event.into_event();
        assert_eq!(event.uid, "abc");
        assert_eq!(event.subject, "Flight AB123");
        assert_eq!(event.end, LocalDateTime::new(2024, 5, 1, 12, 30));
        assert_eq!(event.location, "");
    }

    #[test]
    fn parse_defaults_to_ticket_pdf() {
        let cli = Cli::try_parse_from(["konbikol", "parse"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Parse { ref file, json: false } if file == &PathBuf::from("ticket.pdf")
        ));
    }

    #[test]
    fn missing_uid_is_generated() {
        let args = EventArgs {
            uid: None,
            subject: "IC 5310".into(),
            start: LocalDateTime::new(2024, 5, 1, 10, 0),
            end: LocalDateTime::new(2024, 5, 1, 12, 30),
            description: String::new(),
            location: String::new(),
        };
        assert!(!args.into_event().uid.is_empty());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
