//! `konbikol event` and `konbikol ics`.

use std::path::Path;

use tracing::info;

use konbikol_core::{CALENDAR_EXTENSION, CalendarEvent, build_calendar_payload};
use konbikol_protocol::Request;

use crate::error::ClientResult;
use crate::socket::SocketClient;

/// Hands the event to the server, which saves the calendar file. The server
/// does not answer.
pub async fn download(client: &SocketClient, event: CalendarEvent) -> ClientResult<()> {
    let file_name = format!("{}{}", event.download_name(), CALENDAR_EXTENSION);
    client.notify(Request::download_event(event)).await?;
    info!(file_name = %file_name, "Download requested");
    println!("Requested {}", file_name);
    Ok(())
}

/// Builds the calendar file locally and writes it to `output`, or stdout.
pub fn write_ics(event: &CalendarEvent, output: Option<&Path>) -> ClientResult<()> {
    let payload = build_calendar_payload(event)?;

    match output {
        Some(path) => {
            std::fs::write(path, &payload)?;
            info!(path = %path.display(), "Wrote calendar file");
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&payload)?;
        }
    }
    Ok(())
}
