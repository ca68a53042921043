//! `konbikol parse` - extract the text of a ticket through the server.

use std::path::Path;

use konbikol_protocol::{FileHandle, Request, Response};

use crate::error::{ClientError, ClientResult};
use crate::socket::SocketClient;

/// Extracts the first page of `file` and prints one fragment per line, or a
/// JSON array with `json`.
pub async fn run(client: &SocketClient, file: &Path, json: bool) -> ClientResult<()> {
    // The server may run in another directory.
    let path = std::path::absolute(file)?;
    let fragments = extract(client, FileHandle::from_path(path)).await?;

    if json {
        let out = serde_json::to_string_pretty(&fragments)
            .map_err(|e| ClientError::Protocol(format!("failed to encode fragments: {}", e)))?;
        println!("{}", out);
    } else {
        for fragment in &fragments {
            println!("{}", fragment);
        }
    }
    Ok(())
}

/// Sends a `parse_pdf` request and unpacks the answer.
pub async fn extract(client: &SocketClient, file: FileHandle) -> ClientResult<Vec<String>> {
    match client.send(Request::parse_pdf(file)).await? {
        Response::ExtractedText { fragments, .. } => Ok(fragments),
        Response::ExtractionError { message, .. } => Err(ClientError::Extraction(message)),
        Response::Error { error } => Err(ClientError::Server(error.to_string())),
        other => Err(ClientError::Protocol(format!(
            "unexpected response to parse_pdf: {:?}",
            other
        ))),
    }
}
