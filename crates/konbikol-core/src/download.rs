//! Offering a generated calendar file to the user.
//!
//! A [`Download`] carries the payload as a `data:` URI together with the
//! suggested filename, mirroring what a browser receives from an anchor with
//! `href` and `download` attributes. Where the download ends up is decided by
//! a [`DownloadSink`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

/// MIME type of generated calendar files.
pub const CALENDAR_MIME_TYPE: &str = "text/calendar";

/// Extension appended to the suggested filename.
pub const CALENDAR_EXTENSION: &str = ".ics";

/// Numbered names tried before a directory sink gives up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// A calendar file ready to be saved or opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// `data:text/calendar;charset=utf8,<percent-encoded payload>`.
    pub href: String,
    /// Suggested filename, always ending in `.ics`.
    pub file_name: String,
    /// The raw payload.
    pub payload: Vec<u8>,
}

impl Download {
    /// Wraps `payload` for download under `filename` + `.ics`.
    pub fn new(payload: Vec<u8>, filename: &str) -> Self {
        Self {
            href: data_uri(&payload),
            file_name: format!("{filename}{CALENDAR_EXTENSION}"),
            payload,
        }
    }
}

/// Encodes a calendar payload as a UTF-8 `data:` URI.
pub fn data_uri(payload: &[u8]) -> String {
    format!(
        "data:{CALENDAR_MIME_TYPE};charset=utf8,{}",
        urlencoding::encode_binary(payload)
    )
}

/// Destination for downloads.
pub trait DownloadSink: Send + Sync {
    /// Saves or opens the download.
    fn offer(&self, download: &Download) -> io::Result<()>;
}

/// Hands `payload` to `sink` as `filename.ics`.
///
/// Fire-and-forget: sink failures are logged and otherwise ignored.
pub fn trigger_download(sink: &dyn DownloadSink, payload: Vec<u8>, filename: &str) {
    let download = Download::new(payload, filename);
    debug!(
        file_name = %download.file_name,
        bytes = download.payload.len(),
        "Triggering download"
    );

    if let Err(e) = sink.offer(&download) {
        warn!(file_name = %download.file_name, error = %e, "Download failed");
    }
}

/// Writes downloads into a directory, like a browser's download folder, and
/// optionally opens them with the desktop's default calendar application.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    open_after: bool,
}

impl DirectorySink {
    /// Creates a sink that saves into `dir` without opening the file.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open_after: false,
        }
    }

    /// Builder: open each saved file with the system handler.
    pub fn with_open_after(mut self, open_after: bool) -> Self {
        self.open_after = open_after;
        self
    }

    /// Returns the target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the download is written to when the name is still free.
    pub fn target_path(&self, download: &Download) -> PathBuf {
        self.dir.join(sanitize_file_name(&download.file_name))
    }

    /// Writes `payload` under `name`, or under `name (1)`, `name (2)`, ... if
    /// taken. Existing files are never replaced.
    fn write_unique(&self, name: &str, payload: &[u8]) -> io::Result<PathBuf> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(numbered_name(name, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(payload)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {name}"),
        ))
    }
}

impl DownloadSink for DirectorySink {
    fn offer(&self, download: &Download) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.write_unique(&sanitize_file_name(&download.file_name), &download.payload)?;
        info!(path = %path.display(), "Saved calendar file");

        if self.open_after {
            open::that_detached(&path)?;
        }
        Ok(())
    }
}

/// Keeps every download in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    downloads: Mutex<Vec<Download>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads offered so far, oldest first.
    pub fn downloads(&self) -> Vec<Download> {
        self.downloads
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl DownloadSink for RecordingSink {
    fn offer(&self, download: &Download) -> io::Result<()> {
        self.downloads
            .lock()
            .map_err(|_| io::Error::other("recording sink poisoned"))?
            .push(download.clone());
        Ok(())
    }
}

/// `name` for attempt 0, otherwise `stem (n).ext`, like a browser's
/// download folder.
fn numbered_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({attempt}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({attempt})"),
    }
}

/// Turns a suggested filename into a single path component.
///
/// Path separators and control characters become `_`; names that would
/// resolve to the directory itself fall back to `event.ics`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." | CALENDAR_EXTENSION => format!("event{CALENDAR_EXTENSION}"),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_suggests_ics_filename() {
        let download = Download::new(b"BEGIN:VCALENDAR".to_vec(), "Flight AB123");
        assert_eq!(download.file_name, "Flight AB123.ics");
    }

    #[test]
    fn data_uri_percent_encodes_payload() {
        let uri = data_uri("VERSION:2.0\r\nSUMMARY:Łódź".as_bytes());
        assert_eq!(
            uri,
            "data:text/calendar;charset=utf8,VERSION%3A2.0%0D%0ASUMMARY%3A%C5%81%C3%B3d%C5%BA"
        );
    }

    #[test]
    fn trigger_download_hands_payload_to_sink() {
        let sink = RecordingSink::new();
        trigger_download(&sink, b"payload".to_vec(), "Flight AB123");

        let downloads = sink.downloads();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].file_name, "Flight AB123.ics");
        assert_eq!(downloads[0].payload, b"payload");
        assert!(downloads[0].href.starts_with("data:text/calendar;charset=utf8,"));
    }

    #[test]
    fn trigger_download_swallows_sink_errors() {
        struct FailingSink;
        impl DownloadSink for FailingSink {
            fn offer(&self, _download: &Download) -> io::Result<()> {
                Err(io::Error::other("disk full"))
            }
        }

        trigger_download(&FailingSink, b"payload".to_vec(), "x");
    }

    #[test]
    fn directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("downloads"));

        trigger_download(&sink, b"BEGIN:VCALENDAR\r\n".to_vec(), "IC 5310 Kraków");

        let written = fs::read(dir.path().join("downloads/IC 5310 Kraków.ics")).unwrap();
        assert_eq!(written, b"BEGIN:VCALENDAR\r\n");
    }

    #[test]
    fn directory_sink_keeps_earlier_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        trigger_download(&sink, b"first".to_vec(), "Flight AB123");
        trigger_download(&sink, b"second".to_vec(), "Flight AB123");
        trigger_download(&sink, b"third".to_vec(), "Flight AB123");

        assert_eq!(fs::read(dir.path().join("Flight AB123.ics")).unwrap(), b"first");
        assert_eq!(fs::read(dir.path().join("Flight AB123 (1).ics")).unwrap(), b"second");
        assert_eq!(fs::read(dir.path().join("Flight AB123 (2).ics")).unwrap(), b"third");
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("Flight AB123.ics", 0), "Flight AB123.ics");
        assert_eq!(numbered_name("Flight AB123.ics", 2), "Flight AB123 (2).ics");
        assert_eq!(numbered_name("IC 5310 v1.2.ics", 1), "IC 5310 v1.2 (1).ics");
        assert_eq!(numbered_name("noext", 1), "noext (1)");
    }

    #[test]
    fn directory_sink_stays_inside_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let download = Download::new(Vec::new(), "../../etc/passwd");

        let target = sink.target_path(&download);
        assert_eq!(target.parent(), Some(dir.path()));
        assert_eq!(target.file_name().unwrap(), ".._.._etc_passwd.ics");
    }

    #[test]
    fn sanitize_file_name_cases() {
        assert_eq!(sanitize_file_name("Flight AB123.ics"), "Flight AB123.ics");
        assert_eq!(sanitize_file_name("a/b\\c.ics"), "a_b_c.ics");
        assert_eq!(sanitize_file_name("tab\there.ics"), "tab_here.ics");
        assert_eq!(sanitize_file_name(".ics"), "event.ics");
        assert_eq!(sanitize_file_name(".."), "event.ics");
    }
}
