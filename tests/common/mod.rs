#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use datagrab::download::{DownloadError, Downloader};
use datagrab::owid::OwidSource;
use tracing_subscriber::fmt::MakeWriter;
use zip::write::SimpleFileOptions;

pub const BASE_URL: &str = "https://owid.test/grapher";

/// What the scripted downloader does for one URL.
#[derive(Clone, Debug)]
pub enum Reply {
    Bytes(Vec<u8>),
    Fail(DownloadError),
    /// Leave a truncated file behind, then fail.
    Interrupted(Vec<u8>, DownloadError),
    Nothing,
}

impl Reply {
    pub fn forbidden(url: &str) -> Self {
        Reply::Fail(DownloadError::with_status(url, 403, "HTTP 403 Forbidden"))
    }

    pub fn non_redistributable(url: &str) -> Self {
        Reply::Fail(DownloadError::with_status(
            url,
            403,
            "HTTP 403 Forbidden: this data is non-redistributable",
        ))
    }

    pub fn server_error(url: &str) -> Self {
        Reply::Fail(DownloadError::with_status(
            url,
            500,
            "HTTP 500 Internal Server Error",
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub path: PathBuf,
    pub overwrite: bool,
}

/// In-memory downloader answering from a fixed script and recording calls.
#[derive(Default)]
pub struct ScriptedDownloader {
    replies: HashMap<String, Reply>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, url: impl Into<String>, reply: Reply) -> Self {
        self.replies.insert(url.into(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|call| call.url == url).count()
    }
}

impl Downloader for ScriptedDownloader {
    fn download(
        &self,
        url: &str,
        filepath: &Path,
        overwrite: bool,
    ) -> Result<Option<PathBuf>, DownloadError> {
        self.calls.borrow_mut().push(Call {
            url: url.to_string(),
            path: filepath.to_path_buf(),
            overwrite,
        });

        if filepath.exists() && !overwrite {
            return Ok(Some(filepath.to_path_buf()));
        }

        match self.replies.get(url) {
            Some(Reply::Bytes(bytes)) => {
                write_fixture(filepath, bytes);
                Ok(Some(filepath.to_path_buf()))
            }
            Some(Reply::Fail(err)) => Err(err.clone()),
            Some(Reply::Interrupted(bytes, err)) => {
                write_fixture(filepath, bytes);
                Err(err.clone())
            }
            Some(Reply::Nothing) => Ok(None),
            None => Err(DownloadError::with_status(url, 404, "HTTP 404 Not Found")),
        }
    }
}

fn write_fixture(filepath: &Path, bytes: &[u8]) {
    if let Some(parent) = filepath.parent() {
        fs::create_dir_all(parent).expect("create download dir");
    }
    fs::write(filepath, bytes).expect("write download");
}

pub fn source(root: &Path) -> OwidSource {
    OwidSource::new(root).with_base_url(BASE_URL)
}

pub fn url(slug: &str, suffix: &str) -> String {
    format!("{BASE_URL}/{slug}{suffix}")
}

pub fn metadata_json(title: &str) -> Vec<u8> {
    format!(r#"{{"chart": {{"title": "{title}"}}, "columns": {{}}}}"#).into_bytes()
}

pub fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in members {
        writer.start_file(*name, options).expect("start member");
        writer.write_all(bytes).expect("write member");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Log output collected by a scoped `tracing` subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with info-level logs captured, returning its result and the log text.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&logs.0.lock().expect("log buffer")).into_owned();
    (result, text)
}
