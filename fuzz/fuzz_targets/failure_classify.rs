//! Fuzz target for download failure classification.

#![no_main]

use datagrab::download::{classify_failure, DownloadError, FailureKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let status = u16::from_le_bytes([data[0], data[1]]);
    let message = String::from_utf8_lossy(&data[2..]);
    let err = DownloadError::with_status("https://example.org/x.csv", status, message);

    let kind = classify_failure(&err);
    if status == 403 {
        assert_ne!(kind, FailureKind::Other);
    }
});
