//! Multipart form-data parts and their wire encoding.
//!
//! Parts are collected by the builder and encoded with generated
//! boundaries at dispatch time. File-backed parts are read through
//! `std::io::Read` when encoding runs, so large files are never buffered
//! while the builder is still chaining.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use courier_core_types::error::service;
use courier_core_types::CourierError;

pub(crate) const DELIMITER: &str = "\r\n";

const READ_CHUNK: usize = 64 * 1024;

/// Where a part's payload comes from.
#[derive(Clone, Debug)]
pub enum PartSource {
    Bytes(Vec<u8>),
    /// Read at encode time, not at builder time.
    File(PathBuf),
}

/// One multipart form-data part: pre-encoded headers plus a payload source.
#[derive(Clone, Debug)]
pub struct BodyPart {
    headers: Vec<u8>,
    source: PartSource,
}

impl BodyPart {
    pub fn new(
        name: &str,
        filename: Option<&str>,
        mime_type: Option<&str>,
        source: PartSource,
    ) -> Self {
        let mime_type = mime_type.unwrap_or("application/octet-stream");
        let mut disposition = format!("form-data; name=\"{name}\"");
        if let Some(filename) = filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }

        let mut header_text = format!("Content-Disposition: {disposition}{DELIMITER}");
        header_text.push_str(&format!("Content-Type: {mime_type}{DELIMITER}"));
        header_text.push_str(DELIMITER);

        Self {
            headers: header_text.into_bytes(),
            source,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum BoundaryKind {
    Initial,
    Middle,
    Final,
}

pub(crate) fn boundary_data(kind: BoundaryKind, boundary: &str) -> Vec<u8> {
    let text = match kind {
        BoundaryKind::Initial => format!("--{boundary}{DELIMITER}"),
        BoundaryKind::Middle => format!("{DELIMITER}--{boundary}{DELIMITER}"),
        BoundaryKind::Final => format!("{DELIMITER}--{boundary}--{DELIMITER}"),
    };
    text.into_bytes()
}

/// Serializes `parts` into a single `multipart/form-data` payload with the
/// given boundary.
pub fn encode_parts(parts: &[BodyPart], boundary: &str) -> Result<Vec<u8>, CourierError> {
    let mut encoded = boundary_data(BoundaryKind::Initial, boundary);
    let last = parts.len().saturating_sub(1);

    for (index, part) in parts.iter().enumerate() {
        encoded.extend_from_slice(&part.headers);
        append_source(&part.source, &mut encoded)?;
        let kind = if index == last {
            BoundaryKind::Final
        } else {
            BoundaryKind::Middle
        };
        encoded.extend_from_slice(&boundary_data(kind, boundary));
    }

    Ok(encoded)
}

fn append_source(source: &PartSource, out: &mut Vec<u8>) -> Result<(), CourierError> {
    match source {
        PartSource::Bytes(bytes) => {
            out.extend_from_slice(bytes);
            Ok(())
        }
        PartSource::File(path) => {
            let mut file = File::open(path)
                .map_err(|err| service::multipart_encoding_failure(&format!("{}: {err}", path.display())))?;
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                let read = file
                    .read(&mut chunk)
                    .map_err(|err| service::multipart_encoding_failure(&format!("{}: {err}", path.display())))?;
                if read == 0 {
                    break;
                }
                out.extend_from_slice(&chunk[..read]);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_two_parts_with_boundaries() {
        let parts = vec![
            BodyPart::new("a", None, Some("text/plain"), PartSource::Bytes(b"one".to_vec())),
            BodyPart::new("b", None, None, PartSource::Bytes(b"two".to_vec())),
        ];
        let encoded = encode_parts(&parts, "BOUNDARY").unwrap();
        let text = String::from_utf8(encoded).unwrap();

        assert!(text.starts_with("--BOUNDARY\r\n"));
        assert!(text.contains("Content-Disposition: form-data; name=\"a\"\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("one\r\n--BOUNDARY\r\n"));
        assert!(text.contains("Content-Type: application/octet-stream\r\n"));
        assert!(text.ends_with("two\r\n--BOUNDARY--\r\n"));
    }

    #[test]
    fn filename_lands_in_the_disposition() {
        let part = BodyPart::new(
            "upload",
            Some("report.pdf"),
            Some("application/pdf"),
            PartSource::Bytes(Vec::new()),
        );
        let encoded = encode_parts(&[part], "B").unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert!(text.contains("form-data; name=\"upload\"; filename=\"report.pdf\""));
    }

    #[test]
    fn missing_file_reports_a_multipart_error() {
        let parts = vec![BodyPart::new(
            "f",
            None,
            None,
            PartSource::File(PathBuf::from("/definitely/not/here")),
        )];
        let error = encode_parts(&parts, "B").unwrap_err();
        assert_eq!(error.code, service::MULTIPART_ENCODING_FAILURE);
    }
}
