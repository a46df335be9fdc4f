//! Request body encoding.
//!
//! Parameters travel as `application/x-www-form-urlencoded` unless the
//! request carries attachments, in which case everything goes out as
//! `multipart/form-data` with a fixed boundary. Part order is parameters,
//! then files, then in-memory blobs, each in insertion order.

use std::fs;

use crate::error::ApiError;
use crate::types::{BinaryAttachment, FileAttachment, ParameterSet};

pub const MULTIPART_BOUNDARY: &str = "------------SelectPdf_Api_Boundry_$";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const NEW_LINE: &str = "\r\n";

/// An encoded body together with the `Content-Type` that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Encode `params`, switching to multipart when any attachment is present.
pub fn encode(
    params: &ParameterSet,
    files: &[FileAttachment],
    blobs: &[BinaryAttachment],
) -> Result<EncodedBody, ApiError> {
    if files.is_empty() && blobs.is_empty() {
        Ok(encode_form(params))
    } else {
        encode_multipart(params, files, blobs)
    }
}

pub fn encode_form(params: &ParameterSet) -> EncodedBody {
    let body = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    EncodedBody {
        content_type: FORM_CONTENT_TYPE.to_string(),
        bytes: body.into_bytes(),
    }
}

/// Build a multipart body. Reads every attached file into memory.
pub fn encode_multipart(
    params: &ParameterSet,
    files: &[FileAttachment],
    blobs: &[BinaryAttachment],
) -> Result<EncodedBody, ApiError> {
    let mut out = Vec::new();

    for (key, value) in params.iter() {
        push_part_header(&mut out, key, None);
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(NEW_LINE.as_bytes());
    }

    for file in files {
        let bytes = fs::read(&file.path).map_err(|e| {
            ApiError::local_io(format!("Cannot read attachment '{}'", file.path.display()), e)
        })?;
        let filename = file.path.to_string_lossy();
        push_part_header(&mut out, &file.field, Some(&filename));
        out.extend_from_slice(&bytes);
        out.extend_from_slice(NEW_LINE.as_bytes());
    }

    for blob in blobs {
        push_part_header(&mut out, &blob.field, Some(&blob.field));
        out.extend_from_slice(&blob.bytes);
        out.extend_from_slice(NEW_LINE.as_bytes());
    }

    out.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--{NEW_LINE}").as_bytes());

    Ok(EncodedBody {
        content_type: format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        bytes: out,
    })
}

fn push_part_header(out: &mut Vec<u8>, name: &str, filename: Option<&str>) {
    let mut header = format!("--{MULTIPART_BOUNDARY}{NEW_LINE}");
    match filename {
        Some(filename) => {
            header.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"{NEW_LINE}"
            ));
            header.push_str(&format!("Content-Type: application/octet-stream{NEW_LINE}"));
        }
        None => {
            header.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"{NEW_LINE}"
            ));
        }
    }
    header.push_str(NEW_LINE);
    out.extend_from_slice(header.as_bytes());
}
