//! Result sinks: caller-supplied writers and local files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::error::ApiError;

const WRITE_ERROR: &str = "Error writing the result to the specified destination";

/// Write `bytes` to `writer`, failing unless every byte was accepted.
pub fn write_to_writer<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<(), ApiError> {
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(ApiError::local_io(WRITE_ERROR, e)),
        }
    }
    if written != bytes.len() {
        return Err(ApiError::local_io(
            WRITE_ERROR,
            io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {written} of {} bytes", bytes.len()),
            ),
        ));
    }
    writer.flush().map_err(|e| ApiError::local_io(WRITE_ERROR, e))
}

/// Create `path`, hand it to `op`, and delete it again if anything fails.
///
/// The file is created before `op` runs so an unwritable destination is
/// reported before any request goes out.
pub fn write_to_file<F>(path: &Path, op: F) -> Result<(), ApiError>
where
    F: FnOnce(&mut File) -> Result<(), ApiError>,
{
    let mut file = File::create(path).map_err(|e| {
        ApiError::local_io(format!("Cannot create output file '{}'", path.display()), e)
    })?;

    let result = op(&mut file);
    drop(file);

    if let Err(err) = result {
        if let Err(rm) = fs::remove_file(path) {
            warn!("Could not remove partial output '{}': {}", path.display(), rm);
        }
        return Err(err);
    }
    Ok(())
}
