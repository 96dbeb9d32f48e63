//! Writing frames to disk

use crate::frame::FrameBuffer;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Save a frame as a binary PPM (P6); alpha is dropped
pub fn save_ppm(frame: &FrameBuffer, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_ppm(frame, &mut writer)?;
    writer.flush()?;
    log::info!("Saved {}x{} frame to {}", frame.width(), frame.height(), path.as_ref().display());
    Ok(())
}

/// Encode a frame as binary PPM into any writer
pub fn write_ppm<W: Write>(frame: &FrameBuffer, writer: &mut W) -> io::Result<()> {
    write!(writer, "P6\n{} {}\n255\n", frame.width(), frame.height())?;
    for texel in frame.as_bytes().chunks_exact(4) {
        writer.write_all(&texel[..3])?;
    }
    Ok(())
}
