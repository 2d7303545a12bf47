//! Line-oriented stderr draining
//!
//! The runner's stderr is read line by line. Every line is kept for the final
//! error message; lines carrying the noise marker are held back from the live
//! stream only.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Read `reader` to EOF, mirroring lines to `live` and appending them to `captured`
///
/// Each captured line ends with `\n`, including a final unterminated one.
/// Invalid UTF-8 is replaced rather than dropped. A failing `live` sink stops
/// the mirroring but never the capture. Lines are appended as they arrive, so
/// `captured` holds everything read so far if the future is dropped early.
pub async fn drain_stderr<R, W>(
    reader: R,
    mut live: W,
    noise_marker: &str,
    captured: &mut String,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::with_capacity(1024);
    let mut mirroring = true;

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Error reading runner stderr: {}", e);
                break;
            }
        }

        let text = String::from_utf8_lossy(&raw);
        let line = text.strip_suffix('\n').unwrap_or(&text);
        captured.push_str(line);
        captured.push('\n');

        if !mirroring || is_noise(line, noise_marker) {
            continue;
        }
        let written = async {
            live.write_all(line.as_bytes()).await?;
            live.write_all(b"\n").await?;
            live.flush().await
        }
        .await;
        if let Err(e) = written {
            tracing::warn!("Stopped mirroring runner stderr: {}", e);
            mirroring = false;
        }
    }
}

fn is_noise(line: &str, marker: &str) -> bool {
    !marker.is_empty() && line.contains(marker)
}
