//! JSON-lines method channel.
//!
//! Reads one [`MethodCall`](sendora_core::protocol::messages::MethodCall) per
//! line from `reader`, dispatches it and writes the response as one line to
//! `writer`.  Events from the [`EventReceiver`] are interleaved on the same
//! writer as they arrive.  Each output line is a complete JSON object.
//!
//! The binary runs this over stdin/stdout; tests run it over an in-memory
//! `tokio::io::duplex` pipe.

use sendora_core::protocol::messages::{ErrorBody, MethodResponse};
use sendora_core::{decode_call, encode_event, encode_response, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::application::dispatcher::CommandDispatcher;
use crate::application::event_bus::EventReceiver;

/// Error type for the method channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("method channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Serves requests until `reader` reaches end of input.
///
/// Events keep flowing while the channel waits for input.  Once the event
/// bus closes only requests are served.
///
/// # Errors
///
/// Returns [`ChannelError::Io`] if reading or writing fails.  Malformed
/// request lines are answered with a `MALFORMED_REQUEST` error response and
/// do not end the loop.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    dispatcher: &CommandDispatcher,
    events: &mut EventReceiver,
) -> Result<(), ChannelError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut events_open = true;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("method channel input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = match decode_call(&line) {
                    Ok(call) => dispatcher.handle_call(&call).await,
                    Err(e) => {
                        warn!("rejecting request line: {e}");
                        MethodResponse::err(
                            None,
                            ErrorBody {
                                code: e.code().to_string(),
                                message: e.to_string(),
                            },
                        )
                    }
                };
                write_line(&mut writer, &encode_response(&response)?).await?;
            }
            event = events.recv(), if events_open => match event {
                Some(event) => write_line(&mut writer, &encode_event(&event)?).await?,
                None => {
                    debug!("event bus closed");
                    events_open = false;
                }
            },
        }
    }

    writer.flush().await?;
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
