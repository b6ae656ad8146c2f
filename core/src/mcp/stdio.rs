//! Newline-delimited JSON-RPC on a byte stream

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::handler::{SchoolServer, SERVER_NAME};
use super::session::{Outbound, Session};
use crate::error::Result;

/// Serve on the process stdin/stdout until stdin closes
pub async fn serve_stdio(server: SchoolServer) -> Result<()> {
    serve_lines(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Read frames until EOF, writing one line per response
///
/// Requests still running at EOF are answered before returning.
pub async fn serve_lines<R, W>(server: SchoolServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(
        "{} {} serving {} tools on stdio",
        SERVER_NAME,
        crate::VERSION,
        server.tool_count()
    );

    let (mut session, mut outbound) = Session::start(server);
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut frame) => {
                if read? == 0 {
                    break;
                }
                session.deliver(&frame).await?;
                frame.clear();
            }
            Some(item) = outbound.recv() => write_item(&mut writer, item).await?,
        }
    }

    // A final line without a newline
    if !frame.is_empty() {
        session.deliver(&frame).await?;
    }

    while session.has_pending() {
        match outbound.recv().await {
            Some(item) => write_item(&mut writer, item).await?,
            None => break,
        }
    }

    drop(session);
    while let Some(item) = outbound.recv().await {
        write_item(&mut writer, item).await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

async fn write_item<W: AsyncWrite + Unpin>(writer: &mut W, item: Outbound) -> Result<()> {
    if let Outbound::Frame(frame) = item {
        writer.write_all(frame.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
