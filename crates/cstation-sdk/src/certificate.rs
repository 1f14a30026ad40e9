//! Registry TLS certificate export.

use crate::client::ContainerStationClient;
use crate::error::{Result, SdkError, TransportError};
use reqwest::{Method, Response};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

/// Most bytes copied from the export endpoint. A certificate chain is a few
/// kilobytes; anything past this is dropped.
pub const CERTIFICATE_EXPORT_LIMIT: u64 = 5 * 1024 * 1024;

impl ContainerStationClient {
    /// Copy the container registry's TLS certificate into `sink`.
    ///
    /// The body is not JSON and is copied verbatim, up to
    /// [`CERTIFICATE_EXPORT_LIMIT`] bytes; a longer body is truncated, not
    /// rejected. Returns the number of bytes written.
    #[instrument(skip(self, sink))]
    pub async fn export_tls_certificate<W>(&self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let request = self.request(Method::GET, "/tls/export/registry");

        self.cancellable(async {
            let mut response = self.send(request).await?;
            let copied = copy_capped(&mut response, sink, CERTIFICATE_EXPORT_LIMIT).await?;

            if copied.truncated {
                warn!(
                    limit = CERTIFICATE_EXPORT_LIMIT,
                    "certificate export reached the size limit, output truncated"
                );
            }
            debug!(bytes = copied.written, "certificate exported");

            Ok::<_, SdkError>(copied.written)
        })
        .await
    }

    /// Export the registry certificate to `path`, created or truncated with
    /// permission bits `mode` (ignored off Unix). The file is removed if the
    /// export fails.
    #[instrument(skip(self, path))]
    pub async fn download_tls_certificate(
        &self,
        path: impl AsRef<Path>,
        mode: u32,
    ) -> Result<u64> {
        let path = path.as_ref();
        let mut options = tokio::fs::OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        options.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(path).await?;
        let result = self.export_tls_certificate(&mut file).await;
        drop(file);

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                debug!(error = %e, "failed to remove partial certificate file");
            }
        }

        result
    }
}

struct Copied {
    written: u64,
    /// Body bytes past `limit` were dropped.
    truncated: bool,
}

async fn copy_capped<W>(response: &mut Response, sink: &mut W, limit: u64) -> Result<Copied>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written: u64 = 0;
    let mut truncated = false;

    while let Some(chunk) = response.chunk().await.map_err(TransportError::from)? {
        if chunk.is_empty() {
            continue;
        }
        let room = (limit - written) as usize;
        let take = chunk.len().min(room);
        if take > 0 {
            sink.write_all(&chunk[..take]).await?;
            written += take as u64;
        }
        if take < chunk.len() {
            truncated = true;
            break;
        }
    }
    sink.flush().await?;

    Ok(Copied { written, truncated })
}
