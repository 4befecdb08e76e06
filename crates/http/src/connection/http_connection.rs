use std::error::Error;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderValue, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, keep_alive};

const CLOSE: HeaderValue = HeaderValue::from_static("close");

/// An HTTP/1.x connection.
///
/// # Type Parameters
///
/// * `R`: The async readable half of the socket
/// * `W`: The async writable half of the socket
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection").finish_non_exhaustive()
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Serves requests until the peer goes away or the connection must be closed.
    ///
    /// A request that can't be decoded is answered with an empty 400 and ends the
    /// connection with the decode error.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(request)) => {
                    let keep_alive = keep_alive(request.version(), request.headers());

                    let mut response = match handler.call(request).await {
                        Ok(response) => response,
                        Err(e) => {
                            let e: Box<dyn Error + Send + Sync> = e.into();
                            error!(cause = %e, "handle request error");
                            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
                        }
                    };

                    let keep_alive = keep_alive && response.headers().get(CONNECTION) != Some(&CLOSE);
                    if !keep_alive {
                        response.headers_mut().insert(CONNECTION, CLOSE);
                    }

                    self.framed_write.send(response).await?;

                    if !keep_alive {
                        debug!("request asked for close, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    let mut error_response = build_error_response(StatusCode::BAD_REQUEST);
                    error_response.headers_mut().insert(CONNECTION, CLOSE);
                    self.framed_write.send(error_response).await?;
                    return Err(e.into());
                }

                None => {
                    debug!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status_code;
    response
}
