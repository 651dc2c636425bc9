//! Connection address construction.

use url::Url;

use sio_core::constants::{ENGINE_IO_VERSION, SOCKET_IO_PATH, TRANSPORT_NAME};
use sio_core::error::{SioError, SioResult};

/// Rewrite a base server URL into the socket endpoint.
///
/// The path is replaced with `/socket.io/` and the protocol version and
/// transport are appended to whatever query the base URL already carries.
pub fn socket_url(base: &str) -> SioResult<Url> {
    let mut url = Url::parse(base).map_err(|e| SioError::InvalidUrl(format!("{base}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SioError::InvalidUrl(format!("{base}: not a hierarchical url")));
    }
    url.set_path(SOCKET_IO_PATH);
    url.query_pairs_mut()
        .append_pair("EIO", ENGINE_IO_VERSION)
        .append_pair("transport", TRANSPORT_NAME);
    Ok(url)
}
