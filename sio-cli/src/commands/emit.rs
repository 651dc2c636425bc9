//! Emit command - send an event to the server.

use std::time::Duration;

use console::style;

use sio_core::config::AppConfig;
use sio_core::constants::notifications;
use sio_core::error::{SioError, SioResult};
use sio_socket::ConnectionState;

use super::{format_args, parse_arg};

/// Time left for the write loop to flush before disconnecting.
const LINGER: Duration = Duration::from_millis(250);

pub struct EmitOptions {
    pub repeat: u32,
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

pub async fn run(
    config: &AppConfig,
    url: Option<String>,
    headers: Vec<String>,
    event: &str,
    args: Vec<String>,
    options: EmitOptions,
) -> SioResult<()> {
    let client = super::create_client(config, url)?;
    let headers = super::collect_headers(config, &headers)?;
    let args: Vec<_> = args.iter().map(|arg| parse_arg(arg)).collect();

    client.on(notifications::ERROR, |args| {
        eprintln!("{} {}", style("[error]").red().bold(), format_args(args));
    });

    let mut state = client.state_receiver();
    client.connect(headers).await;

    let reached = tokio::time::timeout(
        Duration::from_secs(options.timeout_secs),
        state.wait_for(|s| matches!(s, ConnectionState::Ready | ConnectionState::Closed)),
    )
    .await
    .map(|current| current.map(|s| *s));
    match reached {
        Ok(Ok(ConnectionState::Ready)) => {}
        Ok(_) => return Err(SioError::ConnectionClosed),
        Err(_) => {
            client.disconnect().await;
            return Err(SioError::Dial(format!(
                "not connected after {}s",
                options.timeout_secs
            )));
        }
    }

    for n in 0..options.repeat {
        if n > 0 {
            tokio::time::sleep(Duration::from_millis(options.interval_ms)).await;
        }
        client.send(event, args.clone()).await?;
        println!("{} {event} {}", style("sent").green(), format_args(&args));
    }

    tokio::time::sleep(LINGER).await;
    client.disconnect().await;
    Ok(())
}
