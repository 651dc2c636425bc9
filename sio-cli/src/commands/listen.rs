//! Listen command - print server events until Ctrl-C.

use console::style;

use sio_core::config::AppConfig;
use sio_core::constants::notifications;
use sio_core::error::SioResult;

use super::format_args;

pub async fn run(
    config: &AppConfig,
    url: Option<String>,
    headers: Vec<String>,
    events: Vec<String>,
) -> SioResult<()> {
    let client = super::create_client(config, url)?;
    let headers = super::collect_headers(config, &headers)?;

    for name in notifications::ALL {
        let name = *name;
        client.on(name, move |args| {
            let label = format!("[{name}]");
            let label = if name == notifications::ERROR {
                style(label).red().bold()
            } else {
                style(label).dim()
            };
            println!("{label} {}", format_args(args));
        });
    }

    for event in events {
        let label = event.clone();
        client.on(&event, move |args| {
            println!("{} {}", style(&label).cyan().bold(), format_args(args));
        });
    }

    println!("Connecting to {}...", client.url());
    client.connect(headers).await;

    tokio::signal::ctrl_c().await?;
    println!();
    client.disconnect().await;
    Ok(())
}
