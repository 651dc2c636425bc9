//! CLI subcommand implementations.

pub mod emit;
pub mod listen;

use serde_json::Value;

use sio_core::config::AppConfig;
use sio_core::error::{SioError, SioResult};
use sio_socket::{ClientOptions, Headers, SocketClient};

/// Build a client for the URL argument, falling back to the configured address.
pub fn create_client(config: &AppConfig, url: Option<String>) -> SioResult<SocketClient> {
    let address = match url {
        Some(url) => url,
        None if config.is_server_configured() => config.server.address.clone(),
        None => {
            return Err(SioError::MissingConfig(
                "server address (use --url or set server.address)".into(),
            ))
        }
    };
    SocketClient::with_options(&address, ClientOptions::from(config))
}

/// Configured headers first, then `NAME:VALUE` arguments in order.
pub fn collect_headers(config: &AppConfig, args: &[String]) -> SioResult<Headers> {
    let mut headers: Headers = config
        .server
        .custom_headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    headers.sort();

    for arg in args {
        let (name, value) = arg
            .split_once(':')
            .ok_or_else(|| SioError::Config(format!("header {arg:?} is not NAME:VALUE")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SioError::Config(format!("header {arg:?} has an empty name")));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

/// Parse an argument as JSON, or keep it as a plain string.
pub fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Render event arguments on one line.
pub fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_headers() {
        let mut config = AppConfig::default();
        config
            .server
            .custom_headers
            .insert("x-from-config".into(), "1".into());

        let headers = collect_headers(
            &config,
            &["terminal: en-US".to_string(), "success:a".to_string(), "success:b".to_string()],
        )
        .unwrap();
        assert_eq!(
            headers,
            vec![
                ("x-from-config".to_string(), "1".to_string()),
                ("terminal".to_string(), "en-US".to_string()),
                ("success".to_string(), "a".to_string()),
                ("success".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_collect_headers_rejects_garbage() {
        let config = AppConfig::default();
        assert!(collect_headers(&config, &["no-colon".to_string()]).is_err());
        assert!(collect_headers(&config, &[":value".to_string()]).is_err());
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("42"), json!(42));
        assert_eq!(parse_arg(r#"{"a":true}"#), json!({"a": true}));
        assert_eq!(parse_arg("hello server!"), json!("hello server!"));
    }

    #[test]
    fn test_create_client_requires_address() {
        let config = AppConfig::default();
        assert!(matches!(
            create_client(&config, None),
            Err(SioError::MissingConfig(_))
        ));
        let client = create_client(&config, Some("ws://localhost:3000".into())).unwrap();
        assert_eq!(client.url().path(), "/socket.io/");
    }
}
