//! Commands that talk to a *running* gateway over HTTP, rather than
//! operating on local config: device pairing, rate-limit/status
//! snapshots, and sync triggers all read or mutate state the gateway
//! process owns in memory.

use wizard_config::WizardConfig;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
}

/// Resolve the base URL for a running gateway: an explicit `--url`
/// override, or the configured host/port (with `0.0.0.0` remapped to
/// `127.0.0.1` since that's a bind address, not something a client can
/// dial).
fn base_url(url: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(url) = url {
        return Ok(url.trim_end_matches('/').to_string());
    }
    let config = WizardConfig::load().map_err(|e| format!("failed to load config: {e}"))?;
    let host = if config.gateway.host == "0.0.0.0" { "127.0.0.1" } else { &config.gateway.host };
    Ok(format!("http://{host}:{}", config.gateway.port))
}

fn with_auth(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(t) => builder.bearer_auth(t),
        None => builder,
    }
}

pub async fn status(url: Option<String>, token: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let base = base_url(url)?;
    let response = with_auth(client().get(format!("{base}/api/status")), token.as_deref()).send().await?;
    print_json_response(response).await
}

pub async fn rate_limits(url: Option<String>, token: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let base = base_url(url)?;
    let response = with_auth(client().get(format!("{base}/api/rate-limits")), token.as_deref()).send().await?;
    print_json_response(response).await
}

pub async fn pair(url: Option<String>, code: &str, display_name: &str, device_type: &str) -> Result<(), Box<dyn std::error::Error>> {
    let base = base_url(url)?;
    let response = client()
        .post(format!("{base}/pair"))
        .json(&serde_json::json!({
            "code": code,
            "display_name": display_name,
            "device_type": device_type,
        }))
        .send()
        .await?;
    print_json_response(response).await
}

#[allow(clippy::too_many_arguments)]
pub async fn sync(
    url: Option<String>,
    token: Option<String>,
    kind: &str,
    mission_id: &str,
    query: Option<String>,
    channel_id: Option<String>,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = base_url(url)?;
    let mut request = with_auth(client().post(format!("{base}/api/sync/{kind}")), token.as_deref());

    let mut params = vec![("mission_id", mission_id.to_string())];
    if let Some(q) = query {
        params.push(("query", q));
    }
    if let Some(c) = channel_id {
        params.push(("channel_id", c));
    }
    if let Some(l) = limit {
        params.push(("limit", l.to_string()));
    }
    request = request.query(&params);

    let response = request.send().await?;
    print_json_response(response).await
}

async fn print_json_response(response: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        return Err(format!("gateway responded with {status}").into());
    }
    Ok(())
}
