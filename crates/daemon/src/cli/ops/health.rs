use std::convert::Infallible;

use clap::Args;
use reqwest::Client;
use url::Url;

use hashdrop_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

const PROBES: [&str; 2] = ["livez", "readyz"];

/// One status line for `/_status/<probe>`
async fn probe(client: &Client, base: &Url, probe: &str) -> String {
    let url = match base.join(&format!("/_status/{}", probe)) {
        Ok(url) => url,
        Err(e) => return format!("  {:<7} BAD URL ({})", probe, e),
    };

    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => format!("  {:<7} OK", probe),
        Ok(resp) => format!("  {:<7} UNHEALTHY ({})", probe, resp.status()),
        Err(_) => format!("  {:<7} NOT REACHABLE", probe),
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = vec!["Config:".to_string()];

        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                let snapshot = if state.snapshot_path.exists() {
                    "OK"
                } else {
                    "not written yet"
                };
                lines.push(format!("  directory:    {}", state.app_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push(format!(
                    "  snapshot:     {} ({})",
                    state.snapshot_path.display(),
                    snapshot
                ));
                lines.push(format!("  api_port:     {}", state.config.api_port));
                lines.push(format!("  key_policy:   {:?}", state.config.key_policy));
            }
            Err(e) => lines.push(format!("  error: {}", e)),
        }

        let base = ctx.client.base_url();
        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));
        for name in PROBES {
            lines.push(probe(ctx.client.http_client(), base, name).await);
        }

        Ok(lines.join("\n"))
    }
}
