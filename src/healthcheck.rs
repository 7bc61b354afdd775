use std::time::Duration;

use anyhow::{bail, Context};

use crate::config::HealthcheckArgs;

/// GETs the probe url; `Ok` only for a 200 answer within the timeout.
pub async fn probe(args: &HealthcheckArgs) -> anyhow::Result<()> {
    let url = args.url();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let res = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    if res.status() != reqwest::StatusCode::OK {
        bail!("{} answered {}", url, res.status());
    }
    Ok(())
}
