use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Client for the local inverter control server.
///
/// The server is a thin shim over the inverter's own protocol; losing it
/// mid-run is survivable, so every call here is individually fallible.
pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
}

impl Client {
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: Url) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { inner, base_url })
    }

    /// Read the inverter state.
    ///
    /// The SOC is absent until the inverter has pushed its first status
    /// packet after a server restart.
    #[instrument(skip_all)]
    pub async fn get_state(&self) -> Result<State> {
        let url = self.url("api/state")?;
        self.inner
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("failed to request the inverter state from `{url}`"))?
            .json()
            .await
            .context("failed to deserialize the inverter state")
    }

    /// Cap the discharge rate: 0 idles the inverter, 100 allows full discharge.
    #[instrument(skip_all, fields(pct = pct))]
    pub async fn set_discharge_pct(&self, pct: u32) -> Result {
        #[derive(Serialize)]
        struct SetDischargePct {
            pct: u32,
        }

        info!("setting…");
        self.inner
            .post(self.url("api/discharge-pct")?)
            .json(&SetDischargePct { pct })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("failed to set the discharge limit")?;
        Ok(())
    }

    /// Switch AC charging on or off.
    #[instrument(skip_all, fields(enabled = enabled))]
    pub async fn set_charge(&self, enabled: bool) -> Result {
        #[derive(Serialize)]
        struct SetCharge {
            enabled: bool,
        }

        info!("setting…");
        self.inner
            .post(self.url("api/charge")?)
            .json(&SetCharge { enabled })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context("failed to set the charge flag")?;
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).with_context(|| format!("failed to build the `{path}` URL"))
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct State {
    pub soc: Option<u32>,
    pub discharge_pct: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ok() -> Result {
        // language=json
        let state: State = serde_json::from_str(r#"{"soc": 47, "discharge_pct": 100}"#)?;
        assert_eq!(state.soc, Some(47));
        assert_eq!(state.discharge_pct, 100);
        Ok(())
    }

    #[test]
    fn state_without_soc_ok() -> Result {
        // language=json
        let state: State = serde_json::from_str(r#"{"soc": null, "discharge_pct": 0}"#)?;
        assert_eq!(state.soc, None);
        Ok(())
    }
}
