//! Process configuration.
//!
//! Built once in `main` and injected through `AppState`; required values fail
//! fast at startup. Gateway credentials here are the env-level fallback; a
//! per-merchant override in the `settings` table takes precedence at call
//! time (see `gateway::credentials`).

use std::env;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_api_key: String,
    pub service_secret: String,
    pub bot_base_url: Option<String>,
    pub bot_token: Option<String>,
    pub ipaymu: IpaymuEnv,
    pub pakasir: PakasirEnv,
    pub tokopay: TokopayEnv,
}

#[derive(Clone, Debug, Default)]
pub struct IpaymuEnv {
    pub va: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PakasirEnv {
    pub project: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TokopayEnv {
    pub merchant_id: Option<String>,
    pub secret: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8083".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;
        let admin_api_key = env::var("ADMIN_API_KEY").context("ADMIN_API_KEY must be set")?;
        let service_secret = env::var("SERVICE_SECRET").context("SERVICE_SECRET must be set")?;

        Ok(Self {
            database_url,
            port,
            admin_api_key,
            service_secret,
            bot_base_url: env::var("BOT_BASE_URL").ok(),
            bot_token: env::var("BOT_TOKEN").ok(),
            ipaymu: IpaymuEnv {
                va: env::var("IPAYMU_VA").ok(),
                api_key: env::var("IPAYMU_API_KEY").ok(),
                base_url: env::var("IPAYMU_BASE_URL").ok(),
            },
            pakasir: PakasirEnv {
                project: env::var("PAKASIR_PROJECT").ok(),
                api_key: env::var("PAKASIR_API_KEY").ok(),
                base_url: env::var("PAKASIR_BASE_URL").ok(),
            },
            tokopay: TokopayEnv {
                merchant_id: env::var("TOKOPAY_MERCHANT_ID").ok(),
                secret: env::var("TOKOPAY_SECRET").ok(),
                base_url: env::var("TOKOPAY_BASE_URL").ok(),
            },
        })
    }
}
