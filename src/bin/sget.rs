//
// Copyright 2026 The Sigstore Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! sget — fetch content over HTTPS, verified against a transparency log.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use sget::errors::Result;
use sget::oauth::{
    DeviceFlowProvider, IdentityToken, OauthTokenProvider, TokenProvider, DEFAULT_CLIENT_ID,
    DEFAULT_ISSUER, DEFAULT_REDIRECT_PORT,
};
use sget::sign::{self, SignOpts};
use sget::trust::{self, TrustConfig};
use sget::verify::{self, VerifyOpts};
use sget::{fulcio, registry, rekor};

#[derive(Parser)]
#[command(name = "sget")]
#[command(about = "Fetch content over HTTPS, verified against a transparency log")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL and emit it only if a trusted identity has signed for its digest
    Get {
        /// HTTPS URL, or an OCI reference pinned by digest
        url: String,

        /// If set, the fetched content must have this sha256 digest
        #[arg(long)]
        digest: Option<String>,

        /// File path to write to (pass "-" for stdout)
        #[arg(short, long, default_value = "-")]
        out: String,

        #[command(flatten)]
        services: ServiceFlags,
    },

    /// Sign for a URL's digest and record it in the transparency log
    Sign {
        /// HTTPS URL to sign for
        url: String,

        /// If set, the fetched content must have this sha256 digest
        #[arg(long)]
        digest: Option<String>,

        /// If set, skip the OIDC flow and use this identity token
        #[arg(long)]
        idtoken: Option<String>,

        /// OIDC issuer
        #[arg(long, default_value = DEFAULT_ISSUER)]
        oidc_issuer: String,

        /// OIDC client ID
        #[arg(long, default_value = DEFAULT_CLIENT_ID)]
        oidc_client_id: String,

        /// OIDC client secret
        #[arg(long, default_value = "")]
        oidc_client_secret: String,

        /// Local port for the OIDC redirect listener
        #[arg(long, default_value_t = DEFAULT_REDIRECT_PORT)]
        oidc_redirect_port: u16,

        #[command(flatten)]
        services: ServiceFlags,
    },

    /// Manage the set of trusted identities
    Trust {
        /// Identities to add (or remove with --rm)
        #[arg(required = true)]
        identities: Vec<String>,

        /// If set, scope trust to this host
        #[arg(long)]
        host: Option<String>,

        /// If set, remove trusted identities
        #[arg(long)]
        rm: bool,
    },
}

#[derive(Args)]
struct ServiceFlags {
    /// URL of the Rekor transparency log
    #[arg(long, default_value = rekor::REKOR_ROOT)]
    rekor_url: Url,

    /// URL of the Fulcio CA
    #[arg(long, default_value = fulcio::FULCIO_ROOT)]
    fulcio_url: Url,

    /// Timeout in seconds for requests to Rekor and Fulcio
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl ServiceFlags {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("sget: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Get {
            url,
            digest,
            out,
            services,
        } => {
            let is_https = Url::parse(&url)
                .map(|u| u.scheme() == "https")
                .unwrap_or(false);
            if !is_https {
                info!("argument is not an HTTPS URL, assuming an OCI reference by digest");
                let mut sink = open_sink(&out)?;
                return registry::fetch_image(&url, sink.as_mut()).await;
            }

            let timeout = services.timeout();
            let opts = VerifyOpts {
                url,
                want_digest: digest,
                fulcio_url: services.fulcio_url,
                rekor_url: services.rekor_url,
                timeout,
                trust_config_path: trust::default_config_path()?,
            };
            let verification = verify::get(&opts, &cancel).await?;

            let mut sink = open_sink(&out)?;
            let mut content = verification.content.open()?;
            std::io::copy(&mut content, &mut sink)?;
            Ok(())
        }

        Commands::Sign {
            url,
            digest,
            idtoken,
            oidc_issuer,
            oidc_client_id,
            oidc_client_secret,
            oidc_redirect_port,
            services,
        } => {
            let provider = match idtoken {
                Some(raw) => TokenProvider::Static(IdentityToken::try_from(raw.as_str())?),
                None if !std::io::stdin().is_terminal() => {
                    eprintln!("Non-interactive mode detected, using device flow.");
                    TokenProvider::Device(DeviceFlowProvider::new(oidc_issuer, oidc_client_id))
                }
                None => TokenProvider::Interactive(
                    OauthTokenProvider::default()
                        .with_issuer(&oidc_issuer)
                        .with_client_id(&oidc_client_id)
                        .with_client_secret(&oidc_client_secret)
                        .with_redirect_port(oidc_redirect_port),
                ),
            };

            let timeout = services.timeout();
            let opts = SignOpts {
                url,
                want_digest: digest,
                fulcio_url: services.fulcio_url,
                rekor_url: services.rekor_url,
                timeout,
            };
            let outcome = sign::sign(&opts, &provider, &cancel).await?;

            let integrated = chrono::DateTime::from_timestamp(outcome.integrated_time, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| outcome.integrated_time.to_string());
            info!(uuid = %outcome.uuid, "UUID");
            info!(time = %integrated, "integrated");
            info!(index = outcome.log_index, "log index");
            info!(identity = %outcome.identity, digest = %outcome.digest, "signed");
            Ok(())
        }

        Commands::Trust {
            identities,
            host,
            rm,
        } => {
            let host = host.as_deref().map(trust::normalize_host).transpose()?;
            let path = trust::default_config_path()?;
            let mut config = TrustConfig::load(&path)?;
            config.update(&identities, host.as_deref(), rm);
            config.store(&path)
        }
    }
}

fn open_sink(out: &str) -> Result<Box<dyn Write>> {
    Ok(match out {
        "-" => Box::new(std::io::stdout()),
        path => Box::new(std::fs::File::create(path)?),
    })
}
