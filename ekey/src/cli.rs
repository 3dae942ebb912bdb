//! the `ekey` CLI

use std::net::SocketAddr;

use argh::FromArgs;
use ekey_core::{Bind, Capability, EKeyConfig, IssueRequest, Issuer, SystemClock};

use crate::server::default_listen_addr;

/// issue and verify ephemeral proof-bound capability keys
#[derive(Debug, FromArgs)]
pub struct Args {
    #[argh(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
pub enum Command {
    Serve(ServeCommand),
    Issue(IssueCommand),
}

/// run the demo issuance/verification HTTP server
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "serve")]
pub struct ServeCommand {
    /// address to listen on. Default: 127.0.0.1:8080
    #[argh(option, default = "default_listen_addr()")]
    pub listen_addr: SocketAddr,

    /// the issuer URL embedded in every minted token's `iss` claim.
    /// Env: `ISSUER_URL`.
    #[argh(option)]
    pub issuer_url: Option<String>,

    /// the audience every minted token targets and every verify call
    /// requires.
    #[argh(option)]
    pub audience: Option<String>,

    /// signing algorithm: es256 or eddsa. Default: es256. Env: `SIGNING_ALG`.
    #[argh(option)]
    pub signing_alg: Option<String>,
}

/// mint a single token against a freshly generated in-process key, for
/// local testing/scripting
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "issue")]
pub struct IssueCommand {
    /// the subject the token is issued to
    #[argh(option)]
    pub sub: String,

    /// the audience the token targets
    #[argh(option)]
    pub aud: String,

    /// the capability action, e.g. "POST:/payments"
    #[argh(option)]
    pub action: String,

    /// how many times the token may be consumed. Default: 1
    #[argh(option, default = "1")]
    pub limit: u32,

    /// token lifetime in seconds. Default: 60
    #[argh(option, default = "60")]
    pub ttl: u64,
}

/// Mint one token against a throwaway in-process ES256 key and print it.
/// Useful for exercising the issuer without standing up a server; the
/// minted key is discarded when the process exits, so this is strictly a
/// local testing aid.
pub fn issue_one_shot(cmd: IssueCommand) -> anyhow::Result<()> {
    let key_provider = ekey_crypto::KeyPair::generate_es256()?;
    let client_jwk = ekey_crypto::KeyPair::generate_ed25519()?.public_jwk();

    let config = EKeyConfig::new("https://issuer.local", cmd.aud.clone());
    let issuer = Issuer::new(std::sync::Arc::new(key_provider), std::sync::Arc::new(SystemClock), config);

    let cap = Capability { action: cmd.action, scope: None, limit: cmd.limit, subcap: None };
    let req = IssueRequest {
        sub: cmd.sub,
        aud: cmd.aud,
        cap,
        ttl: cmd.ttl,
        bind: Bind::DPoP,
        jwk: Some(client_jwk),
        cert_fingerprint: None,
    };
    let resp = issuer.issue(req)?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}
