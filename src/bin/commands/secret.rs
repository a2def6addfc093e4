use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use netinv::NetinvConfig;

/// Arguments for the Secret command
#[derive(Args)]
pub struct SecretArgs {
    #[clap(subcommand)]
    pub action: SecretAction,
}

#[derive(Subcommand)]
pub enum SecretAction {
    /// Encrypt a plaintext secret into its stored form
    Encrypt {
        /// Plaintext secret
        value: String,
    },

    /// Decrypt a stored secret back to plaintext
    Decrypt {
        /// Stored (base64) secret
        value: String,
    },
}

pub fn run(config: &NetinvConfig, args: SecretArgs) -> Result<()> {
    let cipher = config.secret_cipher()?;

    let output = match args.action {
        SecretAction::Encrypt { value } => cipher
            .encrypt(&value)
            .map_err(|e| anyhow!("encrypt: {}", e))?,
        SecretAction::Decrypt { value } => cipher
            .decrypt(&value)
            .map_err(|e| anyhow!("decrypt: {}", e))?,
    };
    println!("{}", output);
    Ok(())
}
