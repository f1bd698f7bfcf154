//! Client configuration

use {
    metadata_wrapper_interface::{TOKEN_METADATA_PROGRAM_ID, WRAPPER_PROGRAM_ID},
    solana_program::pubkey::Pubkey,
    std::str::FromStr,
    thiserror::Error,
};

/// Environment variable overriding the wrapper program id.
pub const PROGRAM_ID_ENV: &str = "METADATA_WRAPPER_PROGRAM_ID";

/// Environment variable overriding the token metadata program id.
pub const TOKEN_METADATA_PROGRAM_ID_ENV: &str = "TOKEN_METADATA_PROGRAM_ID";

/// Program ids a client talks to. Passed explicitly to every component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deployed metadata wrapper program
    pub program_id: Pubkey,
    /// Token metadata program owning the metadata and master edition PDAs
    pub token_metadata_program_id: Pubkey,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: WRAPPER_PROGRAM_ID,
            token_metadata_program_id: TOKEN_METADATA_PROGRAM_ID,
        }
    }
}

/// Errors loading a [`ClientConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but does not hold a base58 address
    #[error("{var} is not a valid base58 address: {value:?}")]
    InvalidAddress {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

impl ClientConfig {
    /// Defaults, overridden by the process environment and a `.env` file when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults, overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(PROGRAM_ID_ENV) {
            config.program_id = parse_address(PROGRAM_ID_ENV, value)?;
        }
        if let Some(value) = lookup(TOKEN_METADATA_PROGRAM_ID_ENV) {
            config.token_metadata_program_id = parse_address(TOKEN_METADATA_PROGRAM_ID_ENV, value)?;
        }
        Ok(config)
    }
}

fn parse_address(var: &'static str, value: String) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|_| ConfigError::InvalidAddress { var, value })
}
