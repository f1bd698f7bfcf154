//! Error types

use {
    crate::{pda::DerivationError, provider::ProviderError},
    metadata_wrapper_interface::error::DecodeError,
    solana_program::{program_error::ProgramError, pubkey::Pubkey},
    thiserror::Error,
};

/// Errors composing instructions, before anything touches the network.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    /// Address derivation failed
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    /// A field fails client-side validation
    #[error("invalid field: {0}")]
    InvalidField(String),
    /// A token program builder refused its arguments
    #[error("instruction builder failed: {0}")]
    Instruction(#[from] ProgramError),
}

/// Errors returned by [`crate::MetadataClient`]. Every variant names the
/// operation that failed.
#[derive(Debug, Error)]
pub enum MetadataClientError {
    /// No off-curve address for the mint's seeds
    #[error("{operation}: cannot derive address for mint {mint}")]
    Derivation {
        /// Client operation
        operation: &'static str,
        /// Mint the derivation ran for
        mint: Pubkey,
        /// Underlying failure
        #[source]
        source: DerivationError,
    },
    /// The account exists but its data is not a valid record
    #[error("{operation}: account {address} does not decode")]
    Decode {
        /// Client operation
        operation: &'static str,
        /// Fetched account
        address: Pubkey,
        /// Underlying failure
        #[source]
        source: DecodeError,
    },
    /// The account holds no data
    #[error("{operation}: account {address} not found")]
    NotFound {
        /// Client operation
        operation: &'static str,
        /// Requested account
        address: Pubkey,
    },
    /// Arguments rejected before submission
    #[error("{operation}: {reason}")]
    InvalidField {
        /// Client operation
        operation: &'static str,
        /// What was wrong
        reason: String,
    },
    /// A token program builder refused its arguments
    #[error("{operation}: instruction builder failed")]
    Instruction {
        /// Client operation
        operation: &'static str,
        /// Underlying failure
        #[source]
        source: ProgramError,
    },
    /// The submitter or program refused the signer set
    #[error("{operation}: unauthorized signer {address}")]
    Unauthorized {
        /// Client operation
        operation: &'static str,
        /// Signer the call was made with
        address: Pubkey,
        /// Collaborator error, unchanged
        #[source]
        source: ProviderError,
    },
    /// Any other collaborator failure
    #[error("{operation}: request for {address} failed")]
    Submission {
        /// Client operation
        operation: &'static str,
        /// Address the request concerned
        address: Pubkey,
        /// Collaborator error, unchanged
        #[source]
        source: ProviderError,
    },
}

impl MetadataClientError {
    /// Name of the client operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Derivation { operation, .. }
            | Self::Decode { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::InvalidField { operation, .. }
            | Self::Instruction { operation, .. }
            | Self::Unauthorized { operation, .. }
            | Self::Submission { operation, .. } => operation,
        }
    }

    pub(crate) fn compose(operation: &'static str, mint: Pubkey, err: ComposeError) -> Self {
        match err {
            ComposeError::Derivation(source) => Self::Derivation {
                operation,
                mint,
                source,
            },
            ComposeError::InvalidField(reason) => Self::InvalidField { operation, reason },
            ComposeError::Instruction(source) => Self::Instruction { operation, source },
        }
    }

    pub(crate) fn provider(operation: &'static str, address: Pubkey, source: ProviderError) -> Self {
        match source {
            ProviderError::Unauthorized(_) => Self::Unauthorized {
                operation,
                address,
                source,
            },
            _ => Self::Submission {
                operation,
                address,
                source,
            },
        }
    }
}
