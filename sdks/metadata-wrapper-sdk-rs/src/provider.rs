//! Collaborator interfaces: account reads and transaction submission

use {
    async_trait::async_trait,
    solana_program::{instruction::Instruction, pubkey::Pubkey},
    solana_sdk::signature::{Keypair, Signature},
    std::sync::Arc,
    thiserror::Error,
};

/// Failures reported by a [`Connection`] or [`TransactionSubmitter`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// A required signature was missing or the program refused the signer
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The program rejected the transaction for another reason
    #[error("rejected: {0}")]
    Rejected(String),
    /// The request never reached a verdict (connectivity, timeouts, funds)
    #[error("transport: {0}")]
    Transport(String),
}

/// Read access to chain state.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Raw data of the account at `address`, or `None` when it holds no data.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ProviderError>;

    /// Lamports an account of `data_len` bytes needs to be rent exempt.
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ProviderError>;
}

/// Signs, submits and confirms transactions.
///
/// Implementations pay fees from and co-sign with their own wallet, then add
/// the `signers` handed in by the caller.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit `instructions` as one atomic transaction and wait for confirmation.
    async fn submit(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Signature, ProviderError>;
}

#[async_trait]
impl<T: Connection + ?Sized> Connection for Arc<T> {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ProviderError> {
        (**self).get_account_data(address).await
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ProviderError> {
        (**self).get_minimum_balance_for_rent_exemption(data_len).await
    }
}

#[async_trait]
impl<T: TransactionSubmitter + ?Sized> TransactionSubmitter for Arc<T> {
    async fn submit(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Signature, ProviderError> {
        (**self).submit(instructions, signers).await
    }
}
