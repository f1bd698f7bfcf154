//! Signer resolution

use {
    solana_program::pubkey::Pubkey,
    solana_sdk::signature::{Keypair, Signer},
};

/// An account acting in a call: either a bare address, which must be
/// co-signed by the submitter, or a keypair that signs locally.
#[derive(Clone, Copy, Debug)]
pub enum Payer<'a> {
    /// Address without local signing capability
    Address(Pubkey),
    /// Full signing identity
    Keypair(&'a Keypair),
}

impl From<Pubkey> for Payer<'_> {
    fn from(address: Pubkey) -> Self {
        Payer::Address(address)
    }
}

impl<'a> From<&'a Keypair> for Payer<'a> {
    fn from(keypair: &'a Keypair) -> Self {
        Payer::Keypair(keypair)
    }
}

/// Address acting in a call plus the keypairs that must sign for it.
#[derive(Debug)]
pub struct SignerInfo<'a> {
    /// Acting address
    pub payer: Pubkey,
    /// Local signers; empty for a bare address
    pub signers: Vec<&'a Keypair>,
}

impl<'a> Payer<'a> {
    /// Address of the acting account.
    pub fn pubkey(&self) -> Pubkey {
        match self {
            Payer::Address(address) => *address,
            Payer::Keypair(keypair) => keypair.pubkey(),
        }
    }

    /// Split into the acting address and its local signer set.
    pub fn resolve(self) -> SignerInfo<'a> {
        match self {
            Payer::Address(payer) => SignerInfo {
                payer,
                signers: Vec::new(),
            },
            Payer::Keypair(keypair) => SignerInfo {
                payer: keypair.pubkey(),
                signers: vec![keypair],
            },
        }
    }
}
