//! Metadata client
//!
//! Ties the address deriver, record decoders and instruction composer to a
//! [`Connection`] and a [`TransactionSubmitter`]. Each call is independent;
//! the client keeps no state between calls and adds no retries.

use {
    crate::{
        composer::{InstructionComposer, MintSequenceParams},
        error::{ComposeError, MetadataClientError},
        pda::{AddressDeriver, ProgramAddressDeriver, SeedDeriver},
        provider::{Connection, TransactionSubmitter},
        signer::Payer,
        ClientConfig,
    },
    metadata_wrapper_interface::{
        instruction::{MetadataInfo, UpdateMetadataInfo},
        state::{MasterEditionRecord, MetadataRecord},
    },
    solana_program::{instruction::Instruction, program_pack::Pack, pubkey::Pubkey},
    solana_sdk::signature::{Keypair, Signature, Signer},
    spl_token::state::Mint,
    tracing::{debug, info, warn},
};

/// Result of [`MetadataClient::generate_metadata`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedMetadata {
    /// Confirmed transaction
    pub signature: Signature,
    /// Mint the metadata was generated for
    pub mint: Pubkey,
    /// Metadata PDA
    pub metadata: Pubkey,
    /// Master edition PDA, present only when a supply was requested
    pub master_edition: Option<Pubkey>,
}

/// Client for the metadata wrapper program.
pub struct MetadataClient<C, S, D = ProgramAddressDeriver> {
    connection: C,
    submitter: S,
    composer: InstructionComposer<D>,
}

impl<C: Connection, S: TransactionSubmitter> MetadataClient<C, S> {
    /// Client using [`ProgramAddressDeriver`].
    pub fn new(config: ClientConfig, connection: C, submitter: S) -> Self {
        Self::with_deriver(AddressDeriver::with_config(config), connection, submitter)
    }
}

impl<C: Connection, S: TransactionSubmitter, D: SeedDeriver> MetadataClient<C, S, D> {
    /// Client over an explicit address deriver.
    pub fn with_deriver(addresses: AddressDeriver<D>, connection: C, submitter: S) -> Self {
        Self {
            connection,
            submitter,
            composer: InstructionComposer::new(addresses),
        }
    }

    /// Instruction builders the client submits.
    pub fn composer(&self) -> &InstructionComposer<D> {
        &self.composer
    }

    /// Address deriver the client uses.
    pub fn addresses(&self) -> &AddressDeriver<D> {
        self.composer.addresses()
    }

    /// Metadata PDA of `mint`.
    pub fn metadata_address(&self, mint: &Pubkey) -> Result<Pubkey, MetadataClientError> {
        self.addresses()
            .metadata_pda(mint)
            .map_err(|source| MetadataClientError::Derivation {
                operation: "metadata_address",
                mint: *mint,
                source,
            })
    }

    /// Master edition PDA of `mint`.
    pub fn master_edition_address(&self, mint: &Pubkey) -> Result<Pubkey, MetadataClientError> {
        self.addresses()
            .master_edition_pda(mint)
            .map_err(|source| MetadataClientError::Derivation {
                operation: "master_edition_address",
                mint: *mint,
                source,
            })
    }

    /// Fetch and decode the metadata account at `address`.
    pub async fn fetch_metadata(&self, address: &Pubkey) -> Result<MetadataRecord, MetadataClientError> {
        const OPERATION: &str = "fetch_metadata";
        let data = self.fetch_account(OPERATION, address).await?;
        MetadataRecord::decode(&data).map_err(|source| MetadataClientError::Decode {
            operation: OPERATION,
            address: *address,
            source,
        })
    }

    /// Fetch and decode the master edition account at `address`.
    pub async fn fetch_master_edition(
        &self,
        address: &Pubkey,
    ) -> Result<MasterEditionRecord, MetadataClientError> {
        const OPERATION: &str = "fetch_master_edition";
        let data = self.fetch_account(OPERATION, address).await?;
        MasterEditionRecord::decode(&data).map_err(|source| MetadataClientError::Decode {
            operation: OPERATION,
            address: *address,
            source,
        })
    }

    /// Fetch the metadata of `mint`.
    pub async fn fetch_metadata_for_mint(
        &self,
        mint: &Pubkey,
    ) -> Result<MetadataRecord, MetadataClientError> {
        let address = self.metadata_address(mint)?;
        self.fetch_metadata(&address).await
    }

    /// Fetch the master edition of `mint`.
    pub async fn fetch_master_edition_for_mint(
        &self,
        mint: &Pubkey,
    ) -> Result<MasterEditionRecord, MetadataClientError> {
        let address = self.master_edition_address(mint)?;
        self.fetch_master_edition(&address).await
    }

    /// The mint setup sequence with rent looked up from the connection.
    pub async fn mint_instructions(
        &self,
        mint: Pubkey,
        owner: Pubkey,
        payer: Pubkey,
    ) -> Result<[Instruction; 4], MetadataClientError> {
        const OPERATION: &str = "mint_instructions";
        let rent_lamports = self.mint_rent(OPERATION, payer).await?;
        self.composer
            .mint_sequence(MintSequenceParams {
                mint,
                owner,
                payer,
                mint_authority: payer,
                freeze_authority: payer,
                rent_lamports,
            })
            .map_err(|err| MetadataClientError::compose(OPERATION, mint, err))
    }

    /// Create `mint`, mint one token to the payer and generate its metadata,
    /// plus a master edition when `info.supply` is set, in one transaction.
    ///
    /// The payer becomes mint, freeze and update authority unless
    /// `info.new_update_authority` hands the record to someone else.
    pub async fn generate_metadata(
        &self,
        mint: &Keypair,
        info: MetadataInfo,
        payer: Payer<'_>,
    ) -> Result<GeneratedMetadata, MetadataClientError> {
        const OPERATION: &str = "generate_metadata";
        let mint_address = mint.pubkey();
        let compose = |err: ComposeError| MetadataClientError::compose(OPERATION, mint_address, err);

        let accounts = self.composer.metadata_accounts(mint, payer).map_err(compose)?;
        let has_master_edition = info.supply.is_some();
        let rent_lamports = self.mint_rent(OPERATION, accounts.payer).await?;
        let ixs = self
            .composer
            .generate_tx(&accounts, info, rent_lamports)
            .map_err(compose)?;
        debug!(
            mint = %mint_address,
            metadata = %accounts.metadata,
            master_edition = %accounts.master_edition,
            instructions = ixs.len(),
            "composed generate transaction"
        );

        let signature = self
            .submit(OPERATION, accounts.payer, &ixs, &accounts.signer_info.signers)
            .await?;
        info!(operation = OPERATION, mint = %mint_address, %signature, "metadata generated");

        Ok(GeneratedMetadata {
            signature,
            mint: mint_address,
            metadata: accounts.metadata,
            master_edition: has_master_edition.then_some(accounts.master_edition),
        })
    }

    /// Verify `creator` on the metadata of `mint`.
    pub async fn sign_metadata(
        &self,
        mint: &Pubkey,
        creator: Payer<'_>,
    ) -> Result<Signature, MetadataClientError> {
        const OPERATION: &str = "sign_metadata";
        let creator = creator.resolve();
        let ix = self
            .composer
            .sign_metadata_ix(*mint, creator.payer)
            .map_err(|err| MetadataClientError::compose(OPERATION, *mint, err))?;

        let signature = self
            .submit(OPERATION, creator.payer, &[ix], &creator.signers)
            .await?;
        info!(operation = OPERATION, %mint, creator = %creator.payer, %signature, "creator verified");
        Ok(signature)
    }

    /// Replace the URI of the metadata of `mint`.
    pub async fn update_metadata_uri(
        &self,
        mint: &Pubkey,
        uri: String,
        authority: Payer<'_>,
    ) -> Result<Signature, MetadataClientError> {
        const OPERATION: &str = "update_metadata_uri";
        let authority = authority.resolve();
        let ix = self
            .composer
            .update_metadata_uri_ix(*mint, authority.payer, uri)
            .map_err(|err| MetadataClientError::compose(OPERATION, *mint, err))?;

        let signature = self
            .submit(OPERATION, authority.payer, &[ix], &authority.signers)
            .await?;
        info!(operation = OPERATION, %mint, %signature, "metadata uri updated");
        Ok(signature)
    }

    /// Replace every mutable field of the metadata of `mint`. Fields left as
    /// `None` in `info` are cleared.
    pub async fn update_metadata(
        &self,
        mint: &Pubkey,
        info: UpdateMetadataInfo,
        authority: Payer<'_>,
    ) -> Result<Signature, MetadataClientError> {
        const OPERATION: &str = "update_metadata";
        let authority = authority.resolve();
        let ix = self
            .composer
            .update_metadata_ix(*mint, authority.payer, info)
            .map_err(|err| MetadataClientError::compose(OPERATION, *mint, err))?;

        let signature = self
            .submit(OPERATION, authority.payer, &[ix], &authority.signers)
            .await?;
        info!(operation = OPERATION, %mint, %signature, "metadata updated");
        Ok(signature)
    }

    async fn fetch_account(
        &self,
        operation: &'static str,
        address: &Pubkey,
    ) -> Result<Vec<u8>, MetadataClientError> {
        let data = self
            .connection
            .get_account_data(address)
            .await
            .map_err(|source| MetadataClientError::provider(operation, *address, source))?;
        match data {
            Some(data) if !data.is_empty() => Ok(data),
            _ => Err(MetadataClientError::NotFound {
                operation,
                address: *address,
            }),
        }
    }

    async fn mint_rent(&self, operation: &'static str, payer: Pubkey) -> Result<u64, MetadataClientError> {
        self.connection
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await
            .map_err(|source| MetadataClientError::provider(operation, payer, source))
    }

    async fn submit(
        &self,
        operation: &'static str,
        signer: Pubkey,
        ixs: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Signature, MetadataClientError> {
        self.submitter.submit(ixs, signers).await.map_err(|source| {
            warn!(operation, %signer, error = %source, "submission rejected");
            MetadataClientError::provider(operation, signer, source)
        })
    }
}
