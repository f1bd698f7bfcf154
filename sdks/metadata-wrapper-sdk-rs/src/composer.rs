//! Instruction builders
//!
//! Everything here is a pure computation over known or derived addresses;
//! nothing touches the network. Rent for the mint account is passed in by the
//! caller.

use {
    crate::{
        error::ComposeError,
        pda::{AddressDeriver, ProgramAddressDeriver, SeedDeriver},
        signer::{Payer, SignerInfo},
        ClientConfig,
    },
    metadata_wrapper_interface::{
        instruction::{MetadataInfo, UpdateMetadataInfo, WrapperInstruction},
        state::{
            Creator, MAX_CREATOR_LIMIT, MAX_NAME_LENGTH, MAX_SELLER_FEE_BASIS_POINTS,
            MAX_SYMBOL_LENGTH, MAX_URI_LENGTH,
        },
    },
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program_pack::Pack,
        pubkey::Pubkey,
        system_instruction, system_program, sysvar,
    },
    solana_sdk::signature::{Keypair, Signer},
    spl_token::state::Mint,
};

/// Decimals of every mint created by the metadata flow.
pub const MINT_DECIMALS: u8 = 0;

/// Amount minted to the owner; the metadata program requires a supply of one.
pub const MINT_AMOUNT: u64 = 1;

/// Inputs of [`InstructionComposer::mint_sequence`].
#[derive(Clone, Copy, Debug)]
pub struct MintSequenceParams {
    /// New mint account
    pub mint: Pubkey,
    /// Owner of the associated token account receiving the token
    pub owner: Pubkey,
    /// Funds the mint and token accounts
    pub payer: Pubkey,
    /// Mint authority, also signs the mint-to
    pub mint_authority: Pubkey,
    /// Freeze authority
    pub freeze_authority: Pubkey,
    /// Lamports making the mint account rent exempt
    pub rent_lamports: u64,
}

/// Full account set of a `generate` call plus the signers it needs.
#[derive(Debug)]
pub struct MetadataAccounts<'a> {
    /// Pays for every account created
    pub payer: Pubkey,
    /// Mint the metadata describes
    pub mint: Pubkey,
    /// Mint authority of `mint`
    pub mint_authority: Pubkey,
    /// Update authority recorded at creation
    pub update_authority: Pubkey,
    /// Metadata PDA
    pub metadata: Pubkey,
    /// Master edition PDA
    pub master_edition: Pubkey,
    /// Token metadata program
    pub token_metadata_program: Pubkey,
    /// Token program
    pub token_program: Pubkey,
    /// System program
    pub system_program: Pubkey,
    /// Rent sysvar
    pub rent: Pubkey,
    /// Resolved payer and local signers, mint keypair included
    pub signer_info: SignerInfo<'a>,
}

/// Builds the instructions of the metadata flows.
#[derive(Clone, Debug)]
pub struct InstructionComposer<D = ProgramAddressDeriver> {
    addresses: AddressDeriver<D>,
}

impl InstructionComposer {
    /// Composer backed by [`ProgramAddressDeriver`].
    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(AddressDeriver::with_config(config))
    }
}

impl<D: SeedDeriver> InstructionComposer<D> {
    /// Build a composer over an address deriver.
    pub fn new(addresses: AddressDeriver<D>) -> Self {
        Self { addresses }
    }

    /// Deriver used for PDAs.
    pub fn addresses(&self) -> &AddressDeriver<D> {
        &self.addresses
    }

    fn config(&self) -> &ClientConfig {
        self.addresses.config()
    }

    // Token program helpers

    /// Allocate the mint account, owned by the token program.
    pub fn create_mint_account_ix(&self, payer: Pubkey, mint: Pubkey, lamports: u64) -> Instruction {
        system_instruction::create_account(
            &payer,
            &mint,
            lamports,
            Mint::LEN as u64,
            &spl_token::id(),
        )
    }

    /// Initialize the mint with zero decimals.
    pub fn initialize_mint_ix(
        &self,
        mint: Pubkey,
        mint_authority: Pubkey,
        freeze_authority: Pubkey,
    ) -> Result<Instruction, ComposeError> {
        let ix = spl_token::instruction::initialize_mint2(
            &spl_token::id(),
            &mint,
            &mint_authority,
            Some(&freeze_authority),
            MINT_DECIMALS,
        )?;
        Ok(ix)
    }

    /// Create `owner`'s associated token account for `mint`.
    pub fn create_associated_token_account_ix(
        &self,
        payer: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    ) -> Instruction {
        spl_associated_token_account::instruction::create_associated_token_account(
            &payer,
            &owner,
            &mint,
            &spl_token::id(),
        )
    }

    /// Mint a single token into `owner`'s associated token account.
    pub fn mint_one_ix(
        &self,
        mint: Pubkey,
        owner: Pubkey,
        mint_authority: Pubkey,
    ) -> Result<Instruction, ComposeError> {
        let token_account = self.addresses.associated_token_address(&owner, &mint);
        let ix = spl_token::instruction::mint_to(
            &spl_token::id(),
            &mint,
            &token_account,
            &mint_authority,
            &[],
            MINT_AMOUNT,
        )?;
        Ok(ix)
    }

    /// The four mint setup instructions, always all of them, in order:
    /// create account, initialize mint, create associated token account, mint one.
    pub fn mint_sequence(&self, params: MintSequenceParams) -> Result<[Instruction; 4], ComposeError> {
        Ok([
            self.create_mint_account_ix(params.payer, params.mint, params.rent_lamports),
            self.initialize_mint_ix(params.mint, params.mint_authority, params.freeze_authority)?,
            self.create_associated_token_account_ix(params.payer, params.owner, params.mint),
            self.mint_one_ix(params.mint, params.owner, params.mint_authority)?,
        ])
    }

    // Wrapper program

    /// Resolve every account `generate` touches. The payer also acts as mint,
    /// freeze and update authority.
    pub fn metadata_accounts<'a>(
        &self,
        mint: &'a Keypair,
        payer: Payer<'a>,
    ) -> Result<MetadataAccounts<'a>, ComposeError> {
        let mint_address = mint.pubkey();
        let mut signer_info = payer.resolve();
        signer_info.signers.push(mint);
        let authority = signer_info.payer;

        Ok(MetadataAccounts {
            payer: authority,
            mint: mint_address,
            mint_authority: authority,
            update_authority: authority,
            metadata: self.addresses.metadata_pda(&mint_address)?,
            master_edition: self.addresses.master_edition_pda(&mint_address)?,
            token_metadata_program: self.config().token_metadata_program_id,
            token_program: spl_token::id(),
            system_program: system_program::id(),
            rent: sysvar::rent::id(),
            signer_info,
        })
    }

    /// Build a `generate` instruction.
    ///
    /// Accounts (strict order):
    /// - payer (writable, signer)
    /// - mint_authority (readonly, signer)
    /// - update_authority (readonly, signer)
    /// - mint (writable)
    /// - metadata (writable)
    /// - master_edition (writable)
    /// - token_metadata_program, token_program, system_program, rent (readonly)
    pub fn generate_ix(
        &self,
        accounts: &MetadataAccounts<'_>,
        info: MetadataInfo,
    ) -> Result<Instruction, ComposeError> {
        validate_data(
            &info.name,
            &info.symbol,
            &info.uri,
            info.seller_fee_basis_points,
            info.creators.as_deref(),
        )?;

        Ok(Instruction {
            program_id: self.config().program_id,
            accounts: vec![
                AccountMeta::new(accounts.payer, true),
                AccountMeta::new_readonly(accounts.mint_authority, true),
                AccountMeta::new_readonly(accounts.update_authority, true),
                AccountMeta::new(accounts.mint, false),
                AccountMeta::new(accounts.metadata, false),
                AccountMeta::new(accounts.master_edition, false),
                AccountMeta::new_readonly(accounts.token_metadata_program, false),
                AccountMeta::new_readonly(accounts.token_program, false),
                AccountMeta::new_readonly(accounts.system_program, false),
                AccountMeta::new_readonly(accounts.rent, false),
            ],
            data: WrapperInstruction::Generate(info).pack(),
        })
    }

    /// Mint setup for the payer followed by `generate`, as one transaction.
    pub fn generate_tx(
        &self,
        accounts: &MetadataAccounts<'_>,
        info: MetadataInfo,
        rent_lamports: u64,
    ) -> Result<Vec<Instruction>, ComposeError> {
        let generate = self.generate_ix(accounts, info)?;
        let mut ixs = Vec::from(self.mint_sequence(MintSequenceParams {
            mint: accounts.mint,
            owner: accounts.payer,
            payer: accounts.payer,
            mint_authority: accounts.mint_authority,
            freeze_authority: accounts.mint_authority,
            rent_lamports,
        })?);
        ixs.push(generate);
        Ok(ixs)
    }

    /// Build a `sign_metadata` instruction.
    ///
    /// Accounts (strict order):
    /// - creator (readonly, signer)
    /// - metadata (writable)
    /// - token_metadata_program (readonly)
    pub fn sign_metadata_ix(&self, mint: Pubkey, creator: Pubkey) -> Result<Instruction, ComposeError> {
        let metadata = self.addresses.metadata_pda(&mint)?;
        Ok(Instruction {
            program_id: self.config().program_id,
            accounts: vec![
                AccountMeta::new_readonly(creator, true),
                AccountMeta::new(metadata, false),
                AccountMeta::new_readonly(self.config().token_metadata_program_id, false),
            ],
            data: WrapperInstruction::SignMetadata.pack(),
        })
    }

    /// Build an `update_metadata_uri` instruction.
    ///
    /// Accounts (strict order):
    /// - update_authority (writable, signer)
    /// - metadata (writable)
    /// - token_metadata_program (readonly)
    pub fn update_metadata_uri_ix(
        &self,
        mint: Pubkey,
        update_authority: Pubkey,
        uri: String,
    ) -> Result<Instruction, ComposeError> {
        ensure(uri.len() <= MAX_URI_LENGTH, "uri too long")?;
        self.update_authority_ix(
            mint,
            update_authority,
            WrapperInstruction::UpdateMetadataUri { uri },
        )
    }

    /// Build an `update_metadata` instruction. Accounts as for
    /// [`Self::update_metadata_uri_ix`].
    pub fn update_metadata_ix(
        &self,
        mint: Pubkey,
        update_authority: Pubkey,
        info: UpdateMetadataInfo,
    ) -> Result<Instruction, ComposeError> {
        validate_data(
            &info.name,
            &info.symbol,
            &info.uri,
            info.seller_fee_basis_points,
            info.creators.as_deref(),
        )?;
        self.update_authority_ix(mint, update_authority, WrapperInstruction::UpdateMetadata(info))
    }

    fn update_authority_ix(
        &self,
        mint: Pubkey,
        update_authority: Pubkey,
        instruction: WrapperInstruction,
    ) -> Result<Instruction, ComposeError> {
        let metadata = self.addresses.metadata_pda(&mint)?;
        Ok(Instruction {
            program_id: self.config().program_id,
            accounts: vec![
                AccountMeta::new(update_authority, true),
                AccountMeta::new(metadata, false),
                AccountMeta::new_readonly(self.config().token_metadata_program_id, false),
            ],
            data: instruction.pack(),
        })
    }
}

// === Validation helpers ===

fn ensure(condition: bool, reason: &str) -> Result<(), ComposeError> {
    if condition {
        Ok(())
    } else {
        Err(ComposeError::InvalidField(reason.to_string()))
    }
}

fn validate_data(
    name: &str,
    symbol: &str,
    uri: &str,
    seller_fee_basis_points: u16,
    creators: Option<&[Creator]>,
) -> Result<(), ComposeError> {
    ensure(name.len() <= MAX_NAME_LENGTH, "name too long")?;
    ensure(symbol.len() <= MAX_SYMBOL_LENGTH, "symbol too long")?;
    ensure(uri.len() <= MAX_URI_LENGTH, "uri too long")?;
    ensure(
        seller_fee_basis_points <= MAX_SELLER_FEE_BASIS_POINTS,
        "seller fee basis points above 10000",
    )?;
    if let Some(creators) = creators {
        ensure(creators.len() <= MAX_CREATOR_LIMIT, "too many creators")?;
    }
    Ok(())
}
