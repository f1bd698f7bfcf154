//! Native stand-ins for the wrapper and token metadata programs.
//!
//! The wrapper forwards every call, with its accounts and data unchanged, to
//! the token metadata program named in its account list. That program owns
//! the metadata and master edition PDAs and applies the authority, creator
//! and mutability rules. Authority failures return `MissingRequiredSignature`.

use {
    metadata_wrapper_interface::{
        instruction::{MetadataInfo, UpdateMetadataInfo, WrapperInstruction},
        state::{
            Creator, MasterEditionRecord, MasterEditionV2, MetadataRecord, TokenStandard,
            MAX_CREATOR_LIMIT,
        },
        EDITION_SEED, METADATA_SEED,
    },
    metadata_wrapper_sdk::{AddressDeriver, ClientConfig},
    solana_program::{
        account_info::{next_account_info, AccountInfo},
        entrypoint::ProgramResult,
        instruction::{AccountMeta, Instruction},
        msg,
        program::{invoke, invoke_signed},
        program_error::ProgramError,
        program_option::COption,
        program_pack::Pack,
        pubkey::Pubkey,
        rent::Rent,
        system_instruction,
        sysvar::Sysvar,
    },
    spl_token::{instruction::AuthorityType, state::Mint},
};

/// Position of the token metadata program in `generate` accounts.
const GENERATE_CALLEE_INDEX: usize = 6;
/// Position of the token metadata program in sign and update accounts.
const CALLEE_INDEX: usize = 2;

/// Wrapper program entrypoint.
pub fn process_wrapper(
    _program_id: &Pubkey,
    accounts: &[AccountInfo],
    input: &[u8],
) -> ProgramResult {
    let callee = match WrapperInstruction::unpack(input)? {
        WrapperInstruction::Generate(_) => GENERATE_CALLEE_INDEX,
        _ => CALLEE_INDEX,
    };
    let callee = accounts.get(callee).ok_or(ProgramError::NotEnoughAccountKeys)?;
    if !callee.executable {
        return Err(ProgramError::IncorrectProgramId);
    }

    let metas = accounts
        .iter()
        .map(|account| AccountMeta {
            pubkey: *account.key,
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        })
        .collect();
    invoke(
        &Instruction {
            program_id: *callee.key,
            accounts: metas,
            data: input.to_vec(),
        },
        accounts,
    )
}

/// Token metadata program entrypoint.
pub fn process_token_metadata(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    input: &[u8],
) -> ProgramResult {
    let instruction = WrapperInstruction::unpack(input)?;
    msg!("Instruction: {}", instruction.name());
    match instruction {
        WrapperInstruction::Generate(info) => process_generate(program_id, accounts, info),
        WrapperInstruction::SignMetadata => process_sign_metadata(program_id, accounts),
        WrapperInstruction::UpdateMetadataUri { uri } => {
            let (_, metadata_info, mut record) = authorized_metadata(program_id, accounts)?;
            record.uri = uri;
            store_metadata(metadata_info, &record)
        }
        WrapperInstruction::UpdateMetadata(info) => {
            process_update_metadata(program_id, accounts, info)
        }
    }
}

fn process_generate(program_id: &Pubkey, accounts: &[AccountInfo], info: MetadataInfo) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let payer_info = next_account_info(account_info_iter)?;
    let mint_authority_info = next_account_info(account_info_iter)?;
    let update_authority_info = next_account_info(account_info_iter)?;
    let mint_info = next_account_info(account_info_iter)?;
    let metadata_info = next_account_info(account_info_iter)?;
    let master_edition_info = next_account_info(account_info_iter)?;
    let _token_metadata_program_info = next_account_info(account_info_iter)?;
    let token_program_info = next_account_info(account_info_iter)?;
    let system_program_info = next_account_info(account_info_iter)?;

    for signer in [payer_info, mint_authority_info, update_authority_info] {
        require_signer(signer)?;
    }

    let addresses = AddressDeriver::with_config(ClientConfig {
        token_metadata_program_id: *program_id,
        ..ClientConfig::default()
    });
    let (metadata, metadata_bump) = addresses
        .metadata_pda_and_bump(mint_info.key)
        .map_err(|_| ProgramError::InvalidSeeds)?;
    let (master_edition, edition_bump) = addresses
        .master_edition_pda_and_bump(mint_info.key)
        .map_err(|_| ProgramError::InvalidSeeds)?;
    if metadata != *metadata_info.key || master_edition != *master_edition_info.key {
        msg!("Metadata accounts do not match the mint");
        return Err(ProgramError::InvalidSeeds);
    }

    if *mint_info.owner != spl_token::id() || *token_program_info.key != spl_token::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    let mint = Mint::unpack(&mint_info.try_borrow_data()?)?;
    if mint.decimals != 0 || mint.supply != 1 {
        msg!("Mint must have zero decimals and a supply of one");
        return Err(ProgramError::InvalidAccountData);
    }
    let update_authority = *update_authority_info.key;
    if mint.mint_authority != COption::Some(update_authority)
        || mint.freeze_authority != COption::Some(update_authority)
    {
        msg!("Mint and freeze authority must be the update authority");
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_creators(info.creators.as_deref(), |c| c.address == update_authority)?;

    let record = MetadataRecord {
        update_authority: info.new_update_authority.unwrap_or(update_authority),
        mint: *mint_info.key,
        name: info.name,
        symbol: info.symbol,
        uri: info.uri,
        seller_fee_basis_points: info.seller_fee_basis_points,
        creators: info.creators,
        primary_sale_happened: true,
        is_mutable: info.is_mutable,
        edition_nonce: Some(edition_bump),
        token_standard: info.supply.map(|_| TokenStandard::NonFungible),
        collection: info.collection,
        uses: info.uses,
    };
    create_owned_account(
        payer_info,
        metadata_info,
        system_program_info,
        program_id,
        MetadataRecord::LEN,
        &[
            METADATA_SEED,
            program_id.as_ref(),
            mint_info.key.as_ref(),
            &[metadata_bump],
        ],
    )?;
    store_metadata(metadata_info, &record)?;

    let Some(max_supply) = info.supply else {
        return Ok(());
    };
    let edition = MasterEditionRecord::V2(MasterEditionV2 {
        supply: 0,
        max_supply: Some(max_supply),
    })
    .encode()
    .map_err(invalid_data)?;
    create_owned_account(
        payer_info,
        master_edition_info,
        system_program_info,
        program_id,
        MasterEditionRecord::LEN,
        &[
            METADATA_SEED,
            program_id.as_ref(),
            mint_info.key.as_ref(),
            EDITION_SEED,
            &[edition_bump],
        ],
    )?;
    master_edition_info
        .try_borrow_mut_data()?
        .copy_from_slice(&edition);

    // the edition takes over both mint authorities
    for authority_type in [AuthorityType::MintTokens, AuthorityType::FreezeAccount] {
        invoke(
            &spl_token::instruction::set_authority(
                token_program_info.key,
                mint_info.key,
                Some(master_edition_info.key),
                authority_type,
                update_authority_info.key,
                &[],
            )?,
            &[
                mint_info.clone(),
                update_authority_info.clone(),
                token_program_info.clone(),
            ],
        )?;
    }
    Ok(())
}

fn process_sign_metadata(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let creator_info = next_account_info(account_info_iter)?;
    let metadata_info = next_account_info(account_info_iter)?;
    require_signer(creator_info)?;

    let mut record = load_metadata(program_id, metadata_info)?;
    let creator = record
        .creators
        .iter_mut()
        .flatten()
        .find(|c| c.address == *creator_info.key)
        .ok_or_else(|| {
            msg!("{} is not a listed creator", creator_info.key);
            ProgramError::MissingRequiredSignature
        })?;
    creator.verified = true;
    store_metadata(metadata_info, &record)
}

fn process_update_metadata(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    info: UpdateMetadataInfo,
) -> ProgramResult {
    let (authority, metadata_info, mut record) = authorized_metadata(program_id, accounts)?;
    let UpdateMetadataInfo {
        name,
        symbol,
        uri,
        seller_fee_basis_points,
        creators,
        collection,
        uses,
    } = info;
    check_creators(creators.as_deref(), |c| {
        c.address == authority
            || record
                .creators
                .iter()
                .flatten()
                .any(|old| old.address == c.address && old.verified)
    })?;

    record.name = name;
    record.symbol = symbol;
    record.uri = uri;
    record.seller_fee_basis_points = seller_fee_basis_points;
    record.creators = creators;
    record.collection = collection;
    record.uses = uses;
    store_metadata(metadata_info, &record)
}

/// The signing update authority, the metadata account and its record, once
/// the authority matches and the record is still mutable.
fn authorized_metadata<'a, 'b>(
    program_id: &Pubkey,
    accounts: &'a [AccountInfo<'b>],
) -> Result<(Pubkey, &'a AccountInfo<'b>, MetadataRecord), ProgramError> {
    let account_info_iter = &mut accounts.iter();
    let authority_info = next_account_info(account_info_iter)?;
    let metadata_info = next_account_info(account_info_iter)?;
    require_signer(authority_info)?;

    let record = load_metadata(program_id, metadata_info)?;
    if record.update_authority != *authority_info.key {
        msg!("{} is not the update authority", authority_info.key);
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !record.is_mutable {
        return Err(ProgramError::Immutable);
    }
    Ok((*authority_info.key, metadata_info, record))
}

/// Shares must total 100 and a creator may only be marked verified when
/// `may_verify` allows it.
fn check_creators(
    creators: Option<&[Creator]>,
    may_verify: impl Fn(&Creator) -> bool,
) -> ProgramResult {
    let Some(creators) = creators else {
        return Ok(());
    };
    if creators.len() > MAX_CREATOR_LIMIT {
        return Err(ProgramError::InvalidArgument);
    }
    let total: u32 = creators.iter().map(|c| u32::from(c.share)).sum();
    if total != 100 {
        msg!("Creator shares total {}", total);
        return Err(ProgramError::InvalidArgument);
    }
    match creators.iter().find(|&c| c.verified && !may_verify(c)) {
        Some(creator) => {
            msg!("Cannot verify creator {}", creator.address);
            Err(ProgramError::MissingRequiredSignature)
        }
        None => Ok(()),
    }
}

fn require_signer(account: &AccountInfo) -> ProgramResult {
    if account.is_signer {
        Ok(())
    } else {
        Err(ProgramError::MissingRequiredSignature)
    }
}

fn load_metadata(program_id: &Pubkey, metadata_info: &AccountInfo) -> Result<MetadataRecord, ProgramError> {
    if metadata_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let data = metadata_info.try_borrow_data()?;
    MetadataRecord::decode(&data).map_err(invalid_data)
}

fn store_metadata(metadata_info: &AccountInfo, record: &MetadataRecord) -> ProgramResult {
    let encoded = record.encode().map_err(invalid_data)?;
    let mut data = metadata_info.try_borrow_mut_data()?;
    if data.len() != encoded.len() {
        return Err(ProgramError::AccountDataTooSmall);
    }
    data.copy_from_slice(&encoded);
    Ok(())
}

fn create_owned_account<'a>(
    payer_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    owner: &Pubkey,
    space: usize,
    seeds: &[&[u8]],
) -> ProgramResult {
    let lamports = Rent::get()?.minimum_balance(space);
    invoke_signed(
        &system_instruction::create_account(
            payer_info.key,
            new_account_info.key,
            lamports,
            space as u64,
            owner,
        ),
        &[
            payer_info.clone(),
            new_account_info.clone(),
            system_program_info.clone(),
        ],
        &[seeds],
    )
}

fn invalid_data(err: impl std::fmt::Display) -> ProgramError {
    msg!("{}", err);
    ProgramError::InvalidAccountData
}
