use metadata_wrapper_sdk::{
    MasterEditionRecord, MetadataClientError, Payer, ProviderError, UsageLimit,
};
use metadata_wrapper_tests::{default_creators, sample_info, setup};
use serial_test::serial;
use solana_program::{program_option::COption, program_pack::Pack, pubkey::Pubkey};
use solana_sdk::signature::{Keypair, Signer};
use spl_token::state::{Account as TokenAccount, Mint};

#[tokio::test]
#[serial]
async fn generate_records_primary_sale_and_creators() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let cocreator = Pubkey::new_unique();
    let mint = Keypair::new();

    let generated = client
        .generate_metadata(
            &mint,
            sample_info(Some(default_creators(payer.pubkey(), cocreator))),
            Payer::from(&payer),
        )
        .await?;
    assert_eq!(generated.mint, mint.pubkey());
    assert_eq!(generated.metadata, client.metadata_address(&mint.pubkey())?);
    assert_eq!(generated.master_edition, None);

    let record = client.fetch_metadata(&generated.metadata).await?;
    assert!(record.primary_sale_happened);
    assert!(record.is_mutable);
    assert_eq!(record.update_authority, payer.pubkey());
    assert_eq!(record.mint, mint.pubkey());
    assert_eq!(record.name, "Sunrise #1");
    assert_eq!(record.symbol, "SUN");
    assert_eq!(record.seller_fee_basis_points, 420);
    let creators = record.creators.expect("creators");
    assert_eq!(creators.len(), 2);
    assert_eq!((creators[0].address, creators[0].share), (payer.pubkey(), 60));
    assert!(creators[0].verified);
    assert_eq!((creators[1].address, creators[1].share), (cocreator, 40));
    assert!(!creators[1].verified);

    // no master edition account was created
    let edition = client.master_edition_address(&mint.pubkey())?;
    assert!(ledger.account(&edition).await?.is_none());

    // one token landed in the payer's associated token account
    let ata = client
        .addresses()
        .associated_token_address(&payer.pubkey(), &mint.pubkey());
    let token = TokenAccount::unpack(&ledger.account(&ata).await?.expect("ata").data)?;
    assert_eq!(token.amount, 1);
    assert_eq!(token.owner, payer.pubkey());
    Ok(())
}

#[tokio::test]
#[serial]
async fn zero_supply_still_creates_a_master_edition() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let mint = Keypair::new();
    let mut info = sample_info(None);
    info.supply = Some(0);

    let generated = client
        .generate_metadata(&mint, info, Payer::from(&payer))
        .await?;
    let edition_address = generated.master_edition.expect("master edition");
    assert_eq!(edition_address, client.master_edition_address(&mint.pubkey())?);

    let edition = client.fetch_master_edition(&edition_address).await?;
    assert!(matches!(edition, MasterEditionRecord::V2(_)));
    assert_eq!(edition.max_supply(), Some(0));
    assert_eq!(edition.supply(), 0);

    // the edition now holds both mint authorities
    let mint_account = ledger.account(&mint.pubkey()).await?.expect("mint");
    let mint_state = Mint::unpack(&mint_account.data)?;
    assert_eq!(mint_state.mint_authority, COption::Some(edition_address));
    assert_eq!(mint_state.freeze_authority, COption::Some(edition_address));
    assert_eq!(mint_state.supply, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn supply_caps_prints_and_keeps_usage_limit() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let mint = Keypair::new();
    let mut info = sample_info(None);
    info.supply = Some(25);
    info.uses = UsageLimit::Multiple {
        remaining: 3,
        total: 3,
    };

    let generated = client
        .generate_metadata(&mint, info, Payer::from(&payer))
        .await?;
    let edition = client.fetch_master_edition_for_mint(&mint.pubkey()).await?;
    assert_eq!(edition.max_supply(), Some(25));
    assert_eq!(generated.master_edition, Some(client.master_edition_address(&mint.pubkey())?));

    let record = client.fetch_metadata_for_mint(&mint.pubkey()).await?;
    assert_eq!(
        record.uses,
        UsageLimit::Multiple {
            remaining: 3,
            total: 3
        }
    );
    Ok(())
}

#[tokio::test]
#[serial]
async fn wallet_address_can_pay_without_a_local_keypair() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let wallet = ledger.wallet().pubkey();
    let mint = Keypair::new();

    client
        .generate_metadata(&mint, sample_info(None), Payer::from(wallet))
        .await?;
    let record = client.fetch_metadata_for_mint(&mint.pubkey()).await?;
    assert_eq!(record.update_authority, wallet);
    Ok(())
}

#[tokio::test]
#[serial]
async fn unsigned_payer_is_unauthorized_and_nothing_is_created() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let stranger = Pubkey::new_unique();
    let mint = Keypair::new();

    let err = client
        .generate_metadata(&mint, sample_info(None), Payer::from(stranger))
        .await
        .unwrap_err();
    match err {
        MetadataClientError::Unauthorized {
            operation,
            address,
            source: ProviderError::Unauthorized(_),
        } => {
            assert_eq!(operation, "generate_metadata");
            assert_eq!(address, stranger);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(ledger.account(&mint.pubkey()).await?.is_none());
    assert!(ledger
        .account(&client.metadata_address(&mint.pubkey())?)
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
#[serial]
async fn reused_mint_is_rejected_atomically() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let mint = Keypair::new();
    client
        .generate_metadata(&mint, sample_info(None), Payer::from(&payer))
        .await?;
    let before = ledger.account(&payer.pubkey()).await?.expect("payer").lamports;

    let mut info = sample_info(None);
    info.name = "Second".into();
    let err = client
        .generate_metadata(&mint, info, Payer::from(&payer))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MetadataClientError::Submission {
            source: ProviderError::Rejected(_),
            ..
        }
    ));

    let after = ledger.account(&payer.pubkey()).await?.expect("payer").lamports;
    assert_eq!(after, before);
    let record = client.fetch_metadata_for_mint(&mint.pubkey()).await?;
    assert_eq!(record.name, "Sunrise #1");
    Ok(())
}

#[tokio::test]
#[serial]
async fn invalid_fields_fail_before_submission() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let mint = Keypair::new();
    let mut info = sample_info(None);
    info.symbol = "WAYTOOLONGSYMBOL".into();

    let err = client
        .generate_metadata(&mint, info, Payer::from(&payer))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MetadataClientError::InvalidField {
            operation: "generate_metadata",
            ..
        }
    ));
    assert!(ledger.account(&mint.pubkey()).await?.is_none());
    Ok(())
}

#[tokio::test]
#[serial]
async fn creators_cannot_be_verified_by_someone_else() -> anyhow::Result<()> {
    let (ledger, client) = setup().await;
    let payer = ledger.funded_keypair().await?;
    let mint = Keypair::new();
    // the first creator is marked verified but is not the signer
    let creators = default_creators(Pubkey::new_unique(), payer.pubkey());

    let err = client
        .generate_metadata(&mint, sample_info(Some(creators)), Payer::from(&payer))
        .await
        .unwrap_err();
    assert!(matches!(err, MetadataClientError::Unauthorized { .. }));
    assert!(ledger.account(&mint.pubkey()).await?.is_none());
    Ok(())
}
