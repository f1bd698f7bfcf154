//! Local bank for exercising the metadata client end to end.
//!
//! [`LocalLedger`] runs a `solana-program-test` bank and implements
//! [`Connection`] and [`TransactionSubmitter`] over its `BanksClient`. The
//! system, token and associated token programs are the bank's own; the
//! wrapper and token metadata programs are the native processors in
//! [`programs`]. Every transaction is paid for and co-signed by the ledger
//! wallet.

pub mod programs;

use {
    async_trait::async_trait,
    metadata_wrapper_interface::{instruction::MetadataInfo, state::Creator},
    metadata_wrapper_sdk::{
        ClientConfig, Connection, MetadataClient, ProviderError, TransactionSubmitter,
    },
    solana_program::{
        instruction::{Instruction, InstructionError},
        message::Message,
        native_token::LAMPORTS_PER_SOL,
        pubkey::Pubkey,
        system_instruction,
    },
    solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext},
    solana_sdk::{
        account::{Account, AccountSharedData},
        signature::{Keypair, Signature, Signer},
        transaction::{Transaction, TransactionError},
    },
    std::sync::Arc,
    tokio::sync::Mutex,
    tracing::debug,
};

/// Lamports [`LocalLedger::funded_keypair`] hands out.
pub const FUNDED_LAMPORTS: u64 = LAMPORTS_PER_SOL;

/// Client wired to a shared ledger.
pub type LedgerClient = MetadataClient<Arc<LocalLedger>, Arc<LocalLedger>>;

/// A program-test bank plus the wallet that pays for and co-signs every
/// submitted transaction.
pub struct LocalLedger {
    wallet: Keypair,
    context: Mutex<ProgramTestContext>,
}

impl LocalLedger {
    /// Start a bank with the wrapper and token metadata programs deployed at
    /// the ids in `config`.
    pub async fn start(config: ClientConfig) -> Self {
        let mut program_test = ProgramTest::new(
            "metadata_wrapper",
            config.program_id,
            processor!(programs::process_wrapper),
        );
        program_test.add_program(
            "token_metadata",
            config.token_metadata_program_id,
            processor!(programs::process_token_metadata),
        );
        let context = program_test.start_with_context().await;
        Self {
            wallet: context.payer.insecure_clone(),
            context: Mutex::new(context),
        }
    }

    /// Fee payer and implicit co-signer of every transaction.
    pub fn wallet(&self) -> &Keypair {
        &self.wallet
    }

    /// The account at `address`, if it exists.
    pub async fn account(&self, address: &Pubkey) -> Result<Option<Account>, ProviderError> {
        let mut context = self.context.lock().await;
        context
            .banks_client
            .get_account(*address)
            .await
            .map_err(classify)
    }

    /// Overwrite or create an account outside of any transaction.
    pub async fn set_account(&self, address: &Pubkey, account: Account) {
        let mut context = self.context.lock().await;
        context.set_account(address, &AccountSharedData::from(account));
    }

    /// Transfer `lamports` from the wallet to `address`.
    pub async fn airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, ProviderError> {
        let ix = system_instruction::transfer(&self.wallet.pubkey(), address, lamports);
        self.execute(&[ix], &[]).await
    }

    /// A new keypair holding [`FUNDED_LAMPORTS`].
    pub async fn funded_keypair(&self) -> Result<Keypair, ProviderError> {
        let keypair = Keypair::new();
        self.airdrop(&keypair.pubkey(), FUNDED_LAMPORTS).await?;
        Ok(keypair)
    }

    async fn execute(&self, ixs: &[Instruction], signers: &[&Keypair]) -> Result<Signature, ProviderError> {
        let message = Message::new(ixs, Some(&self.wallet.pubkey()));
        let required = &message.account_keys[..message.header.num_required_signatures as usize];

        let mut keypairs: Vec<&Keypair> = vec![&self.wallet];
        for signer in signers {
            let pubkey = signer.pubkey();
            if required.contains(&pubkey) && keypairs.iter().all(|k| k.pubkey() != pubkey) {
                keypairs.push(*signer);
            }
        }

        let mut context = self.context.lock().await;
        let blockhash = context
            .banks_client
            .get_latest_blockhash()
            .await
            .map_err(classify)?;
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(keypairs.as_slice(), blockhash)
            .map_err(|err| ProviderError::Unauthorized(err.to_string()))?;
        let signature = tx.signatures[0];

        context
            .banks_client
            .process_transaction(tx)
            .await
            .map_err(classify)?;
        debug!(%signature, instructions = ixs.len(), "ledger processed transaction");
        Ok(signature)
    }
}

#[async_trait]
impl Connection for LocalLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ProviderError> {
        Ok(self.account(address).await?.map(|account| account.data))
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ProviderError> {
        let mut context = self.context.lock().await;
        let rent = context.banks_client.get_rent().await.map_err(classify)?;
        Ok(rent.minimum_balance(data_len))
    }
}

#[async_trait]
impl TransactionSubmitter for LocalLedger {
    async fn submit(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Signature, ProviderError> {
        self.execute(instructions, signers).await
    }
}

/// A program reporting a missing signature means the caller lacked
/// authority; any other failed transaction is a rejection.
fn classify(err: BanksClientError) -> ProviderError {
    match err {
        BanksClientError::TransactionError(err) | BanksClientError::SimulationError { err, .. } => {
            match err {
                TransactionError::InstructionError(
                    index,
                    InstructionError::MissingRequiredSignature,
                ) => ProviderError::Unauthorized(format!("instruction {index}: {err}")),
                err => ProviderError::Rejected(err.to_string()),
            }
        }
        other => ProviderError::Transport(other.to_string()),
    }
}

// === Test helpers ===

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fresh ledger and a client talking to it.
pub async fn setup() -> (Arc<LocalLedger>, LedgerClient) {
    init_tracing();
    let config = ClientConfig::default();
    let ledger = Arc::new(LocalLedger::start(config).await);
    let client = MetadataClient::new(config, Arc::clone(&ledger), Arc::clone(&ledger));
    (ledger, client)
}

/// Two creators splitting 60/40; the first is verified at creation.
pub fn default_creators(first: Pubkey, second: Pubkey) -> Vec<Creator> {
    vec![
        Creator {
            address: first,
            verified: true,
            share: 60,
        },
        Creator {
            address: second,
            verified: false,
            share: 40,
        },
    ]
}

/// Mutable metadata with a 4.2% royalty and no master edition.
pub fn sample_info(creators: Option<Vec<Creator>>) -> MetadataInfo {
    MetadataInfo {
        name: "Sunrise #1".into(),
        symbol: "SUN".into(),
        uri: "https://arweave.net/sunrise-1.json".into(),
        creators,
        seller_fee_basis_points: 420,
        update_authority_is_signer: true,
        is_mutable: true,
        ..MetadataInfo::default()
    }
}
