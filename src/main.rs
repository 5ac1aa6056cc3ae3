use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use multisender::{
    config::{self, Config, NETWORKS},
    intake,
    operation_log::{self, OperationRecord},
    page::PageController,
    query::ApproveQuery,
    recipients, report,
    staging::Submitter,
    tokens::{self, MoralisIndexer, TokenIndexer},
    totals::AggregateTotals,
    units::{self, BASE_UNIT_DECIMALS},
    user_settings::UserSettings,
    vip,
    wallet::{EthersWallet, WalletProvider},
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cmd {
    /// Network to use, as a decimal or 0x-prefixed chain id.
    ///
    /// The choice is remembered in the settings file.
    #[clap(long, global = true)]
    chain: Option<String>,
    #[clap(subcommand)]
    cmd: SubCmd,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Validate a recipient list and show totals against the wallet balance.
    #[clap(name = "review")]
    Review {
        /// CSV file with one `address, amount` pair per line
        file: Option<PathBuf>,
        /// Recipient text given inline instead of a file
        #[clap(long, conflicts_with = "file")]
        text: Option<String>,
        /// Balance to compare against instead of querying the wallet
        #[clap(long)]
        balance: Option<f64>,
        /// Write valid.csv and invalid.csv to the export directory
        #[clap(long)]
        export: bool,
    },
    /// Send a token to every valid recipient in one multisend transaction.
    #[clap(name = "send")]
    Send {
        file: PathBuf,
        /// ERC-20 token contract address
        #[clap(long)]
        token: String,
        /// Token decimals used to convert amounts.
        ///
        /// Defaults to the decimals reported by the token indexer, or 18.
        #[clap(long)]
        decimals: Option<u32>,
        /// Submit without stopping at the review
        #[clap(long, short = 'y')]
        yes: bool,
    },
    /// List the ERC-20 balances of the wallet (or of --address).
    #[clap(name = "tokens")]
    Tokens {
        #[clap(long)]
        address: Option<String>,
    },
    /// List supported networks.
    #[clap(name = "networks")]
    Networks,
    /// List VIP tiers.
    #[clap(name = "vip")]
    Vip,
    /// Buy a VIP tier from the multisender contract.
    #[clap(name = "buy-vip")]
    BuyVip { tier: u8 },
    /// Show the expected CSV format.
    #[clap(name = "format")]
    Format,
    /// Print the operation log.
    #[clap(name = "log")]
    Log,
}

/// Environment first, then the settings file; `--chain` wins over both
fn resolve_config(chain: Option<&str>, settings: &mut UserSettings) -> Result<Config> {
    let mut config = Config::from_env()?;
    match chain {
        Some(chain) => {
            let network = config.switch_network(config::parse_chain_id(chain)?)?;
            settings.selected_chain_id = network.chain_id;
            if let Err(e) = settings.save() {
                warn!("Failed to save settings: {}", e);
            }
        }
        None if std::env::var("CHAIN_ID").is_err() && settings.selected_chain_id != config.chain_id => {
            config.switch_network(settings.selected_chain_id)?;
        }
        None => {}
    }
    settings.apply_to(&mut config);
    Ok(config)
}

fn load_text(file: Option<PathBuf>, text: Option<String>) -> Result<String> {
    match (file, text) {
        (Some(path), _) => Ok(intake::read_csv_file(&path)?),
        (None, Some(text)) => Ok(text),
        (None, None) => Err(anyhow!("Provide a CSV file or --text")),
    }
}

async fn wallet_balance(config: &Config) -> Result<f64> {
    let wallet = EthersWallet::connect(config).await?;
    let raw = wallet.get_balance(wallet.address()).await?;
    Ok(units::base_unit_to_f64(raw, BASE_UNIT_DECIMALS))
}

async fn review(config: &Config, text: String, balance: Option<f64>, export: bool) -> Result<()> {
    let result = recipients::validate_csv(&text);
    let balance = match balance {
        Some(balance) => balance,
        None if config.private_key.is_some() => wallet_balance(config).await?,
        None => {
            warn!("No wallet configured; comparing against a zero balance");
            0.0
        }
    };
    let totals = AggregateTotals::compute(&result.valid, balance);
    println!("{}", report::review_text(&result, &totals, config.native_token()));

    if export {
        let (valid, invalid) = report::export_review(Path::new(&config.export_directory), &result)?;
        println!("Exported {} and {}", valid.display(), invalid.display());
    }
    Ok(())
}

fn indexer_for(config: &Config) -> Result<MoralisIndexer> {
    Ok(MoralisIndexer::new(
        config.indexer_base_url.clone(),
        config.indexer_api_key.clone(),
        config.estimate_timeout,
    )?)
}

async fn send(config: &Config, file: PathBuf, token: String, decimals: Option<u32>, yes: bool) -> Result<()> {
    let text = intake::read_csv_file(&file)?;
    let wallet = EthersWallet::connect(config).await?;
    let submitter = Submitter::from_config(wallet.clone(), config);
    let mut page = PageController::new(wallet, submitter);

    if !page.connect().await {
        for entry in page.state.notifications.drain() {
            eprintln!("{}", entry);
        }
        return Err(anyhow!("Could not connect the wallet"));
    }

    // Without --decimals, take them from the wallet's token list when the indexer can answer
    if decimals.is_none() && config.indexer_api_key.is_some() && tokens::indexer_supports(config.chain_id) {
        if !page.refresh_tokens(&indexer_for(config)?).await {
            for entry in page.state.notifications.drain() {
                eprintln!("{}", entry);
            }
        }
    }
    let listed = page
        .state
        .tokens()
        .iter()
        .find(|t| t.token_address.eq_ignore_ascii_case(token.trim()))
        .cloned();
    let symbol = listed.as_ref().map(|t| t.symbol.clone()).unwrap_or_else(|| "tokens".to_string());

    page.state.set_csv_text(text);
    match &listed {
        Some(listed) => page.state.select_token(listed),
        None if page.state.select_token_manual(&token) => {
            if decimals.is_none() {
                warn!("Token not found in the wallet's token list; assuming {} decimals", BASE_UNIT_DECIMALS);
            }
        }
        None => return Err(anyhow!("Please enter a valid token address.")),
    }

    // The review stage only sees what the query carries
    let query = page
        .state
        .continue_to_approve()
        .ok_or_else(|| anyhow!("Please connect your wallet first."))?
        .to_query_string()?;
    page.state.enter_approve(&ApproveQuery::from_query_string(&query)?);
    if let Some(decimals) = decimals {
        page.state.set_token_decimals(decimals);
    }
    let decimals = page
        .state
        .selected_token()
        .map(|t| t.decimals)
        .unwrap_or(BASE_UNIT_DECIMALS);

    println!(
        "{}",
        report::review_text(page.state.validation(), page.state.totals(), config.native_token())
    );

    if !yes {
        println!("Review only. Re-run with --yes to submit.");
        return Ok(());
    }

    let outcome = page.submit().await;
    for entry in page.state.notifications.drain() {
        println!("{}", entry);
    }

    let Some(outcome) = outcome else {
        return Err(anyhow!("Submission is not enabled for this list"));
    };
    let record = OperationRecord::multisend(config.chain_id, &token, decimals, &outcome);
    if let Err(e) = operation_log::record(&record) {
        warn!("Failed to write operation log: {}", e);
    }

    let done = outcome?;
    println!("{}", report::outcome_summary(&done, decimals, &symbol, config.native_token()));
    if let Some(url) = config::get_tx_explorer_url(config.chain_id, &format!("{:?}", done.receipt.tx_hash)) {
        println!("{}", url);
    }
    Ok(())
}

async fn list_tokens(config: &Config, address: Option<String>) -> Result<()> {
    let address = match address {
        Some(address) => address,
        None => format!("{:?}", EthersWallet::connect(config).await?.address()),
    };
    let tokens = indexer_for(config)?.get_wallet_token_balances(&address, config.chain_id).await?;
    if tokens.is_empty() {
        println!("No tokens found for {}", address);
    }
    for token in tokens {
        println!(
            "{:<8} {:>24.6}  {}",
            token.symbol,
            token.display_balance(),
            token.short_address()
        );
    }
    Ok(())
}

fn list_networks(config: &Config) {
    for network in NETWORKS {
        let marker = if network.chain_id == config.chain_id { "*" } else { " " };
        println!(
            "{} {:>9} {:>9} {:<6} {:<22} {}",
            marker,
            network.chain_id,
            network.hex_chain_id(),
            network.native_token,
            network.label,
            if network.testnet { "testnet" } else { "" }
        );
    }
}

async fn list_vip(config: &Config) -> Result<()> {
    let balance = match config.private_key {
        Some(_) => Some(wallet_balance(config).await?),
        None => None,
    };
    for tier in vip::VIP_TIERS {
        let status = match balance {
            Some(b) if vip::is_tier_active(tier, b) => "available",
            Some(_) => "insufficient balance",
            None => "",
        };
        println!("{} {:<24} {} {}  {}", tier.id, tier.name, tier.price, config.native_token(), status);
    }
    Ok(())
}

async fn buy_vip(config: &Config, tier: u8) -> Result<()> {
    let wallet = EthersWallet::connect(config).await?;
    let raw = wallet.get_balance(wallet.address()).await?;
    let purchase = vip::prepare_purchase(Some(tier), units::base_unit_to_f64(raw, BASE_UNIT_DECIMALS))?;
    let name = purchase.tier.name;

    let result = vip::buy_vip(&wallet, wallet.multisender(), purchase).await;
    if let Err(e) = operation_log::record(&OperationRecord::vip(config.chain_id, name, &result)) {
        warn!("Failed to write operation log: {}", e);
    }

    let receipt = result?;
    println!("Successfully purchased the {} VIP pack. Tx: {:?}", name, receipt.tx_hash);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let args = Cmd::parse();
    let mut settings = UserSettings::load();
    let config = resolve_config(args.chain.as_deref(), &mut settings)?;
    info!("Using {} (chain {}) via {}", config.network_label(), config.chain_id, config.rpc_url);

    match args.cmd {
        SubCmd::Review {
            file,
            text,
            balance,
            export,
        } => review(&config, load_text(file, text)?, balance, export).await,
        SubCmd::Send {
            file,
            token,
            decimals,
            yes,
        } => send(&config, file, token, decimals, yes).await,
        SubCmd::Tokens { address } => list_tokens(&config, address).await,
        SubCmd::Networks => {
            list_networks(&config);
            Ok(())
        }
        SubCmd::Vip => list_vip(&config).await,
        SubCmd::BuyVip { tier } => buy_vip(&config, tier).await,
        SubCmd::Format => {
            print!("{}", intake::format_help());
            Ok(())
        }
        SubCmd::Log => {
            println!("{}", operation_log::log_file_path());
            print!("{}", operation_log::read_log()?);
            Ok(())
        }
    }
}
