//! Page controller for the Prepare → Approve → Multisend flow.
//!
//! [`PageState`] is the only mutable state of the flow and changes only
//! through its transition methods; validation and totals are derived inside
//! those transitions. [`PageController`] adds the async collaborator calls and
//! turns every collaborator failure into a notification.

use crate::intake::{self, CsvUpload};
use crate::notifications::Notifications;
use crate::query::ApproveQuery;
use crate::recipients::{self, RecipientEntry, ValidationResult};
use crate::staging::{self, StagingError, SubmissionOutcome, SubmissionRequest, Submitter};
use crate::tokens::{SelectedToken, TokenBalance, TokenIndexer};
use crate::totals::AggregateTotals;
use crate::units::{self, BASE_UNIT_DECIMALS};
use crate::wallet::{ContractCaller, WalletEvent, WalletProvider};
use ethers::types::Address;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Prepare,
    Approve,
    Multisend,
}

impl Stage {
    pub fn step(&self) -> u8 {
        match self {
            Stage::Prepare => 1,
            Stage::Approve => 2,
            Stage::Multisend => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Prepare => "Prepare",
            Stage::Approve => "Approve",
            Stage::Multisend => "Multisend",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageState {
    csv_text: String,
    validation: ValidationResult,
    totals: AggregateTotals,
    account: Option<Address>,
    account_balance: f64,
    chain_id: Option<u64>,
    tokens: Vec<TokenBalance>,
    selected_token: Option<SelectedToken>,
    stage: Stage,
    in_flight: bool,
    pub notifications: Notifications,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    pub fn new() -> Self {
        Self {
            csv_text: String::new(),
            validation: ValidationResult::default(),
            totals: AggregateTotals::default(),
            account: None,
            account_balance: 0.0,
            chain_id: None,
            tokens: Vec::new(),
            selected_token: None,
            stage: Stage::Prepare,
            in_flight: false,
            notifications: Notifications::default(),
        }
    }

    pub fn csv_text(&self) -> &str {
        &self.csv_text
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn valid(&self) -> &[RecipientEntry] {
        &self.validation.valid
    }

    pub fn totals(&self) -> &AggregateTotals {
        &self.totals
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn account_balance(&self) -> f64 {
        self.account_balance
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn tokens(&self) -> &[TokenBalance] {
        &self.tokens
    }

    pub fn selected_token(&self) -> Option<&SelectedToken> {
        self.selected_token.as_ref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the text box should be flagged as containing bad lines.
    ///
    /// Clearing the box counts as an error (the blank line is invalid); a box
    /// that was never edited is not flagged.
    pub fn csv_error(&self) -> bool {
        self.validation.has_errors()
    }

    /// Gutter line numbers for the text box ("1\n2\n3")
    pub fn line_numbers(&self) -> String {
        (1..=self.csv_text.split('\n').count())
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn can_submit(&self) -> bool {
        staging::submission_enabled(&self.validation.valid, &self.totals, self.in_flight)
    }

    fn recompute_totals(&mut self) {
        self.totals = AggregateTotals::compute(&self.validation.valid, self.account_balance);
    }

    /// Replace the recipient text and re-validate it
    pub fn set_csv_text(&mut self, text: impl Into<String>) {
        self.csv_text = text.into();
        self.validation = recipients::validate_csv(&self.csv_text);
        self.recompute_totals();
        debug!(
            "CSV updated: {} valid, {} invalid",
            self.validation.valid.len(),
            self.validation.invalid.len()
        );
    }

    /// Take an uploaded file; rejected uploads leave the current text untouched
    pub fn load_upload(&mut self, upload: CsvUpload) -> bool {
        match intake::accept_upload(upload) {
            Ok(text) => {
                self.set_csv_text(text);
                true
            }
            Err(e) => {
                self.notifications.error(e.to_string());
                false
            }
        }
    }

    /// Commit a successful wallet connection in one step
    pub fn apply_connection(&mut self, account: Address, chain_id: u64, balance: f64) {
        self.account = Some(account);
        self.chain_id = Some(chain_id);
        self.set_balance(balance);
    }

    pub fn set_account(&mut self, account: Option<Address>) {
        self.account = account;
    }

    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = Some(chain_id);
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.account_balance = balance;
        self.recompute_totals();
    }

    pub fn set_tokens(&mut self, tokens: Vec<TokenBalance>) {
        self.tokens = tokens;
    }

    pub fn select_token(&mut self, token: &TokenBalance) {
        self.selected_token = Some(SelectedToken::from_balance(token));
    }

    /// Override the decimals of the selected token (manual entries assume 18)
    pub fn set_token_decimals(&mut self, decimals: u32) {
        if let Some(token) = self.selected_token.as_mut() {
            token.decimals = decimals;
        }
    }

    /// Select a token by typed address; returns false (and notifies) when rejected
    pub fn select_token_manual(&mut self, input: &str) -> bool {
        match SelectedToken::manual(input) {
            Ok(token) => {
                self.selected_token = Some(token);
                true
            }
            Err(message) => {
                self.notifications.error(message);
                false
            }
        }
    }

    /// React to the wallet switching account or chain; the balance must be refreshed after
    pub fn handle_wallet_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                self.account = accounts.first().copied();
                match self.account {
                    Some(_) => self.notifications.info("Account switched successfully."),
                    None => self.notifications.info("Wallet disconnected."),
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                self.chain_id = Some(chain_id);
                self.notifications.info(format!("Switched to chain {}.", chain_id));
            }
        }
        self.tokens.clear();
        self.set_balance(0.0);
    }

    /// Leave Prepare; requires a connected wallet, returns the hand-off query
    pub fn continue_to_approve(&mut self) -> Option<ApproveQuery> {
        if self.account.is_none() {
            self.notifications.error("Please connect your wallet first.");
            return None;
        }
        let token = self
            .selected_token
            .as_ref()
            .map(|t| t.address.clone())
            .unwrap_or_default();
        self.stage = Stage::Approve;
        Some(ApproveQuery::new(&self.validation, token))
    }

    /// Arrive at Approve with the lists carried by the query
    pub fn enter_approve(&mut self, query: &ApproveQuery) {
        self.validation = query.validation();
        if !query.selected_token.is_empty() {
            let decimals = self
                .tokens
                .iter()
                .find(|t| t.token_address.eq_ignore_ascii_case(&query.selected_token))
                .map(|t| t.decimals)
                .unwrap_or(BASE_UNIT_DECIMALS);
            self.selected_token = Some(SelectedToken {
                address: query.selected_token.clone(),
                decimals,
            });
        }
        self.stage = Stage::Approve;
        self.recompute_totals();
    }

    pub fn back(&mut self) {
        self.stage = Stage::Prepare;
        self.notifications.info("Navigating back to the previous page.");
    }

    /// Mark a submission as started; false (with a notification) when the gate is closed
    pub fn begin_submission(&mut self) -> bool {
        if self.in_flight {
            self.notifications.error(StagingError::AlreadyInFlight.to_string());
            return false;
        }
        if !self.can_submit() {
            let message = if self.validation.valid.is_empty() {
                StagingError::NothingToSend.to_string()
            } else {
                StagingError::InsufficientFunds {
                    needed: self.totals.total_amount(),
                    available: self.totals.account_balance(),
                }
                .to_string()
            };
            self.notifications.error(message);
            return false;
        }
        self.in_flight = true;
        self.stage = Stage::Multisend;
        true
    }

    /// Record the outcome; recipient data is never touched
    pub fn finish_submission(&mut self, result: &Result<SubmissionOutcome, StagingError>) {
        self.in_flight = false;
        match result {
            Ok(outcome) => {
                self.notifications.success(format!(
                    "Tokens successfully sent to all recipients! Tx: {:?}",
                    outcome.receipt.tx_hash
                ));
            }
            Err(e) => {
                self.stage = Stage::Approve;
                let mut message = format!("Error processing the multisend: {}", e);
                if e.is_retryable() {
                    message.push_str(" Please try again.");
                }
                self.notifications.error(message);
            }
        }
    }
}

/// Drives the flow against real or fake collaborators
pub struct PageController<W, C> {
    pub state: PageState,
    wallet: W,
    submitter: Submitter<C>,
}

impl<W: WalletProvider, C: ContractCaller> PageController<W, C> {
    pub fn new(wallet: W, submitter: Submitter<C>) -> Self {
        Self {
            state: PageState::new(),
            wallet,
            submitter,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn submitter(&self) -> &Submitter<C> {
        &self.submitter
    }

    /// Request accounts, chain and balance from the wallet; state changes only if all three succeed
    pub async fn connect(&mut self) -> bool {
        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state.notifications.error(format!("Error connecting wallet: {}", e));
                return false;
            }
        };
        let Some(account) = accounts.first().copied() else {
            self.state.notifications.error("The wallet returned no accounts.");
            return false;
        };

        let chain_id = match self.wallet.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                self.state.notifications.error(format!("Error reading chain id: {}", e));
                return false;
            }
        };

        let raw = match self.wallet.get_balance(account).await {
            Ok(raw) => raw,
            Err(e) => {
                self.state
                    .notifications
                    .error(format!("Failed to fetch account information: {}", e));
                return false;
            }
        };

        self.state
            .apply_connection(account, chain_id, units::base_unit_to_f64(raw, BASE_UNIT_DECIMALS));
        info!("Wallet connected: {:?} on chain {}", account, chain_id);
        true
    }

    /// Re-read the connected account's balance
    pub async fn refresh_balance(&mut self) -> bool {
        let Some(account) = self.state.account() else {
            self.state.notifications.error("Please connect your wallet first.");
            return false;
        };
        match self.wallet.get_balance(account).await {
            Ok(raw) => {
                self.state.set_balance(units::base_unit_to_f64(raw, BASE_UNIT_DECIMALS));
                true
            }
            Err(e) => {
                self.state
                    .notifications
                    .error(format!("Failed to fetch account information: {}", e));
                false
            }
        }
    }

    /// Load the account's token list for the picker
    pub async fn refresh_tokens(&mut self, indexer: &impl TokenIndexer) -> bool {
        let (Some(account), Some(chain_id)) = (self.state.account(), self.state.chain_id()) else {
            self.state.notifications.error("Please connect your wallet first.");
            return false;
        };
        match indexer
            .get_wallet_token_balances(&format!("{:?}", account), chain_id)
            .await
        {
            Ok(tokens) => {
                info!("Indexer returned {} tokens", tokens.len());
                self.state.set_tokens(tokens);
                true
            }
            Err(e) => {
                self.state.notifications.error(e.to_string());
                false
            }
        }
    }

    pub async fn handle_wallet_event(&mut self, event: WalletEvent) {
        self.state.handle_wallet_event(event);
        if self.state.account().is_some() {
            self.refresh_balance().await;
        }
    }

    /// Run one multisend attempt from the Approve stage
    pub async fn submit(&mut self) -> Option<Result<SubmissionOutcome, StagingError>> {
        let Some(from) = self.state.account() else {
            self.state.notifications.error("Please connect your wallet first.");
            return None;
        };
        if !self.state.begin_submission() {
            return None;
        }

        let result = {
            let token = self.state.selected_token.as_ref();
            let request = SubmissionRequest {
                token_address: token.map(|t| t.address.as_str()).unwrap_or(""),
                decimals: token.map(|t| t.decimals).unwrap_or(BASE_UNIT_DECIMALS),
                valid: &self.state.validation.valid,
                totals: &self.state.totals,
                from,
            };
            self.submitter.submit(request).await
        };

        self.state.finish_submission(&result);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationLevel;
    use crate::staging::tests::{receipt, FakeCaller, ADDR_1, ADDR_2, TOKEN};
    use crate::tokens::IndexerError;
    use crate::wallet::CallError;
    use ethers::types::U256;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    struct FakeWallet {
        accounts: Vec<Address>,
        balance: StdMutex<Result<U256, CallError>>,
    }

    impl FakeWallet {
        fn with_balance(eth: u64) -> Self {
            Self {
                accounts: vec![Address::repeat_byte(0x99)],
                balance: StdMutex::new(Ok(U256::from(eth) * U256::from(10u64.pow(18)))),
            }
        }
    }

    impl WalletProvider for FakeWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, CallError> {
            Ok(self.accounts.clone())
        }

        async fn get_balance(&self, _account: Address) -> Result<U256, CallError> {
            self.balance.lock().unwrap().clone()
        }

        async fn chain_id(&self) -> Result<u64, CallError> {
            Ok(1)
        }
    }

    struct FakeIndexer {
        tokens: Option<Vec<TokenBalance>>,
    }

    impl TokenIndexer for FakeIndexer {
        async fn get_wallet_token_balances(
            &self,
            _address: &str,
            _chain_id: u64,
        ) -> Result<Vec<TokenBalance>, IndexerError> {
            self.tokens.clone().ok_or(IndexerError::Http(503))
        }
    }

    fn usdt() -> TokenBalance {
        TokenBalance {
            name: "Tether".into(),
            symbol: "USDT".into(),
            token_address: TOKEN.into(),
            balance: "5000000".into(),
            decimals: 6,
        }
    }

    fn controller(wallet: FakeWallet, caller: FakeCaller) -> PageController<FakeWallet, FakeCaller> {
        let submitter = Submitter::new(caller, Duration::from_secs(1), Duration::from_secs(1));
        PageController::new(wallet, submitter)
    }

    fn scenario_text() -> String {
        format!("{ADDR_1}, 1.5\nbadaddr, 2\n{ADDR_2}, 0.5")
    }

    // ==================== PageState tests ====================

    #[test]
    fn test_set_csv_text_recomputes_everything() {
        let mut state = PageState::new();
        state.set_balance(1.0);
        state.set_csv_text(scenario_text());

        assert_eq!(state.valid().len(), 2);
        assert_eq!(state.validation().invalid.len(), 1);
        assert_eq!(state.totals().total_amount(), 2.0);
        assert!(state.totals().insufficient_funds());
        assert!(state.csv_error());
        assert!(!state.can_submit());

        state.set_balance(2.0);
        assert!(!state.totals().insufficient_funds());
        assert!(state.can_submit());
    }

    #[test]
    fn test_empty_text_disables_submission() {
        let mut state = PageState::new();
        state.set_balance(100.0);
        state.set_csv_text("");
        assert!(!state.can_submit());
        assert_eq!(state.line_numbers(), "1");
    }

    #[test]
    fn test_cleared_text_is_flagged() {
        let mut state = PageState::new();
        assert!(!state.csv_error());

        state.set_csv_text(ADDR_1.to_string() + ", 1");
        assert!(!state.csv_error());

        state.set_csv_text("");
        assert!(state.csv_error());
        assert_eq!(state.validation().invalid, vec![RecipientEntry { address: String::new(), amount: None }]);
    }

    #[test]
    fn test_rejected_upload_keeps_text() {
        let mut state = PageState::new();
        state.set_csv_text(scenario_text());
        assert!(!state.load_upload(CsvUpload::new("x.txt", "text/plain", "nothing")));
        assert_eq!(state.csv_text(), scenario_text());
        assert_eq!(state.notifications.latest().unwrap().message, "Please upload a valid CSV file.");

        assert!(state.load_upload(CsvUpload::new("x.csv", "text/csv", ADDR_1)));
        assert_eq!(state.valid().len(), 1);
    }

    #[test]
    fn test_continue_requires_wallet() {
        let mut state = PageState::new();
        state.set_csv_text(scenario_text());
        assert!(state.continue_to_approve().is_none());
        assert_eq!(state.stage(), Stage::Prepare);

        state.set_account(Some(Address::repeat_byte(1)));
        assert!(state.select_token_manual(TOKEN));
        let query = state.continue_to_approve().unwrap();
        assert_eq!(state.stage(), Stage::Approve);
        assert_eq!(query.valid.len(), 2);
        assert_eq!(query.selected_token, TOKEN);
    }

    #[test]
    fn test_enter_approve_from_query() {
        let mut prepare = PageState::new();
        prepare.set_account(Some(Address::repeat_byte(1)));
        prepare.set_csv_text(scenario_text());
        prepare.select_token_manual(TOKEN);
        let encoded = prepare.continue_to_approve().unwrap().to_query_string().unwrap();

        let mut approve = PageState::new();
        approve.set_balance(2.0);
        approve.enter_approve(&ApproveQuery::from_query_string(&encoded).unwrap());
        assert_eq!(approve.stage(), Stage::Approve);
        assert_eq!(approve.valid(), prepare.valid());
        assert_eq!(approve.selected_token().unwrap().address, TOKEN);
        assert!(approve.can_submit());
    }

    #[test]
    fn test_wallet_events_reset_balance() {
        let mut state = PageState::new();
        state.set_csv_text(scenario_text());
        state.set_balance(5.0);
        assert!(state.can_submit());

        state.handle_wallet_event(WalletEvent::ChainChanged(137));
        assert_eq!(state.chain_id(), Some(137));
        assert_eq!(state.account_balance(), 0.0);
        assert!(!state.can_submit());

        state.handle_wallet_event(WalletEvent::AccountsChanged(vec![]));
        assert!(state.account().is_none());
    }

    #[test]
    fn test_manual_token_rejected() {
        let mut state = PageState::new();
        assert!(!state.select_token_manual("0x12"));
        assert!(state.selected_token().is_none());
        assert_eq!(state.notifications.latest().unwrap().level, NotificationLevel::Error);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Prepare.step(), 1);
        assert_eq!(Stage::Multisend.label(), "Multisend");
        assert!(Stage::Approve > Stage::Prepare);
    }

    // ==================== PageController tests ====================

    #[tokio::test]
    async fn test_connect_loads_balance() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        assert!(page.connect().await);
        assert_eq!(page.state.account(), Some(Address::repeat_byte(0x99)));
        assert_eq!(page.state.chain_id(), Some(1));
        assert_eq!(page.state.account_balance(), 2.0);
    }

    #[tokio::test]
    async fn test_balance_failure_leaves_state() {
        let wallet = FakeWallet::with_balance(2);
        *wallet.balance.lock().unwrap() = Err(CallError::Network("connection refused".into()));
        let mut page = controller(wallet, FakeCaller::succeeding());
        page.state.set_balance(3.0);

        assert!(!page.connect().await);
        assert_eq!(page.state.account_balance(), 3.0);
        assert!(page.state.account().is_none());
        assert!(page.state.chain_id().is_none());
        assert!(!page.state.can_submit());
        assert!(page.state.notifications.latest().unwrap().message.contains("Failed to fetch"));
        assert!(page.state.continue_to_approve().is_none());
        assert_eq!(page.state.stage(), Stage::Prepare);
    }

    #[tokio::test]
    async fn test_balance_failure_keeps_previous_connection() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        assert!(page.connect().await);
        page.state.set_csv_text(scenario_text());
        assert!(page.state.can_submit());

        *page.wallet().balance.lock().unwrap() = Err(CallError::Network("connection refused".into()));
        assert!(!page.connect().await);
        assert_eq!(page.state.account(), Some(Address::repeat_byte(0x99)));
        assert_eq!(page.state.chain_id(), Some(1));
        assert_eq!(page.state.account_balance(), 2.0);
    }

    #[tokio::test]
    async fn test_full_flow_submits_once() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        page.connect().await;
        page.state.set_csv_text(scenario_text());
        page.state.select_token_manual(TOKEN);
        let query = page.state.continue_to_approve().unwrap();
        page.state.enter_approve(&query);

        let outcome = page.submit().await.unwrap().unwrap();
        assert_eq!(outcome.receipt, receipt());
        assert_eq!(page.state.stage(), Stage::Multisend);
        assert!(!page.state.in_flight());
        assert_eq!(page.state.notifications.latest().unwrap().level, NotificationLevel::Success);

        let submitted = page.submitter().caller().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0.addresses.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_blocked_by_insufficient_funds() {
        let mut page = controller(FakeWallet::with_balance(1), FakeCaller::succeeding());
        page.connect().await;
        page.state.set_csv_text(scenario_text());
        page.state.select_token_manual(TOKEN);

        assert!(page.submit().await.is_none());
        assert!(page.submitter().caller().submitted.lock().unwrap().is_empty());
        assert!(page.state.notifications.latest().unwrap().message.contains("Insufficient"));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_data() {
        let caller = FakeCaller::default();
        caller
            .submits
            .lock()
            .unwrap()
            .push_back(Err(CallError::Rejected("User denied transaction signature".into())));
        let mut page = controller(FakeWallet::with_balance(5), caller);
        page.connect().await;
        page.state.set_csv_text(scenario_text());
        page.state.select_token_manual(TOKEN);
        let before = page.state.validation().clone();

        let result = page.submit().await.unwrap();
        assert!(result.unwrap_err().is_rejection());
        assert_eq!(page.state.validation(), &before);
        assert_eq!(page.state.stage(), Stage::Approve);
        assert!(!page.state.in_flight());
        assert!(page.state.can_submit());
    }

    #[tokio::test]
    async fn test_listed_token_decimals_reach_the_batch() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        page.connect().await;
        assert!(page.refresh_tokens(&FakeIndexer { tokens: Some(vec![usdt()]) }).await);
        assert_eq!(page.state.tokens(), &[usdt()]);

        page.state.set_csv_text(scenario_text());
        let token = page.state.tokens()[0].clone();
        page.state.select_token(&token);
        let encoded = page.state.continue_to_approve().unwrap().to_query_string().unwrap();
        page.state.enter_approve(&ApproveQuery::from_query_string(&encoded).unwrap());
        assert_eq!(page.state.selected_token().unwrap().decimals, 6);

        page.submit().await.unwrap().unwrap();
        let submitted = page.submitter().caller().submitted.lock().unwrap();
        assert_eq!(submitted[0].0.amounts, vec![U256::from(1_500_000u64), U256::from(500_000u64)]);
    }

    #[tokio::test]
    async fn test_failed_token_fetch_keeps_list() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        page.connect().await;
        page.refresh_tokens(&FakeIndexer { tokens: Some(vec![usdt()]) }).await;

        assert!(!page.refresh_tokens(&FakeIndexer { tokens: None }).await);
        assert_eq!(page.state.tokens(), &[usdt()]);
        let latest = page.state.notifications.latest().unwrap();
        assert_eq!(latest.level, NotificationLevel::Error);
        assert!(latest.message.contains("503"));
    }

    #[tokio::test]
    async fn test_token_fetch_requires_connection() {
        let mut page = controller(FakeWallet::with_balance(2), FakeCaller::succeeding());
        assert!(!page.refresh_tokens(&FakeIndexer { tokens: Some(vec![usdt()]) }).await);
        assert!(page.state.tokens().is_empty());
    }

    #[tokio::test]
    async fn test_account_change_refreshes_balance() {
        let mut page = controller(FakeWallet::with_balance(4), FakeCaller::succeeding());
        page.connect().await;
        page.handle_wallet_event(WalletEvent::AccountsChanged(vec![Address::repeat_byte(0x55)]))
            .await;
        assert_eq!(page.state.account(), Some(Address::repeat_byte(0x55)));
        assert_eq!(page.state.account_balance(), 4.0);
    }
}
