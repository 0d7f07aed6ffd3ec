use cf_api_types::{AccountId, RefreshPhase, TokenKind, TokenStateResponse, U128String};
use cf_contracts::{Nep141Token, STORAGE_DEPOSIT_AMOUNT, StakingPoolP1};
use cf_units::{convert_to_decimals, format_base_units, parse_u128, to_base_units, yton};
use cf_wallet_client::{WalletBackend, WalletError, WalletEvent, WalletProvider};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

use crate::state::FetchedToken;
use crate::{
    AutoRefresh, DEFAULT_REFRESH_PERIOD, FarmConfig, FarmError, FormGate, Notifier, TokenConfig,
    TokenState,
};

/// Smallest stake, in whole tokens.
pub const MIN_DEPOSIT_AMOUNT: u128 = 1;
pub const STAKE_MEMO: &str = "to pool";

/// One supported token: its two contract proxies, form gate and cached state.
pub struct FarmToken {
    pub kind: TokenKind,
    pub pool: StakingPoolP1,
    pub token: Nep141Token,
    form: FormGate,
    state: RwLock<TokenState>,
}

impl FarmToken {
    fn new(config: &TokenConfig, provider: &WalletProvider) -> Self {
        Self {
            kind: config.kind,
            pool: StakingPoolP1::new(config.pool_contract.clone(), provider.clone()),
            token: Nep141Token::new(config.token_contract.clone(), provider.clone()),
            form: FormGate::default(),
            state: RwLock::new(TokenState::new(config.kind)),
        }
    }

    pub async fn state(&self) -> TokenState {
        self.state.read().await.clone()
    }

    pub fn form_enabled(&self) -> bool {
        self.form.is_enabled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Stake,
    Unstake,
    Activate,
    Close,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Stake => "stake",
            ActionKind::Unstake => "unstake",
            ActionKind::Activate => "activate",
            ActionKind::Close => "close",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ActionKind::Stake => "Stake",
            ActionKind::Unstake => "Unstake",
            ActionKind::Activate => "Activate",
            ActionKind::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    pub token: TokenKind,
    pub action: ActionKind,
    /// Human decimal amount.
    pub amount: String,
    pub base_amount: U128String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub refreshed: Vec<TokenKind>,
    pub failed: Vec<(TokenKind, FarmError)>,
    /// No wallet: tokens were reset and nothing was fetched.
    pub disconnected: bool,
}

pub struct StakingFarm {
    provider: WalletProvider,
    tokens: BTreeMap<TokenKind, FarmToken>,
    notifier: Arc<dyn Notifier>,
    refresh_period: Duration,
    auto_refresh: Mutex<Option<AutoRefresh>>,
}

impl StakingFarm {
    pub fn new(
        provider: WalletProvider,
        tokens: &[TokenConfig],
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tokens = tokens
            .iter()
            .map(|config| (config.kind, FarmToken::new(config, &provider)))
            .collect();
        Self {
            provider,
            tokens,
            notifier,
            refresh_period: DEFAULT_REFRESH_PERIOD,
            auto_refresh: Mutex::new(None),
        }
    }

    pub fn from_config(
        config: &FarmConfig,
        provider: WalletProvider,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(provider, &config.tokens, notifier).with_refresh_period(config.refresh_period)
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn provider(&self) -> &WalletProvider {
        &self.provider
    }

    pub fn kinds(&self) -> impl Iterator<Item = TokenKind> + '_ {
        self.tokens.keys().copied()
    }

    pub fn token(&self, kind: TokenKind) -> Result<&FarmToken, FarmError> {
        self.tokens
            .get(&kind)
            .ok_or_else(|| FarmError::Validation(format!("token {kind} is not configured")))
    }

    pub async fn token_state(&self, kind: TokenKind) -> Result<TokenState, FarmError> {
        Ok(self.token(kind)?.state().await)
    }

    /// Installs `backend`, refreshes every token and arms the periodic refresh.
    /// Cached token state is dropped first when the account changes.
    pub async fn connect(self: &Arc<Self>, backend: Arc<dyn WalletBackend>) -> RefreshSummary {
        let account_id = backend.account_id().ok();
        info!(
            backend = backend.kind(),
            account = account_id.as_deref().unwrap_or_default(),
            "wallet connected"
        );
        let previous = self.provider.replace(backend);
        if previous.account_id().ok() != account_id {
            for token in self.tokens.values() {
                token.state.write().await.reset();
            }
        }
        let summary = self.refresh().await;
        self.start_auto_refresh();
        summary
    }

    pub async fn disconnect(&self) -> RefreshSummary {
        self.stop_auto_refresh();
        self.provider.disconnect();
        self.refresh().await
    }

    pub async fn handle_wallet_event(self: &Arc<Self>, event: WalletEvent) {
        match event {
            WalletEvent::Connected { backend, account_id } => {
                debug!(%account_id, "wallet event: connected");
                self.connect(backend).await;
            }
            WalletEvent::Disconnected => {
                debug!("wallet event: disconnected");
                self.disconnect().await;
            }
        }
    }

    pub async fn run_wallet_events(self: Arc<Self>, mut events: mpsc::Receiver<WalletEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_wallet_event(event).await;
        }
    }

    pub fn start_auto_refresh(self: &Arc<Self>) {
        let mut slot = self.auto_refresh.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(AutoRefresh::is_running) {
            return;
        }
        *slot = Some(AutoRefresh::start(Arc::downgrade(self), self.refresh_period));
    }

    pub fn stop_auto_refresh(&self) {
        let task = self
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(AutoRefresh::is_running)
    }

    /// Refreshes every token in turn. Without a connected wallet every token
    /// is reset and no chain call is made. A token whose fetch fails keeps
    /// its previous state; the failure goes to the notifier.
    pub async fn refresh(&self) -> RefreshSummary {
        let wallet = self.provider.wallet();
        let account_id = match wallet.account_id() {
            Ok(id) if wallet.is_connected() => id,
            _ => {
                for token in self.tokens.values() {
                    token.state.write().await.reset();
                }
                return RefreshSummary {
                    disconnected: true,
                    ..RefreshSummary::default()
                };
            }
        };

        let mut summary = RefreshSummary::default();
        for token in self.tokens.values() {
            match self.refresh_token(token, &account_id).await {
                Ok(()) => summary.refreshed.push(token.kind),
                Err(err) => {
                    if err != FarmError::NotConnected {
                        self.notifier.error(&format!("Refresh {}", token.kind), &err);
                    }
                    summary.failed.push((token.kind, err));
                }
            }
        }
        summary
    }

    async fn refresh_token(&self, token: &FarmToken, account_id: &str) -> Result<(), FarmError> {
        let previous_phase = {
            let mut state = token.state.write().await;
            std::mem::replace(&mut state.phase, RefreshPhase::Loading)
        };

        let fetched = fetch_token(token, account_id).await;

        let mut state = token.state.write().await;
        match fetched {
            Ok(fetched) if self.connected_as(account_id) => {
                state.apply(fetched);
                Ok(())
            }
            Ok(_) => {
                debug!(token = %token.kind, "wallet changed during refresh, result dropped");
                if state.phase == RefreshPhase::Loading {
                    state.phase = previous_phase;
                }
                Err(FarmError::NotConnected)
            }
            Err(err) => {
                if state.phase == RefreshPhase::Loading {
                    state.phase = previous_phase;
                }
                Err(err)
            }
        }
    }

    fn connected_as(&self, account_id: &str) -> bool {
        let wallet = self.provider.wallet();
        wallet.is_connected() && matches!(wallet.account_id(), Ok(id) if id == account_id)
    }

    pub async fn stake(&self, kind: TokenKind, amount: &str) -> Result<ActionReceipt, FarmError> {
        self.submit(kind, ActionKind::Stake, amount).await
    }

    pub async fn unstake(&self, kind: TokenKind, amount: &str) -> Result<ActionReceipt, FarmError> {
        self.submit(kind, ActionKind::Unstake, amount).await
    }

    /// Registers the account with the pool (storage deposit).
    pub async fn activate(&self, kind: TokenKind) -> Result<ActionReceipt, FarmError> {
        self.submit(kind, ActionKind::Activate, "").await
    }

    /// Unstakes everything and closes the pool account.
    pub async fn close(&self, kind: TokenKind) -> Result<ActionReceipt, FarmError> {
        self.submit(kind, ActionKind::Close, "").await
    }

    async fn submit(
        &self,
        kind: TokenKind,
        action: ActionKind,
        amount: &str,
    ) -> Result<ActionReceipt, FarmError> {
        let result = match self.token(kind) {
            Ok(token) => match token.form.try_acquire() {
                Some(_guard) => self.execute(token, action, amount).await,
                None => Err(FarmError::NotReady(format!(
                    "another action on {kind} is still running"
                ))),
            },
            Err(err) => Err(err),
        };

        match &result {
            Ok(receipt) => self.notifier.success(action.title(), &receipt.message),
            Err(err) => self.notifier.error(action.title(), err),
        }
        result
    }

    async fn execute(
        &self,
        token: &FarmToken,
        action: ActionKind,
        amount: &str,
    ) -> Result<ActionReceipt, FarmError> {
        match action {
            ActionKind::Stake | ActionKind::Unstake => self.transfer(token, action, amount).await,
            ActionKind::Activate => {
                token.pool.storage_deposit().await?;
                self.refresh().await;
                let shown = yton(STORAGE_DEPOSIT_AMOUNT)?;
                Ok(ActionReceipt {
                    token: token.kind,
                    action,
                    message: format!(
                        "Registered with {} ({shown} NEAR deposit)",
                        token.pool.contract_id()
                    ),
                    amount: shown,
                    base_amount: STORAGE_DEPOSIT_AMOUNT.to_owned(),
                })
            }
            ActionKind::Close => {
                let (staked, decimals, symbol) = {
                    let state = token.state.read().await;
                    let metadata = state.metadata().ok_or_else(|| not_loaded(token.kind))?;
                    (
                        state.account_staked.clone(),
                        metadata.decimals,
                        metadata.symbol.to_uppercase(),
                    )
                };
                token.pool.close().await?;
                self.refresh().await;
                let shown = convert_to_decimals(&staked, decimals, None)?;
                Ok(ActionReceipt {
                    token: token.kind,
                    action,
                    message: format!("Closed account, unstaked {shown} {symbol}"),
                    amount: shown,
                    base_amount: staked,
                })
            }
        }
    }

    async fn transfer(
        &self,
        token: &FarmToken,
        action: ActionKind,
        amount: &str,
    ) -> Result<ActionReceipt, FarmError> {
        let (decimals, symbol, is_active) = {
            let state = token.state.read().await;
            let metadata = state.metadata().ok_or_else(|| not_loaded(token.kind))?;
            (metadata.decimals, metadata.symbol.to_uppercase(), state.pool_params.is_active)
        };

        if !is_active {
            return Err(FarmError::Validation("pools are not open yet".to_owned()));
        }

        let base = to_base_units(amount, decimals)?;
        let delta = i128::try_from(base)
            .map_err(|_| FarmError::Validation(format!("amount {amount} is too large")))?;

        let delta = if action == ActionKind::Stake {
            let minimum = to_base_units(&MIN_DEPOSIT_AMOUNT.to_string(), decimals)?;
            if base < minimum {
                return Err(FarmError::Validation(format!(
                    "Stake at least {MIN_DEPOSIT_AMOUNT} {symbol}"
                )));
            }
            token
                .token
                .ft_transfer_call(token.pool.contract_id(), &base.to_string(), Some(STAKE_MEMO))
                .await?;
            delta
        } else {
            if base == 0 {
                return Err(FarmError::Validation("Unstake a positive amount".to_owned()));
            }
            token.pool.unstake(&base.to_string()).await?;
            -delta
        };

        {
            let mut state = token.state.write().await;
            if let Some(loaded) = state.loaded.as_mut() {
                loaded.staked.add_pending(delta);
            }
        }
        self.refresh().await;

        let shown = format_base_units(base, decimals, None);
        let verb = if action == ActionKind::Stake { "Staked" } else { "Unstaked" };
        Ok(ActionReceipt {
            token: token.kind,
            action,
            message: format!("{verb} {shown} {symbol}"),
            amount: shown,
            base_amount: base.to_string(),
        })
    }

    /// Whole-token wallet balance, for filling the stake input.
    pub async fn max_stake_amount(&self, kind: TokenKind) -> Result<String, FarmError> {
        let token = self.token(kind)?;
        let decimals = token
            .state
            .read()
            .await
            .metadata()
            .map(|metadata| metadata.decimals)
            .ok_or_else(|| not_loaded(kind))?;
        let account_id: AccountId = self.provider.account_id()?;
        let balance = token.token.ft_balance_of(&account_id).await?;
        Ok(convert_to_decimals(&balance, decimals, Some(0))?)
    }

    /// Cached staked balance of the account, for filling the unstake input.
    pub async fn max_unstake_amount(&self, kind: TokenKind) -> Result<String, FarmError> {
        let state = self.token(kind)?.state().await;
        let decimals = state
            .metadata()
            .map(|metadata| metadata.decimals)
            .ok_or_else(|| not_loaded(kind))?;
        Ok(convert_to_decimals(&state.account_staked, decimals, None)?)
    }

    pub async fn describe(&self, kind: TokenKind) -> Result<TokenStateResponse, FarmError> {
        let token = self.token(kind)?;
        let state = token.state().await;
        Ok(TokenStateResponse {
            token: kind,
            pool_contract: token.pool.contract_id().to_owned(),
            token_contract: token.token.contract_id().to_owned(),
            phase: state.phase.clone(),
            registered: state.registered,
            wallet_balance: state.wallet_balance.clone(),
            account_staked: state.account_staked.clone(),
            pool_params: state.pool_params.clone(),
            metadata: state.metadata().cloned(),
            staked_local: state.staked().map(|staked| staked.current().to_string()),
            form_enabled: token.form_enabled(),
        })
    }

    pub async fn describe_all(&self) -> Vec<TokenStateResponse> {
        let mut out = Vec::with_capacity(self.tokens.len());
        for kind in self.kinds() {
            if let Ok(described) = self.describe(kind).await {
                out.push(described);
            }
        }
        out
    }
}

fn not_loaded(kind: TokenKind) -> FarmError {
    FarmError::NotReady(format!("{kind} contracts loading"))
}

/// The five reads of one refresh, in order. Nothing is applied here.
async fn fetch_token(token: &FarmToken, account_id: &str) -> Result<FetchedToken, FarmError> {
    let wallet_balance = token.token.ft_balance_of(account_id).await?;
    let metadata = token.token.ft_metadata().await?;
    let storage = token.pool.storage_balance_of(Some(account_id)).await?;
    let account_staked = token.pool.status(Some(account_id)).await?;
    let pool_params = token.pool.get_contract_params().await?;
    let pool_total = parse_u128(&pool_params.total_staked)
        .map_err(|err| FarmError::ChainCall(WalletError::Decode(err.to_string())))?;

    Ok(FetchedToken {
        wallet_balance,
        metadata,
        storage,
        account_staked,
        pool_params,
        pool_total,
    })
}
