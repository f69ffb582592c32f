use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::blockchain::{await_receipt, ChainClient, TxStatus};
use crate::constants::{
    DEFAULT_CONFIRM_TIMEOUT_SECS, DEFAULT_QUOTE_TTL_SECS, DEFAULT_SLIPPAGE_BPS, MAX_SLIPPAGE_BPS,
};
use crate::errors::SwapError;
use crate::registry::TokenRegistry;
use crate::swap::allowance::AllowanceManager;
use crate::swap::calldata::{default_encoders, SwapCallEncoder, SwapLegParams};
use crate::swap::directory::ExchangeDirectory;
use crate::swap::quote::{QuoteEngine, QuoteSet};
use crate::swap::remittance::RemittanceHandler;
use crate::swap::router::RouteResolver;
use crate::types::{
    min_amount_out, LegStatus, RemittanceStatus, SwapLeg, SwapPlan, SwapResult, SwapState,
    TradablePair,
};

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub default_slippage_bps: u32,
    pub confirm_timeout: Duration,
    pub quote_ttl_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT_SECS),
            quote_ttl_secs: DEFAULT_QUOTE_TTL_SECS,
        }
    }
}

/// A fully quoted swap awaiting the caller's confirmation. The gap between
/// `prepare` and `execute` is the only cancellation point: once a transaction
/// is broadcast it cannot be withdrawn.
#[derive(Debug, Clone, Serialize)]
pub struct SwapProposal {
    pub pair: TradablePair,
    pub quotes: QuoteSet,
    /// Input in human units of the source token.
    pub amount_in: Decimal,
    /// Simulated final output in human units of the destination token.
    pub expected_out: Decimal,
    pub slippage_bps: u32,
    pub initiator: Address,
    pub recipient: Address,
}

/// Drives a swap plan to a terminal state, leg by leg, strictly sequential.
///
/// Leg i+1 is only attempted after leg i's confirmation is observed: its true
/// input amount is leg i's on-chain output, not the quoted estimate. A
/// per-signer mutex keeps a second attempt from the same wallet from racing
/// the first on nonce and allowance state.
pub struct SwapExecutor {
    client: Arc<dyn ChainClient>,
    registry: Arc<TokenRegistry>,
    directory: ExchangeDirectory,
    quote_engine: QuoteEngine,
    allowance: AllowanceManager,
    remittance: RemittanceHandler,
    encoders: Vec<Box<dyn SwapCallEncoder>>,
    settings: ExecutorSettings,
    wallet_lock: Mutex<()>,
}

impl SwapExecutor {
    pub fn new(
        client: Arc<dyn ChainClient>,
        registry: Arc<TokenRegistry>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            directory: ExchangeDirectory::new(client.clone(), registry.clone()),
            quote_engine: QuoteEngine::new(client.clone()),
            allowance: AllowanceManager::new(client.clone(), settings.confirm_timeout),
            remittance: RemittanceHandler::new(client.clone(), settings.confirm_timeout),
            encoders: default_encoders(),
            client,
            registry,
            settings,
            wallet_lock: Mutex::new(()),
        }
    }

    /// Resolve a route and quote it. Nothing is broadcast; failures here are
    /// safe to retry.
    pub async fn prepare(
        &self,
        source_symbol: &str,
        dest_symbol: &str,
        amount_in: Decimal,
        slippage_bps: Option<u32>,
        recipient: Option<Address>,
    ) -> Result<SwapProposal, SwapError> {
        let slippage_bps = slippage_bps.unwrap_or(self.settings.default_slippage_bps);
        if slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(SwapError::InvalidAmount(format!(
                "slippage {} bps exceeds maximum {}",
                slippage_bps, MAX_SLIPPAGE_BPS
            )));
        }

        let source = self.registry.token(source_symbol)?.clone();
        let dest = self.registry.token(dest_symbol)?.clone();
        let amount_base = TokenRegistry::to_base_units(amount_in, &source)?;
        if amount_base.is_zero() {
            return Err(SwapError::InvalidAmount(format!(
                "{} {} is below one base unit",
                amount_in, source.symbol
            )));
        }

        let exchanges = self.directory.list().await?;
        let pair = RouteResolver::resolve(&source, &dest, &exchanges)?;
        let quotes = self
            .quote_engine
            .quote_pair(&pair, amount_base, slippage_bps)
            .await?;

        let initiator = self.client.signer_address();
        let expected_out = TokenRegistry::from_base_units(quotes.expected_out, &dest)?;
        info!(
            source = %source.symbol,
            dest = %dest.symbol,
            hops = pair.path.len(),
            %amount_in,
            %expected_out,
            "swap prepared"
        );

        Ok(SwapProposal {
            pair,
            quotes,
            amount_in,
            expected_out,
            slippage_bps,
            initiator,
            recipient: recipient.unwrap_or(initiator),
        })
    }

    /// Execute a prepared swap through to a terminal state.
    ///
    /// Returns `Err` only for failures before anything is broadcast (stale
    /// re-quote failures). Once the leg loop starts, the outcome is always a
    /// `SwapResult` so settled legs are never silently discarded.
    pub async fn execute(&self, proposal: SwapProposal) -> Result<SwapResult, SwapError> {
        let _wallet_guard = self.wallet_lock.lock().await;

        let mut quotes = proposal.quotes;
        if quotes.is_stale(self.settings.quote_ttl_secs) {
            warn!(
                age_limit_secs = self.settings.quote_ttl_secs,
                "quotes are stale, refreshing before broadcast"
            );
            quotes = self
                .quote_engine
                .quote_pair(&proposal.pair, quotes.amount_in, proposal.slippage_bps)
                .await?;
        }

        let mut plan = SwapPlan {
            legs: quotes.legs.iter().map(SwapLeg::from_quote).collect(),
            initiator: proposal.initiator,
            recipient: proposal.recipient,
        };
        let broker = match self.client.broker_address().await {
            Ok(addr) => addr,
            Err(e) => return Err(e),
        };

        let leg_count = plan.legs.len();
        for i in 0..leg_count {
            info!(
                leg = i,
                token_in = %plan.legs[i].token_in.symbol,
                token_out = %plan.legs[i].token_out.symbol,
                amount_in = %plan.legs[i].amount_in,
                "starting leg"
            );

            plan.legs[i].status = LegStatus::Approving;
            if let Err(e) = self
                .allowance
                .ensure(
                    &plan.legs[i].token_in,
                    plan.initiator,
                    broker,
                    plan.legs[i].amount_in,
                )
                .await
            {
                return Ok(self.finish(plan, Some(e)));
            }

            let balance_before = match self
                .client
                .token_balance(plan.legs[i].token_out.address, plan.initiator)
                .await
            {
                Ok(v) => v,
                Err(e) => return Ok(self.finish(plan, Some(e))),
            };

            let params = SwapLegParams {
                provider: plan.legs[i].exchange.provider,
                exchange_id: plan.legs[i].exchange.id,
                token_in: plan.legs[i].token_in.address,
                token_out: plan.legs[i].token_out.address,
                amount_in: plan.legs[i].amount_in,
                min_amount_out: plan.legs[i].min_amount_out,
            };
            let tx_hash = match self.submit_negotiated(broker, &params).await {
                Ok(hash) => hash,
                Err(e) => return Ok(self.finish(plan, Some(e))),
            };
            plan.legs[i].tx_hash = Some(tx_hash);
            plan.legs[i].status = LegStatus::Submitted;
            info!(leg = i, %tx_hash, "leg submitted, awaiting confirmation");

            match await_receipt(self.client.as_ref(), tx_hash, self.settings.confirm_timeout)
                .await
            {
                Ok(TxStatus::Success) => {}
                Ok(TxStatus::Reverted) => {
                    plan.legs[i].status = LegStatus::Reverted;
                    return Ok(self.finish(plan, Some(SwapError::SwapReverted { leg: i, tx_hash })));
                }
                Err(e) => return Ok(self.finish(plan, Some(e))),
            }
            plan.legs[i].status = LegStatus::Confirmed;

            // Settled output: post-trade balance delta. The leg is already
            // confirmed at this point, so a zero delta or a failed read falls
            // back to the simulated amount rather than abandoning the plan.
            let settled = match self
                .client
                .token_balance(plan.legs[i].token_out.address, plan.initiator)
                .await
            {
                Ok(after) if after > balance_before => after - balance_before,
                Ok(_) => quotes.legs[i].amount_out,
                Err(e) => {
                    warn!(
                        leg = i,
                        error = %e,
                        "balance read failed after confirmation, using quoted output"
                    );
                    quotes.legs[i].amount_out
                }
            };
            plan.legs[i].settled_out = Some(settled);
            info!(leg = i, %settled, "leg confirmed");

            // The next leg trades the real on-chain output, so its minimum is
            // re-derived from a fresh simulation at the settled input.
            if i + 1 < leg_count {
                let next = &plan.legs[i + 1];
                let next_out = match self
                    .client
                    .quote_out(
                        next.exchange.provider,
                        next.exchange.id,
                        next.token_in.address,
                        next.token_out.address,
                        settled,
                    )
                    .await
                {
                    Ok(v) if !v.is_zero() => v,
                    Ok(_) => {
                        let e = SwapError::QuoteFailed {
                            token_in: next.token_in.symbol.clone(),
                            token_out: next.token_out.symbol.clone(),
                            reason: "re-quote at settled input returned zero".to_string(),
                        };
                        return Ok(self.finish(plan, Some(e)));
                    }
                    Err(e) => return Ok(self.finish(plan, Some(e))),
                };
                plan.legs[i + 1].amount_in = settled;
                plan.legs[i + 1].min_amount_out =
                    min_amount_out(next_out, proposal.slippage_bps);
            }
        }

        // All legs confirmed; remit if the output belongs to someone else.
        let dest = &proposal.pair.dest;
        let final_settled = plan
            .legs
            .last()
            .and_then(|leg| leg.settled_out)
            .unwrap_or(quotes.expected_out);

        let remittance = if plan.recipient == plan.initiator {
            RemittanceStatus::NotRequired
        } else {
            match self
                .remittance
                .remit(dest, plan.recipient, final_settled)
                .await
            {
                Ok(tx_hash) => RemittanceStatus::Completed { tx_hash },
                Err(e) => {
                    warn!(error = %e, "remittance failed; swap legs remain settled");
                    RemittanceStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        let amount_out = TokenRegistry::from_base_units(final_settled, dest).ok();
        info!(
            ?amount_out,
            dest = %dest.symbol,
            "swap completed"
        );

        Ok(SwapResult {
            state: SwapState::Completed,
            legs: plan.legs,
            initiator: plan.initiator,
            recipient: plan.recipient,
            amount_out,
            remittance,
            error: None,
        })
    }

    /// Prepare and execute in one call. Callers wanting a confirmation step
    /// use `prepare`/`execute` directly.
    pub async fn plan_and_execute(
        &self,
        source_symbol: &str,
        dest_symbol: &str,
        amount_in: Decimal,
        slippage_bps: Option<u32>,
        recipient: Option<Address>,
    ) -> Result<SwapResult, SwapError> {
        let proposal = self
            .prepare(source_symbol, dest_symbol, amount_in, slippage_bps, recipient)
            .await?;
        self.execute(proposal).await
    }

    /// Try each known call shape in priority order; surface the broker's
    /// declared function names once every shape has been rejected.
    async fn submit_negotiated(
        &self,
        broker: Address,
        params: &SwapLegParams,
    ) -> Result<B256, SwapError> {
        let mut attempted = Vec::with_capacity(self.encoders.len());
        for encoder in &self.encoders {
            attempted.push(encoder.name().to_string());
            match self.client.submit_call(broker, encoder.encode(params)).await {
                Ok(tx_hash) => return Ok(tx_hash),
                Err(SwapError::CallRejected { reason }) => {
                    warn!(signature = encoder.name(), %reason, "call shape rejected");
                }
                Err(other) => return Err(other),
            }
        }

        let available = self
            .client
            .broker_function_names()
            .await
            .unwrap_or_default();
        Err(SwapError::UnknownCallSignature {
            attempted,
            available,
        })
    }

    /// Build the terminal result for a plan that stopped short.
    fn finish(&self, plan: SwapPlan, error: Option<SwapError>) -> SwapResult {
        let confirmed = plan
            .legs
            .iter()
            .filter(|leg| leg.status == LegStatus::Confirmed)
            .count();
        let state = if confirmed == plan.legs.len() {
            SwapState::Completed
        } else if confirmed > 0 {
            SwapState::PartiallyCompleted
        } else {
            SwapState::Failed
        };

        if let Some(e) = &error {
            warn!(?state, error = %e, "swap ended early");
        }

        let remittance = if plan.recipient == plan.initiator {
            RemittanceStatus::NotRequired
        } else {
            RemittanceStatus::Skipped
        };

        SwapResult {
            state,
            initiator: plan.initiator,
            recipient: plan.recipient,
            legs: plan.legs,
            amount_out: None,
            remittance,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CELO_MAINNET;
    use crate::mocks::MockChainClient;
    use crate::types::Token;
    use alloy::primitives::B256;
    use std::str::FromStr;

    const E12: u128 = 1_000_000_000_000;

    struct Harness {
        mock: Arc<MockChainClient>,
        executor: SwapExecutor,
        cusd: Token,
        usdc: Token,
        celo: Token,
        initiator: Address,
    }

    fn harness() -> Harness {
        let registry = Arc::new(TokenRegistry::for_network(CELO_MAINNET).unwrap());
        let initiator = Address::repeat_byte(0xaa);
        let mock = Arc::new(MockChainClient::new(initiator));
        let executor = SwapExecutor::new(
            mock.clone(),
            registry.clone(),
            ExecutorSettings {
                confirm_timeout: Duration::from_secs(5),
                ..Default::default()
            },
        );
        Harness {
            cusd: registry.token("cUSD").unwrap().clone(),
            usdc: registry.token("USDC").unwrap().clone(),
            celo: registry.token("CELO").unwrap().clone(),
            mock,
            executor,
            initiator,
        }
    }

    /// Direct cUSD/USDC venue at par (18d -> 6d).
    fn add_direct_venue(h: &Harness) -> B256 {
        let id = B256::repeat_byte(1);
        let provider = Address::repeat_byte(0xEE);
        h.mock
            .add_exchange(id, provider, vec![h.cusd.address, h.usdc.address]);
        h.mock.set_rate(id, h.cusd.address, h.usdc.address, 1, E12);
        id
    }

    /// cUSD -> CELO -> USDC venues, par pricing.
    fn add_two_hop_venues(h: &Harness) {
        let provider = Address::repeat_byte(0xEE);
        let e1 = B256::repeat_byte(1);
        let e2 = B256::repeat_byte(2);
        h.mock
            .add_exchange(e1, provider, vec![h.cusd.address, h.celo.address]);
        h.mock
            .add_exchange(e2, provider, vec![h.celo.address, h.usdc.address]);
        h.mock.set_rate(e1, h.cusd.address, h.celo.address, 1, 1);
        h.mock.set_rate(e2, h.celo.address, h.usdc.address, 1, E12);
    }

    #[tokio::test]
    async fn test_direct_swap_completes() {
        let h = harness();
        add_direct_venue(&h);

        let amount = Decimal::from_str("0.001").unwrap();
        let proposal = h
            .executor
            .prepare("cUSD", "USDC", amount, None, None)
            .await
            .unwrap();

        // 0.001 cUSD in base units, min out exactly 99% floored
        assert_eq!(proposal.quotes.amount_in, U256::from(1_000_000_000_000_000u128));
        assert_eq!(proposal.quotes.expected_out, U256::from(1_000u64));
        assert_eq!(proposal.quotes.min_final_out, U256::from(990u64));

        let result = h.executor.execute(proposal).await.unwrap();
        assert_eq!(result.state, SwapState::Completed);
        assert_eq!(result.legs.len(), 1);
        assert_eq!(result.legs[0].status, LegStatus::Confirmed);
        assert!(result.legs[0].tx_hash.is_some());
        assert_eq!(result.remittance, RemittanceStatus::NotRequired);
        assert_eq!(result.amount_out, Some(Decimal::from_str("0.001").unwrap()));
        // exactly one approval, for the exact amount
        assert_eq!(h.mock.approvals_submitted(), 1);
    }

    #[tokio::test]
    async fn test_two_hop_swap_chains_settled_output() {
        let h = harness();
        add_two_hop_venues(&h);

        let amount = Decimal::from_str("2").unwrap();
        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", amount, None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Completed);
        assert_eq!(result.legs.len(), 2);
        assert_eq!(result.legs[0].token_out, result.legs[1].token_in);
        // leg 1 consumed exactly what leg 0 settled
        assert_eq!(
            result.legs[0].settled_out.unwrap(),
            result.legs[1].amount_in
        );
        assert_eq!(result.amount_out, Some(Decimal::from_str("2").unwrap()));
    }

    #[tokio::test]
    async fn test_second_leg_revert_is_partial_completion() {
        let h = harness();
        add_two_hop_venues(&h);
        h.mock.fail_swap_at(1);

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::PartiallyCompleted);
        assert_eq!(result.legs[0].status, LegStatus::Confirmed);
        assert!(result.legs[0].tx_hash.is_some());
        assert_eq!(result.legs[1].status, LegStatus::Reverted);
        assert!(matches!(
            result.error,
            Some(SwapError::SwapReverted { leg: 1, .. })
        ));
        // the caller can see exactly what they are holding
        let (stranded, amount) = result.stranded_asset().unwrap();
        assert_eq!(stranded.symbol, "CELO");
        assert!(amount > U256::ZERO);
    }

    #[tokio::test]
    async fn test_first_leg_revert_is_failed() {
        let h = harness();
        add_direct_venue(&h);
        h.mock.fail_swap_at(0);

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Failed);
        assert!(result.last_confirmed_leg().is_none());
        assert!(matches!(
            result.error,
            Some(SwapError::SwapReverted { leg: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_remittance_to_third_party() {
        let h = harness();
        add_direct_venue(&h);
        let recipient = Address::repeat_byte(0xcc);

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, Some(recipient))
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Completed);
        assert!(matches!(
            result.remittance,
            RemittanceStatus::Completed { .. }
        ));
        // output ended up with the recipient
        assert_eq!(
            h.mock.balance_of(h.usdc.address, recipient),
            U256::from(1_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_failed_remittance_keeps_swap_completed() {
        let h = harness();
        add_direct_venue(&h);
        h.mock.fail_next_transfer();
        let recipient = Address::repeat_byte(0xcc);

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, Some(recipient))
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Completed);
        assert!(result.legs.iter().all(|l| l.status == LegStatus::Confirmed));
        assert!(matches!(result.remittance, RemittanceStatus::Failed { .. }));
        assert!(result.error.is_none());
        // initiator still holds the output
        assert_eq!(
            h.mock.balance_of(h.usdc.address, h.initiator),
            U256::from(1_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_negotiation_falls_back_to_legacy_signature() {
        let h = harness();
        add_direct_venue(&h);
        h.mock.reject_primary_signature();
        h.mock.accept_legacy_signature();

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Completed);
        assert_eq!(h.mock.rejected_calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_negotiation_reports_broker_functions() {
        let h = harness();
        add_direct_venue(&h);
        h.mock.reject_primary_signature();
        // legacy stays rejected by default

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Failed);
        match result.error {
            Some(SwapError::UnknownCallSignature {
                attempted,
                available,
            }) => {
                assert_eq!(attempted.len(), 2);
                assert!(available.iter().any(|f| f == "swapIn"));
            }
            other => panic!("expected UnknownCallSignature, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_route_before_broadcast() {
        let h = harness();
        // no venues at all
        let err = h
            .executor
            .prepare("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::NoRouteFound { .. }));
        assert!(err.is_retry_safe());
        assert_eq!(h.mock.swaps_submitted(), 0);
    }

    #[tokio::test]
    async fn test_reverted_approval_aborts_before_swap() {
        let h = harness();
        add_direct_venue(&h);
        h.mock.fail_next_approval();

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Failed);
        assert!(matches!(
            result.error,
            Some(SwapError::ApprovalReverted { .. })
        ));
        assert_eq!(h.mock.swaps_submitted(), 0);
    }

    #[tokio::test]
    async fn test_balance_read_failure_falls_back_to_quoted_output() {
        let h = harness();
        add_direct_venue(&h);
        let recipient = Address::repeat_byte(0xcc);
        // the post-confirmation read is the plan's second balance read
        h.mock.fail_balance_read_at(1);

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, Some(recipient))
            .await
            .unwrap();

        // a confirmed plan is not abandoned over a failed read
        assert_eq!(result.state, SwapState::Completed);
        assert!(result.error.is_none());
        assert_eq!(result.legs[0].settled_out, Some(U256::from(1_000_000u64)));
        // remittance still ran, with the quoted amount
        assert!(matches!(
            result.remittance,
            RemittanceStatus::Completed { .. }
        ));
        assert_eq!(
            h.mock.balance_of(h.usdc.address, recipient),
            U256::from(1_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_stale_quotes_refreshed_at_execute() {
        let h = harness();
        let id = add_direct_venue(&h);

        let mut proposal = h
            .executor
            .prepare("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();
        proposal.quotes.quoted_at = chrono::Utc::now() - chrono::Duration::seconds(120);
        // the rate doubles while the proposal sits
        h.mock.set_rate(id, h.cusd.address, h.usdc.address, 2, E12);

        let result = h.executor.execute(proposal).await.unwrap();
        assert_eq!(result.state, SwapState::Completed);
        // the executed leg carries the refreshed minimum, not the stale one
        assert_eq!(result.legs[0].min_amount_out, U256::from(1_980_000u64));
        assert_eq!(result.amount_out, Some(Decimal::from_str("0.002").unwrap()));
    }

    #[tokio::test]
    async fn test_stale_requote_failure_is_err_before_broadcast() {
        let h = harness();
        let id = add_direct_venue(&h);

        let mut proposal = h
            .executor
            .prepare("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();
        proposal.quotes.quoted_at = chrono::Utc::now() - chrono::Duration::seconds(120);
        // the venue stops quoting while the proposal sits
        h.mock.set_rate(id, h.cusd.address, h.usdc.address, 0, 1);

        let err = h.executor.execute(proposal).await.unwrap_err();
        assert!(matches!(err, SwapError::QuoteFailed { .. }));
        assert!(err.is_retry_safe());
        assert_eq!(h.mock.swaps_submitted(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_reports_leg_hash() {
        let registry = Arc::new(TokenRegistry::for_network(CELO_MAINNET).unwrap());
        let initiator = Address::repeat_byte(0xaa);
        let mock = Arc::new(MockChainClient::new(initiator));
        let executor = SwapExecutor::new(
            mock.clone(),
            registry.clone(),
            ExecutorSettings {
                confirm_timeout: Duration::from_millis(100),
                ..Default::default()
            },
        );
        let h = Harness {
            cusd: registry.token("cUSD").unwrap().clone(),
            usdc: registry.token("USDC").unwrap().clone(),
            celo: registry.token("CELO").unwrap().clone(),
            mock,
            executor,
            initiator,
        };
        add_direct_venue(&h);
        h.mock.hold_next_receipt();

        let result = h
            .executor
            .plan_and_execute("cUSD", "USDC", Decimal::from(1u32), None, None)
            .await
            .unwrap();

        assert_eq!(result.state, SwapState::Failed);
        assert_eq!(result.legs[0].status, LegStatus::Submitted);
        let leg_hash = result.legs[0].tx_hash.unwrap();
        assert!(matches!(
            result.error,
            Some(SwapError::ConfirmationTimeout { tx_hash, .. }) if tx_hash == leg_hash
        ));
    }

    #[tokio::test]
    async fn test_excessive_slippage_rejected() {
        let h = harness();
        add_direct_venue(&h);
        let err = h
            .executor
            .prepare("cUSD", "USDC", Decimal::from(1u32), Some(9_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidAmount(_)));
    }
}
