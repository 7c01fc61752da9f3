//! Contention-tolerant submission.
//!
//! Every submission first makes sure the signer holds a gas coin. A failure
//! classified as contention (insufficient gas or a consumed object version)
//! triggers a refund, a full rebuild of the plan from fresh ledger reads and
//! a resubmit, up to the configured attempt bound.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use objsync_core::{
    Address, DynLedger, ExecutionMode, ExecutionStatus, LedgerError, PublishPlan, SUI_COIN_TYPE, Signer,
    TransactionEffects, TransactionPlan,
};

use crate::error::{ProvisionError, ProvisionResult};
use crate::retry::{Exhausted, Retried, RetryPolicy, retry_with};

/// Effects of a successful submission.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub effects: TransactionEffects,
    pub attempts: u32,
}

/// Submits plans on behalf of one signer.
#[derive(Clone)]
pub struct FundingExecutor {
    ledger: DynLedger,
    signer: Arc<dyn Signer>,
    policy: RetryPolicy,
    gas_budget: u64,
}

impl FundingExecutor {
    pub fn new(ledger: DynLedger, signer: Arc<dyn Signer>, policy: RetryPolicy) -> Self {
        Self {
            ledger,
            signer,
            policy,
            gas_budget: objsync_core::DEFAULT_GAS_BUDGET,
        }
    }

    pub fn with_gas_budget(mut self, gas_budget: u64) -> Self {
        self.gas_budget = gas_budget;
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn ledger(&self) -> &DynLedger {
        &self.ledger
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Requests faucet gas when the signer holds no gas coin.
    ///
    /// Networks without a faucet are left alone; the submission itself then
    /// reports the shortage.
    pub async fn ensure_funded(&self) -> ProvisionResult<()> {
        let address = self.address();
        let coins = self.ledger.get_coins(address, SUI_COIN_TYPE).await?;
        if coins.iter().any(|coin| coin.balance > 0) {
            return Ok(());
        }

        tracing::info!(%address, "signer has no gas coins, requesting faucet funds");
        self.request_faucet(address).await
    }

    /// Requests faucet gas regardless of the current balance.
    pub async fn refund(&self) -> ProvisionResult<()> {
        let address = self.address();
        tracing::info!(%address, "previous attempt ran out of gas, requesting faucet funds");
        self.request_faucet(address).await
    }

    async fn request_faucet(&self, address: Address) -> ProvisionResult<()> {
        match self.ledger.request_funds(address).await {
            Ok(()) => Ok(()),
            Err(LedgerError::Unsupported { message }) => {
                tracing::warn!(%address, %message, "no faucet available");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Funds the signer before an attempt. A previous insufficient-gas
    /// failure forces a faucet request even when some gas coin exists.
    async fn fund(&self, needs_refund: &AtomicBool) -> ProvisionResult<()> {
        if needs_refund.swap(false, Ordering::SeqCst) {
            self.refund().await
        } else {
            self.ensure_funded().await
        }
    }

    /// Builds and submits a plan, rebuilding it after every contention
    /// failure.
    ///
    /// `build` runs once per attempt so shared object references are
    /// re-read. Dry runs make a single unfunded attempt.
    pub async fn submit_with_funding_retry<B, Fut>(
        &self,
        mode: ExecutionMode,
        mut build: B,
    ) -> ProvisionResult<Submitted>
    where
        B: FnMut() -> Fut,
        Fut: Future<Output = ProvisionResult<TransactionPlan>>,
    {
        if mode.is_dry_run() {
            let plan = build().await?.with_gas_budget(self.gas_budget);
            let effects = self.submit_once(&plan, mode).await?;
            return Ok(Submitted {
                effects,
                attempts: 1,
            });
        }

        let needs_refund = AtomicBool::new(false);
        let result = retry_with(&self.policy, is_contention, |attempt| {
            let plan = build();
            let needs_refund = &needs_refund;
            async move {
                self.fund(needs_refund).await?;
                let plan = plan.await?.with_gas_budget(self.gas_budget);
                tracing::debug!(label = %plan.label, attempt, calls = plan.calls.len(), "submitting");
                let outcome = self.submit_once(&plan, ExecutionMode::Execute).await;
                needs_refund.store(is_out_of_gas(&outcome), Ordering::SeqCst);
                outcome
            }
        })
        .await;

        self.finish(result)
    }

    /// Publishes a package with the same funding and retry rules.
    pub async fn publish_with_funding_retry(&self, plan: &PublishPlan) -> ProvisionResult<Submitted> {
        let mut plan = plan.clone();
        plan.gas_budget = self.gas_budget;

        let needs_refund = AtomicBool::new(false);
        let result = retry_with(&self.policy, is_contention, |attempt| {
            let plan = &plan;
            let needs_refund = &needs_refund;
            async move {
                self.fund(needs_refund).await?;
                tracing::debug!(label = %plan.label, attempt, modules = plan.modules.len(), "publishing");
                let outcome = match self.ledger.publish(plan, self.signer.as_ref()).await {
                    Ok(effects) => ensure_success(effects),
                    Err(err) => Err(err.into()),
                };
                needs_refund.store(is_out_of_gas(&outcome), Ordering::SeqCst);
                outcome
            }
        })
        .await;

        self.finish(result)
    }

    async fn submit_once(
        &self,
        plan: &TransactionPlan,
        mode: ExecutionMode,
    ) -> ProvisionResult<TransactionEffects> {
        let effects = self.ledger.submit(plan, self.signer.as_ref(), mode).await?;
        ensure_success(effects)
    }

    fn finish(
        &self,
        result: Result<Retried<TransactionEffects>, Exhausted<ProvisionError>>,
    ) -> ProvisionResult<Submitted> {
        match result {
            Ok(retried) => {
                tracing::info!(
                    digest = %retried.value.digest,
                    attempts = retried.attempts,
                    created = retried.value.created.len(),
                    "transaction executed"
                );
                Ok(Submitted {
                    effects: retried.value,
                    attempts: retried.attempts,
                })
            }
            Err(Exhausted {
                error: ProvisionError::Ledger(source),
                attempts,
                retryable: true,
            }) => Err(ProvisionError::Contention { attempts, source }),
            Err(exhausted) => Err(exhausted.error),
        }
    }
}

fn is_contention(err: &ProvisionError) -> bool {
    matches!(err, ProvisionError::Ledger(ledger) if ledger.is_contention())
}

fn is_out_of_gas<T>(outcome: &ProvisionResult<T>) -> bool {
    matches!(
        outcome,
        Err(ProvisionError::Ledger(LedgerError::InsufficientGas { .. }))
    )
}

/// Turns a failed execution status into an error, classifying the
/// ledger's message.
fn ensure_success(effects: TransactionEffects) -> ProvisionResult<TransactionEffects> {
    match &effects.status {
        ExecutionStatus::Success => Ok(effects),
        ExecutionStatus::Failure { error } => {
            Err(LedgerError::from_execution_failure(error).into())
        }
    }
}
