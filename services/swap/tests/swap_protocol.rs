//! End-to-end protocol scenarios against in-memory collaborators

use claims::AesGcmEnvelope;
use config::ServiceConfig;
use futures::future::join_all;
use message_queue::{MessageConsumer, MessageQueue};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use storage::{PoolStore, TransactionLedger};
use swap_service::{DeliveryOutcome, SettleOutcome, SwapError, SwapService};
use types::{
    Asset, AssetQuote, CreatePoolRequest, Decimal, LiquidityPool, ManualClock, PoolName,
    SettlementMessage, SwapIntent, Transaction, TransactionState,
};

const TOLERANCE: Decimal = dec!(0.000000001);

fn close(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= TOLERANCE
}

struct Harness {
    service: SwapService,
    clock: Arc<ManualClock>,
}

fn harness_with(config: ServiceConfig) -> Harness {
    let clock = Arc::new(ManualClock::default());
    let service = SwapService::in_memory(
        &config,
        Arc::new(AesGcmEnvelope::ephemeral()),
        clock.clone(),
    )
    .unwrap();
    Harness { service, clock }
}

fn harness() -> Harness {
    harness_with(ServiceConfig::default())
}

fn apples_bananas() -> PoolName {
    PoolName::for_pair(Asset::Apples, Asset::Bananas).unwrap()
}

fn apples_for_bananas(amount: Decimal) -> SwapIntent {
    SwapIntent {
        asset_name_in: Asset::Apples,
        asset_amount_in: amount,
        asset_name_out: Asset::Bananas,
    }
}

impl Harness {
    async fn seed_pool(&self) -> LiquidityPool {
        self.service
            .pools
            .create_pool(
                "Apples-Bananas",
                &CreatePoolRequest {
                    asset_one: Some(AssetQuote::new(dec!(100), dec!(10))),
                    asset_two: Some(AssetQuote::new(dec!(1000), dec!(1))),
                },
            )
            .await
            .unwrap()
    }

    async fn pool(&self) -> LiquidityPool {
        self.service.pool_store.load(&apples_bananas()).await.unwrap()
    }

    async fn estimate_and_submit(&self, request_id: &str, amount: Decimal) -> String {
        let estimate = self
            .service
            .orchestrator
            .estimate(request_id, &apples_for_bananas(amount))
            .await
            .unwrap();
        self.service
            .orchestrator
            .submit(&estimate.swap_claim_token)
            .await
            .unwrap()
    }

    /// STARTED transaction whose settlement names a pool that was never created
    async fn publish_orphan_settlement(&self) {
        self.service
            .ledger
            .create_if_absent(Transaction::started("orphan", self.clock_now()))
            .await
            .unwrap();
        let message = SettlementMessage {
            contract_id: "orphan".to_string(),
            swap_intent: SwapIntent {
                asset_name_in: Asset::Lemons,
                asset_amount_in: dec!(1),
                asset_name_out: Asset::Limes,
            },
        };
        self.service
            .queue
            .publish(serde_json::to_vec(&message).unwrap())
            .await
            .unwrap();
    }

    async fn deliver_next(&self) -> DeliveryOutcome {
        let delivery = self.service.consumer.receive().await.unwrap().unwrap();
        self.service.worker.handle(delivery).await
    }
}

#[tokio::test]
async fn estimate_submit_settle_updates_pool() {
    let h = harness();
    let created = h.seed_pool().await;

    let estimate = h
        .service
        .orchestrator
        .estimate("req-1", &apples_for_bananas(dec!(10)))
        .await
        .unwrap();
    let quote = &estimate.swap_quote;
    assert_eq!(quote.in_name, Asset::Apples);
    assert_eq!(quote.in_leg, AssetQuote::new(dec!(10), dec!(10)));
    assert_eq!(quote.out_name, Asset::Bananas);
    assert!(close(quote.out_leg.amount, dec!(90.909090909090909)));
    assert!(close(quote.out_leg.price, dec!(1.1)));

    // Estimate persists nothing
    assert_eq!(h.pool().await, created);
    assert!(h.service.ledger.is_empty());

    let transaction_id = h
        .service
        .orchestrator
        .submit(&estimate.swap_claim_token)
        .await
        .unwrap();
    assert_eq!(transaction_id, "req-1");
    let record = h.service.orchestrator.get_transaction("req-1").await.unwrap();
    assert_eq!(record.transaction_state, TransactionState::Started);
    assert_eq!(h.service.queue.published_count(), 1);

    h.clock.advance(chrono::Duration::seconds(5));
    match h.deliver_next().await {
        DeliveryOutcome::Acked(SettleOutcome::Settled(applied)) => {
            assert_eq!(&applied, quote);
        }
        other => panic!("expected settlement, got {:?}", other),
    }

    let pool = h.pool().await;
    assert_eq!(pool.asset_one.amount, dec!(110));
    assert!(close(pool.asset_two.amount, dec!(909.09090909090909)));
    assert!(close(pool.asset_one.market_cap(), dec!(1000)));
    assert!(close(pool.asset_two.market_cap(), dec!(1000)));
    assert_eq!(pool.created_at, created.created_at);
    assert_eq!(pool.updated_at, Some(h.clock_now()));

    let record = h.service.orchestrator.get_transaction("req-1").await.unwrap();
    assert_eq!(record.transaction_state, TransactionState::Finished);
    assert_eq!(record.applied_quote.as_ref(), Some(quote));
    assert_eq!(record.time_started, created.created_at);
    assert_eq!(record.time_completed, Some(h.clock_now()));
}

impl Harness {
    fn clock_now(&self) -> types::Timestamp {
        use types::Clock;
        self.clock.now()
    }
}

#[tokio::test]
async fn claim_cannot_be_submitted_twice() {
    let h = harness();
    h.seed_pool().await;
    let estimate = h
        .service
        .orchestrator
        .estimate("req-2", &apples_for_bananas(dec!(1)))
        .await
        .unwrap();

    h.service
        .orchestrator
        .submit(&estimate.swap_claim_token)
        .await
        .unwrap();
    let err = h
        .service
        .orchestrator
        .submit(&estimate.swap_claim_token)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Claim is already used.");
    assert_eq!(h.service.ledger.len(), 1);
    assert_eq!(h.service.queue.published_count(), 1);
}

#[tokio::test]
async fn expired_claim_leaves_ledger_untouched() {
    let h = harness();
    h.seed_pool().await;
    let token = h
        .service
        .orchestrator
        .estimate("req-3", &apples_for_bananas(dec!(1)))
        .await
        .unwrap()
        .swap_claim_token;

    h.clock.advance(chrono::Duration::seconds(91));
    let err = h.service.orchestrator.submit(&token).await.unwrap_err();
    assert!(matches!(err, SwapError::Expired { .. }));
    assert_eq!(err.to_string(), "Claim is expired.");
    assert!(h.service.ledger.is_empty());
    assert_eq!(h.service.queue.published_count(), 0);
}

#[tokio::test]
async fn claim_valid_at_exact_expiry() {
    let h = harness();
    h.seed_pool().await;
    let token = h
        .service
        .orchestrator
        .estimate("req-4", &apples_for_bananas(dec!(1)))
        .await
        .unwrap()
        .swap_claim_token;

    h.clock.advance(chrono::Duration::seconds(90));
    assert!(h.service.orchestrator.submit(&token).await.is_ok());
}

#[tokio::test]
async fn tampered_token_is_malformed() {
    let h = harness();
    h.seed_pool().await;
    let token = h
        .service
        .orchestrator
        .estimate("req-5", &apples_for_bananas(dec!(1)))
        .await
        .unwrap()
        .swap_claim_token;

    let mut chars: Vec<char> = token.chars().collect();
    let mid = chars.len() / 2;
    chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    for bad in [tampered.as_str(), "", "definitely not a claim"] {
        let err = h.service.orchestrator.submit(bad).await.unwrap_err();
        assert!(matches!(err, SwapError::MalformedClaim));
        assert_eq!(err.to_string(), "Invalid swap claim.");
    }
    assert!(h.service.ledger.is_empty());
}

#[tokio::test]
async fn estimate_requires_existing_pool() {
    let h = harness();
    let err = h
        .service
        .orchestrator
        .estimate("req-6", &apples_for_bananas(dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Liquidity pool does not exist.");
}

#[tokio::test]
async fn zero_amount_swap_prices_to_nothing() {
    let h = harness();
    h.seed_pool().await;
    let estimate = h
        .service
        .orchestrator
        .estimate("req-7", &apples_for_bananas(dec!(0)))
        .await
        .unwrap();
    assert_eq!(estimate.swap_quote.out_leg.amount, Decimal::ZERO);
    assert_eq!(estimate.swap_quote.out_leg.price, dec!(1));
}

#[tokio::test]
async fn unreadable_or_unknown_messages_are_discarded() {
    let h = harness();
    h.seed_pool().await;
    let before = h.pool().await;

    let outcome = h.service.orchestrator.settle(b"{not json").await.unwrap();
    assert_eq!(outcome, SettleOutcome::Discarded);

    let stray = SettlementMessage {
        contract_id: "never-submitted".to_string(),
        swap_intent: apples_for_bananas(dec!(5)),
    };
    let outcome = h
        .service
        .orchestrator
        .settle(&serde_json::to_vec(&stray).unwrap())
        .await
        .unwrap();
    assert_eq!(outcome, SettleOutcome::Discarded);
    assert_eq!(h.pool().await, before);
}

#[tokio::test]
async fn redelivered_settlement_does_not_double_apply() {
    let h = harness();
    h.seed_pool().await;
    h.estimate_and_submit("req-8", dec!(10)).await;

    let delivery = h.service.consumer.receive().await.unwrap().unwrap();
    let payload = delivery.payload.clone();
    h.service.worker.handle(delivery).await;
    let settled = h.pool().await;

    // Same message delivered again by the queue
    h.service.queue.publish(payload).await.unwrap();
    assert_eq!(
        h.deliver_next().await,
        DeliveryOutcome::Acked(SettleOutcome::Duplicate)
    );
    assert_eq!(h.pool().await.asset_one, settled.asset_one);
    assert_eq!(h.pool().await.asset_two, settled.asset_two);
}

#[tokio::test]
async fn settlement_for_missing_pool_is_dead_lettered() {
    let h = harness();
    h.publish_orphan_settlement().await;

    assert_eq!(h.deliver_next().await, DeliveryOutcome::DeadLettered);
    let letters = h.service.dead_letters.letters();
    assert_eq!(letters.len(), 1);
    assert!(letters[0].reason.contains("Lemons-Limes"));
    assert_eq!(h.service.consumer.in_flight_count(), 0);

    let record = h.service.ledger.load("orphan").await.unwrap();
    assert_eq!(record.transaction_state, TransactionState::Started);
}

#[tokio::test]
async fn store_outage_retries_then_dead_letters() {
    let mut config = ServiceConfig::default();
    config.settlement.max_delivery_attempts = 2;
    let h = harness_with(config);
    h.seed_pool().await;
    h.estimate_and_submit("req-9", dec!(3)).await;

    h.service.pool_store.set_unavailable(true);
    assert_eq!(h.deliver_next().await, DeliveryOutcome::Retried);
    assert_eq!(h.deliver_next().await, DeliveryOutcome::DeadLettered);
    assert_eq!(h.service.dead_letters.count(), 1);
    assert!(h.service.dead_letters.letters()[0]
        .reason
        .contains("after 2 attempts"));
}

#[tokio::test]
async fn dead_letter_write_failure_returns_message_for_redelivery() {
    let h = harness();
    h.publish_orphan_settlement().await;

    h.service.dead_letters.fail_next_write();
    assert_eq!(h.deliver_next().await, DeliveryOutcome::Retried);
    assert_eq!(h.service.dead_letters.count(), 0);
    assert_eq!(h.service.consumer.in_flight_count(), 0);

    assert_eq!(h.deliver_next().await, DeliveryOutcome::DeadLettered);
    assert_eq!(h.service.dead_letters.count(), 1);
    assert_eq!(h.service.consumer.in_flight_count(), 0);
}

#[tokio::test]
async fn worker_keeps_settling_after_dead_letter_failure() {
    let mut config = ServiceConfig::default();
    config.settlement.redelivery_delay_ms = 5;
    let h = Arc::new(harness_with(config));
    h.seed_pool().await;
    h.publish_orphan_settlement().await;
    h.service.dead_letters.fail_next_write();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let runner = {
        let h = h.clone();
        tokio::spawn(async move { h.service.worker.run(shutdown_rx).await })
    };

    let transaction_id = h.estimate_and_submit("req-dl", dec!(10)).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let record = h.service.ledger.load(&transaction_id).await.unwrap();
            if record.is_finished() && h.service.dead_letters.count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker settled the swap and parked the orphan");
    assert_eq!(h.pool().await.asset_one.amount, dec!(110));
    assert_eq!(h.service.consumer.in_flight_count(), 0);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("worker stopped")
        .unwrap();
}

#[tokio::test]
async fn ack_failure_does_not_block_later_settlements() {
    let h = harness();
    h.seed_pool().await;
    h.estimate_and_submit("req-ack-1", dec!(10)).await;

    h.service.consumer.fail_next_ack();
    assert!(matches!(
        h.deliver_next().await,
        DeliveryOutcome::Acked(SettleOutcome::Settled(_))
    ));
    // Unacked delivery stays with the queue
    assert_eq!(h.service.consumer.in_flight_count(), 1);

    h.estimate_and_submit("req-ack-2", dec!(5)).await;
    assert!(matches!(
        h.deliver_next().await,
        DeliveryOutcome::Acked(SettleOutcome::Settled(_))
    ));
    assert_eq!(h.pool().await.asset_one.amount, dec!(115));
}

#[tokio::test]
async fn failed_reopen_dead_letters_inconsistent_transaction() {
    let h = harness();
    h.seed_pool().await;
    h.estimate_and_submit("req-reopen", dec!(10)).await;

    h.service.pool_store.fail_next_write();
    h.service.ledger.fail_next_overwrite();
    assert_eq!(h.deliver_next().await, DeliveryOutcome::DeadLettered);

    let letters = h.service.dead_letters.letters();
    assert_eq!(letters.len(), 1);
    assert!(letters[0].reason.contains("req-reopen"));
    assert!(letters[0]
        .reason
        .contains("marked finished without a pool update"));
    assert_eq!(h.service.consumer.in_flight_count(), 0);

    // Ledger and pool disagree; the dead letter is the record of it
    let record = h.service.ledger.load("req-reopen").await.unwrap();
    assert_eq!(record.transaction_state, TransactionState::Finished);
    assert_eq!(h.pool().await.asset_one.amount, dec!(100));
}

#[tokio::test]
async fn failed_pool_write_reopens_transaction_for_retry() {
    let h = harness();
    h.seed_pool().await;
    h.estimate_and_submit("req-10", dec!(10)).await;

    h.service.pool_store.fail_next_write();
    assert_eq!(h.deliver_next().await, DeliveryOutcome::Retried);
    let record = h.service.ledger.load("req-10").await.unwrap();
    assert_eq!(record.transaction_state, TransactionState::Started);
    assert_eq!(record.applied_quote, None);
    assert_eq!(h.pool().await.asset_one.amount, dec!(100));

    assert!(matches!(
        h.deliver_next().await,
        DeliveryOutcome::Acked(SettleOutcome::Settled(_))
    ));
    assert_eq!(h.pool().await.asset_one.amount, dec!(110));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submits_of_one_claim_have_one_winner() {
    let h = harness();
    h.seed_pool().await;
    let token = h
        .service
        .orchestrator
        .estimate("req-11", &apples_for_bananas(dec!(2)))
        .await
        .unwrap()
        .swap_claim_token;

    let tasks = (0..16).map(|_| {
        let orchestrator = h.service.orchestrator.clone();
        let token = token.clone();
        tokio::spawn(async move { orchestrator.submit(&token).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.to_string() == "Claim is already used."));
    assert_eq!(h.service.queue.published_count(), 1);
}

#[tokio::test]
async fn worker_settles_until_shutdown() {
    let h = harness();
    h.seed_pool().await;
    let Harness { service, clock: _ } = h;
    let service = Arc::new(service);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let runner = {
        let service = service.clone();
        tokio::spawn(async move { service.worker.run(shutdown_rx).await })
    };

    for (i, amount) in [dec!(1), dec!(2), dec!(3)].into_iter().enumerate() {
        let estimate = service
            .orchestrator
            .estimate(&format!("req-w{}", i), &apples_for_bananas(amount))
            .await
            .unwrap();
        service
            .orchestrator
            .submit(&estimate.swap_claim_token)
            .await
            .unwrap();
    }

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let pool = service.pool_store.load(&apples_bananas()).await.unwrap();
            if pool.asset_one.amount == dec!(106) {
                break pool;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker settled all swaps");
    assert!(close(settled.asset_one.market_cap(), settled.asset_two.market_cap()));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("worker stopped")
        .unwrap();

    for i in 0..3 {
        let record = service
            .orchestrator
            .get_transaction(&format!("req-w{}", i))
            .await
            .unwrap();
        assert!(record.is_finished());
    }
}
