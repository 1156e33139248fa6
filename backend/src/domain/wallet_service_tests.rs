//! Tests for the wallet service.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::domain::ports::{FixtureDrawSource, MockLedgerStore};
use crate::domain::{
    ErrorCode, GameId, InventoryItem, LedgerEntryKind, Money, MutationKind, RulesDocument,
    UserAccount, UserId,
};

#[fixture]
fn rules() -> Arc<GameRules> {
    Arc::new(GameRules::try_from(RulesDocument::default()).expect("stock rules"))
}

#[fixture]
fn external() -> ExternalId {
    ExternalId::new("1001").expect("valid id")
}

fn make_service(
    store: MockLedgerStore,
    draw: u64,
    rules: Arc<GameRules>,
) -> WalletService<MockLedgerStore> {
    WalletService::new(Arc::new(store), Arc::new(FixtureDrawSource(draw)), rules)
}

fn applied(amount: i64, balance: i64, kind: LedgerEntryKind) -> AppliedMutation {
    let user_id = UserId::random();
    AppliedMutation {
        user_id,
        new_balance: Money::from_cents(balance),
        entry: LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount: Money::from_cents(amount),
            description: "test".to_owned(),
            created_at: Utc::now(),
        },
        sold_item: None,
        game_id: None,
    }
}

fn spun(balance: i64, game_id: GameId) -> AppliedMutation {
    AppliedMutation {
        game_id: Some(game_id),
        ..applied(-100, balance, LedgerEntryKind::Spin)
    }
}

#[rstest]
#[tokio::test]
async fn profile_creates_account_with_starting_balance(
    rules: Arc<GameRules>,
    external: ExternalId,
) {
    let mut store = MockLedgerStore::new();
    store
        .expect_find_or_create_user()
        .withf(|_, starting| *starting == Money::from_cents(500))
        .times(1)
        .returning(|external_id, starting| {
            Ok(UserAccount {
                id: UserId::random(),
                external_id: external_id.clone(),
                username: external_id.default_username(),
                balance: starting,
                created_at: Utc::now(),
            })
        });
    store
        .expect_list_inventory()
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let profile = make_service(store, 0, rules)
        .profile(&external)
        .await
        .expect("profile loads");
    assert_eq!(profile.account.balance, Money::from_cents(500));
    assert_eq!(profile.account.username, "User_1001");
}

#[rstest]
#[case(0, "Pepe")]
#[case(49, "Pepe")]
#[case(50, "Peach")]
#[case(99, "Peach")]
#[tokio::test]
async fn spin_debits_configured_stake_and_returns_drawn_prize(
    rules: Arc<GameRules>,
    external: ExternalId,
    #[case] draw: u64,
    #[case] expected: &'static str,
) {
    let game_id = GameId::random();
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .withf(move |_, mutation| {
            matches!(
                mutation.kind(),
                MutationKind::SpinDebit { stake, prize }
                    if *stake == Money::from_cents(100) && prize.name() == expected
            )
        })
        .times(1)
        .returning(move |_, _| Ok(spun(400, game_id)));

    let outcome = make_service(store, draw, rules)
        .spin(&external)
        .await
        .expect("spin succeeds");
    assert_eq!(outcome.game_id, game_id);
    assert_eq!(outcome.prize.name(), expected);
    assert_eq!(outcome.stake, Money::from_cents(100));
    assert_eq!(outcome.new_balance, Money::from_cents(400));
}

#[rstest]
#[tokio::test]
async fn configured_stake_is_always_charged(external: ExternalId) {
    let document = RulesDocument {
        spin_stake: Money::from_cents(250),
        ..RulesDocument::default()
    };
    let rules = Arc::new(GameRules::try_from(document).expect("rules"));
    let game_id = GameId::random();
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .withf(|_, mutation| {
            matches!(
                mutation.kind(),
                MutationKind::SpinDebit { stake, .. } if *stake == Money::from_cents(250)
            )
        })
        .times(1)
        .returning(move |_, _| Ok(spun(250, game_id)));

    let outcome = make_service(store, 0, rules)
        .spin(&external)
        .await
        .expect("spin succeeds");
    assert_eq!(outcome.stake, Money::from_cents(250));
}

#[rstest]
#[tokio::test]
async fn spin_without_recorded_game_is_internal(rules: Arc<GameRules>, external: ExternalId) {
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .returning(|_, _| Ok(applied(-100, 400, LedgerEntryKind::Spin)));

    let error = make_service(store, 0, rules)
        .spin(&external)
        .await
        .expect_err("inconsistent adapter result");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[case(
    LedgerStoreError::rejected(MutationRejection::InsufficientBalance {
        balance: Money::from_cents(99),
        required: Money::from_cents(100),
    }),
    ErrorCode::InsufficientBalance
)]
#[case(LedgerStoreError::lock_timeout("canceling statement"), ErrorCode::LockTimeout)]
#[case(LedgerStoreError::connection("pool closed"), ErrorCode::StorageUnavailable)]
#[case(LedgerStoreError::query("syntax"), ErrorCode::InternalError)]
#[case(LedgerStoreError::user_not_found("1001"), ErrorCode::UserNotFound)]
#[tokio::test]
async fn store_failures_are_classified(
    rules: Arc<GameRules>,
    external: ExternalId,
    #[case] failure: LedgerStoreError,
    #[case] expected: ErrorCode,
) {
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let error = make_service(store, 0, rules)
        .spin(&external)
        .await
        .expect_err("store failure surfaces");
    assert_eq!(error.code(), expected);
    assert_eq!(
        error.is_retryable(),
        matches!(
            expected,
            ErrorCode::LockTimeout | ErrorCode::StorageUnavailable
        )
    );
}

#[rstest]
#[tokio::test]
async fn insufficient_balance_reports_amounts(rules: Arc<GameRules>, external: ExternalId) {
    let mut store = MockLedgerStore::new();
    store.expect_apply_mutation().return_once(|_, _| {
        Err(LedgerStoreError::rejected(
            MutationRejection::InsufficientBalance {
                balance: Money::from_cents(99),
                required: Money::from_cents(100),
            },
        ))
    });

    let error = make_service(store, 0, rules)
        .spin(&external)
        .await
        .expect_err("short by one cent");
    let details = error.details().expect("details present");
    assert_eq!(details["balance"], serde_json::json!(0.99));
    assert_eq!(details["required"], serde_json::json!(1.0));
}

#[rstest]
#[tokio::test]
async fn keep_prize_claims_the_spin(rules: Arc<GameRules>, external: ExternalId) {
    let game_id = GameId::random();
    let mut store = MockLedgerStore::new();
    store
        .expect_claim_prize()
        .withf(move |_, id| *id == game_id)
        .times(1)
        .returning(|_, _| {
            Ok(InventoryItem {
                id: InventoryItemId::random(),
                name: "Peach".to_owned(),
                emoji: "🍑".to_owned(),
                price: Money::ZERO,
                created_at: Utc::now(),
            })
        });

    let item = make_service(store, 0, rules)
        .keep_prize(&external, game_id)
        .await
        .expect("prize kept");
    assert_eq!(item.emoji, "🍑");
}

#[rstest]
#[case(
    MutationRejection::GameNotFound { game_id: GameId::from_uuid(Uuid::nil()) },
    ErrorCode::GameNotFound
)]
#[case(
    MutationRejection::PrizeAlreadyClaimed { game_id: GameId::from_uuid(Uuid::nil()) },
    ErrorCode::PrizeAlreadyClaimed
)]
#[tokio::test]
async fn refused_claims_are_classified(
    rules: Arc<GameRules>,
    external: ExternalId,
    #[case] reason: MutationRejection,
    #[case] expected: ErrorCode,
) {
    let mut store = MockLedgerStore::new();
    store
        .expect_claim_prize()
        .return_once(move |_, _| Err(LedgerStoreError::rejected(reason)));

    let error = make_service(store, 0, rules)
        .keep_prize(&external, GameId::from_uuid(Uuid::nil()))
        .await
        .expect_err("claim refused");
    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn sell_prize_returns_removed_item(rules: Arc<GameRules>, external: ExternalId) {
    let item_id = InventoryItemId::random();
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .withf(move |_, mutation| {
            matches!(mutation.kind(), MutationKind::PrizeSale { item_id: id } if *id == item_id)
        })
        .times(1)
        .returning(move |_, _| {
            let mut result = applied(25, 525, LedgerEntryKind::PrizeSell);
            result.sold_item = Some(InventoryItem {
                id: item_id,
                name: "Peach".to_owned(),
                emoji: "🍑".to_owned(),
                price: Money::from_cents(25),
                created_at: Utc::now(),
            });
            Ok(result)
        });

    let outcome = make_service(store, 0, rules)
        .sell_prize(&external, item_id)
        .await
        .expect("sale succeeds");
    assert_eq!(outcome.item.id, item_id);
    assert_eq!(outcome.new_balance, Money::from_cents(525));
}

#[rstest]
#[tokio::test]
async fn sale_without_removed_item_is_internal(rules: Arc<GameRules>, external: ExternalId) {
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .returning(|_, _| Ok(applied(0, 500, LedgerEntryKind::PrizeSell)));

    let error = make_service(store, 0, rules)
        .sell_prize(&external, InventoryItemId::random())
        .await
        .expect_err("inconsistent adapter result");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn promo_credits_catalogue_amount(rules: Arc<GameRules>, external: ExternalId) {
    let mut store = MockLedgerStore::new();
    store
        .expect_apply_mutation()
        .withf(|_, mutation| {
            matches!(
                mutation.kind(),
                MutationKind::PromoCredit { code, amount }
                    if code.as_ref() == "GIFT5" && *amount == Money::from_cents(500)
            )
        })
        .times(1)
        .returning(|_, _| Ok(applied(500, 900, LedgerEntryKind::Promo)));

    let code = PromoCode::new("gift5").expect("code");
    let outcome = make_service(store, 0, rules)
        .apply_promo(&external, &code)
        .await
        .expect("promo applies");
    assert_eq!(outcome.amount, Money::from_cents(500));
    assert_eq!(outcome.new_balance, Money::from_cents(900));
}

#[rstest]
#[tokio::test]
async fn unknown_promo_never_reaches_the_store(rules: Arc<GameRules>, external: ExternalId) {
    let code = PromoCode::new("NOPE").expect("code");
    let error = make_service(MockLedgerStore::new(), 0, rules)
        .apply_promo(&external, &code)
        .await
        .expect_err("unknown code");
    assert_eq!(error.code(), ErrorCode::UnknownPromoCode);
}

#[rstest]
#[tokio::test]
async fn repeated_promo_maps_to_already_redeemed(rules: Arc<GameRules>, external: ExternalId) {
    let mut store = MockLedgerStore::new();
    store.expect_apply_mutation().returning(|_, mutation| {
        let MutationKind::PromoCredit { code, .. } = mutation.kind() else {
            panic!("expected promo credit");
        };
        Err(LedgerStoreError::rejected(
            MutationRejection::AlreadyRedeemed { code: code.clone() },
        ))
    });

    let code = PromoCode::new("BONUS").expect("code");
    let error = make_service(store, 0, rules)
        .apply_promo(&external, &code)
        .await
        .expect_err("already redeemed");
    assert_eq!(error.code(), ErrorCode::AlreadyRedeemed);
    assert!(!error.is_retryable());
}

#[rstest]
#[case(0, 1)]
#[case(20, 20)]
#[case(500, HISTORY_LIMIT_MAX)]
#[tokio::test]
async fn history_limit_is_clamped(
    rules: Arc<GameRules>,
    external: ExternalId,
    #[case] requested: usize,
    #[case] forwarded: usize,
) {
    let mut store = MockLedgerStore::new();
    store
        .expect_list_entries()
        .withf(move |_, limit| *limit == forwarded)
        .times(1)
        .returning(|_, _| Ok(Vec::new()));

    let entries = make_service(store, 0, rules)
        .history(&external, requested)
        .await
        .expect("history loads");
    assert!(entries.is_empty());
}

#[rstest]
#[tokio::test]
async fn wheel_lists_prize_table(rules: Arc<GameRules>) {
    let info = make_service(MockLedgerStore::new(), 0, rules)
        .wheel()
        .await
        .expect("wheel info");
    assert_eq!(info.spin_stake, Money::from_cents(100));
    let names: Vec<_> = info.prizes.iter().map(|prize| prize.name.as_str()).collect();
    assert_eq!(names, ["Pepe", "Peach"]);
}
