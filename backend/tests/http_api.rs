//! End-to-end HTTP behaviour over the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

use wheel_backend::Trace;
use wheel_backend::domain::{GameRules, RulesDocument, TRACE_ID_HEADER, WalletService};
use wheel_backend::inbound::http::health::{HealthState, api_health};
use wheel_backend::inbound::http::state::HttpState;
use wheel_backend::inbound::http::wallet::{
    apply_promo, get_profile, get_wheel, keep_prize, list_transactions, sell_prize, spin,
};
use wheel_backend::inbound::http::{json_config, query_config};
use wheel_backend::outbound::memory::InMemoryLedgerStore;
use wheel_backend::outbound::random::SeededDrawSource;

fn app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let rules = GameRules::try_from(RulesDocument::default()).expect("stock rules");
    let wallet = WalletService::new(
        Arc::new(InMemoryLedgerStore::new(Arc::new(DefaultClock))),
        Arc::new(SeededDrawSource::new(3)),
        Arc::new(rules),
    );
    App::new()
        .app_data(web::Data::new(HealthState::new()))
        .app_data(web::Data::new(HttpState::new(Arc::new(wallet))))
        .app_data(json_config())
        .app_data(query_config())
        .wrap(Trace)
        .service(api_health)
        .service(get_profile)
        .service(get_wheel)
        .service(spin)
        .service(keep_prize)
        .service(sell_prize)
        .service(apply_promo)
        .service(list_transactions)
}

#[rstest]
#[actix_web::test]
async fn player_journey_keeps_balance_and_history_in_step() {
    let app = actix_test::init_service(app()).await;

    let me: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/me?telegramId=555")
            .to_request(),
    )
    .await;
    assert_eq!(me["user"]["balance"], json!(5.0));
    assert_eq!(me["user"]["username"], json!("User_555"));

    let spun: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({"telegramId": 555}))
            .to_request(),
    )
    .await;
    assert_eq!(spun["newBalance"], json!(4.0));
    let game_id = spun["gameId"].as_str().expect("game id").to_owned();

    let kept: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/prize/keep")
            .set_json(json!({"telegramId": "555", "gameId": game_id}))
            .to_request(),
    )
    .await;
    assert_eq!(kept["name"], spun["prize"]["name"]);
    let item_id = kept["id"].as_str().expect("item id").to_owned();

    let sold: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/prize/sell")
            .set_json(json!({"telegramId": "555", "itemId": item_id}))
            .to_request(),
    )
    .await;
    assert_eq!(sold["newBalance"], json!(4.0));

    let promo: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/promo/apply")
            .set_json(json!({"telegramId": "555", "code": "gift5"}))
            .to_request(),
    )
    .await;
    assert_eq!(promo["newBalance"], json!(9.0));

    let history: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/transactions?telegramId=555&limit=2")
            .to_request(),
    )
    .await;
    let kinds: Vec<_> = history["transactions"]
        .as_array()
        .expect("transactions")
        .iter()
        .map(|entry| entry["type"].clone())
        .collect();
    assert_eq!(kinds, [json!("promo"), json!("prize_sell")]);
}

#[rstest]
#[actix_web::test]
async fn spin_before_profile_is_not_found_with_trace_id() {
    let app = actix_test::init_service(app()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({"telegramId": "nobody"}))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .expect("trace-id header")
        .to_owned();
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], json!("user_not_found"));
    assert_eq!(body["traceId"], json!(header));
}

#[rstest]
#[actix_web::test]
async fn second_promo_redemption_conflicts() {
    let app = actix_test::init_service(app()).await;
    let _: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/me?telegramId=7")
            .to_request(),
    )
    .await;

    let redeem = || {
        actix_test::TestRequest::post()
            .uri("/api/promo/apply")
            .set_json(json!({"telegramId": "7", "code": "BONUS"}))
            .to_request()
    };
    let first = actix_test::call_service(&app, redeem()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = actix_test::call_service(&app, redeem()).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn client_supplied_stake_cannot_make_spins_free() {
    let app = actix_test::init_service(app()).await;
    let opened = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/me?telegramId=8")
            .to_request(),
    )
    .await;
    assert_eq!(opened.status(), StatusCode::OK);

    let spun: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({"telegramId": "8", "stake": 0}))
            .to_request(),
    )
    .await;
    assert_eq!(spun["stake"], json!(1.0));
    assert_eq!(spun["newBalance"], json!(4.0));
}

#[rstest]
#[actix_web::test]
async fn a_spin_is_kept_once_and_only_by_its_player() {
    let app = actix_test::init_service(app()).await;
    for telegram_id in ["9", "10"] {
        let opened = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/me?telegramId={telegram_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(opened.status(), StatusCode::OK);
    }

    let spun: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/spin")
            .set_json(json!({"telegramId": "9"}))
            .to_request(),
    )
    .await;
    let game_id = spun["gameId"].as_str().expect("game id").to_owned();
    let keep = |telegram_id: &str| {
        actix_test::TestRequest::post()
            .uri("/api/prize/keep")
            .set_json(json!({"telegramId": telegram_id, "gameId": game_id}))
            .to_request()
    };

    let foreign = actix_test::call_service(&app, keep("10")).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    let first = actix_test::call_service(&app, keep("9")).await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = actix_test::call_service(&app, keep("9")).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(second).await;
    assert_eq!(body["code"], json!("prize_already_claimed"));
}

#[rstest]
#[actix_web::test]
async fn wheel_and_health_describe_the_service() {
    let app = actix_test::init_service(app()).await;

    let wheel: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get().uri("/api/wheel").to_request(),
    )
    .await;
    assert_eq!(wheel["spinStake"], json!(1.0));
    assert_eq!(wheel["prizes"].as_array().map(Vec::len), Some(2));

    let health: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["service"], json!("wheelsbot-backend"));
}
