//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the wallet and health endpoints together with their
//! request, response, and error schemas. The document backs Swagger UI in
//! debug builds and is exported via `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, PrizeRule};
use crate::inbound::http::health::HealthResponse;
use crate::inbound::http::validation::TelegramIdInput;
use crate::inbound::http::wallet::{
    InventoryItemResponse, KeepPrizeRequest, PrizeResponse, ProfileResponse, PromoRequest,
    PromoResponse, SaleResponse, SellPrizeRequest, SpinRequest, SpinResponse, TransactionResponse,
    TransactionsResponse, UserResponse, WheelResponse,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Prize wheel wallet API",
        description = "Balances, spins, inventory, and promo codes for wheel players."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::wallet::get_profile,
        crate::inbound::http::wallet::get_wheel,
        crate::inbound::http::wallet::spin,
        crate::inbound::http::wallet::keep_prize,
        crate::inbound::http::wallet::sell_prize,
        crate::inbound::http::wallet::apply_promo,
        crate::inbound::http::wallet::list_transactions,
        crate::inbound::http::health::api_health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        PrizeRule,
        TelegramIdInput,
        HealthResponse,
        UserResponse,
        InventoryItemResponse,
        ProfileResponse,
        PrizeResponse,
        SpinRequest,
        SpinResponse,
        KeepPrizeRequest,
        SellPrizeRequest,
        SaleResponse,
        PromoRequest,
        PromoResponse,
        TransactionResponse,
        TransactionsResponse,
        WheelResponse,
    )),
    tags(
        (name = "wallet", description = "Balance-changing and read operations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
