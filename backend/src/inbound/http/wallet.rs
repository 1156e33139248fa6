//! Wallet HTTP handlers.
//!
//! ```text
//! GET  /api/me?telegramId=
//! GET  /api/wheel
//! POST /api/spin
//! POST /api/prize/keep
//! POST /api/prize/sell
//! POST /api/promo/apply
//! GET  /api/transactions?telegramId=&limit=
//! ```
//!
//! Handlers validate identity and payload shape, then delegate to the
//! [`WalletCommand`](crate::domain::ports::WalletCommand) port. Balance rules
//! live in the domain.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{PromoOutcome, SaleOutcome, SpinOutcome, WheelInfo};
use crate::domain::{
    ApiResult, Error, InventoryItem, LedgerEntry, Money, Prize, PrizeRule, Profile, UserAccount,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    TelegramIdInput, parse_external_id, parse_game_id, parse_item_id, parse_promo_code,
};

/// Default page size for `GET /api/transactions`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Account fields returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub telegram_id: String,
    pub username: String,
    #[schema(value_type = f64, example = 5.0)]
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(value: UserAccount) -> Self {
        Self {
            id: value.id.to_string(),
            telegram_id: value.external_id.into(),
            username: value.username,
            balance: value.balance,
            created_at: value.created_at,
        }
    }
}

/// A kept prize.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub emoji: String,
    #[schema(value_type = f64)]
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryItem> for InventoryItemResponse {
    fn from(value: InventoryItem) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            emoji: value.emoji,
            price: value.price,
            created_at: value.created_at,
        }
    }
}

/// Response payload for `GET /api/me`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub inventory: Vec<InventoryItemResponse>,
}

impl From<Profile> for ProfileResponse {
    fn from(value: Profile) -> Self {
        Self {
            user: value.account.into(),
            inventory: value.inventory.into_iter().map(Into::into).collect(),
        }
    }
}

/// A prize as shown on the wheel.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrizeResponse {
    pub name: String,
    pub emoji: String,
    #[schema(value_type = f64)]
    pub price: Money,
}

impl From<Prize> for PrizeResponse {
    fn from(value: Prize) -> Self {
        Self {
            name: value.name().to_owned(),
            emoji: value.emoji().to_owned(),
            price: value.price(),
        }
    }
}

/// Identity query shared by read endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProfileQuery {
    /// Platform user identifier.
    pub telegram_id: Option<String>,
}

/// Request payload for `POST /api/spin`.
///
/// The stake is always the configured one; other fields are ignored.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinRequest {
    pub telegram_id: Option<TelegramIdInput>,
}

/// Response payload for `POST /api/spin`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinResponse {
    /// Pass back to `POST /api/prize/keep` to keep the prize.
    #[schema(value_type = String, format = Uuid)]
    pub game_id: String,
    pub prize: PrizeResponse,
    #[schema(value_type = f64)]
    pub stake: Money,
    #[schema(value_type = f64)]
    pub new_balance: Money,
}

impl From<SpinOutcome> for SpinResponse {
    fn from(value: SpinOutcome) -> Self {
        Self {
            game_id: value.game_id.to_string(),
            prize: value.prize.into(),
            stake: value.stake,
            new_balance: value.new_balance,
        }
    }
}

/// Request payload for `POST /api/prize/keep`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeepPrizeRequest {
    pub telegram_id: Option<TelegramIdInput>,
    /// Spin whose prize is kept.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub game_id: Option<String>,
}

/// Request payload for `POST /api/prize/sell`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellPrizeRequest {
    pub telegram_id: Option<TelegramIdInput>,
    pub item_id: Option<String>,
}

/// Response payload for `POST /api/prize/sell`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub item: InventoryItemResponse,
    #[schema(value_type = f64)]
    pub new_balance: Money,
}

impl From<SaleOutcome> for SaleResponse {
    fn from(value: SaleOutcome) -> Self {
        Self {
            item: value.item.into(),
            new_balance: value.new_balance,
        }
    }
}

/// Request payload for `POST /api/promo/apply`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoRequest {
    pub telegram_id: Option<TelegramIdInput>,
    pub code: Option<String>,
}

/// Response payload for `POST /api/promo/apply`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoResponse {
    pub code: String,
    #[schema(value_type = f64)]
    pub amount: Money,
    #[schema(value_type = f64)]
    pub new_balance: Money,
}

impl From<PromoOutcome> for PromoResponse {
    fn from(value: PromoOutcome) -> Self {
        Self {
            code: value.code.into(),
            amount: value.amount,
            new_balance: value.new_balance,
        }
    }
}

/// Query for `GET /api/transactions`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionsQuery {
    /// Platform user identifier.
    pub telegram_id: Option<String>,
    /// Page size; defaults to 20 and is capped at 100.
    pub limit: Option<usize>,
}

/// One ledger entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    /// `spin`, `prize_sell`, or `promo`.
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = f64)]
    pub amount: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionResponse {
    fn from(value: LedgerEntry) -> Self {
        Self {
            id: value.id.to_string(),
            kind: value.kind.as_str().to_owned(),
            amount: value.amount,
            description: value.description,
            created_at: value.created_at,
        }
    }
}

/// Response payload for `GET /api/transactions`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

/// Response payload for `GET /api/wheel`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WheelResponse {
    #[schema(value_type = f64)]
    pub spin_stake: Money,
    pub prizes: Vec<PrizeRule>,
}

impl From<WheelInfo> for WheelResponse {
    fn from(value: WheelInfo) -> Self {
        Self {
            spin_stake: value.spin_stake,
            prizes: value.prizes,
        }
    }
}

/// Fetch the caller's account and inventory, creating the account on first use.
#[utoipa::path(
    get,
    path = "/api/me",
    params(ProfileQuery),
    responses(
        (status = 200, description = "Account and inventory", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "getProfile"
)]
#[get("/api/me")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    query: web::Query<ProfileQuery>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let external_id = parse_external_id(query.into_inner().telegram_id.map(TelegramIdInput::Text))?;
    let profile = state.wallet.profile(&external_id).await?;
    Ok(web::Json(ProfileResponse::from(profile)))
}

/// Describe the wheel: default stake and prize table.
#[utoipa::path(
    get,
    path = "/api/wheel",
    responses(
        (status = 200, description = "Wheel configuration", body = WheelResponse)
    ),
    tags = ["wallet"],
    operation_id = "getWheel"
)]
#[get("/api/wheel")]
pub async fn get_wheel(state: web::Data<HttpState>) -> ApiResult<web::Json<WheelResponse>> {
    let wheel = state.wallet.wheel().await?;
    Ok(web::Json(WheelResponse::from(wheel)))
}

/// Debit the stake and draw a prize.
#[utoipa::path(
    post,
    path = "/api/spin",
    request_body = SpinRequest,
    responses(
        (status = 200, description = "Spin committed", body = SpinResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Account not found", body = Error),
        (status = 409, description = "Insufficient balance", body = Error),
        (status = 503, description = "Account busy or storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "spin"
)]
#[post("/api/spin")]
pub async fn spin(
    state: web::Data<HttpState>,
    payload: web::Json<SpinRequest>,
) -> ApiResult<web::Json<SpinResponse>> {
    let SpinRequest { telegram_id } = payload.into_inner();
    let external_id = parse_external_id(telegram_id)?;
    let outcome = state.wallet.spin(&external_id).await?;
    Ok(web::Json(SpinResponse::from(outcome)))
}

/// Keep the prize of one of the caller's spins in the inventory.
#[utoipa::path(
    post,
    path = "/api/prize/keep",
    request_body = KeepPrizeRequest,
    responses(
        (status = 200, description = "Prize kept", body = InventoryItemResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Account or game not found", body = Error),
        (status = 409, description = "Prize already kept", body = Error),
        (status = 503, description = "Account busy or storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "keepPrize"
)]
#[post("/api/prize/keep")]
pub async fn keep_prize(
    state: web::Data<HttpState>,
    payload: web::Json<KeepPrizeRequest>,
) -> ApiResult<web::Json<InventoryItemResponse>> {
    let KeepPrizeRequest {
        telegram_id,
        game_id,
    } = payload.into_inner();
    let external_id = parse_external_id(telegram_id)?;
    let game_id = parse_game_id(game_id)?;
    let item = state.wallet.keep_prize(&external_id, game_id).await?;
    Ok(web::Json(InventoryItemResponse::from(item)))
}

/// Sell a kept prize for its stored price.
#[utoipa::path(
    post,
    path = "/api/prize/sell",
    request_body = SellPrizeRequest,
    responses(
        (status = 200, description = "Prize sold", body = SaleResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Item not found", body = Error),
        (status = 503, description = "Account busy or storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "sellPrize"
)]
#[post("/api/prize/sell")]
pub async fn sell_prize(
    state: web::Data<HttpState>,
    payload: web::Json<SellPrizeRequest>,
) -> ApiResult<web::Json<SaleResponse>> {
    let SellPrizeRequest {
        telegram_id,
        item_id,
    } = payload.into_inner();
    let external_id = parse_external_id(telegram_id)?;
    let item_id = parse_item_id(item_id)?;
    let outcome = state.wallet.sell_prize(&external_id, item_id).await?;
    Ok(web::Json(SaleResponse::from(outcome)))
}

/// Redeem a promo code once per account.
#[utoipa::path(
    post,
    path = "/api/promo/apply",
    request_body = PromoRequest,
    responses(
        (status = 200, description = "Promo credited", body = PromoResponse),
        (status = 400, description = "Invalid request or unknown code", body = Error),
        (status = 409, description = "Already redeemed", body = Error),
        (status = 503, description = "Account busy or storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "applyPromo"
)]
#[post("/api/promo/apply")]
pub async fn apply_promo(
    state: web::Data<HttpState>,
    payload: web::Json<PromoRequest>,
) -> ApiResult<web::Json<PromoResponse>> {
    let PromoRequest { telegram_id, code } = payload.into_inner();
    let external_id = parse_external_id(telegram_id)?;
    let code = parse_promo_code(code)?;
    let outcome = state.wallet.apply_promo(&external_id, &code).await?;
    Ok(web::Json(PromoResponse::from(outcome)))
}

/// List recent ledger entries, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Ledger entries", body = TransactionsResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "listTransactions"
)]
#[get("/api/transactions")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    query: web::Query<TransactionsQuery>,
) -> ApiResult<web::Json<TransactionsResponse>> {
    let TransactionsQuery { telegram_id, limit } = query.into_inner();
    let external_id = parse_external_id(telegram_id.map(TelegramIdInput::Text))?;
    let entries = state
        .wallet
        .history(&external_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    Ok(web::Json(TransactionsResponse {
        transactions: entries.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
#[path = "wallet_tests.rs"]
mod tests;
