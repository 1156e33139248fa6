//! Shared validation helpers for inbound HTTP adapters.

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, ExternalId, GameId, InventoryItemId, PromoCode};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const TELEGRAM_ID: FieldName = FieldName::new("telegramId");
pub(crate) const ITEM_ID: FieldName = FieldName::new("itemId");
pub(crate) const CODE: FieldName = FieldName::new("code");
pub(crate) const GAME_ID: FieldName = FieldName::new("gameId");

fn field_error(field: FieldName, message: String, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Platform identifier as sent by clients: Telegram ids arrive as numbers
/// from some clients and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TelegramIdInput {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier.
    Text(String),
}

impl TelegramIdInput {
    fn into_raw(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

pub(crate) fn parse_external_id(value: Option<TelegramIdInput>) -> Result<ExternalId, Error> {
    let raw = value
        .ok_or_else(|| missing_field_error(TELEGRAM_ID))?
        .into_raw();
    ExternalId::new(&raw)
        .map_err(|err| value_error(TELEGRAM_ID, err.to_string(), ErrorCode::InvalidValue, &raw))
}

fn parse_uuid(field: FieldName, value: Option<String>) -> Result<Uuid, Error> {
    let raw = value.ok_or_else(|| missing_field_error(field))?;
    Uuid::parse_str(raw.trim()).map_err(|_| {
        value_error(
            field,
            format!("{} must be a valid UUID", field.as_str()),
            ErrorCode::InvalidUuid,
            &raw,
        )
    })
}

pub(crate) fn parse_item_id(value: Option<String>) -> Result<InventoryItemId, Error> {
    parse_uuid(ITEM_ID, value).map(InventoryItemId::from_uuid)
}

pub(crate) fn parse_game_id(value: Option<String>) -> Result<GameId, Error> {
    parse_uuid(GAME_ID, value).map(GameId::from_uuid)
}

pub(crate) fn parse_promo_code(value: Option<String>) -> Result<PromoCode, Error> {
    let raw = value.ok_or_else(|| missing_field_error(CODE))?;
    PromoCode::new(&raw)
        .map_err(|err| value_error(CODE, err.to_string(), ErrorCode::InvalidValue, &raw))
}
