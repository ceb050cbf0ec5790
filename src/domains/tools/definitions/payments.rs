//! Payments tools: orders and coupons.
//!
//! Order and coupon endpoints are scoped by `altId`/`altType`; both default
//! to the configured location.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt_string, to_body, with_client};
use crate::clients::GhlApiClient;
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::provider::ProviderTable;

pub const CATEGORY: &str = "Payments";

pub const LIST_ORDERS: &str = "list_orders";
pub const GET_ORDER: &str = "get_order";
pub const LIST_COUPONS: &str = "list_coupons";
pub const CREATE_COUPON: &str = "create_coupon";

const LOCATION_ALT_TYPE: &str = "location";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListOrdersParams {
    /// Location or agency ID. Defaults to the configured location.
    pub alt_id: Option<String>,
    /// Type of `altId` (default: "location")
    pub alt_type: Option<String>,
    /// Filter by order status
    pub status: Option<String>,
    /// Filter by payment mode: "live" or "test"
    pub payment_mode: Option<String>,
    /// Start date (YYYY-MM-DD)
    pub start_at: Option<String>,
    /// End date (YYYY-MM-DD)
    pub end_at: Option<String>,
    /// Filter by contact ID
    pub contact_id: Option<String>,
    /// Search by contact name or order ID
    pub search: Option<String>,
    /// Maximum number of orders to return
    pub limit: Option<u32>,
    /// Number of orders to skip
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetOrderParams {
    /// The unique ID of the order
    pub order_id: String,
    /// Location or agency ID. Defaults to the configured location.
    pub alt_id: Option<String>,
    /// Type of `altId` (default: "location")
    pub alt_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListCouponsParams {
    /// Location ID. Defaults to the configured location.
    pub alt_id: Option<String>,
    /// Type of `altId` (default: "location")
    pub alt_type: Option<String>,
    /// Maximum number of coupons to return
    pub limit: Option<u32>,
    /// Number of coupons to skip
    pub offset: Option<u32>,
    /// Filter by status: "scheduled", "active" or "expired"
    pub status: Option<String>,
    /// Search by coupon name or code
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCouponParams {
    /// Location ID. Defaults to the configured location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<String>,
    /// Type of `altId` (default: "location")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_type: Option<String>,
    /// Display name of the coupon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Code customers enter at checkout
    pub code: String,
    /// "percentage" or "amount"
    pub discount_type: String,
    /// Discount value (percent or currency amount)
    pub discount: f64,
    /// Start date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// End date (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Maximum number of redemptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
}

/// Build the payments provider.
pub fn provider(client: Arc<GhlApiClient>) -> ProviderTable {
    ProviderTable::new(CATEGORY)
        .with_tool(
            LIST_ORDERS,
            "List payment orders with optional status, date, contact and search filters.",
            with_client(&client, list_orders),
        )
        .with_tool(
            GET_ORDER,
            "Get a payment order by ID including items, amounts and transaction status.",
            with_client(&client, get_order),
        )
        .with_tool(
            LIST_COUPONS,
            "List promotional coupons with optional status and search filters.",
            with_client(&client, list_coupons),
        )
        .with_tool(
            CREATE_COUPON,
            "Create a promotional coupon with a percentage or fixed-amount discount.",
            with_client(&client, create_coupon),
        )
}

fn alt_scope(client: &GhlApiClient, alt_id: Option<String>, alt_type: Option<String>) -> (String, String) {
    (
        client.location_or_default(alt_id),
        alt_type.unwrap_or_else(|| LOCATION_ALT_TYPE.to_string()),
    )
}

async fn list_orders(client: Arc<GhlApiClient>, params: ListOrdersParams) -> ToolResult<Value> {
    let (alt_id, alt_type) = alt_scope(&client, params.alt_id, params.alt_type);
    let query = [
        ("altId", Some(alt_id)),
        ("altType", Some(alt_type)),
        ("status", params.status),
        ("paymentMode", params.payment_mode),
        ("startAt", params.start_at),
        ("endAt", params.end_at),
        ("contactId", params.contact_id),
        ("search", params.search),
        ("limit", opt_string(params.limit)),
        ("offset", opt_string(params.offset)),
    ];
    Ok(client.list_orders(&query).await?)
}

async fn get_order(client: Arc<GhlApiClient>, params: GetOrderParams) -> ToolResult<Value> {
    let (alt_id, alt_type) = alt_scope(&client, params.alt_id, params.alt_type);
    let query = [("altId", Some(alt_id)), ("altType", Some(alt_type))];
    Ok(client.get_order(&params.order_id, &query).await?)
}

async fn list_coupons(client: Arc<GhlApiClient>, params: ListCouponsParams) -> ToolResult<Value> {
    let (alt_id, alt_type) = alt_scope(&client, params.alt_id, params.alt_type);
    let query = [
        ("altId", Some(alt_id)),
        ("altType", Some(alt_type)),
        ("limit", opt_string(params.limit)),
        ("offset", opt_string(params.offset)),
        ("status", params.status),
        ("search", params.search),
    ];
    Ok(client.list_coupons(&query).await?)
}

async fn create_coupon(client: Arc<GhlApiClient>, mut params: CreateCouponParams) -> ToolResult<Value> {
    let (alt_id, alt_type) = alt_scope(&client, params.alt_id.take(), params.alt_type.take());
    params.alt_id = Some(alt_id);
    params.alt_type = Some(alt_type);
    let body = to_body(&params)?;
    Ok(client.create_coupon(&body).await?)
}
