// Copyright 2025 Cowboy AI, LLC.

//! Framework-agnostic HTTP surface
//!
//! [`LivestockApi::handle`] maps a method, path, headers and JSON body onto
//! the workflows, so any HTTP server can mount it under
//! [`WorkflowConfig::api_base_path`](crate::config::WorkflowConfig).
//!
//! | Method | Path |
//! |---|---|
//! | POST | `/clearances` |
//! | GET | `/clearances/{id}` |
//! | POST | `/clearances/{id}/approve`, `/clearances/{id}/reject` |
//! | POST | `/permits` |
//! | GET | `/permits/{id}`, `/permits/{id}/verifications` |
//! | POST | `/permits/{id}/verify`, `/permits/{id}/complete`, `/permits/{id}/cancel` |
//! | POST | `/transfers` |
//! | GET | `/transfers/{id}` |
//! | POST | `/transfers/{id}/confirm-current-owner`, `/transfers/{id}/confirm-new-owner` |
//! | POST | `/transfers/{id}/complete`, `/transfers/{id}/cancel` |

use crate::domain::{ConfirmingParty, Coordinates, Location, TransportMode};
use crate::entity::{EntityId, OfficerId};
use crate::errors::{DomainError, DomainResult};
use crate::workflows::{
    ClearanceWorkflow, CreateClearance, CreatePermit, InitiateTransfer, OwnershipTransferWorkflow,
    PermitWorkflow, Services,
};
use bytes::Bytes;
use chrono::NaiveDate;
use indexmap::IndexMap;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, error};
use uuid::Uuid;

/// Body of `POST /clearances`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreateClearanceRequest {
    /// Animal to clear
    pub livestock_id: Uuid,
    /// Claimed owner of record
    pub owner_id: Uuid,
    /// Where the request was taken
    pub coordinates: Option<Coordinates>,
    /// Two-letter province code
    pub province_code: Option<String>,
    /// Free-form remarks
    pub notes: Option<String>,
}

/// Body of the reject and cancel operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReasonRequest {
    /// Why
    pub reason: String,
}

/// Body of `POST /permits`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreatePermitRequest {
    /// Approved clearance
    pub clearance_id: Uuid,
    /// Animal to move
    pub livestock_id: Uuid,
    /// Origin
    pub from_location: Location,
    /// Destination
    pub to_location: Location,
    /// First valid day
    pub valid_from: NaiveDate,
    /// Last valid day
    pub valid_until: NaiveDate,
    /// Why the animal is moving
    pub purpose: Option<String>,
    /// How it travels
    pub transport_mode: Option<TransportMode>,
    /// Vehicle plate
    pub vehicle_registration: Option<String>,
}

/// Body of `POST /permits/{id}/verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerifyPermitRequest {
    /// Checkpoint position
    pub coordinates: Option<Coordinates>,
    /// Officer remarks
    pub notes: Option<String>,
}

/// Body of `POST /permits/{id}/complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompletePermitRequest {
    /// Arrival position
    pub coordinates: Option<Coordinates>,
}

/// Body of `POST /transfers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InitiateTransferRequest {
    /// Animal changing hands
    pub livestock_id: Uuid,
    /// Receiving owner
    pub to_owner_id: Uuid,
    /// Sale, inheritance, gift, ...
    pub reason: Option<String>,
    /// Agreed handover date
    pub transfer_date: Option<NaiveDate>,
}

/// Body of the transfer confirmation operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfirmTransferRequest {
    /// Raw fingerprint probe
    pub fingerprint: Option<Vec<u8>>,
}

/// JSON schema of every request body, keyed by type name
pub fn request_schemas() -> IndexMap<&'static str, RootSchema> {
    let mut schemas = IndexMap::new();
    schemas.insert("CreateClearanceRequest", schema_for!(CreateClearanceRequest));
    schemas.insert("ReasonRequest", schema_for!(ReasonRequest));
    schemas.insert("CreatePermitRequest", schema_for!(CreatePermitRequest));
    schemas.insert("VerifyPermitRequest", schema_for!(VerifyPermitRequest));
    schemas.insert("CompletePermitRequest", schema_for!(CompletePermitRequest));
    schemas.insert("InitiateTransferRequest", schema_for!(InitiateTransferRequest));
    schemas.insert("ConfirmTransferRequest", schema_for!(ConfirmTransferRequest));
    schemas
}

/// Incoming request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method
    pub method: String,
    /// Full path, including the base path
    pub path: String,
    /// Request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body; `null` when absent
    #[serde(default)]
    pub body: Value,
}

impl ApiRequest {
    /// Request without headers or body
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Value::Null,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// `POST path` with a JSON body
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            body,
            ..Self::new("POST", path)
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Header value, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    fn not_found(path: &str) -> Self {
        Self {
            status: 404,
            body: json!({ "error": "NOT_FOUND", "message": format!("no route for {path}") }),
        }
    }

    fn method_not_allowed(method: &str, allowed: &str) -> Self {
        Self {
            status: 405,
            body: json!({
                "error": "METHOD_NOT_ALLOWED",
                "message": format!("{method} is not allowed here; use {allowed}"),
            }),
        }
    }

    /// Error body `{ "error", "message", "field"? }` with the kind's status
    pub fn from_error(err: &DomainError) -> Self {
        let kind = err.kind();
        let mut body = json!({ "error": kind, "message": err.to_string() });
        if let Some(field) = err.field() {
            body["field"] = Value::String(field.to_string());
        }
        Self {
            status: kind.http_status(),
            body,
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    CreateClearance,
    GetClearance(&'a str),
    ApproveClearance(&'a str),
    RejectClearance(&'a str),
    CreatePermit,
    GetPermit(&'a str),
    PermitVerifications(&'a str),
    VerifyPermit(&'a str),
    CompletePermit(&'a str),
    CancelPermit(&'a str),
    InitiateTransfer,
    GetTransfer(&'a str),
    ConfirmTransfer(&'a str, ConfirmingParty),
    CompleteTransfer(&'a str),
    CancelTransfer(&'a str),
}

impl<'a> Route<'a> {
    fn parse(segments: &[&'a str]) -> Option<Self> {
        use Route as R;
        Some(match *segments {
            ["clearances"] => R::CreateClearance,
            ["clearances", id] => R::GetClearance(id),
            ["clearances", id, "approve"] => R::ApproveClearance(id),
            ["clearances", id, "reject"] => R::RejectClearance(id),
            ["permits"] => R::CreatePermit,
            ["permits", id] => R::GetPermit(id),
            ["permits", id, "verifications"] => R::PermitVerifications(id),
            ["permits", id, "verify"] => R::VerifyPermit(id),
            ["permits", id, "complete"] => R::CompletePermit(id),
            ["permits", id, "cancel"] => R::CancelPermit(id),
            ["transfers"] => R::InitiateTransfer,
            ["transfers", id] => R::GetTransfer(id),
            ["transfers", id, "confirm-current-owner"] => {
                R::ConfirmTransfer(id, ConfirmingParty::CurrentOwner)
            }
            ["transfers", id, "confirm-new-owner"] => R::ConfirmTransfer(id, ConfirmingParty::NewOwner),
            ["transfers", id, "complete"] => R::CompleteTransfer(id),
            ["transfers", id, "cancel"] => R::CancelTransfer(id),
            _ => return None,
        })
    }

    fn method(&self) -> &'static str {
        match self {
            Route::GetClearance(_)
            | Route::GetPermit(_)
            | Route::PermitVerifications(_)
            | Route::GetTransfer(_) => "GET",
            _ => "POST",
        }
    }
}

/// Request router over the workflows
#[derive(Clone)]
pub struct LivestockApi {
    base_path: String,
    officer_header: String,
    clearances: ClearanceWorkflow,
    permits: PermitWorkflow,
    transfers: OwnershipTransferWorkflow,
}

impl LivestockApi {
    /// Router over `services`, configured from `services.config`
    pub fn new(services: Services) -> Self {
        Self {
            base_path: services.config.api_base_path.trim_end_matches('/').to_string(),
            officer_header: services.config.officer_header.clone(),
            clearances: ClearanceWorkflow::new(services.clone()),
            permits: PermitWorkflow::new(services.clone()),
            transfers: OwnershipTransferWorkflow::new(services),
        }
    }

    /// Route and execute a request
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let path = request.path.split('?').next().unwrap_or_default();
        let Some(rest) = path.strip_prefix(&self.base_path) else {
            return ApiResponse::not_found(path);
        };
        if !(rest.is_empty() || rest.starts_with('/')) {
            return ApiResponse::not_found(path);
        }
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let Some(route) = Route::parse(&segments) else {
            return ApiResponse::not_found(path);
        };
        if !request.method.eq_ignore_ascii_case(route.method()) {
            return ApiResponse::method_not_allowed(&request.method, route.method());
        }

        match self.dispatch(route, &request).await {
            Ok(response) => response,
            Err(err) => {
                let response = ApiResponse::from_error(&err);
                if response.status >= 500 {
                    error!(%err, method = %request.method, %path, "request failed");
                } else {
                    debug!(%err, method = %request.method, %path, status = response.status, "request refused");
                }
                response
            }
        }
    }

    async fn dispatch(&self, route: Route<'_>, request: &ApiRequest) -> DomainResult<ApiResponse> {
        match route {
            Route::CreateClearance => {
                let body: CreateClearanceRequest = parse_body(&request.body)?;
                let created = self
                    .clearances
                    .create(CreateClearance {
                        livestock_id: EntityId::from_uuid(body.livestock_id),
                        owner_id: EntityId::from_uuid(body.owner_id),
                        issued_by: self.officer(request)?,
                        coordinates: body.coordinates,
                        province_code: body.province_code,
                        notes: body.notes,
                    })
                    .await?;
                Ok(ApiResponse::created(to_json(&self.clearances.get(&created.id).await?)?))
            }
            Route::GetClearance(id) => {
                Ok(ApiResponse::ok(to_json(&self.clearances.get(&parse_id(id)?).await?)?))
            }
            Route::ApproveClearance(id) => {
                let approved = self
                    .clearances
                    .approve(parse_id(id)?, self.officer(request)?)
                    .await?;
                Ok(ApiResponse::ok(to_json(&approved)?))
            }
            Route::RejectClearance(id) => {
                let body: ReasonRequest = parse_body(&request.body)?;
                let rejected = self
                    .clearances
                    .reject(parse_id(id)?, self.officer(request)?, &body.reason)
                    .await?;
                Ok(ApiResponse::ok(to_json(&rejected)?))
            }
            Route::CreatePermit => {
                let body: CreatePermitRequest = parse_body(&request.body)?;
                let mut create = CreatePermit::new(
                    EntityId::from_uuid(body.clearance_id),
                    EntityId::from_uuid(body.livestock_id),
                    body.from_location,
                    body.to_location,
                    body.valid_from,
                    body.valid_until,
                    self.officer(request)?,
                );
                create.purpose = body.purpose;
                create.transport_mode = body.transport_mode;
                create.vehicle_registration = body.vehicle_registration;
                Ok(ApiResponse::created(to_json(&self.permits.create(create).await?)?))
            }
            Route::GetPermit(id) => {
                Ok(ApiResponse::ok(to_json(&self.permits.get(&parse_id(id)?).await?)?))
            }
            Route::PermitVerifications(id) => Ok(ApiResponse::ok(to_json(
                &self.permits.verifications(&parse_id(id)?).await?,
            )?)),
            Route::VerifyPermit(id) => {
                let body: VerifyPermitRequest = parse_body(&request.body)?;
                let report = self
                    .permits
                    .verify(parse_id(id)?, self.officer(request)?, body.coordinates, body.notes)
                    .await?;
                Ok(ApiResponse::ok(to_json(&report)?))
            }
            Route::CompletePermit(id) => {
                let body: CompletePermitRequest = parse_body(&request.body)?;
                let completed = self.permits.complete(parse_id(id)?, body.coordinates).await?;
                Ok(ApiResponse::ok(to_json(&completed)?))
            }
            Route::CancelPermit(id) => {
                let body: ReasonRequest = parse_body(&request.body)?;
                let cancelled = self.permits.cancel(parse_id(id)?, &body.reason).await?;
                Ok(ApiResponse::ok(to_json(&cancelled)?))
            }
            Route::InitiateTransfer => {
                let body: InitiateTransferRequest = parse_body(&request.body)?;
                let transfer = self
                    .transfers
                    .initiate(InitiateTransfer {
                        livestock_id: EntityId::from_uuid(body.livestock_id),
                        to_owner_id: EntityId::from_uuid(body.to_owner_id),
                        initiated_by: self.officer(request)?,
                        reason: body.reason,
                        transfer_date: body.transfer_date,
                    })
                    .await?;
                Ok(ApiResponse::created(to_json(&transfer)?))
            }
            Route::GetTransfer(id) => {
                Ok(ApiResponse::ok(to_json(&self.transfers.get(&parse_id(id)?).await?)?))
            }
            Route::ConfirmTransfer(id, party) => {
                let body: ConfirmTransferRequest = parse_body(&request.body)?;
                let transfer = self
                    .transfers
                    .confirm(parse_id(id)?, party, body.fingerprint.map(Bytes::from))
                    .await?;
                Ok(ApiResponse::ok(to_json(&transfer)?))
            }
            Route::CompleteTransfer(id) => {
                let transfer = self
                    .transfers
                    .complete(parse_id(id)?, self.officer(request)?)
                    .await?;
                Ok(ApiResponse::ok(to_json(&transfer)?))
            }
            Route::CancelTransfer(id) => {
                let body: ReasonRequest = parse_body(&request.body)?;
                let transfer = self
                    .transfers
                    .cancel(parse_id(id)?, self.officer(request)?, &body.reason)
                    .await?;
                Ok(ApiResponse::ok(to_json(&transfer)?))
            }
        }
    }

    fn officer(&self, request: &ApiRequest) -> DomainResult<OfficerId> {
        let raw = request.header(&self.officer_header).ok_or_else(|| {
            DomainError::validation(self.officer_header.as_str(), "acting officer is required")
        })?;
        raw.trim().parse().map_err(|_| {
            DomainError::validation(self.officer_header.as_str(), "must be an officer UUID")
        })
    }
}

fn parse_id<T>(raw: &str) -> DomainResult<EntityId<T>> {
    raw.parse()
        .map_err(|_| DomainError::validation("id", format!("'{raw}' is not a valid UUID")))
}

fn parse_body<T: DeserializeOwned>(body: &Value) -> DomainResult<T> {
    let body = match body {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(body).map_err(|err| {
        let message = err.to_string();
        let field = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
            .unwrap_or("body")
            .to_string();
        DomainError::validation(field, message)
    })
}

fn to_json<T: Serialize>(value: &T) -> DomainResult<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::workflows::InMemoryBackend;

    fn api() -> LivestockApi {
        LivestockApi::new(InMemoryBackend::new(WorkflowConfig::default()).services)
    }

    #[test]
    fn test_route_table() {
        assert_eq!(Route::parse(&["clearances"]), Some(Route::CreateClearance));
        assert_eq!(
            Route::parse(&["transfers", "x", "confirm-new-owner"]),
            Some(Route::ConfirmTransfer("x", ConfirmingParty::NewOwner))
        );
        assert_eq!(Route::parse(&["permits", "x", "teleport"]), None);
        assert_eq!(Route::GetPermit("x").method(), "GET");
        assert_eq!(Route::VerifyPermit("x").method(), "POST");
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method() {
        let api = api();

        let response = api.handle(ApiRequest::get("/api/v1/livestock")).await;
        assert_eq!(response.status, 404);

        let response = api.handle(ApiRequest::get("/api/v2/permits")).await;
        assert_eq!(response.status, 404);

        let response = api.handle(ApiRequest::get("/api/v1/clearances")).await;
        assert_eq!(response.status, 405);
    }

    #[tokio::test]
    async fn test_missing_officer_header_is_a_field_error() {
        let response = api()
            .handle(ApiRequest::post(
                "/api/v1/clearances",
                json!({ "livestock_id": Uuid::new_v4(), "owner_id": Uuid::new_v4() }),
            ))
            .await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "VALIDATION");
        assert_eq!(response.body["field"], "X-Officer-Id");
    }

    #[tokio::test]
    async fn test_missing_body_field_is_reported_by_name() {
        let response = api()
            .handle(
                ApiRequest::post(
                    &format!("/api/v1/clearances/{}/reject", Uuid::new_v4()),
                    json!({}),
                )
                .with_header("x-officer-id", Uuid::new_v4().to_string()),
            )
            .await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body["field"], "reason");
    }

    #[tokio::test]
    async fn test_malformed_id_is_a_field_error() {
        let response = api().handle(ApiRequest::get("/api/v1/permits/not-a-uuid")).await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body["field"], "id");
    }

    #[tokio::test]
    async fn test_unknown_entity_is_404() {
        let response = api()
            .handle(ApiRequest::get(format!("/api/v1/transfers/{}", Uuid::new_v4())))
            .await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body["error"], "NOT_FOUND");
    }

    #[test]
    fn test_request_schemas_cover_every_body() {
        let schemas = request_schemas();
        assert_eq!(schemas.len(), 7);
        let permit = serde_json::to_value(&schemas["CreatePermitRequest"]).unwrap();
        let required = permit["required"].as_array().unwrap();
        assert!(required.iter().any(|f| f == "valid_until"));
        assert!(!required.iter().any(|f| f == "purpose"));
    }
}
