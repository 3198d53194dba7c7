// Copyright 2025 Cowboy AI, LLC.

//! The request router driven end to end

mod common;

use common::world;
use livestock_movement::{ApiRequest, LivestockApi};
use pretty_assertions::assert_eq;
use serde_json::json;

const OFFICER: &str = "X-Officer-Id";

#[tokio::test]
async fn clearance_permit_and_scan_over_the_api() {
    let w = world().await;
    let api = LivestockApi::new(w.backend.services.clone());

    let created = api
        .handle(
            ApiRequest::post(
                "/api/v1/clearances",
                json!({ "livestock_id": w.cow.id, "owner_id": w.owner.id, "notes": "kraal 3" }),
            )
            .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(created.status, 201);
    assert_eq!(created.body["clearance_number"], "PC-OT-000001");
    assert_eq!(created.body["status"], "PENDING");
    let clearance_id = created.body["id"].as_str().unwrap().to_string();

    let approved = api
        .handle(
            ApiRequest::post(format!("/api/v1/clearances/{clearance_id}/approve"), json!(null))
                .with_header("x-officer-id", w.police.id.to_string()),
        )
        .await;
    assert_eq!(approved.status, 200);
    assert_eq!(approved.body["status"], "APPROVED");
    assert_eq!(approved.body["valid"], true);

    let permit = api
        .handle(
            ApiRequest::post(
                "/api/v1/permits",
                json!({
                    "clearance_id": clearance_id,
                    "livestock_id": w.cow.id,
                    "from_location": { "name": "Otjiwarongo" },
                    "to_location": { "name": "Okahandja" },
                    "valid_from": "2026-05-04",
                    "valid_until": "2026-05-07",
                    "transport_mode": "TRUCK",
                    "vehicle_registration": "N 4471 OT",
                }),
            )
            .with_header(OFFICER, w.extension.id.to_string()),
        )
        .await;
    assert_eq!(permit.status, 201, "{}", permit.body);
    assert_eq!(permit.body["status"], "APPROVED");
    let permit_id = permit.body["id"].as_str().unwrap().to_string();

    let scan = api
        .handle(
            ApiRequest::post(
                format!("/api/v1/permits/{permit_id}/verify"),
                json!({ "coordinates": { "latitude": -20.46, "longitude": 16.65 } }),
            )
            .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(scan.status, 200);
    assert_eq!(scan.body["verification"]["valid"], true);
    assert_eq!(scan.body["permit"]["status"], "IN_TRANSIT");

    let history = api
        .handle(ApiRequest::get(format!("/api/v1/permits/{permit_id}/verifications")))
        .await;
    assert_eq!(history.status, 200);
    assert_eq!(history.body.as_array().unwrap().len(), 1);

    let completed = api
        .handle(ApiRequest::post(format!("/api/v1/permits/{permit_id}/complete"), json!({})))
        .await;
    assert_eq!(completed.body["status"], "COMPLETED");

    let cancel = api
        .handle(ApiRequest::post(
            format!("/api/v1/permits/{permit_id}/cancel"),
            json!({ "reason": "too late" }),
        ))
        .await;
    assert_eq!(cancel.status, 400);
    assert_eq!(cancel.body["error"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn transfer_over_the_api() {
    let w = world().await;
    let api = LivestockApi::new(w.backend.services.clone());

    let initiated = api
        .handle(
            ApiRequest::post(
                "/api/v1/transfers",
                json!({ "livestock_id": w.cow.id, "to_owner_id": w.buyer.id, "reason": "sale" }),
            )
            .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(initiated.status, 201);
    let transfer_id = initiated.body["id"].as_str().unwrap().to_string();

    let duplicate = api
        .handle(
            ApiRequest::post(
                "/api/v1/transfers",
                json!({ "livestock_id": w.cow.id, "to_owner_id": w.buyer.id }),
            )
            .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(duplicate.status, 400);
    assert_eq!(duplicate.body["error"], "BUSINESS_RULE_VIOLATION");

    let early = api
        .handle(
            ApiRequest::post(format!("/api/v1/transfers/{transfer_id}/complete"), json!({}))
                .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(early.status, 400);
    assert_eq!(early.body["error"], "INVALID_TRANSITION");

    let seller = api
        .handle(ApiRequest::post(
            format!("/api/v1/transfers/{transfer_id}/confirm-current-owner"),
            json!({ "fingerprint": [1, 2, 3] }),
        ))
        .await;
    assert_eq!(seller.status, 200);
    assert_eq!(seller.body["status"], "PENDING");

    let buyer = api
        .handle(ApiRequest::post(
            format!("/api/v1/transfers/{transfer_id}/confirm-new-owner"),
            json!(null),
        ))
        .await;
    assert_eq!(buyer.body["status"], "CONFIRMED");

    let done = api
        .handle(
            ApiRequest::post(format!("/api/v1/transfers/{transfer_id}/complete"), json!({}))
                .with_header(OFFICER, w.police.id.to_string()),
        )
        .await;
    assert_eq!(done.status, 200);
    assert_eq!(done.body["status"], "COMPLETED");

    let fetched = api
        .handle(ApiRequest::get(format!("/api/v1/transfers/{transfer_id}")))
        .await;
    assert_eq!(fetched.body, done.body);
    assert_eq!(
        w.backend.registry().get(&w.cow.id).await.unwrap().owner_id,
        w.buyer.id
    );
}

#[tokio::test]
async fn wrong_role_maps_to_forbidden() {
    let w = world().await;
    let api = LivestockApi::new(w.backend.services.clone());

    let response = api
        .handle(
            ApiRequest::post(
                "/api/v1/clearances",
                json!({ "livestock_id": w.cow.id, "owner_id": w.owner.id }),
            )
            .with_header(OFFICER, w.extension.id.to_string()),
        )
        .await;

    assert_eq!(response.status, 403);
    assert_eq!(response.body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn malformed_body_names_the_offending_field() {
    let w = world().await;
    let api = LivestockApi::new(w.backend.services.clone());

    let response = api
        .handle(
            ApiRequest::post("/api/v1/permits", json!({ "livestock_id": w.cow.id }))
                .with_header(OFFICER, w.extension.id.to_string()),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "VALIDATION");
    assert_eq!(response.body["field"], "clearance_id");
}
