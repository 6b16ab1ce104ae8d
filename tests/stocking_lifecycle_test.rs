mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};

use common::{batch_input, register_request, TestApp};
use stocking_api::{
    entities::person,
    errors::ServiceError,
    services::{
        batch_reconciler::BatchInput,
        status::StockingStatus,
        stocking_events::{
            AdminUpdateStockingRequest, CancelOutcome, ReviewStockingRequest,
            UpdateStockingRequest,
        },
    },
};

#[tokio::test]
async fn registration_too_close_to_the_event_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    // Seeded settings require at least 2 days of lead time.
    let err = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidEventTime(_)));
    assert_eq!(err.code(), "INVALID_EVENT_TIME");
}

#[tokio::test]
async fn registration_creates_an_upcoming_event_with_batches() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let response = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 10))
        .await
        .unwrap();

    assert_eq!(response.status, StockingStatus::Upcoming);
    assert_eq!(response.created_by, owner.id);
    assert_eq!(response.assigned_to, owner.id);
    assert_eq!(response.tenant_id, None);
    assert_eq!(response.batches.len(), 1);
    assert_eq!(response.batches[0].amount, 500);
    assert!(response.batches[0].review_amount.is_none());
}

#[tokio::test]
async fn registration_cannot_pre_fill_reviewed_amounts() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    // A reviewed amount at registration would derive FINISHED without any
    // review ever happening.
    let mut request = register_request(owner.id, 10);
    request.batches[0].review_amount = Some(0);

    let err = app
        .services
        .stocking_events
        .register(&actor, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let mut request = register_request(owner.id, 10);
    request.batches[0].review_weight = Some(10.0);
    let err = app
        .services
        .stocking_events
        .register(&actor, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn pre_event_update_cannot_pre_fill_reviewed_amounts() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let created = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 10))
        .await
        .unwrap();

    let err = app
        .services
        .stocking_events
        .update_registration(
            &actor,
            created.id,
            UpdateStockingRequest {
                batches: Some(vec![BatchInput {
                    review_amount: Some(450),
                    ..batch_input(Some(created.batches[0].id), 1, 500)
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let unchanged = app
        .services
        .stocking_events
        .get(&actor, created.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, StockingStatus::Upcoming);
    assert!(unchanged.batches[0].review_amount.is_none());
}

#[tokio::test]
async fn admin_can_correct_review_data_only_after_a_review_exists() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    let planned = app.seed_batch(event.id, None).await;

    // Unreviewed event: the privileged edit must not fabricate review data.
    let err = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                batches: Some(vec![BatchInput {
                    review_amount: Some(500),
                    ..batch_input(Some(planned.id), 1, 500)
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let reviewed = app
        .services
        .stocking_events
        .review(
            &app.actor(&owner),
            event.id,
            ReviewStockingRequest {
                batches: vec![BatchInput {
                    review_amount: Some(450),
                    ..batch_input(Some(planned.id), 1, 500)
                }],
                waybill_no: None,
                vet_approval_no: None,
                vet_certificate_no: None,
                water_temp: None,
                transport_water_temp: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(reviewed.status, StockingStatus::Finished);

    // With a review on record, correcting its numbers is legitimate.
    let corrected = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                batches: Some(vec![BatchInput {
                    review_amount: Some(480),
                    ..batch_input(Some(reviewed.batches[0].id), 1, 500)
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.status, StockingStatus::Finished);
    assert_eq!(corrected.batches[0].review_amount, Some(480));
}

#[tokio::test]
async fn inspectors_cannot_register_stocking_events() {
    let app = TestApp::new().await;
    let inspector = app.seed_inspector().await;
    let actor = app.actor(&inspector);

    let err = app
        .services
        .stocking_events
        .register(&actor, register_request(inspector.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoRights(_)));
}

#[tokio::test]
async fn unrelated_freelancer_cannot_modify_or_view_a_foreign_event() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let stranger = app.seed_freelancer().await;
    let inspector = app.seed_inspector().await;

    let event = app.seed_event(&owner, Utc::now() + Duration::days(10)).await;
    app.seed_batch(event.id, None).await;

    let err = app
        .services
        .stocking_events
        .update_registration(
            &app.actor(&stranger),
            event.id,
            UpdateStockingRequest {
                assigned_to: Some(stranger.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NO_RIGHTS");

    let err = app
        .services
        .stocking_events
        .get(&app.actor(&stranger), event.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoRights(_)));

    // Inspectors may read anything but not modify it.
    let viewed = app
        .services
        .stocking_events
        .get(&app.actor(&inspector), event.id)
        .await
        .unwrap();
    assert_eq!(viewed.id, event.id);
}

#[tokio::test]
async fn upcoming_event_allows_full_edit_including_batch_replacement() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let created = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 10))
        .await
        .unwrap();
    let kept_id = created.batches[0].id;

    let updated = app
        .services
        .stocking_events
        .update_registration(
            &actor,
            created.id,
            UpdateStockingRequest {
                event_time: Some(Utc::now() + Duration::days(14)),
                batches: Some(vec![
                    batch_input(Some(kept_id), 1, 750),
                    batch_input(None, 2, 200),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, StockingStatus::Upcoming);
    assert_eq!(updated.batches.len(), 2);
    assert_eq!(updated.batches[0].id, kept_id);
    assert_eq!(updated.batches[0].amount, 750);
    assert_eq!(updated.batches[1].fish_type_id, 2);

    // Moving the event date inside the lead-time window is still rejected.
    let err = app
        .services
        .stocking_events
        .update_registration(
            &actor,
            created.id,
            UpdateStockingRequest {
                event_time: Some(Utc::now() + Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidEventTime(_)));
}

#[tokio::test]
async fn ongoing_event_permits_only_assignee_changes() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let substitute = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    app.seed_batch(event.id, None).await;

    let err = app
        .services
        .stocking_events
        .update_registration(
            &actor,
            event.id,
            UpdateStockingRequest {
                batches: Some(vec![batch_input(None, 1, 100)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let updated = app
        .services
        .stocking_events
        .update_registration(
            &actor,
            event.id,
            UpdateStockingRequest {
                assigned_to: Some(substitute.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, StockingStatus::Ongoing);
    assert_eq!(updated.assigned_to, substitute.id);
}

#[tokio::test]
async fn review_finishes_the_event_and_signatures_mark_it_inspected() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    let planned = app.seed_batch(event.id, None).await;

    let reviewed = app
        .services
        .stocking_events
        .review(
            &actor,
            event.id,
            ReviewStockingRequest {
                batches: vec![BatchInput {
                    review_amount: Some(450),
                    review_weight: Some(11.0),
                    ..batch_input(Some(planned.id), 1, 500)
                }],
                waybill_no: Some("WB-2024-001".to_string()),
                vet_approval_no: None,
                vet_certificate_no: None,
                water_temp: Some(12.5),
                transport_water_temp: Some(11.0),
            },
        )
        .await
        .unwrap();

    assert_eq!(reviewed.status, StockingStatus::Finished);
    assert!(reviewed.review_time.is_some());
    assert_eq!(reviewed.reviewed_by, Some(owner.id));
    assert_eq!(reviewed.batches[0].review_amount, Some(450));

    // Countersignatures from the inspection lift it to the terminal status.
    let inspected = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                signatures: Some(serde_json::json!([{
                    "organization": "Keskkonnaamet",
                    "signed_by": "Jaan Tamm",
                    "signature": "a1b2c3"
                }])),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(inspected.status, StockingStatus::Inspected);
}

#[tokio::test]
async fn review_is_rejected_outside_the_stocking_window() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() + Duration::days(10)).await;
    let planned = app.seed_batch(event.id, None).await;

    let err = app
        .services
        .stocking_events
        .review(
            &actor,
            event.id,
            ReviewStockingRequest {
                batches: vec![BatchInput {
                    review_amount: Some(450),
                    ..batch_input(Some(planned.id), 1, 500)
                }],
                waybill_no: None,
                vet_approval_no: None,
                vet_certificate_no: None,
                water_temp: None,
                transport_water_temp: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS");
}

#[tokio::test]
async fn review_requires_a_reviewed_amount_on_every_batch() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    let planned = app.seed_batch(event.id, None).await;

    let err = app
        .services
        .stocking_events
        .review(
            &actor,
            event.id,
            ReviewStockingRequest {
                batches: vec![batch_input(Some(planned.id), 1, 500)],
                waybill_no: None,
                vet_approval_no: None,
                vet_certificate_no: None,
                water_temp: None,
                transport_water_temp: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn canceling_an_upcoming_event_removes_it_outright() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let created = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 10))
        .await
        .unwrap();

    let outcome = app
        .services
        .stocking_events
        .cancel(&actor, created.id)
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Deleted));

    let err = app
        .services
        .stocking_events
        .get(&actor, created.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn canceling_an_ongoing_event_stamps_it_and_is_not_repeatable() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    app.seed_batch(event.id, None).await;

    let outcome = app
        .services
        .stocking_events
        .cancel(&actor, event.id)
        .await
        .unwrap();
    match outcome {
        CancelOutcome::Canceled(response) => {
            assert_eq!(response.status, StockingStatus::Canceled);
            assert!(response.canceled_at.is_some());
        }
        CancelOutcome::Deleted => panic!("ongoing event must not be deleted on cancel"),
    }

    let err = app
        .services
        .stocking_events
        .cancel(&actor, event.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS");
}

#[tokio::test]
async fn a_missed_event_can_still_be_canceled() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    // Stocking window long gone, never reviewed.
    let event = app.seed_event(&owner, Utc::now() - Duration::days(30)).await;
    app.seed_batch(event.id, None).await;

    let current = app.services.stocking_events.get(&actor, event.id).await.unwrap();
    assert_eq!(current.status, StockingStatus::NotFinished);

    let outcome = app
        .services
        .stocking_events
        .cancel(&actor, event.id)
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Canceled(_)));
}

#[tokio::test]
async fn a_finished_event_cannot_be_canceled() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    let event = app.seed_event(&owner, Utc::now() - Duration::days(1)).await;
    let planned = app.seed_batch(event.id, None).await;
    app.services
        .stocking_events
        .review(
            &actor,
            event.id,
            ReviewStockingRequest {
                batches: vec![BatchInput {
                    review_amount: Some(500),
                    ..batch_input(Some(planned.id), 1, 500)
                }],
                waybill_no: None,
                vet_approval_no: None,
                vet_certificate_no: None,
                water_temp: None,
                transport_water_temp: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .stocking_events
        .cancel(&actor, event.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn deletion_is_blocked_once_the_event_is_too_near() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;

    let distant = app.seed_event(&owner, Utc::now() + Duration::days(10)).await;
    app.services
        .stocking_events
        .delete(&app.actor(&owner), distant.id)
        .await
        .unwrap();

    // Exactly at the minimum lead time: already too late.
    let near = app.seed_event(&owner, Utc::now() + Duration::days(2)).await;
    let err = app
        .services
        .stocking_events
        .delete(&app.actor(&owner), near.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AFTER_PERMITTED_DELETION_TIME");

    // The deletion window binds administrators too.
    let err = app
        .services
        .stocking_events
        .delete(&app.actor(&admin), near.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AfterPermittedDeletionTime));
}

#[tokio::test]
async fn inspector_snapshot_is_a_point_in_time_copy() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;
    let inspector = app.seed_inspector().await;

    let event = app.seed_event(&owner, Utc::now() + Duration::days(10)).await;
    app.seed_batch(event.id, None).await;

    let assigned = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                inspector_id: Some(inspector.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(assigned.assigned_inspector_id, Some(inspector.id));
    let snapshot = assigned.inspector.expect("snapshot stored on assignment");
    assert_eq!(snapshot["email"], inspector.email);

    // Later profile edits must not leak into the stored snapshot.
    let mut active: person::ActiveModel = inspector.clone().into();
    active.email = Set("changed@example.com".to_string());
    active.update(&*app.db).await.unwrap();

    let fetched = app
        .services
        .stocking_events
        .get(&app.actor(&admin), event.id)
        .await
        .unwrap();
    assert_eq!(fetched.inspector.unwrap()["email"], inspector.email);
}

#[tokio::test]
async fn only_inspectors_can_be_assigned_as_inspector() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;

    let event = app.seed_event(&owner, Utc::now() + Duration::days(10)).await;

    let err = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                inspector_id: Some(owner.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ASSIGNED_TO");
}

#[tokio::test]
async fn admin_update_is_not_gated_by_the_derived_status() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let admin = app.seed_admin().await;

    let event = app.seed_event(&owner, Utc::now() - Duration::days(30)).await;
    app.seed_batch(event.id, None).await;

    let updated = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&admin),
            event.id,
            AdminUpdateStockingRequest {
                water_temp: Some(9.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, StockingStatus::NotFinished);
    assert_eq!(updated.water_temp, Some(9.5));

    let err = app
        .services
        .stocking_events
        .admin_update(
            &app.actor(&owner),
            event.id,
            AdminUpdateStockingRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoRights(_)));
}

#[tokio::test]
async fn listing_is_scoped_to_the_actor() {
    let app = TestApp::new().await;
    let tenant_a = app.seed_tenant("Peipsi Kalakasvatus").await;
    let tenant_b = app.seed_tenant("Võrtsjärve Kalakasvatus").await;
    let member_a = app
        .seed_person(person::ROLE_USER, Some(tenant_a.id))
        .await;
    let member_b = app
        .seed_person(person::ROLE_USER, Some(tenant_b.id))
        .await;
    let freelancer = app.seed_freelancer().await;
    let inspector = app.seed_inspector().await;

    let in_a = app.seed_event(&member_a, Utc::now() + Duration::days(10)).await;
    app.seed_event(&member_b, Utc::now() + Duration::days(10)).await;
    app.seed_event(&freelancer, Utc::now() + Duration::days(10)).await;

    let listed = app
        .services
        .stocking_events
        .list(&app.actor(&member_a), 1, 50)
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.events[0].id, in_a.id);

    let listed = app
        .services
        .stocking_events
        .list(&app.actor(&freelancer), 1, 50)
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.events[0].created_by, freelancer.id);

    let listed = app
        .services
        .stocking_events
        .list(&app.actor(&inspector), 1, 50)
        .await
        .unwrap();
    assert_eq!(listed.total, 3);
}

#[tokio::test]
async fn settings_changes_take_effect_without_restart() {
    let app = TestApp::new().await;
    let owner = app.seed_freelancer().await;
    let actor = app.actor(&owner);

    app.services.settings.update(5, 5).await.unwrap();

    let err = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidEventTime(_)));

    let created = app
        .services
        .stocking_events
        .register(&actor, register_request(owner.id, 6))
        .await
        .unwrap();
    assert_eq!(created.status, StockingStatus::Upcoming);
}
