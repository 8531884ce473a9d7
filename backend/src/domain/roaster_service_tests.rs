//! Tests for the roaster service.

use std::sync::Arc;

use chrono::Utc;
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockBeanRepository, MockRoasterRepository};
use crate::domain::{Bean, ErrorCode, RoastLevel};

fn make_service(roasters: MockRoasterRepository, beans: MockBeanRepository) -> RoasterService {
    RoasterService::new(Arc::new(roasters), Arc::new(beans))
}

fn roaster(id: i64, version: i32) -> Roaster {
    Roaster {
        id,
        name: "Ember & Oak".into(),
        description: "Small batch".into(),
        website: "https://ember.example".into(),
        location: "Leeds, UK".into(),
        created_at: Utc::now(),
        version,
    }
}

fn form() -> RoasterForm {
    RoasterForm {
        name: "Ember & Oak".into(),
        description: "Small batch".into(),
        website: "https://ember.example".into(),
        location: "Leeds, UK".into(),
    }
}

#[tokio::test]
async fn detail_includes_the_roasters_beans() {
    let mut roasters = MockRoasterRepository::new();
    roasters
        .expect_find()
        .times(1)
        .return_once(|id| Ok(Some(roaster(id, 1))));
    let mut beans = MockBeanRepository::new();
    beans.expect_list_by_roaster().times(1).return_once(|id| {
        Ok(vec![Bean {
            id: 3,
            name: "Yirgacheffe".into(),
            roast_level: RoastLevel::Light,
            roaster_id: id,
            created_at: Utc::now(),
            version: 1,
        }])
    });

    let detail = make_service(roasters, beans)
        .detail(9)
        .await
        .expect("detail loads");
    assert_eq!(detail.roaster.id, 9);
    assert_eq!(detail.beans.len(), 1);
    assert_eq!(detail.beans[0].roaster_id, 9);
}

#[tokio::test]
async fn missing_roaster_is_not_found() {
    let mut roasters = MockRoasterRepository::new();
    roasters.expect_find().times(1).return_once(|_| Ok(None));

    let error = make_service(roasters, MockBeanRepository::new())
        .detail(404)
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_repository() {
    let mut roasters = MockRoasterRepository::new();
    roasters.expect_insert().never();

    let error = make_service(roasters, MockBeanRepository::new())
        .create(&RoasterForm::default())
        .await
        .expect_err("invalid");
    let FormError::Invalid(v) = error else {
        panic!("expected field errors, got {error:?}");
    };
    assert_eq!(v.field_error("name"), Some("this field cannot be blank"));
}

#[tokio::test]
async fn create_inserts_the_trimmed_draft() {
    let mut roasters = MockRoasterRepository::new();
    roasters
        .expect_insert()
        .withf(|draft| draft.name == "Ember & Oak")
        .times(1)
        .return_once(|_| Ok(roaster(1, 1)));

    let mut submitted = form();
    submitted.name = "  Ember & Oak  ".into();
    let created = make_service(roasters, MockBeanRepository::new())
        .create(&submitted)
        .await
        .expect("created");
    assert_eq!(created.version, 1);
}

#[tokio::test]
async fn update_passes_expected_version_through() {
    let mut roasters = MockRoasterRepository::new();
    roasters
        .expect_update()
        .withf(|id, version, _| *id == 4 && *version == 2)
        .times(1)
        .return_once(|id, version, _| Ok(roaster(id, version + 1)));

    let updated = make_service(roasters, MockBeanRepository::new())
        .update(4, 2, &form())
        .await
        .expect("updated");
    assert_eq!(updated.version, 3);
}

#[tokio::test]
async fn stale_version_becomes_a_conflict_with_details() {
    let mut roasters = MockRoasterRepository::new();
    roasters.expect_update().times(1).return_once(|id, expected, _| {
        Err(RoasterRepositoryError::edit_conflict(id, expected, 5))
    });

    let error = make_service(roasters, MockBeanRepository::new())
        .update(4, 2, &form())
        .await
        .expect_err("conflict");
    let FormError::Failed(error) = error else {
        panic!("expected a domain error, got {error:?}");
    };
    assert_eq!(error.code(), ErrorCode::Conflict);
    let details = error.details().expect("details");
    assert_eq!(details["expectedVersion"], 2);
    assert_eq!(details["actualVersion"], 5);
}

#[rstest]
#[case::connection(RoasterRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case::query(RoasterRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[case::timeout(RoasterRepositoryError::timeout("list roasters"), ErrorCode::InternalError)]
#[case::not_found(RoasterRepositoryError::not_found(8), ErrorCode::NotFound)]
fn repository_errors_map_to_domain_codes(
    #[case] error: RoasterRepositoryError,
    #[case] expected: ErrorCode,
) {
    assert_eq!(map_roaster_error(error).code(), expected);
}

#[tokio::test]
async fn delete_of_missing_roaster_is_not_found() {
    let mut roasters = MockRoasterRepository::new();
    roasters
        .expect_delete()
        .times(1)
        .return_once(|id| Err(RoasterRepositoryError::not_found(id)));

    let error = make_service(roasters, MockBeanRepository::new())
        .delete(12)
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
