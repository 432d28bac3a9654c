use hr_core::db::open_db_in_memory;
use hr_core::{
    RepoError, ReviewRepository, ReviewRevision, ReviewService, ReviewValidationError,
    SqliteReviewRepository,
};
use rusqlite::Connection;
use std::rc::Rc;

fn seed_employee(conn: &Connection, name: &str) -> i64 {
    conn.execute("INSERT INTO employees (name) VALUES (?1);", [name])
        .unwrap();
    conn.last_insert_rowid()
}

fn service(conn: &Connection) -> ReviewService<SqliteReviewRepository<'_>> {
    let service = ReviewService::new(SqliteReviewRepository::try_new(conn).unwrap());
    service.ensure_schema().unwrap();
    service
}

#[test]
fn service_wraps_repository_calls() {
    let conn = open_db_in_memory().unwrap();
    let employee_id = seed_employee(&conn, "Lee");
    let service = service(&conn);

    let review = service
        .record_review(2023, "Good performance", employee_id)
        .unwrap();
    let id = review.borrow().id().unwrap();

    let fetched = service.get_review(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&fetched, &review));
    assert_eq!(service.list_reviews().unwrap().len(), 1);
    assert_eq!(
        service
            .list_reviews_for_employee(employee_id)
            .unwrap()
            .len(),
        1
    );

    service.remove_review(&review).unwrap();
    assert!(service.get_review(id).unwrap().is_none());
    assert!(service.list_reviews().unwrap().is_empty());
}

#[test]
fn save_changes_persists_in_memory_edits() {
    let conn = open_db_in_memory().unwrap();
    let employee_id = seed_employee(&conn, "Lee");
    let service = service(&conn);

    let review = service.record_review(2020, "draft", employee_id).unwrap();
    review.borrow_mut().set_summary("reviewed").unwrap();
    service.save_changes(&review).unwrap();

    let summary: String = conn
        .query_row("SELECT summary FROM reviews;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(summary, "reviewed");
}

#[test]
fn revise_review_applies_all_edits_or_none() {
    let conn = open_db_in_memory().unwrap();
    let lee = seed_employee(&conn, "Lee");
    let kim = seed_employee(&conn, "Kim");
    let service = service(&conn);
    let review = service.record_review(2020, "draft", lee).unwrap();

    let rejected = ReviewRevision {
        year: Some(2024),
        summary: Some("moved".to_string()),
        employee_id: Some(kim + 50),
    };
    let err = service.revise_review(&review, &rejected).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::UnknownEmployee(_))
    ));
    assert_eq!(review.borrow().year(), 2020);
    assert_eq!(review.borrow().summary(), "draft");

    let accepted = ReviewRevision {
        year: Some(2024),
        employee_id: Some(kim),
        ..ReviewRevision::default()
    };
    service.revise_review(&review, &accepted).unwrap();
    assert_eq!(review.borrow().year(), 2024);
    assert_eq!(review.borrow().summary(), "draft");
    assert_eq!(review.borrow().employee_id(), kim);

    let stored_year: i64 = conn
        .query_row("SELECT year FROM reviews;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored_year, 2024);
}

#[test]
fn revise_review_restores_instance_when_row_write_fails() {
    let conn = open_db_in_memory().unwrap();
    let employee_id = seed_employee(&conn, "Lee");
    let service = service(&conn);
    let review = service.record_review(2020, "draft", employee_id).unwrap();
    let id = review.borrow().id().unwrap();
    conn.execute("DELETE FROM reviews;", []).unwrap();

    let revision = ReviewRevision {
        year: Some(2030),
        summary: Some("rewritten".to_string()),
        ..ReviewRevision::default()
    };
    let err = service.revise_review(&review, &revision).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
    assert_eq!(review.borrow().year(), 2020);
    assert_eq!(review.borrow().summary(), "draft");
}

#[test]
fn revise_review_rejects_unsaved_reviews() {
    let conn = open_db_in_memory().unwrap();
    let employee_id = seed_employee(&conn, "Lee");
    let service = service(&conn);

    let unsaved = service
        .repository()
        .new_review(2020, "local", employee_id)
        .unwrap()
        .into_handle();
    let revision = ReviewRevision {
        year: Some(2022),
        ..ReviewRevision::default()
    };

    let err = service.revise_review(&unsaved, &revision).unwrap_err();
    assert!(matches!(err, RepoError::Unsaved));
    assert_eq!(unsaved.borrow().year(), 2020);
}

#[test]
fn reset_schema_empties_table_and_cache() {
    let conn = open_db_in_memory().unwrap();
    let employee_id = seed_employee(&conn, "Lee");
    let service = service(&conn);
    service.record_review(2020, "old", employee_id).unwrap();

    service.reset_schema().unwrap();

    assert!(service.list_reviews().unwrap().is_empty());
    assert_eq!(service.repository().cached_count(), 0);
}
