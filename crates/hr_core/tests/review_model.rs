use hr_core::db::open_db_in_memory;
use hr_core::{
    Employee, EmployeeDirectory, EmployeeId, RepoError, RepoResult, Review, SqliteEmployeeDirectory,
};

struct NoEmployees;

impl EmployeeDirectory for NoEmployees {
    fn find_by_id(&self, _id: EmployeeId) -> RepoResult<Option<Employee>> {
        Ok(None)
    }
}

#[test]
fn sqlite_directory_resolves_stored_employees() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO departments (id, name, location) VALUES (1, 'Payroll', 'Building A');
         INSERT INTO employees (id, name, job_title, department_id)
         VALUES (3, 'Amir', 'Accountant', 1);",
    )
    .unwrap();

    let directory = SqliteEmployeeDirectory::new(&conn);
    let employee = directory.find_by_id(3).unwrap().unwrap();
    assert_eq!(
        employee,
        Employee {
            id: 3,
            name: "Amir".to_string(),
            job_title: Some("Accountant".to_string()),
            department_id: Some(1),
        }
    );
    assert!(directory.find_by_id(4).unwrap().is_none());
}

#[test]
fn construction_consults_the_injected_directory() {
    let err = Review::new(2023, "Good performance", 1, &NoEmployees).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "employee_id must refer to an existing Employee"
    );
}

#[test]
fn review_serializes_with_plain_field_names() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO employees (id, name) VALUES (1, 'Lee');", [])
        .unwrap();
    let directory = SqliteEmployeeDirectory::new(&conn);

    let review = Review::new(2023, "Good performance", 1, &directory).unwrap();
    let json = serde_json::to_value(&review).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "id": null,
            "year": 2023,
            "summary": "Good performance",
            "employee_id": 1
        })
    );
}
