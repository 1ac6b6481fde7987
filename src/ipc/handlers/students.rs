use crate::error::StoreError;
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{db_conn, required_id, required_str, student_input};
use crate::ipc::types::{AppState, Request};
use crate::store::StudentStore;
use crate::validate::validate_student;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match StudentStore::new(conn).list_all() {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let id = match required_id(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match StudentStore::new(conn).get(id) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let input = match student_input(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let draft = match validate_student(&input) {
        Ok(d) => d,
        Err(fields) => return store_err(&req.id, StoreError::Invalid(fields)),
    };
    match StudentStore::new(conn).add(&draft) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let id = match required_id(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = StudentStore::new(conn);
    // Missing records report not_found before any field errors.
    if let Err(e) = store.get(id) {
        return store_err(&req.id, e);
    }
    let input = match student_input(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let draft = match validate_student(&input) {
        Ok(d) => d,
        Err(fields) => return store_err(&req.id, StoreError::Invalid(fields)),
    };
    match store.update(id, &draft) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let id = match required_id(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match StudentStore::new(conn).delete(id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    // A missing term behaves like an empty one.
    let term = req
        .params
        .get("term")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match StudentStore::new(conn).search(term) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_students_departments(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let store = StudentStore::new(conn);
    let departments = match store.departments() {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, e),
    };
    let counts = match store.count_by_department() {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, e),
    };
    let counts: Vec<serde_json::Value> = counts
        .iter()
        .map(|(d, n)| json!({ "department": d, "count": n }))
        .collect();
    ok(
        &req.id,
        json!({ "departments": departments, "counts": counts }),
    )
}

fn handle_students_by_department(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let department = match required_str(req, "department") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match StudentStore::new(conn).list_by_department(&department) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.departments" => Some(handle_students_departments(state, req)),
        "students.byDepartment" => Some(handle_students_by_department(state, req)),
        _ => None,
    }
}
