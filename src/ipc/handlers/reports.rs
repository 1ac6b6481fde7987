use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use crate::reports;
use crate::store::StudentStore;
use serde_json::json;

fn handle_department_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match StudentStore::new(conn).list_all() {
        Ok(students) => ok(&req.id, json!(reports::department_report(&students))),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_summary_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match StudentStore::new(conn).list_all() {
        Ok(students) => ok(&req.id, json!(reports::summary_report(&students))),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.department" => Some(handle_department_report(state, req)),
        "reports.summary" => Some(handle_summary_report(state, req)),
        _ => None,
    }
}
