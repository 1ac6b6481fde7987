use crate::auth;
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let username = match required_str(req, "username") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match auth::login(conn, &username, &password) {
        Ok(authenticated) => ok(&req.id, json!({ "authenticated": authenticated })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let username = match required_str(req, "username") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match auth::create_user(conn, &username, &password) {
        Ok(user) => ok(&req.id, json!({ "userId": user.id, "user": user })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_users_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match auth::user_count(conn) {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "users.create" => Some(handle_users_create(state, req)),
        "users.count" => Some(handle_users_count(state, req)),
        _ => None,
    }
}
