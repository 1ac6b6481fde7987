use crate::backup;
use crate::csv_io::{self, TransferError};
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::core::select_workspace;
use crate::ipc::helpers::{db_conn, required_path};
use crate::ipc::types::{AppState, Request};
use crate::store::StudentStore;
use serde_json::json;
use std::path::PathBuf;

fn transfer_err(req: &Request, code: &str, e: TransferError, path: &str) -> serde_json::Value {
    match e {
        TransferError::Store(e) => store_err(&req.id, e),
        TransferError::MissingColumns(cols) => err(
            &req.id,
            code,
            format!("missing required columns: {}", cols.join(", ")),
            Some(json!({ "path": path, "missingColumns": cols })),
        ),
        other => err(&req.id, code, other.to_string(), Some(json!({ "path": path }))),
    }
}

fn handle_students_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let in_path = match required_path(req, "inPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = StudentStore::new(conn);
    match csv_io::import_students_file(&store, &PathBuf::from(&in_path)) {
        Ok(report) => ok(&req.id, json!(report)),
        Err(e) => transfer_err(req, "import_failed", e, &in_path),
    }
}

fn handle_students_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let out_path = match required_path(req, "outPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = StudentStore::new(conn);
    match csv_io::export_students_file(&store, &PathBuf::from(&out_path)) {
        Ok(rows) => ok(
            &req.id,
            json!({ "rowsExported": rows, "path": out_path }),
        ),
        Err(e) => transfer_err(req, "export_failed", e, &out_path),
    }
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_path(req, "outPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(workspace_path) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let out = PathBuf::from(&out_path);
    match backup::export_workspace_bundle(&workspace_path, &out) {
        Ok(export) => ok(
            &req.id,
            json!({
                "path": out_path,
                "bundleFormat": export.bundle_format,
                "entryCount": export.entry_count,
                "dbSha256": export.db_sha256
            }),
        ),
        Err(e) => err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": out_path })),
        ),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_path(req, "inPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(workspace_path) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "restore_failed",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    // Drop open handle before replacing file.
    state.db = None;
    let restored = backup::import_workspace_bundle(&src, &workspace_path);
    let reopened = select_workspace(state, &workspace_path);

    match (restored, reopened) {
        (Ok(import), Ok(())) => ok(
            &req.id,
            json!({
                "workspacePath": workspace_path.to_string_lossy(),
                "bundleFormatDetected": import.bundle_format_detected
            }),
        ),
        (Err(e), _) => err(
            &req.id,
            "restore_failed",
            format!("{e:#}"),
            Some(json!({ "path": in_path })),
        ),
        (Ok(_), Err(e)) => {
            tracing::error!(error = %e, "workspace reopen after restore failed");
            err(&req.id, "store_unavailable", format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.import" => Some(handle_students_import(state, req)),
        "students.export" => Some(handle_students_export(state, req)),
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
