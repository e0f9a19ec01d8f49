//! Mock Zabbix JSON-RPC endpoint shared by the integration tests.

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Value, json};

use zabbix_maintenance::Settings;
use zabbix_maintenance::request::{Endpoint, TransportOptions};
use zabbix_maintenance::session::Credentials;

pub const API_PATH: &str = "/api_jsonrpc.php";
pub const TOKEN: &str = "0424bd59b807674191e7d77572075f33";

pub fn endpoint(server: &ServerGuard) -> Endpoint {
    Endpoint::new(format!("{}{}", server.url(), API_PATH))
}

pub fn settings(server: &ServerGuard, credentials: Option<Credentials>) -> Settings {
    Settings {
        endpoint: endpoint(server),
        credentials,
        transport: TransportOptions::default(),
        timezone: None,
    }
}

pub fn password() -> Credentials {
    Credentials::Password {
        user: "Admin".to_string(),
        password: "zabbix".to_string(),
    }
}

/// Answers one request whose body contains `request` with `result`.
pub fn rpc_ok(server: &mut ServerGuard, request: Value, result: Value) -> Mock {
    rpc_ok_matching(server, Matcher::PartialJson(request), result)
}

pub fn rpc_ok_matching(server: &mut ServerGuard, matcher: Matcher, result: Value) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_header("content-type", "application/json-rpc")
        .match_body(matcher)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "result": result, "id": 1 }).to_string())
        .expect(1)
        .create()
}

pub fn rpc_error(server: &mut ServerGuard, request: Value, message: &str, data: &str) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_body(Matcher::PartialJson(request))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "error": { "code": -32602, "message": message, "data": data },
                "id": 1
            })
            .to_string(),
        )
        .expect(1)
        .create()
}

/// A mock that must never be hit.
pub fn never(server: &mut ServerGuard, method: &str) -> Mock {
    server
        .mock("POST", API_PATH)
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_body(json!({ "jsonrpc": "2.0", "result": true, "id": 1 }).to_string())
        .expect(0)
        .create()
}
