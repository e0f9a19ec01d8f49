mod common;

use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;

use common::{TOKEN, never, password, rpc_error, rpc_ok, rpc_ok_matching, settings};
use zabbix_maintenance::{Error, Job, MaintenanceId, run};

fn job(minutes: u32) -> Job {
    Job {
        host_name: "web01".to_string(),
        duration_minutes: minutes,
    }
}

#[test]
fn full_run_creates_window_and_prunes_expired_ones() {
    let now = Utc::now().timestamp();
    let mut server = Server::new();

    let login = rpc_ok(&mut server, json!({ "method": "user.login", "id": 1 }), json!(TOKEN));
    let host = rpc_ok(
        &mut server,
        json!({
            "method": "host.get",
            "params": { "output": ["hostid"], "filter": { "host": ["web01"] } },
            "auth": TOKEN,
            "id": 2
        }),
        json!([{ "hostid": "10105" }]),
    );
    let create = rpc_ok_matching(
        &mut server,
        Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "method": "maintenance.create",
                "params": {
                    "description": "Host: web01",
                    "hostids": ["10105"],
                    "groupids": [],
                    "tags": [],
                    "timeperiods": [{ "period": 1800 }]
                },
                "auth": TOKEN,
                "id": 3
            })),
            Matcher::Regex(r#""name":"Automatic 30 min \(since [^"]+\)""#.to_string()),
            Matcher::Regex(r#""hostids":\["10105"\]"#.to_string()),
        ]),
        json!({ "maintenanceids": ["42"] }),
    );
    let list = rpc_ok(
        &mut server,
        json!({
            "method": "maintenance.get",
            "params": { "output": "extend", "selectTimeperiods": "extend", "selectTags": "extend" },
            "id": 4
        }),
        json!([
            {
                "maintenanceid": "1",
                "name": "Automatic 10 min (since 2024-01-01 10:00:00)",
                "active_since": (now - 700).to_string(),
                "active_till": (now - 100).to_string(),
                "timeperiods": [{ "period": "600" }],
                "tags": []
            },
            {
                "maintenanceid": "2",
                "name": "Manual check",
                "active_since": (now - 700).to_string(),
                "active_till": (now - 100).to_string()
            },
            {
                "maintenanceid": "3",
                "name": "Automatic 5 min (since 2024-01-01 10:05:00)",
                "active_since": (now - 200).to_string(),
                "active_till": (now + 100).to_string()
            }
        ]),
    );
    let delete = rpc_ok_matching(
        &mut server,
        Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "maintenance.delete", "id": 5 })),
            Matcher::Regex(r#""params":\["1"\]"#.to_string()),
        ]),
        json!({ "maintenanceids": ["1"] }),
    );
    let logout = rpc_ok(&mut server, json!({ "method": "user.logout", "id": 6 }), json!(true));

    let summary = run(&settings(&server, Some(password())), &job(30)).unwrap();

    assert_eq!(summary.created, MaintenanceId::new("42"));
    assert_eq!(summary.deleted, vec![MaintenanceId::new("1")]);
    for mock in [login, host, create, list, delete, logout] {
        mock.assert();
    }
}

#[test]
fn unknown_host_aborts_but_still_logs_out() {
    let mut server = Server::new();
    let _login = rpc_ok(&mut server, json!({ "method": "user.login" }), json!(TOKEN));
    let host = rpc_ok(&mut server, json!({ "method": "host.get" }), json!([]));
    let create = never(&mut server, "maintenance.create");
    let list = never(&mut server, "maintenance.get");
    let logout = rpc_ok(&mut server, json!({ "method": "user.logout", "id": 3 }), json!(true));

    let err = run(&settings(&server, Some(password())), &job(30)).unwrap_err();

    assert!(matches!(err, Error::UnknownHost(ref name) if name == "web01"));
    host.assert();
    create.assert();
    list.assert();
    logout.assert();
}

#[test]
fn rejected_create_is_propagated_and_session_released() {
    let mut server = Server::new();
    let _login = rpc_ok(&mut server, json!({ "method": "user.login" }), json!(TOKEN));
    let _host = rpc_ok(&mut server, json!({ "method": "host.get" }), json!([{ "hostid": "10105" }]));
    let create = rpc_error(
        &mut server,
        json!({ "method": "maintenance.create" }),
        "Invalid params.",
        "Maintenance \"Automatic 30 min\" already exists.",
    );
    let list = never(&mut server, "maintenance.get");
    let logout = rpc_ok(&mut server, json!({ "method": "user.logout" }), json!(true));

    let err = run(&settings(&server, Some(password())), &job(30)).unwrap_err();

    match err {
        Error::Api { method, data, .. } => {
            assert_eq!(method, "maintenance.create");
            assert!(data.unwrap().contains("already exists"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    create.assert();
    list.assert();
    logout.assert();
}

#[test]
fn nothing_expired_skips_delete() {
    let now = Utc::now().timestamp();
    let mut server = Server::new();
    let _host = rpc_ok(&mut server, json!({ "method": "host.get" }), json!([{ "hostid": "10105" }]));
    let _create = rpc_ok(
        &mut server,
        json!({ "method": "maintenance.create" }),
        json!({ "maintenanceids": ["43"] }),
    );
    let _list = rpc_ok(
        &mut server,
        json!({ "method": "maintenance.get" }),
        json!([
            {
                "maintenanceid": "5",
                "name": "Manual check",
                "active_since": 0,
                "active_till": 1
            },
            {
                "maintenanceid": "6",
                "name": "Automatic 60 min (since 2024-01-01 10:00:00)",
                "active_since": now,
                "active_till": now + 3600
            }
        ]),
    );
    let delete = never(&mut server, "maintenance.delete");
    let logout = never(&mut server, "user.logout");

    let credentials = zabbix_maintenance::Credentials::Token(TOKEN.to_string());
    let summary = run(&settings(&server, Some(credentials)), &job(60)).unwrap();

    assert_eq!(summary.created, MaintenanceId::new("43"));
    assert!(summary.deleted.is_empty());
    delete.assert();
    logout.assert();
}

#[test]
fn malformed_host_result_counts_as_unknown_host() {
    let mut server = Server::new();
    let _host = rpc_ok(&mut server, json!({ "method": "host.get" }), json!({ "unexpected": true }));
    let create = never(&mut server, "maintenance.create");

    let credentials = zabbix_maintenance::Credentials::Token(TOKEN.to_string());
    let err = run(&settings(&server, Some(credentials)), &job(30)).unwrap_err();

    assert!(matches!(err, Error::UnknownHost(_)));
    create.assert();
}

#[test]
fn zero_minute_window_is_rejected_without_requests() {
    let mut server = Server::new();
    let host = never(&mut server, "host.get");
    let create = never(&mut server, "maintenance.create");

    let credentials = zabbix_maintenance::Credentials::Token(TOKEN.to_string());
    let err = run(&settings(&server, Some(credentials)), &job(0)).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    host.assert();
    create.assert();
}
