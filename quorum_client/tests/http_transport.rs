use httpmock::prelude::*;
use quorum_client::{
    ClientConfig, ClientError, ContentQuery, FullNodeClient, Role, TransportError,
};
use serde_json::json;

fn client_for(server: &MockServer, token: Option<&str>) -> FullNodeClient {
    let mut config = ClientConfig::new(server.base_url()).expect("config");
    if let Some(token) = token {
        config = config.with_jwt_token(token);
    }
    FullNodeClient::new(&config).expect("client")
}

#[test]
fn bearer_token_rides_on_every_request() {
    let server = MockServer::start();
    let node = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/node")
            .header("authorization", "Bearer secret");
        then.status(200)
            .json_body(json!({ "node_status": "NODE_ONLINE" }));
    });

    let info = client_for(&server, Some("secret")).node_info().unwrap();

    node.assert();
    assert_eq!(info["node_status"], json!("NODE_ONLINE"));
}

#[test]
fn empty_response_body_reads_as_empty_object() {
    let server = MockServer::start();
    let leave = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/group/leave")
            .json_body(json!({ "group_id": "g1" }));
        then.status(200);
    });

    let resp = client_for(&server, None).leave_group(Some("g1")).unwrap();

    leave.assert();
    assert_eq!(resp, json!({}));
}

#[test]
fn node_error_payload_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/group/join");
        then.status(400)
            .json_body(json!({ "error": "invalid seed" }));
    });

    let err = client_for(&server, None).join_group("rum://bad").unwrap_err();

    match err {
        ClientError::NodeRejected { status, payload } => {
            assert_eq!(status, 400);
            assert_eq!(payload, json!({ "error": "invalid seed" }));
        }
        other => panic!("expected NodeRejected, got {other:?}"),
    }
}

#[test]
fn html_answer_is_a_transport_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/network");
        then.status(502).body("<html>bad gateway</html>");
    });

    let err = client_for(&server, None).network().unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Malformed { status: 502, .. })
    ));
}

#[test]
fn content_query_reaches_the_node() {
    let server = MockServer::start();
    let content = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/group/g1/content")
            .query_param("num", "5")
            .query_param("reverse", "true")
            .query_param("start_trx", "t0")
            .query_param("include_start_trx", "false")
            .query_param("senders", "A");
        then.status(200).json_body(json!([{ "TrxId": "t1" }]));
    });

    let query = ContentQuery::starting_at("t0", false)
        .num(5)
        .reverse(true)
        .senders(["A"]);
    let trxs = client_for(&server, None)
        .get_content(&query, Some("g1"))
        .unwrap();

    content.assert();
    assert_eq!(trxs.len(), 1);
    assert_eq!(trxs[0].trx_id, "t1");
}

#[test]
fn token_removal_sends_a_delete_with_body() {
    let server = MockServer::start();
    let remove = server.mock(|when, then| {
        when.method(DELETE)
            .path("/app/api/v1/token")
            .json_body(json!({ "role": "node", "group_id": "g1", "token": "jwt" }));
        then.status(200).json_body(json!({ "success": true }));
    });

    client_for(&server, None)
        .remove_token("jwt", Role::Node, Some("g1"))
        .unwrap();

    remove.assert();
}
