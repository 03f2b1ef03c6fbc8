#![allow(clippy::unwrap_used)]
// Integration tests for `XapiClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panly_api::{
    AuthCredentials, CommitRequest, Error, ExportQuery, ImportRequest, LogQuery, ReportQuery, Status,
    XapiClient, XapiConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer, auth: AuthCredentials) -> XapiConfig {
    let addr = server.address();
    let mut config = XapiConfig::new(addr.ip().to_string(), auth);
    config.port = Some(addr.port());
    config.use_http = true;
    config
}

fn api_key() -> AuthCredentials {
    AuthCredentials::ApiKey(SecretString::from("test-key".to_owned()))
}

async fn setup() -> (MockServer, XapiClient) {
    let server = MockServer::start().await;
    let client = XapiClient::new(config_for(&server, api_key())).unwrap();
    (server, client)
}

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), "application/xml; charset=UTF-8")
}

// ── Config actions ──────────────────────────────────────────────────

#[tokio::test]
async fn test_get_returns_result_children() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("type=config"))
        .and(body_string_contains("action=get"))
        .and(body_string_contains("xpath=%2Fconfig%2Fmgt-config"))
        .and(body_string_contains("key=test-key"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result total-count="1" count="1"><mgt-config><users/></mgt-config></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client.get(Some("/config/mgt-config")).await.unwrap();

    let response = client.last_response();
    assert_eq!(response.status(), Some(&Status::Success));
    assert_eq!(response.status_code(), Some("19"));
    assert_eq!(response.http_status(), Some(200));
    assert_eq!(
        response.xml_result().as_deref(),
        Some("<mgt-config><users /></mgt-config>")
    );
}

#[tokio::test]
async fn test_show_error_surfaces_message_and_code() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=show"))
        .respond_with(xml(
            r#"<response status="error" code="7"><msg><line>Object doesn't exist</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let err = client.show(Some("/config/nope")).await.unwrap_err();

    assert!(
        matches!(&err, Error::Api { message, code } if message == "Object doesn't exist" && code.as_deref() == Some("7")),
        "expected Api error, got: {err:?}"
    );
    assert_eq!(err.api_code(), Some("7"));
    let response = client.last_response();
    assert_eq!(response.status(), Some(&Status::Error));
    assert_eq!(response.status_detail(), Some("Object doesn't exist"));
}

#[tokio::test]
async fn test_error_without_message_names_status() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(xml(r#"<response status="error" code="400"><result/></response>"#))
        .mount(&server)
        .await;

    let err = client.delete(Some("/config/x")).await.unwrap_err();
    assert_eq!(err.to_string(), r#"request failed: status="error" code="400""#);
}

#[tokio::test]
async fn test_set_sends_element() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=set"))
        .and(body_string_contains("element=%3Cdescription%3Elab%3C%2Fdescription%3E"))
        .respond_with(xml(
            r#"<response status="success" code="20"><msg>command succeeded</msg></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set(Some("/config/devices"), Some("<description>lab</description>"))
        .await
        .unwrap();
    assert_eq!(client.last_response().status_detail(), Some("command succeeded"));
}

#[tokio::test]
async fn test_multi_config_reports_each_action() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=multi-config"))
        .and(body_string_contains("strict-transactional=yes"))
        .respond_with(xml(
            r#"<response status="error" code="12">
                 <response status="success" code="20" id="1"><msg><line>command succeeded</line></msg></response>
                 <response status="error" code="12" id="2"><msg>Invalid name</msg></response>
               </response>"#,
        ))
        .mount(&server)
        .await;

    let err = client
        .multi_config("<multi-configure-request/>", true)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "status=\"success\" code=\"20\" id=\"1\" command succeeded\n\
         status=\"error\" code=\"12\" id=\"2\" Invalid name"
    );
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_keygen_runs_once_and_key_is_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=keygen"))
        .and(body_string_contains("user=admin"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(xml(
            r#"<response status="success"><result><key>MINTED==</key></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .and(body_string_contains("key=MINTED=="))
        .respond_with(xml(
            r#"<response status="success"><result><system><hostname>fw1</hostname></system></result></response>"#,
        ))
        .expect(2)
        .mount(&server)
        .await;

    let auth = AuthCredentials::Password {
        username: "admin".into(),
        password: SecretString::from("s3cret".to_owned()),
    };
    let mut client = XapiClient::new(config_for(&server, auth)).unwrap();

    client.op(Some("show system info"), None, true).await.unwrap();
    client.op(Some("<show><system><info/></system></show>"), None, false).await.unwrap();

    assert_eq!(client.api_key().unwrap().expose_secret(), "MINTED==");
}

#[tokio::test]
async fn test_keygen_without_key_element() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(xml(r#"<response status="success"><result/></response>"#))
        .mount(&server)
        .await;

    let auth = AuthCredentials::Password {
        username: "admin".into(),
        password: SecretString::from("pw".to_owned()),
    };
    let mut client = XapiClient::new(config_for(&server, auth)).unwrap();

    let err = client.keygen().await.unwrap_err();
    assert_eq!(err.to_string(), "keygen(): key element not found");
}

#[tokio::test]
async fn test_keygen_rejected_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403).set_body_raw(
                r#"<response status="error" code="403"><result><msg>Invalid Credential</msg></result></response>"#,
                "application/xml",
            ),
        )
        .mount(&server)
        .await;

    let auth = AuthCredentials::Password {
        username: "admin".into(),
        password: SecretString::from("wrong".to_owned()),
    };
    let mut client = XapiClient::new(config_for(&server, auth)).unwrap();

    let err = client.show(None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid Credential");
    assert_eq!(client.last_response().http_status(), Some(403));
    assert!(client.api_key().is_none());
}

// ── Response kinds ──────────────────────────────────────────────────

#[tokio::test]
async fn test_export_attachment_keeps_category() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=export"))
        .and(body_string_contains("category=application-pcap"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0xd4, 0xc3, 0xb2, 0xa1, 0x02, 0x00], "application/octet-stream")
                .insert_header("content-disposition", "attachment; filename=Trace_01.pcap"),
        )
        .mount(&server)
        .await;

    let query = ExportQuery {
        category: Some("application-pcap".into()),
        from: Some("Trace_01.pcap".into()),
        ..ExportQuery::default()
    };
    client.export(&query).await.unwrap();

    let response = client.last_response();
    assert_eq!(response.status(), Some(&Status::Success));
    let attachment = response.attachment().unwrap();
    assert_eq!(attachment.filename.as_deref(), Some("Trace_01.pcap"));
    assert_eq!(attachment.content.as_ref(), &[0xd4, 0xc3, 0xb2, 0xa1, 0x02, 0x00]);
    assert_eq!(attachment.category.as_deref(), Some("application-pcap"));
}

#[tokio::test]
async fn test_plain_text_body() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("set deviceconfig system hostname fw1\n", "text/plain; charset=UTF-8"),
        )
        .mount(&server)
        .await;

    client.op(Some("<show><config><running/></config></show>"), None, false).await.unwrap();

    let response = client.last_response();
    assert_eq!(response.text(), Some("set deviceconfig system hostname fw1\n"));
    assert!(response.is_success());
    assert!(response.root().is_none());
}

#[tokio::test]
async fn test_unknown_content_type_is_a_classification_error() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let err = client.show(None).await.unwrap_err();
    assert!(matches!(err, Error::Classification { .. }), "got: {err:?}");
    assert_eq!(err.to_string(), "no handler for content-type: application/json");
}

#[tokio::test]
async fn test_http_error_with_unparseable_body() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_raw("<html>oops</html>", "text/html"))
        .mount(&server)
        .await;

    let err = client.show(None).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP Error 500: Internal Server Error");
    let response = client.last_response();
    assert_eq!(response.http_status(), Some(500));
    assert_eq!(response.reason(), Some("Internal Server Error"));
}

#[tokio::test]
async fn test_http_error_with_success_document_still_fails() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503).set_body_raw(
                r#"<response status="success"><result/></response>"#,
                "application/xml",
            ),
        )
        .mount(&server)
        .await;

    let err = client.show(None).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 503, .. }), "got: {err:?}");
    assert_eq!(client.last_response().status(), Some(&Status::Success));
}

#[tokio::test]
async fn test_malformed_xml_keeps_document() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(xml(r#"<response status="success"><result>"#))
        .mount(&server)
        .await;

    let err = client.get(None).await.unwrap_err();
    assert!(matches!(err, Error::XmlParse { .. }), "got: {err:?}");
    assert_eq!(
        client.last_response().xml_document(),
        Some(r#"<response status="success"><result>"#)
    );
}

// ── Jobs over HTTP ──────────────────────────────────────────────────

#[tokio::test]
async fn test_log_polls_until_fin() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("log-type=traffic"))
        .and(body_string_contains("nlogs=20"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result><msg><line>query job enqueued with jobid 5</line></msg><job>5</job></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=get"))
        .and(body_string_contains("job-id=5"))
        .respond_with(xml(
            r#"<response status="success"><result><job><id>5</id><status>ACT</status></job></result></response>"#,
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("action=get"))
        .and(body_string_contains("job-id=5"))
        .respond_with(xml(
            r#"<response status="success"><result><job><id>5</id><status>FIN</status></job><log><logs count="1"><entry logid="1"/></logs></log></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let query = LogQuery {
        log_type: Some("traffic".into()),
        nlogs: Some(20),
        interval: Some(0.0),
        ..LogQuery::default()
    };
    let job = client.log(&query).await.unwrap();

    assert_eq!(job.as_deref(), Some("5"));
    let logs = client.last_response().result().unwrap().find("log/logs").unwrap();
    assert_eq!(logs.attr("count"), Some("1"));
}

#[tokio::test]
async fn test_commit_sync_checks_show_jobs() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=commit"))
        .respond_with(xml(
            r#"<response status="success" code="19"><result><msg><line>Commit job enqueued with jobid 7</line></msg><job>7</job></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=op"))
        .and(body_string_contains(
            "cmd=%3Cshow%3E%3Cjobs%3E%3Cid%3E7%3C%2Fid%3E%3C%2Fjobs%3E%3C%2Fshow%3E",
        ))
        .respond_with(xml(
            r#"<response status="success"><result><job><id>7</id><status>FIN</status><details><line>Configuration committed successfully</line></details></job></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let commit = CommitRequest {
        cmd: Some("<commit></commit>".into()),
        sync: true,
        interval: Some(0.0),
        ..CommitRequest::default()
    };
    let job = client.commit(&commit).await.unwrap();

    assert_eq!(job.as_deref(), Some("7"));
    assert_eq!(
        client.last_response().status_detail(),
        Some("Configuration committed successfully")
    );
}

#[tokio::test]
async fn test_report_delivered_inline_is_not_polled() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=report"))
        .and(body_string_contains("reporttype=predefined"))
        .and(body_string_contains("reportname=top-applications"))
        .respond_with(xml(
            r#"<response status="success"><report><result name="top-applications"><entry/></result></report></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let query = ReportQuery {
        report_type: Some("predefined".into()),
        report_name: Some("top-applications".into()),
        ..ReportQuery::default()
    };
    let job = client.report(&query).await.unwrap();

    assert_eq!(job, None);
    assert_eq!(
        client.last_response().result().unwrap().attr("name"),
        Some("top-applications")
    );
}

// ── Requests that never reach the server ────────────────────────────

#[tokio::test]
async fn test_invalid_ad_hoc_query_sends_nothing() {
    let (server, mut client) = setup().await;

    let err = client.ad_hoc(Some("type=op&cmd"), None, false).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid ad_hoc query: type=op&cmd");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_interval_sends_nothing() {
    let (server, mut client) = setup().await;

    let query = LogQuery {
        interval: Some(-1.0),
        ..LogQuery::default()
    };
    let err = client.log(&query).await.unwrap_err();

    assert!(err.is_parameter());
    assert_eq!(err.to_string(), "Invalid interval: -1");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ad_hoc_modify_qs_adds_client_params() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(body_string_contains("type=config"))
        .and(body_string_contains("action=show"))
        .and(body_string_contains("xpath=%2Fconfig"))
        .and(body_string_contains("key=test-key"))
        .respond_with(xml(r#"<response status="success"><result/></response>"#))
        .expect(1)
        .mount(&server)
        .await;

    client
        .ad_hoc(Some("type=config&action=show"), Some("/config"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ad_hoc_modify_qs_replaces_query_key() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(xml(r#"<response status="success"><result/></response>"#))
        .expect(1)
        .mount(&server)
        .await;

    client
        .ad_hoc(Some("type=op&key=OLDKEY"), None, true)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(body, "type=op&key=test-key");
}

// ── GET transport ───────────────────────────────────────────────────

#[tokio::test]
async fn test_use_get_sends_query_string() {
    let server = MockServer::start().await;
    let mut config = config_for(&server, api_key());
    config.use_get = true;
    let mut client = XapiClient::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "config"))
        .and(query_param("action", "get"))
        .and(query_param("xpath", "/config/devices"))
        .and(query_param("key", "test-key"))
        .respond_with(xml(
            r#"<response status="success"><result><devices/></result></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client.get(Some("/config/devices")).await.unwrap();
    assert_eq!(
        client.last_response().xml_result().as_deref(),
        Some("<devices />")
    );
}

// ── Import ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_import_uploads_multipart_file() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(query_param("type", "import"))
        .and(query_param("category", "certificate"))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("filename=\"ca.pem\""))
        .and(body_string_contains("-----BEGIN CERTIFICATE-----"))
        .respond_with(xml(
            r#"<response status="success"><msg>Successfully imported ca into candidate configuration</msg></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    client
        .import(ImportRequest {
            category: "certificate".into(),
            filename: "ca.pem".into(),
            content: b"-----BEGIN CERTIFICATE-----\nMIIB\n".to_vec(),
            extra: vec![("certificate-name".into(), "ca".into()), ("format".into(), "pem".into())],
        })
        .await
        .unwrap();

    assert_eq!(
        client.last_response().status_detail(),
        Some("Successfully imported ca into candidate configuration")
    );
}
