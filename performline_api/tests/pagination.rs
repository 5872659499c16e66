use performline_api::{
    EnvelopeBuilder, Error, RequestContext, RequestOptions, RestClient, SuccessResponse,
    UntilFn, UntilOptions,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_three_pages(server: &MockServer) {
    // The generic page only answers requests the offset-specific mocks miss.
    Mock::given(method("GET"))
        .and(path("/request_until_test/"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            EnvelopeBuilder::new(json!({"Id": 1})).with_total(3).with_limit(1).build(),
        ))
        .with_priority(10)
        .expect(1)
        .mount(server)
        .await;

    for offset in [1u64, 2] {
        Mock::given(method("GET"))
            .and(path("/request_until_test/"))
            .and(query_param("limit", "1"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    EnvelopeBuilder::new(json!({"Id": offset + 1}))
                        .with_total(3)
                        .with_limit(1)
                        .with_offset(offset)
                        .build(),
                ),
            )
            .with_priority(1)
            .expect(1)
            .mount(server)
            .await;
    }
}

fn offsets_sent(requests: &[wiremock::Request]) -> Vec<Option<String>> {
    requests
        .iter()
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn get_until_walks_three_pages() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server).await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let responses = client
        .get_until(
            "/request_until_test/",
            RequestOptions::new().with_param("limit", 1),
            UntilOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(responses.len(), 3);
    for (i, response) in responses.iter().enumerate() {
        assert_eq!(response.result(0)["Id"], json!(i + 1));
        assert_eq!(response.limit(), 1);
        assert_eq!(response.offset(), i as u64);
    }

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        offsets_sent(&requests),
        vec![None, Some("1".to_string()), Some("2".to_string())]
    );
}

#[tokio::test]
async fn explicit_offset_zero_is_advanced() {
    let mock_server = MockServer::start().await;
    mount_three_pages(&mock_server).await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let responses = client
        .get_until(
            "request_until_test",
            RequestOptions::new().with_param("limit", 1).with_param("offset", 0),
            UntilOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(responses.len(), 3);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        offsets_sent(&requests),
        vec![Some("0".to_string()), Some("1".to_string()), Some("2".to_string())]
    );
}

#[tokio::test]
async fn no_predicate_means_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/request_until_test/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            EnvelopeBuilder::new(json!({"Id": 1})).with_total(3).with_limit(1).build(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let responses = client
        .request_until(
            "get",
            "request_until_test",
            RequestOptions::new().with_param("limit", 1),
            UntilOptions::default(),
            None::<UntilFn>,
        )
        .await
        .unwrap();
    assert_eq!(responses.len(), 1);
}

#[tokio::test]
async fn predicate_never_true_hits_iteration_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forever/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "success"})))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let mut seen = Vec::new();
    let err = client
        .request_until(
            "get",
            "forever",
            RequestOptions::new(),
            UntilOptions::default().with_max_iterations(Some(5)),
            Some(|i: usize, _: &SuccessResponse, _: &mut RequestContext| {
                seen.push(i);
                false
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TooManyIterations { max_iterations: 5, .. }));
    assert_eq!(
        err.to_string(),
        "Request GET forever has exceeded the maximum iteration count of 5"
    );
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn predicate_can_rewrite_the_next_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/first/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "success", "Results": [1]})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/second/"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "success", "Results": [2]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let responses = client
        .request_until(
            "get",
            "first",
            RequestOptions::new(),
            UntilOptions::default().with_request_delay(Duration::from_millis(5)),
            Some(|i: usize, _: &SuccessResponse, ctx: &mut RequestContext| {
                if i == 0 {
                    ctx.method = performline_api::Method::Post;
                    ctx.path = "second".to_string();
                    ctx.params_mut().insert("cursor".into(), json!("abc"));
                    return false;
                }
                true
            }),
        )
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1].results(), vec![json!(2)]);
}

#[tokio::test]
async fn failure_mid_loop_propagates() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/flaky/"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(path("/flaky/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            EnvelopeBuilder::new(json!([{"Id": 1}, {"Id": 2}])).with_total(6).with_limit(2).build(),
        ))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let client = RestClient::new(&mock_server.uri()).unwrap();
    let err = client
        .get_until("flaky", RequestOptions::new().with_param("limit", 2), UntilOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ServiceUnavailable(_)));
}
