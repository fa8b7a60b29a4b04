use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::config::AppConfig;
use common::models::{FieldValue, Record};
use entity_store::selectors::{
    select_entity_data, select_entity_error, select_entity_loading, select_entity_pagination,
    select_selected_database, select_selected_database_id, select_selected_database_schema,
    SelectedDatabaseMemo,
};
use entity_store::storage::{self, LocalStorage, SELECTED_DATABASE_KEY};
use entity_store::{AppState, CancelToken, HttpApiClient, MemoryStorage};

fn config(api_url: &str) -> AppConfig {
    AppConfig {
        api_url: api_url.to_string(),
        request_timeout_secs: 1,
        ..Default::default()
    }
}

fn app_with_storage(api_url: &str, storage: Arc<MemoryStorage>) -> AppState {
    let config = config(api_url);
    let api = Arc::new(HttpApiClient::new(&config, storage.clone()).unwrap());
    AppState::with_parts(config, storage, api)
}

fn app(server: &MockServer) -> AppState {
    app_with_storage(&server.uri(), Arc::new(MemoryStorage::new()))
}

async fn mount_databases(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/database"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"_id": "d1", "name": "Sales"},
                {"_id": "d2", "name": "Ops"}
            ],
            "total": 2
        })))
        .mount(server)
        .await;
}

fn name_of(record: &Record) -> Option<&str> {
    record.get("name").and_then(FieldValue::as_str)
}

// ── Fetch ───────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_populates_collection_with_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "d6", "name": "Archive"}],
            "total": 6
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 2, Some(5)).await;

    app.store.select(|s| {
        let data = select_entity_data(s, "database");
        assert_eq!(data.len(), 1);
        assert_eq!(name_of(&data[0]), Some("Archive"));
        let p = select_entity_pagination(s, "database");
        assert_eq!((p.total, p.page, p.limit), (6, 2, 5));
        assert_eq!(p.total_pages, 2);
        assert!(!select_entity_loading(s, "database"));
        assert_eq!(select_entity_error(s, "database"), None);
    });
}

#[tokio::test]
async fn fetch_uses_resource_path_and_default_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database/d1/queries"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "q1", "name": "Monthly revenue"}],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions
        .fetch_entities("queries", Some("database/d1/queries"), 1, None)
        .await;

    let ids: Vec<_> = app
        .store
        .select(|s| select_entity_data(s, "queries").iter().filter_map(Record::id).collect());
    assert_eq!(ids, vec!["q1".to_string()]);
}

#[tokio::test]
async fn fetch_sends_stored_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .and(header("authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    storage::save_token(storage.as_ref(), "jwt-123").unwrap();
    let app = app_with_storage(&server.uri(), storage);
    app.actions.fetch_entities("database", None, 1, None).await;

    app.store
        .select(|s| assert_eq!(select_entity_error(s, "database"), None));
}

#[tokio::test]
async fn fetch_failure_keeps_previous_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "d1", "name": "Sales"}],
            "total": 1
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    app.actions.fetch_entities("database", None, 1, None).await;

    app.store.select(|s| {
        assert_eq!(select_entity_data(s, "database").len(), 1);
        assert_eq!(select_entity_error(s, "database"), Some("boom"));
        assert!(!select_entity_loading(s, "database"));
    });
}

#[tokio::test]
async fn fetch_failure_without_body_uses_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("reports", None, 1, None).await;

    app.store.select(|s| {
        assert_eq!(
            select_entity_error(s, "reports"),
            Some("Request failed with status code 503")
        );
        assert!(select_entity_data(s, "reports").is_empty());
    });
}

#[tokio::test]
async fn fetch_unreachable_server_records_network_error() {
    let app = app_with_storage("http://127.0.0.1:1", Arc::new(MemoryStorage::new()));
    app.actions.fetch_entities("database", None, 1, None).await;

    app.store.select(|s| {
        let error = select_entity_error(s, "database").unwrap();
        assert!(!error.is_empty());
        assert!(!select_entity_loading(s, "database"));
    });
}

#[tokio::test]
async fn fetch_timeout_records_timeout_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [], "total": 0}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;

    app.store.select(|s| {
        assert_eq!(select_entity_error(s, "database"), Some("timeout of 1000ms exceeded"));
        assert!(!select_entity_loading(s, "database"));
    });
}

// ── Create / update / delete ────────────────────────────────────

#[tokio::test]
async fn create_prepends_server_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "q1", "name": "Old"}],
            "total": 7
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/queries"))
        .and(body_json(json!({"name": "New"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "q2", "name": "New"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("queries", None, 1, None).await;
    app.actions
        .create_entity("queries", &Record::new().with("name", "New"), None)
        .await;

    app.store.select(|s| {
        let data = select_entity_data(s, "queries");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].id().as_deref(), Some("q2"));
        assert_eq!(select_entity_pagination(s, "queries").total, 8);
        assert!(!select_entity_loading(s, "queries"));
    });
}

#[tokio::test]
async fn create_failure_records_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/queries"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": ["name must not be empty"]})),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.create_entity("queries", &Record::new(), None).await;

    app.store.select(|s| {
        assert_eq!(select_entity_error(s, "queries"), Some("name must not be empty"));
        assert!(select_entity_data(s, "queries").is_empty());
        assert_eq!(select_entity_pagination(s, "queries").total, 0);
    });
}

#[tokio::test]
async fn update_replaces_record_in_place() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/database/d2"))
        .and(body_json(json!({"name": "Operations"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "d2", "name": "Operations"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    app.actions
        .update_entity("database", "d2", &Record::new().with("name", "Operations"), None)
        .await;

    app.store.select(|s| {
        let names: Vec<_> = select_entity_data(s, "database").iter().filter_map(name_of).collect();
        assert_eq!(names, vec!["Sales", "Operations"]);
        assert_eq!(select_entity_pagination(s, "database").total, 2);
    });
}

#[tokio::test]
async fn update_failure_records_error_and_keeps_items() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/database/d2"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "name already taken"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    let before = app.store.select(|s| select_entity_data(s, "database").to_vec());
    app.actions
        .update_entity("database", "d2", &Record::new().with("name", "Sales"), None)
        .await;

    app.store.select(|s| {
        assert_eq!(select_entity_error(s, "database"), Some("name already taken"));
        assert!(!select_entity_loading(s, "database"));
        assert_eq!(select_entity_data(s, "database"), before.as_slice());
        assert_eq!(select_entity_pagination(s, "database").total, 2);
    });
}

#[tokio::test]
async fn update_of_unfetched_entity_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/widgets/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "w1"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    let before = app.store.version();
    app.actions
        .update_entity("widgets", "w1", &Record::new().with("name", "x"), None)
        .await;

    assert_eq!(app.store.version(), before);
    app.store
        .select(|s| assert!(s.collection("widgets").is_none()));
}

#[tokio::test]
async fn delete_removes_record_and_decrements_total() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/database/d1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    app.actions.delete_entity("database", "d1").await;

    app.store.select(|s| {
        let data = select_entity_data(s, "database");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id().as_deref(), Some("d2"));
        assert_eq!(select_entity_pagination(s, "database").total, 1);
    });
}

#[tokio::test]
async fn delete_failure_keeps_record() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/database/d1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    app.actions.delete_entity("database", "d1").await;

    app.store.select(|s| {
        assert_eq!(select_entity_data(s, "database").len(), 2);
        assert_eq!(select_entity_error(s, "database"), Some("Not found"));
        assert!(!select_entity_loading(s, "database"));
    });
}

// ── Selection and connection ────────────────────────────────────

#[tokio::test]
async fn selecting_database_and_loading_its_queries() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("GET"))
        .and(path("/database/d1/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "q1", "name": "Revenue"}],
            "total": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/database/d1/connect"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "schema": {
                "users": [
                    {"name": "id", "type": "int", "isNullable": false, "isPrimary": true},
                    {"name": "email", "type": "varchar", "isNullable": true, "isPrimary": false}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let app = app_with_storage(&server.uri(), storage.clone());
    app.actions.fetch_entities("database", None, 1, None).await;

    let selected = app.actions.ensure_selection();
    assert_eq!(selected.as_deref(), Some("d1"));
    assert_eq!(storage.get(SELECTED_DATABASE_KEY).as_deref(), Some("d1"));

    app.actions
        .fetch_entities("queries", Some("database/d1/queries"), 1, None)
        .await;
    let schema = app.actions.connect_to_database("d1").await.unwrap();
    assert_eq!(schema["users"].len(), 2);

    let mut memo = SelectedDatabaseMemo::new();
    app.store.select(|s| {
        assert_eq!(select_selected_database_id(s), "d1");
        assert_eq!(select_selected_database(s).and_then(name_of), Some("Sales"));
        assert_eq!(select_entity_data(s, "queries").len(), 1);
        assert!(select_selected_database_schema(s)["users"][0].is_primary);
        assert!(!select_entity_loading(s, "database"));
    });
    let first = app.store.select(|s| memo.select(s)).unwrap();
    let second = app.store.select(|s| memo.select(s)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn selection_survives_restart() {
    let server = MockServer::start().await;
    mount_databases(&server).await;

    let storage = Arc::new(MemoryStorage::new());
    let app = app_with_storage(&server.uri(), storage.clone());
    app.actions.select_database("d2");

    let restarted = app_with_storage(&server.uri(), storage);
    restarted.actions.fetch_entities("database", None, 1, None).await;
    assert_eq!(restarted.actions.ensure_selection().as_deref(), Some("d2"));
    restarted.store.select(|s| {
        assert_eq!(select_selected_database(s).and_then(name_of), Some("Ops"));
    });
}

#[tokio::test]
async fn stale_selection_falls_back_to_first_database() {
    let server = MockServer::start().await;
    mount_databases(&server).await;

    let storage = Arc::new(MemoryStorage::new());
    storage::save_selected_database_id(storage.as_ref(), "gone").unwrap();
    let app = app_with_storage(&server.uri(), storage.clone());

    assert_eq!(app.actions.ensure_selection().as_deref(), Some("gone"));

    app.actions.fetch_entities("database", None, 1, None).await;
    assert_eq!(app.actions.ensure_selection().as_deref(), Some("d1"));
    assert_eq!(storage.get(SELECTED_DATABASE_KEY).as_deref(), Some("d1"));
    app.store.select(|s| {
        assert_eq!(select_selected_database(s).and_then(name_of), Some("Sales"));
    });
}

#[tokio::test]
async fn connect_failure_is_returned_and_leaves_collections_alone() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("POST"))
        .and(path("/database/d1/connect"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Connection refused"})),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    let err = app.actions.connect_to_database("d1").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Connection refused");
    app.store.select(|s| {
        assert_eq!(select_entity_error(s, "database"), None);
        assert!(!select_entity_loading(s, "database"));
        assert!(select_selected_database_schema(s).is_empty());
    });
}

// ── Concurrency and cancellation ────────────────────────────────

#[tokio::test]
async fn loading_stays_set_until_every_operation_settles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"_id": "a"}], "total": 1}))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"_id": "b"}], "total": 1}))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    let store = app.store.clone();
    let mid_flight = async {
        tokio::time::sleep(Duration::from_millis(350)).await;
        store.select(|s| {
            (
                select_entity_loading(s, "items"),
                s.collection("items").map(|c| c.in_flight()),
            )
        })
    };

    let (_, _, (loading, in_flight)) = tokio::join!(
        app.actions.fetch_entities("items", Some("fast"), 1, None),
        app.actions.fetch_entities("items", Some("slow"), 1, None),
        mid_flight,
    );
    assert!(loading);
    assert_eq!(in_flight, Some(1));

    app.store.select(|s| {
        assert!(!select_entity_loading(s, "items"));
        let ids: Vec<_> = select_entity_data(s, "items").iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    });
}

#[tokio::test]
async fn untracked_update_does_not_release_a_concurrent_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/widgets/w1"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"message": "boom"}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"_id": "w1"}], "total": 1}))
                .set_delay(Duration::from_millis(700)),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    let store = app.store.clone();
    let delayed_fetch = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.actions.fetch_entities("widgets", None, 1, None).await;
    };
    let mid_fetch = async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        store.select(|s| {
            (
                select_entity_loading(s, "widgets"),
                s.collection("widgets").map(|c| c.in_flight()),
                select_entity_error(s, "widgets").map(String::from),
            )
        })
    };

    let update_record = Record::new().with("name", "x");
    let (_, _, (loading, in_flight, error)) = tokio::join!(
        app.actions
            .update_entity("widgets", "w1", &update_record, None),
        delayed_fetch,
        mid_fetch,
    );
    assert!(loading);
    assert_eq!(in_flight, Some(1));
    assert_eq!(error, None);

    app.store.select(|s| {
        assert!(!select_entity_loading(s, "widgets"));
        assert_eq!(s.collection("widgets").map(|c| c.in_flight()), Some(0));
        assert_eq!(select_entity_error(s, "widgets"), None);
        assert_eq!(select_entity_data(s, "widgets").len(), 1);
    });
}

#[tokio::test]
async fn cancelled_untracked_delete_leaves_counter_alone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/widgets/w1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = app(&server);
    let token = CancelToken::new();
    token.cancel();
    let before = app.store.version();
    app.actions
        .delete_entity_with_cancel("widgets", "w1", &token)
        .await;

    assert_eq!(app.store.version(), before);
    app.store
        .select(|s| assert!(s.collection("widgets").is_none()));
}

#[tokio::test]
async fn cancelled_fetch_discards_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/database"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"_id": "d1"}], "total": 1}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    let token = CancelToken::new();
    let canceller = {
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        }
    };

    tokio::join!(
        app.actions
            .fetch_entities_with_cancel("database", None, 1, None, &token),
        canceller,
    );

    app.store.select(|s| {
        assert!(select_entity_data(s, "database").is_empty());
        assert!(!select_entity_loading(s, "database"));
        assert_eq!(select_entity_error(s, "database"), None);
    });
}

#[tokio::test]
async fn cancelled_delete_keeps_record() {
    let server = MockServer::start().await;
    mount_databases(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/database/d1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = app(&server);
    app.actions.fetch_entities("database", None, 1, None).await;
    let token = CancelToken::new();
    token.cancel();
    app.actions
        .delete_entity_with_cancel("database", "d1", &token)
        .await;

    app.store.select(|s| {
        assert_eq!(select_entity_data(s, "database").len(), 2);
        assert!(!select_entity_loading(s, "database"));
    });
}

#[tokio::test]
async fn subscribers_observe_changes() {
    let server = MockServer::start().await;
    mount_databases(&server).await;

    let app = app(&server);
    let mut rx = app.store.subscribe();
    app.actions.fetch_entities("database", None, 1, None).await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), 2);
}
