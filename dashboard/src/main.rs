//! 仪表盘客户端
//!
//! Headless consumer of the entity store:
//! - loads the database connections and restores the last selection
//! - loads the saved queries of the selected database
//! - connects to it and prints a JSON summary of the cached state

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::config::{load_dotenv, AppConfig};
use entity_store::selectors::{
    select_entity_data, select_entity_error, select_entity_pagination, select_selected_database,
    select_selected_database_schema, DATABASE_ENTITY,
};
use entity_store::AppState;

const SERVICE_NAME: &str = "dashboard";
const QUERIES_ENTITY: &str = "queries";

#[derive(Debug, Serialize)]
struct Summary {
    api_url: String,
    theme: String,
    authenticated: bool,
    databases: u64,
    selected_database: Option<String>,
    selected_database_name: Option<String>,
    queries: Vec<String>,
    tables: Vec<String>,
    errors: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 初始化日志追踪，LOG_FORMAT=json 时输出结构化日志
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);
    info!(service = SERVICE_NAME, api_url = %config.api_url, "启动仪表盘客户端");

    // 创建应用状态
    let state = AppState::new(config).context("failed to initialize application state")?;

    state.actions.fetch_entities(DATABASE_ENTITY, None, 1, None).await;

    let mut tables = Vec::new();
    if let Some(id) = state.actions.ensure_selection() {
        let queries_path = format!("database/{}/queries", id);
        state
            .actions
            .fetch_entities(QUERIES_ENTITY, Some(&queries_path), 1, None)
            .await;

        match state.actions.connect_to_database(&id).await {
            Ok(schema) => tables = schema.keys().cloned().collect(),
            Err(e) => warn!(database_id = %id, error = %e, "连接数据库失败"),
        }
    } else {
        info!("没有可用的数据库连接");
    }

    let summary = summarize(&state, tables);
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to render summary")?
    );
    Ok(())
}

fn summarize(state: &AppState, mut tables: Vec<String>) -> Summary {
    state.store.select(|s| {
        let selected = select_selected_database(s);
        if tables.is_empty() {
            tables = select_selected_database_schema(s).keys().cloned().collect();
        }
        Summary {
            api_url: state.config.api_url.clone(),
            theme: state.theme.mode().to_string(),
            authenticated: state.session.is_authenticated(),
            databases: select_entity_pagination(s, DATABASE_ENTITY).total,
            selected_database: selected.and_then(|r| r.id()),
            selected_database_name: selected
                .and_then(|r| r.get("name"))
                .map(ToString::to_string),
            queries: select_entity_data(s, QUERIES_ENTITY)
                .iter()
                .map(|q| {
                    q.get("name")
                        .map(ToString::to_string)
                        .or_else(|| q.id())
                        .unwrap_or_default()
                })
                .collect(),
            tables,
            errors: [DATABASE_ENTITY, QUERIES_ENTITY]
                .iter()
                .filter_map(|entity| {
                    select_entity_error(s, entity).map(|e| format!("{}: {}", entity, e))
                })
                .collect(),
        }
    })
}
