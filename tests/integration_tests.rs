use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use indicator_api::config::AppConfig;
use indicator_api::filter::FilterRequest;
use indicator_api::loader::IndicatorStore;
use indicator_api::pipeline;
use indicator_api::server::router;
use indicator_api::state::AppState;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Write one ind_<id> folder with its three artifacts
fn write_indicator(root: &Path, id: u64, metadata: Value, template: Value, csv: &str) {
    let dir = root.join(format!("ind_{}", id));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metadata.json"), metadata.to_string()).unwrap();
    fs::write(dir.join("data_example.json"), template.to_string()).unwrap();
    fs::write(dir.join("raw_data.csv"), csv).unwrap();
}

fn chart_template() -> Value {
    json!({
        "option_echarts": {
            "xAxis": {"type": "category", "data": []},
            "series": [{"id": "1", "type": "line", "lineStyle": {"width": 3}}]
        }
    })
}

/// Fixture directory with a multi-series, a single-series and a map indicator
fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let age_csv = "nome_option_f7 ,nome_option_f3,faixa_etaria,valor\n\
                   2010,Norte,0-4,10\n\
                   2010,Norte,5-9,20\n\
                   2011,Sul,0-4,5\n\
                   2011,Norte,5-9,7\n";
    write_indicator(
        root,
        1299,
        json!({"id": 1299, "nome": "Nascidos vivos", "viz": "Múltipla"}),
        chart_template(),
        age_csv,
    );
    write_indicator(
        root,
        4445,
        json!({"id": 4445, "nome": "Óbitos", "viz": "simples"}),
        chart_template(),
        age_csv,
    );
    write_indicator(
        root,
        6220,
        json!({"id": 6220, "nome": "Cobertura", "viz": "mapa"}),
        json!({"option_echarts": {"visualMap": {"left": "right"}, "series": [{"type": "map", "map": "goias"}]}}),
        "nome_option_f1,tx_cobertura\nGoiânia,5\nGoiânia,7\nAnápolis,2.5\n",
    );

    let maps = root.join("maps");
    fs::create_dir_all(&maps).unwrap();
    fs::write(maps.join("goias.json"), r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
    tmp
}

fn store(tmp: &TempDir) -> IndicatorStore {
    IndicatorStore::new(tmp.path(), tmp.path().join("maps"))
}

fn app(tmp: &TempDir) -> axum::Router {
    let config = AppConfig {
        data_dir: tmp.path().to_path_buf(),
        maps_dir: tmp.path().join("maps"),
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        default_limit: 2,
        max_limit: 10,
    };
    router(AppState::new(Arc::new(config)))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[test]
fn test_pipeline_multi_series_from_disk() {
    let tmp = fixture();
    let out = pipeline::run(&store(&tmp), 1299, &FilterRequest::new()).unwrap();
    let option = &out.response.data_example["option_echarts"];
    assert_eq!(option["xAxis"]["data"], json!([2010, 2011]));
    assert_eq!(
        option["series"],
        json!([
            {"id": "1", "type": "line", "name": "0-4", "data": [[0, 10.0], [1, 5.0]], "lineStyle": {"width": 3}, "itemStyle": {}},
            {"id": "1", "type": "line", "name": "5-9", "data": [[0, 20.0], [1, 7.0]], "lineStyle": {"width": 3}, "itemStyle": {}}
        ])
    );
}

#[test]
fn test_pipeline_single_series_with_filter() {
    let tmp = fixture();
    let request = FilterRequest::from_pairs(vec![("nome_option_f3", "Norte")]);
    let out = pipeline::run(&store(&tmp), 4445, &request).unwrap();
    let doc = &out.response.data_example;
    assert_eq!(doc["option_echarts"]["xAxis"]["data"], json!([2010, 2011]));
    assert_eq!(doc["option_echarts"]["series"][0]["name"], json!("Óbitos"));
    assert_eq!(doc["option_echarts"]["series"][0]["data"], json!([[0, 30.0], [1, 7.0]]));
    assert_eq!(doc["applyed_filters"], json!([{"id_filtro": 3, "id_option": ["Norte"]}]));
    assert!(doc["data_criacao"].is_string());
}

#[test]
fn test_pipeline_map_from_disk() {
    let tmp = fixture();
    let out = pipeline::run(&store(&tmp), 6220, &FilterRequest::new()).unwrap();
    let option = &out.response.data_example["option_echarts"];
    assert_eq!(
        option["series"][0],
        json!({"type": "map", "map": "goias", "data": [
            {"name": "Anápolis", "value": 2.5},
            {"name": "Goiânia", "value": 12.0}
        ]})
    );
    assert_eq!(option["visualMap"], json!({"left": "right", "min": 2.5, "max": 12}));
}

#[test]
fn test_pipeline_does_not_touch_files() {
    let tmp = fixture();
    let csv_path = tmp.path().join("ind_1299").join("raw_data.csv");
    let before = fs::read(&csv_path).unwrap();
    let request = FilterRequest::from_pairs(vec![("nome_option_f7", "2010")]);
    let first = pipeline::run(&store(&tmp), 1299, &request).unwrap();
    let second = pipeline::run(&store(&tmp), 1299, &request).unwrap();
    assert_eq!(fs::read(&csv_path).unwrap(), before);
    assert_eq!(
        first.response.data_example["option_echarts"],
        second.response.data_example["option_echarts"]
    );
}

#[tokio::test]
async fn test_http_list_indicators_paginated() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/indicators").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"indicators": [1299, 4445], "total": 3, "limit": 2, "offset": 0}));

    let (_, body) = get(app(&tmp), "/indicators?limit=2&offset=2").await;
    assert_eq!(body["indicators"], json!([6220]));
}

#[tokio::test]
async fn test_http_get_indicator_unfiltered() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/indicators/1299").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["nome"], json!("Nascidos vivos"));
    assert_eq!(body["data_example"], chart_template());
}

#[tokio::test]
async fn test_http_filter_multi_valued_query() {
    let tmp = fixture();
    let uri = "/indicators/1299/filter?nome_option_f7=2010&nome_option_f7=2011&nome_option_f3=Norte";
    let (status, body) = get(app(&tmp), uri).await;
    assert_eq!(status, StatusCode::OK);
    let doc = &body["data_example"];
    assert_eq!(
        doc["applyed_filters"],
        json!([
            {"id_filtro": 7, "id_option": ["2010", "2011"]},
            {"id_filtro": 3, "id_option": ["Norte"]}
        ])
    );
    let series = doc["option_echarts"]["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["data"], json!([[0, 10.0]]));
    assert_eq!(series[1]["data"], json!([[0, 20.0], [1, 7.0]]));
}

#[tokio::test]
async fn test_http_filter_zero_rows() {
    let tmp = fixture();
    let uri = "/indicators/4445/filter?nome_option_f3=Leste,Oeste";
    let (status, body) = get(app(&tmp), uri).await;
    assert_eq!(status, StatusCode::OK);
    let doc = &body["data_example"];
    assert_eq!(doc["option_echarts"]["xAxis"], json!({"data": []}));
    assert_eq!(doc["option_echarts"]["series"], json!([]));
    assert_eq!(doc["applyed_filters"], json!([{"id_filtro": 3, "id_option": ["Leste", "Oeste"]}]));
}

#[tokio::test]
async fn test_http_map_filter_zero_rows() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/indicators/6220/filter?nome_option_f1=Catal%C3%A3o").await;
    assert_eq!(status, StatusCode::OK);
    let doc = &body["data_example"];
    assert_eq!(doc["option_echarts"]["series"], json!([]));
    assert_eq!(doc["option_echarts"]["xAxis"], json!({"data": []}));
    assert_eq!(doc["option_echarts"]["visualMap"], json!({"left": "right"}));
    assert_eq!(doc["applyed_filters"], json!([{"id_filtro": 1, "id_option": ["Catalão"]}]));
}

#[tokio::test]
async fn test_http_map_insufficient_fields() {
    let tmp = fixture();
    write_indicator(
        tmp.path(),
        6221,
        json!({"id": 6221, "nome": "Municípios", "viz": "mapa"}),
        json!({"option_echarts": {"visualMap": {}, "series": [{"type": "map"}]}}),
        "nome_option_f1\nGoiânia\nAnápolis\n",
    );
    let (status, body) = get(app(&tmp), "/indicators/6221/filter").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("insufficient fields"));
}

#[test]
fn test_pipeline_map_ignores_missing_value_markers() {
    let tmp = fixture();
    write_indicator(
        tmp.path(),
        6222,
        json!({"id": 6222, "nome": "Cobertura", "viz": "mapa"}),
        json!({"option_echarts": {"visualMap": {}, "series": [{"type": "map"}]}}),
        "nome,tx\nCityA,5\nNA,7\nnull,3\nCityB,inf\n",
    );
    let out = pipeline::run(&store(&tmp), 6222, &FilterRequest::new()).unwrap();
    let option = &out.response.data_example["option_echarts"];
    assert_eq!(option["series"][0]["data"], json!([{"name": "CityA", "value": 5.0}]));
    assert_eq!(option["visualMap"], json!({"min": 5, "max": 5}));
}

#[tokio::test]
async fn test_http_not_found() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/indicators/9999/filter").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get(app(&tmp), "/indicators/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(app(&tmp), "/maps/parana").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_http_map_shape_verbatim() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/maps/goias").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"type": "FeatureCollection", "features": []}));
}

#[tokio::test]
async fn test_http_health() {
    let tmp = fixture();
    let (status, body) = get(app(&tmp), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
