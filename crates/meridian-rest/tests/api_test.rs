//! Router tests against mocked services and an in-memory cache manager.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use meridian_cache::{CacheKey, CacheManager, CacheName, MemoryStoreFactory, SerializedValue};
use meridian_config::{CacheConfig, ServerConfig};
use meridian_core::{Department, Employee, MeridianError, MeridianResult};
use meridian_rest::{create_router, AppState};
use meridian_service::{DeptService, EmployeeService};
use mockall::{mock, predicate::eq};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mock! {
    pub EmpService {}

    #[async_trait]
    impl EmployeeService for EmpService {
        async fn get_emp(&self, id: i32) -> MeridianResult<Employee>;
        async fn update_emp(&self, employee: Employee) -> MeridianResult<Employee>;
        async fn delete_emp(&self, id: i32) -> MeridianResult<()>;
        async fn get_emp_by_last_name(&self, last_name: &str) -> MeridianResult<Employee>;
    }
}

mock! {
    pub DeptSvc {}

    #[async_trait]
    impl DeptService for DeptSvc {
        async fn get_dept_by_id(&self, id: i32) -> MeridianResult<Department>;
    }
}

fn zhang() -> Employee {
    Employee::new(1, "Zhang", "zhang@example.com", 1, 2)
}

fn manager() -> Arc<CacheManager> {
    CacheManager::init(&CacheConfig::default(), Arc::new(MemoryStoreFactory))
}

fn app(emp: MockEmpService, dept: MockDeptSvc, manager: Arc<CacheManager>) -> Router {
    let state = AppState::new(Arc::new(emp), Arc::new(dept), manager);
    create_router(state, &ServerConfig::default())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_get_emp() {
    let mut emp = MockEmpService::new();
    emp.expect_get_emp()
        .with(eq(1))
        .returning(|_| Ok(zhang()));

    let (status, body) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::GET,
        "/emp/1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["lastName"], "Zhang");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_get_emp_not_found() {
    let mut emp = MockEmpService::new();
    emp.expect_get_emp()
        .returning(|id| Err(MeridianError::not_found("Employee", id)));

    let (status, body) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::GET,
        "/emp/9",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cache_unavailable_maps_to_503() {
    let mut emp = MockEmpService::new();
    emp.expect_get_emp()
        .returning(|_| Err(MeridianError::CacheUnavailable("connection refused".to_string())));

    let (status, body) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::GET,
        "/emp/1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CACHE_UNAVAILABLE");
}

#[tokio::test]
async fn test_update_emp() {
    let mut emp = MockEmpService::new();
    emp.expect_update_emp()
        .withf(|employee| employee.last_name == "Wang")
        .returning(Ok);

    let body = json!({
        "id": 1,
        "lastName": "Wang",
        "email": "wang@example.com",
        "gender": 1,
        "dId": 2
    });
    let (status, body) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::PUT,
        "/emp",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "wang@example.com");
}

#[tokio::test]
async fn test_delete_emp() {
    let mut emp = MockEmpService::new();
    emp.expect_delete_emp().with(eq(1)).times(1).returning(|_| Ok(()));

    let (status, _) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::DELETE,
        "/emp/1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_get_emp_by_last_name() {
    let mut emp = MockEmpService::new();
    emp.expect_get_emp_by_last_name()
        .withf(|last_name| last_name == "Zhang")
        .returning(|_| Ok(zhang()));

    let (status, body) = send(
        app(emp, MockDeptSvc::new(), manager()),
        Method::GET,
        "/emp/lastname/Zhang",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
}

#[tokio::test]
async fn test_get_dept() {
    let mut dept = MockDeptSvc::new();
    dept.expect_get_dept_by_id()
        .with(eq(2))
        .returning(|id| Ok(Department::new(id, "Engineering")));

    let (status, body) = send(
        app(MockEmpService::new(), dept, manager()),
        Method::GET,
        "/dept/2",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["departmentName"], "Engineering");
}

#[tokio::test]
async fn test_list_caches() {
    let manager = manager();
    for name in ["emp", "dept"] {
        manager
            .get_or_create_store(&CacheName::new(name).unwrap())
            .unwrap();
    }

    let (status, body) = send(
        app(MockEmpService::new(), MockDeptSvc::new(), manager),
        Method::GET,
        "/caches",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["backend"], "memory");
    assert_eq!(body["data"]["caches"], json!(["dept", "emp"]));
}

#[tokio::test]
async fn test_clear_existing_cache() {
    let manager = manager();
    let store = manager
        .get_or_create_store(&CacheName::new("emp").unwrap())
        .unwrap();
    let key = CacheKey::from("1");
    store
        .put(&key, SerializedValue::new("{}"), None)
        .await
        .unwrap();

    let (status, _) = send(
        app(MockEmpService::new(), MockDeptSvc::new(), Arc::clone(&manager)),
        Method::DELETE,
        "/caches/emp",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_clear_unknown_cache_does_not_create_it() {
    let manager = manager();

    let (status, body) = send(
        app(MockEmpService::new(), MockDeptSvc::new(), Arc::clone(&manager)),
        Method::DELETE,
        "/caches/nope",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(manager.cache_names().is_empty());
}

#[tokio::test]
async fn test_health_and_readiness() {
    let manager = manager();

    let (status, body) = send(
        app(MockEmpService::new(), MockDeptSvc::new(), Arc::clone(&manager)),
        Method::GET,
        "/health",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    manager.shutdown();
    let (status, _) = send(
        app(MockEmpService::new(), MockDeptSvc::new(), manager),
        Method::GET,
        "/ready",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
