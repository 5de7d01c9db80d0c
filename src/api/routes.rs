use axum::{
    routing::{get, MethodRouter},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::api::handlers;
use crate::model::{
    Entity, Entreprise, HistoriqueAppel, HistoriqueEmail, HistoriqueMeeting, Prospect, Tache,
};
use crate::store::traits::Store;

fn collection_routes<S: Store + 'static, E: Entity>() -> MethodRouter<Arc<S>> {
    get(handlers::list_records::<S, E>)
        .post(handlers::create_record::<S, E>)
        .put(handlers::missing_id::<E>)
        .delete(handlers::missing_id::<E>)
        .fallback(handlers::method_not_allowed)
}

fn member_routes<S: Store + 'static, E: Entity>() -> MethodRouter<Arc<S>> {
    get(handlers::get_record::<S, E>)
        .put(handlers::update_record::<S, E>)
        .delete(handlers::delete_record::<S, E>)
        .fallback(handlers::method_not_allowed)
}

/// `/api/{route}`, `/api/{route}/` and `/api/{route}/:id` for one entity.
fn resource_routes<S: Store + 'static, E: Entity>(router: Router<Arc<S>>) -> Router<Arc<S>> {
    let base = format!("/api/{}", E::descriptor().route);
    router
        .route(&base, collection_routes::<S, E>())
        // An empty id segment is still a write without an id.
        .route(&format!("{}/", base), collection_routes::<S, E>())
        .route(&format!("{}/:id", base), member_routes::<S, E>())
}

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check));

    let router = resource_routes::<S, Entreprise>(router);
    let router = resource_routes::<S, Prospect>(router);
    let router = resource_routes::<S, Tache>(router);
    let router = resource_routes::<S, HistoriqueEmail>(router);
    let router = resource_routes::<S, HistoriqueAppel>(router);
    let router = resource_routes::<S, HistoriqueMeeting>(router);

    // Everything else is the CRM page
    router.fallback(handlers::crm_page::<S>)
}

/// Router with the page assets mounted under `/static`.
pub fn create_app<S: Store + 'static>(static_dir: impl AsRef<Path>) -> Router<Arc<S>> {
    create_router::<S>().nest_service("/static", ServeDir::new(static_dir.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::store::MemoryStore;

    fn app() -> Router {
        create_router::<MemoryStore>().with_state(Arc::new(MemoryStore::new()))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_acme(app: &Router) -> i64 {
        let (status, body) = call(app, "POST", "/api/entreprises", Some(json!({"nom_entreprise": "Acme"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        body["data"]["entreprise_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_prospect_under_entreprise() {
        let app = app();
        let acme = create_acme(&app).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/prospects",
            Some(json!({"nom": "Doe", "prenom": "Jane", "email": "jane@acme.test", "entreprise_id": acme})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["entreprise_id"], acme);

        let (status, list) = call(&app, "GET", "/api/prospects", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["nom"], "Doe");
        assert_eq!(list[0]["entreprise_id"], acme);
    }

    #[tokio::test]
    async fn test_dangling_reference_is_rejected() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/prospects",
            Some(json!({"nom": "Doe", "prenom": "Jane", "email": "jane@acme.test", "entreprise_id": 999999})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "Entreprise ID '999999' does not exist. Please select a valid Entreprise."
        );

        let (_, list) = call(&app, "GET", "/api/prospects", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let app = app();
        let jane = json!({"nom": "Doe", "prenom": "Jane", "email": "jane@acme.test"});
        let (status, _) = call(&app, "POST", "/api/prospects", Some(jane.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, "POST", "/api/prospects", Some(jane)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Database Constraint Violation: "));
    }

    #[tokio::test]
    async fn test_delete_entreprise_cascades() {
        let app = app();
        let acme = create_acme(&app).await;
        call(
            &app,
            "POST",
            "/api/prospects",
            Some(json!({"nom": "Doe", "prenom": "Jane", "email": "jane@acme.test", "entreprise_id": acme})),
        )
        .await;

        let (status, body) = call(&app, "DELETE", &format!("/api/entreprises/{}", acme), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, list) = call(&app, "GET", "/api/prospects", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let app = app();
        let acme = create_acme(&app).await;
        let uri = format!("/api/entreprises/{}", acme);

        let (status, body) = call(&app, "PUT", &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No fields to update");

        let (status, body) = call(&app, "PUT", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No fields to update");

        let (status, body) = call(&app, "PUT", &uri, Some(json!({"secteur_activite": "Industrie"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["secteur_activite"], "Industrie");
        assert_eq!(body["data"]["nom_entreprise"], "Acme");

        let (status, _) = call(&app, "PUT", "/api/entreprises/404", Some(json!({"notes": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_path_errors() {
        let app = app();

        let (status, body) = call(&app, "DELETE", "/api/taches", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing Tache ID in path");

        let (status, body) = call(&app, "PUT", "/api/meetings", Some(json!({"notes": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing Meeting ID in path");

        let (status, _) = call(&app, "GET", "/api/call_history/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, "GET", "/api/email_history/12", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_empty_id_segment_is_missing_id() {
        let app = app();
        create_acme(&app).await;

        let (status, body) = call(&app, "PUT", "/api/prospects/", Some(json!({"nom": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing Prospect ID in path");

        let (status, body) = call(&app, "DELETE", "/api/entreprises/", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing Entreprise ID in path");

        let (status, body) = call(&app, "PATCH", "/api/taches/", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);

        // Nothing was deleted.
        let (status, body) = call(&app, "GET", "/api/entreprises/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let app = app();
        let (status, body) = call(&app, "PATCH", "/api/prospects", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, "POST", "/api/prospects/1", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_internal_error() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/entreprises")
            .body(Body::from("{nope"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_other_paths_serve_the_page() {
        let app = app();
        create_acme(&app).await;

        let request = Request::builder()
            .uri("/?tab=entreprises")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Nom de l&#39;entreprise: Acme"));
    }
}
