use axum::http::{Method, StatusCode};
use serde_json::json;

use super::TestApp;

#[tokio::test]
async fn test_list_is_public() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    app.create_event(&ana, "Rust meetup").await;
    app.create_event(&ana, "Axum workshop").await;

    let (status, body) = app.send(Method::GET, "/eventos", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["nombre"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Rust meetup", "Axum workshop"]);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/eventos",
            None,
            Some(json!({ "nombre": "x", "fecha": "2030-01-01T00:00:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn test_create_sets_organizer_to_caller() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let bob = app.user("bob", "Bob", "Ruiz").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/eventos",
            Some(&ana.auth),
            Some(json!({
                "nombre": "Rust meetup",
                "fecha": "2030-05-01T18:00:00Z",
                "organizador": bob.id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let event = &body["data"];
    assert_eq!(event["organizador"], ana.id.to_string());
    assert_eq!(event["organizador_username"], "ana");
    assert!(event["descripcion"].is_null());
    assert!(event["creado_en"].is_string());
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;

    for payload in [
        json!({ "nombre": "", "fecha": "2030-05-01T18:00:00Z" }),
        json!({ "nombre": "Sin fecha" }),
        json!({ "nombre": "Fecha rara", "fecha": "mañana" }),
    ] {
        let (status, body) = app
            .send(Method::POST, "/eventos", Some(&ana.auth), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_get_missing_event() {
    let app = TestApp::new();

    let uri = format!("/eventos/{}", uuid::Uuid::new_v4());
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::GET, "/eventos/42", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_token_is_rejected_on_public_reads() {
    let app = TestApp::new();
    let (status, _) = app
        .send(Method::GET, "/eventos", Some("Token not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ownership_scenario() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let bob = app.user("bob", "Bob", "Ruiz").await;

    let event = app.create_event(&ana, "Rust meetup").await;
    let id = event["id"].as_str().unwrap();
    let uri = format!("/eventos/{}", id);

    // A non-organizer cannot touch it, and nothing changes.
    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&bob.auth), Some(json!({ "nombre": "Hacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    let (_, current) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(current["data"], event);

    // Anonymous callers are told to authenticate first.
    let (status, _) = app
        .send(Method::PATCH, &uri, None, Some(json!({ "nombre": "Anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&ana.auth), Some(json!({ "nombre": "X" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre"], "X");
    assert_eq!(body["data"]["fecha"], event["fecha"]);
    assert_eq!(body["data"]["organizador"], ana.id.to_string());

    let register = format!("/eventos/{}/asistentes/registro", id);
    let (status, _) = app.send(Method::POST, &register, Some(&bob.auth), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.send(Method::POST, &register, Some(&bob.auth), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/eventos/{}/asistentes", id),
            Some(&ana.auth),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["usuario"], bob.id.to_string());
}

#[tokio::test]
async fn test_patch_only_touches_name_and_date() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let bob = app.user("bob", "Bob", "Ruiz").await;
    let event = app.create_event(&ana, "Rust meetup").await;
    let uri = format!("/eventos/{}", event["id"].as_str().unwrap());

    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&ana.auth),
            Some(json!({
                "fecha": "2031-01-01T09:30:00Z",
                "descripcion": "ignored",
                "organizador": bob.id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let updated = &body["data"];
    assert_eq!(updated["fecha"], "2031-01-01T09:30:00Z");
    assert_eq!(updated["nombre"], "Rust meetup");
    assert_eq!(updated["descripcion"], event["descripcion"]);
    assert_eq!(updated["organizador"], ana.id.to_string());
    assert_eq!(updated["creado_en"], event["creado_en"]);
}

#[tokio::test]
async fn test_patch_rejects_blank_name() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let event = app.create_event(&ana, "Rust meetup").await;
    let uri = format!("/eventos/{}", event["id"].as_str().unwrap());

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&ana.auth), Some(json!({ "nombre": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(current["data"]["nombre"], "Rust meetup");
}

#[tokio::test]
async fn test_patch_rejects_explicit_nulls() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let event = app.create_event(&ana, "Rust meetup").await;
    let uri = format!("/eventos/{}", event["id"].as_str().unwrap());

    for body in [json!({ "nombre": null }), json!({ "fecha": null })] {
        let (status, _) = app
            .send(Method::PATCH, &uri, Some(&ana.auth), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, current) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(current["data"]["nombre"], "Rust meetup");
    assert_eq!(current["data"]["fecha"], event["fecha"]);
}

#[tokio::test]
async fn test_dates_without_offset_are_read_as_utc() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/eventos",
            Some(&ana.auth),
            Some(json!({ "nombre": "Rust meetup", "fecha": "2030-05-01T18:00:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["fecha"], "2030-05-01T18:00:00Z");

    let uri = format!("/eventos/{}", body["data"]["id"].as_str().unwrap());
    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&ana.auth),
            Some(json!({ "fecha": "2031-01-01T09:30:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["fecha"], "2031-01-01T09:30:00Z");

    let (status, _) = app
        .send(
            Method::POST,
            "/eventos",
            Some(&ana.auth),
            Some(json!({ "nombre": "Otro", "fecha": "mañana" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_replace_is_not_allowed() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let event = app.create_event(&ana, "Rust meetup").await;
    let uri = format!("/eventos/{}", event["id"].as_str().unwrap());

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&ana.auth),
            Some(json!({ "nombre": "x", "fecha": "2030-01-01T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_delete_by_organizer_cascades() {
    let app = TestApp::new();
    let ana = app.user("ana", "Ana", "Pérez").await;
    let bob = app.user("bob", "Bob", "Ruiz").await;
    let event = app.create_event(&ana, "Rust meetup").await;
    let id = event["id"].as_str().unwrap();
    let uri = format!("/eventos/{}", id);

    app.send(
        Method::POST,
        &format!("/eventos/{}/asistentes/registro", id),
        Some(&bob.auth),
        None,
    )
    .await;
    app.send(
        Method::POST,
        &format!("/eventos/{}/comentarios/crear", id),
        Some(&bob.auth),
        Some(json!({ "contenido": "Genial" })),
    )
    .await;

    let (status, _) = app.send(Method::DELETE, &uri, Some(&bob.auth), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&ana.auth), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&ana.auth), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, attendees) = app
        .send(Method::GET, &format!("{}/asistentes", uri), Some(&ana.auth), None)
        .await;
    assert_eq!(attendees["data"]["count"], 0);
    let (_, comments) = app
        .send(Method::GET, &format!("{}/comentarios", uri), None, None)
        .await;
    assert_eq!(comments["data"]["count"], 0);
    assert!(!app
        .state
        .store
        .attendee_exists(uuid::Uuid::parse_str(id).unwrap(), bob.id)
        .await
        .unwrap());
}
