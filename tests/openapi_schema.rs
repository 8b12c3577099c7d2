use anyhow::Result;
use serde_json::Value;

use shopfloor_auth::docs::build_openapi;

#[test]
fn openapi_lists_every_route() -> Result<()> {
    let doc = serde_json::to_value(build_openapi(8000)?)?;

    let expected = [
        ("/api/health", "get"),
        ("/auth/verify", "post"),
        ("/auth/me", "get"),
        ("/auth/logout", "post"),
        ("/auth/revoke", "post"),
        ("/authz/roles", "get"),
        ("/authz/check", "post"),
        ("/authz/can-manage", "post"),
        ("/password/validate", "post"),
        ("/password/generate", "post"),
        ("/password/breached", "post"),
    ];

    for (path, method) in expected {
        assert!(
            doc["paths"][path][method].is_object(),
            "missing {method} {path} in OpenAPI document"
        );
    }

    Ok(())
}

#[test]
fn openapi_declares_bearer_auth_and_server() -> Result<()> {
    let doc = serde_json::to_value(build_openapi(9100)?)?;

    assert_eq!(doc["components"]["securitySchemes"]["bearerAuth"]["scheme"], "bearer");
    assert_eq!(doc["servers"][0]["url"], "http://localhost:9100");

    let schemas = doc["components"]["schemas"].as_object().cloned().unwrap_or_default();
    for name in ["AccessClaims", "Principal", "Role", "ValidatePasswordResponse", "PermissionCheckRequest"] {
        assert!(schemas.contains_key(name), "schema {name} missing");
    }

    let example = &doc["paths"]["/password/validate"]["post"]["requestBody"]["content"]["application/json"]["example"];
    assert_eq!(example["password"], Value::from("Tr0ub4dor&3"));

    Ok(())
}
