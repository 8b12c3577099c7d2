use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, jwt, models, password, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::verify,
		routes::auth::me,
		routes::auth::logout,
		routes::auth::revoke,
		routes::authz::list_roles,
		routes::authz::check,
		routes::authz::can_manage,
		routes::password::validate,
		routes::password::generate,
		routes::password::breached
	),
	components(
		schemas(
			routes::health::HealthResponse,
			authz::Role,
			authz::Permission,
			authz::Principal,
			authz::ResourceRef,
			authz::CheckOptions,
			jwt::AccessClaims,
			password::PasswordPolicy,
			password::Strength,
			models::auth::VerifyTokenRequest,
			models::auth::VerifyTokenResponse,
			models::auth::MeResponse,
			models::auth::LogoutResponse,
			models::auth::RevokeTokenRequest,
			models::auth::RevokeTokenResponse,
			models::authz::RoleSummary,
			models::authz::PermissionCheckRequest,
			models::authz::PermissionCheckResponse,
			models::authz::CanManageRequest,
			models::authz::CanManageResponse,
			models::password::ValidatePasswordRequest,
			models::password::ValidatePasswordResponse,
			models::password::GeneratePasswordRequest,
			models::password::GeneratePasswordResponse,
			models::password::BreachCheckRequest,
			models::password::BreachCheckResponse
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Auth", description = "Token verification and revocation"),
		(name = "Authz", description = "Roles and permission checks"),
		(name = "Password", description = "Password strength, generation and breach checks")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	normalize_path_operations(&mut doc);
	ensure_security_components(&mut doc);
	ensure_openapi_version(&mut doc);
	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

/// JSON document at `/api-docs/openapi.json` plus Swagger UI at `/docs`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn normalize_path_operations(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		let snapshot = paths.clone();
		for (path, item) in snapshot {
			if let Some(ops) = item.as_object() {
				let mut normalized = Map::new();
				for (method, val) in ops {
					let key = method.to_lowercase();
					if let Some(existing) = normalized.get_mut(&key) {
						merge_values(existing, val);
					} else {
						normalized.insert(key, val.clone());
					}
				}
				paths.insert(path, Value::Object(normalized));
			}
		}
	}
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else { return; };

	let components = root
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()));
	let Some(components) = components.as_object_mut() else { return; };

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));
	let Some(schemes) = schemes.as_object_mut() else { return; };

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
}

fn ensure_openapi_version(doc: &mut Value) {
	if let Some(root) = doc.as_object_mut() {
		root.entry("openapi")
			.or_insert_with(|| Value::String("3.1.0".to_string()));
	}
}

fn add_examples(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		for item in paths.values_mut() {
			if let Some(operations) = item.as_object_mut() {
				for operation in operations.values_mut() {
					apply_request_examples(operation);
					apply_response_examples(operation);
				}
			}
		}
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(request_body) = operation.get_mut("requestBody") else { return; };
	let Some(content) = request_body.get_mut("content").and_then(Value::as_object_mut) else { return; };
	let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { return; };
	let Some(schema) = app_json.get("schema").and_then(Value::as_object) else { return; };
	let Some(reference) = schema.get("$ref").and_then(Value::as_str) else { return; };

	let example = match reference {
		"#/components/schemas/PermissionCheckRequest" => Some(json!({
			"permission": "orders.update",
			"resource": {
				"workspace_id": "ws-acme",
				"owner_id": "user-17",
				"brand_id": "brand-north"
			},
			"options": {
				"require_same_workspace": true,
				"require_ownership": true,
				"require_same_brand": false
			}
		})),
		"#/components/schemas/CanManageRequest" => Some(json!({
			"target_role": "PRODUCTION_OPERATOR"
		})),
		"#/components/schemas/ValidatePasswordRequest" => Some(json!({
			"password": "Tr0ub4dor&3"
		})),
		"#/components/schemas/GeneratePasswordRequest" => Some(json!({
			"length": 16
		})),
		"#/components/schemas/BreachCheckRequest" => Some(json!({
			"password": "password123"
		})),
		_ => None,
	};

	if let Some(example) = example {
		app_json.insert("example".to_string(), example);
	}
}

fn apply_response_examples(operation: &mut Value) {
	let Some(responses) = operation.get_mut("responses").and_then(Value::as_object_mut) else { return; };

	for response in responses.values_mut() {
		let Some(content) = response.get_mut("content").and_then(Value::as_object_mut) else { continue; };
		let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { continue; };
		let Some(reference) = app_json
			.get("schema")
			.and_then(|schema| schema.get("$ref"))
			.and_then(Value::as_str)
		else {
			continue;
		};

		let example = match reference {
			"#/components/schemas/ValidatePasswordResponse" => Some(json!({
				"valid": false,
				"errors": ["Password must contain at least one special character (!@#$%^&*...)"],
				"strength": "medium",
				"score": 57,
				"feedback": [
					"✗ Password does not meet requirements:",
					"  - Password must contain at least one special character (!@#$%^&*...)",
					"Password strength: medium",
					"Score: 57/100"
				]
			})),
			"#/components/schemas/PermissionCheckResponse" => Some(json!({
				"permission": "orders.update",
				"allowed": true
			})),
			_ => None,
		};

		if let Some(example) = example {
			app_json.insert("example".to_string(), example);
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
