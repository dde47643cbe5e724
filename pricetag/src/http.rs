use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    import::BulkImportReport,
    models::{Address, AddressId, Cart, CartId, Customer, CustomerId, NewTagDefinition, TagDefinition, TagRef},
    ErrorKind, Pricetag,
};

type AppState = State<Arc<Pricetag>>;

impl IntoResponse for crate::Error {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{self}");
        }

        let body = match self.model() {
            Some(model) => json!({ "error": self.to_string(), "model": model.to_string() }),
            None => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct ListTags {
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Deserialize)]
struct CreateCustomer {
    name: String,
}

#[derive(Deserialize)]
struct AddAddress {
    label: String,
}

#[derive(Deserialize)]
struct AssignTag {
    full_tag: String,
}

#[derive(Deserialize)]
struct EffectiveTags {
    #[serde(default)]
    detailed: bool,
}

#[derive(Deserialize)]
struct CreateCart {
    customer_id: CustomerId,
    address_id: AddressId,
}

async fn list_tags(
    State(pricetag): AppState,
    Query(ListTags { include_inactive }): Query<ListTags>,
) -> Result<Json<Vec<TagDefinition>>, crate::Error> {
    Ok(Json(pricetag.list_tag_definitions(include_inactive).await?))
}

async fn create_tag(
    State(pricetag): AppState,
    Json(new): Json<NewTagDefinition>,
) -> Result<(StatusCode, Json<TagDefinition>), crate::Error> {
    Ok((
        StatusCode::CREATED,
        Json(pricetag.create_tag_definition(&new).await?),
    ))
}

async fn deactivate_tag(
    State(pricetag): AppState,
    Path(full_tag): Path<String>,
) -> Result<Json<TagDefinition>, crate::Error> {
    Ok(Json(pricetag.deactivate_tag_definition(&full_tag).await?))
}

async fn list_customers(State(pricetag): AppState) -> Result<Json<Vec<Customer>>, crate::Error> {
    Ok(Json(pricetag.list_customers().await?))
}

async fn create_customer(
    State(pricetag): AppState,
    Json(CreateCustomer { name }): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>), crate::Error> {
    Ok((
        StatusCode::CREATED,
        Json(pricetag.create_customer(&name).await?),
    ))
}

async fn import_customers(
    State(pricetag): AppState,
    body: String,
) -> Json<BulkImportReport> {
    Json(pricetag.import_lines(&body).await)
}

async fn get_customer(
    State(pricetag): AppState,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Customer>, crate::Error> {
    Ok(Json(pricetag.get_customer(customer_id).await?))
}

async fn add_address(
    State(pricetag): AppState,
    Path(customer_id): Path<CustomerId>,
    Json(AddAddress { label }): Json<AddAddress>,
) -> Result<(StatusCode, Json<Address>), crate::Error> {
    Ok((
        StatusCode::CREATED,
        Json(pricetag.add_address(customer_id, &label).await?),
    ))
}

async fn assign_customer_tag(
    State(pricetag): AppState,
    Path(customer_id): Path<CustomerId>,
    Json(AssignTag { full_tag }): Json<AssignTag>,
) -> Result<Json<Vec<TagRef>>, crate::Error> {
    Ok(Json(
        pricetag.assign_customer_tag(customer_id, &full_tag).await?,
    ))
}

async fn remove_customer_tag(
    State(pricetag): AppState,
    Path((customer_id, full_tag)): Path<(CustomerId, String)>,
) -> Result<Json<Vec<TagRef>>, crate::Error> {
    Ok(Json(
        pricetag.remove_customer_tag(customer_id, &full_tag).await?,
    ))
}

async fn assign_address_tag_override(
    State(pricetag): AppState,
    Path((customer_id, address_id)): Path<(CustomerId, AddressId)>,
    Json(AssignTag { full_tag }): Json<AssignTag>,
) -> Result<Json<Vec<TagRef>>, crate::Error> {
    Ok(Json(
        pricetag
            .assign_address_tag_override(customer_id, address_id, &full_tag)
            .await?,
    ))
}

async fn remove_address_tag_override(
    State(pricetag): AppState,
    Path((customer_id, address_id, full_tag)): Path<(CustomerId, AddressId, String)>,
) -> Result<Json<Vec<TagRef>>, crate::Error> {
    Ok(Json(
        pricetag
            .remove_address_tag_override(customer_id, address_id, &full_tag)
            .await?,
    ))
}

async fn effective_tags(
    State(pricetag): AppState,
    Path((customer_id, address_id)): Path<(CustomerId, AddressId)>,
    Query(EffectiveTags { detailed }): Query<EffectiveTags>,
) -> Result<Response, crate::Error> {
    if detailed {
        Ok(Json(
            pricetag
                .effective_tags_detailed(customer_id, address_id)
                .await?,
        )
        .into_response())
    } else {
        Ok(Json(pricetag.effective_tags(customer_id, address_id).await?).into_response())
    }
}

async fn create_cart(
    State(pricetag): AppState,
    Json(CreateCart {
        customer_id,
        address_id,
    }): Json<CreateCart>,
) -> Result<Json<Cart>, crate::Error> {
    Ok(Json(pricetag.create_cart(customer_id, address_id).await?))
}

async fn get_cart(
    State(pricetag): AppState,
    Path(cart_id): Path<CartId>,
) -> Result<Json<Cart>, crate::Error> {
    Ok(Json(pricetag.get_cart(cart_id).await?))
}

async fn submit_cart(
    State(pricetag): AppState,
    Path(cart_id): Path<CartId>,
) -> Result<Json<Cart>, crate::Error> {
    Ok(Json(pricetag.submit_cart(cart_id).await?))
}

pub fn router(pricetag: Arc<Pricetag>) -> Router {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{full_tag}/deactivate", post(deactivate_tag))
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/import", post(import_customers))
        .route("/customers/{customer_id}", get(get_customer))
        .route("/customers/{customer_id}/addresses", post(add_address))
        .route("/customers/{customer_id}/tags", post(assign_customer_tag))
        .route(
            "/customers/{customer_id}/tags/{full_tag}",
            delete(remove_customer_tag),
        )
        .route(
            "/customers/{customer_id}/addresses/{address_id}/tag-overrides",
            post(assign_address_tag_override),
        )
        .route(
            "/customers/{customer_id}/addresses/{address_id}/tag-overrides/{full_tag}",
            delete(remove_address_tag_override),
        )
        .route(
            "/customers/{customer_id}/addresses/{address_id}/effective-tags",
            get(effective_tags),
        )
        .route("/carts", post(create_cart))
        .route("/carts/{cart_id}", get(get_cart))
        .route("/carts/{cart_id}/submit", post(submit_cart))
        .with_state(pricetag)
}

pub async fn serve(pricetag: Arc<Pricetag>) -> Result<(), crate::Error> {
    let address = pricetag.config.http_address;

    let listener = TcpListener::bind(address).await?;

    info!("Listening on {address}");

    axum::serve(listener, router(pricetag)).await?;

    Ok(())
}
