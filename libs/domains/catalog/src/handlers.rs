use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    AuthenticatedUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::media::MediaStore;
use crate::models::{
    AckResponse, CreateProduct, CreateReview, DeleteReviewQuery, MessageResponse, Product,
    ProductListingResponse, ProductResponse, ProductsResponse, ReviewsQuery, ReviewsResponse,
    UpdateProduct,
};
use crate::query::CatalogQuery;
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

/// OpenAPI documentation for the Catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        get_product,
        list_all_products,
        create_product,
        update_product,
        delete_product,
        create_review,
        list_reviews,
        delete_review,
    ),
    components(
        schemas(
            Product,
            crate::models::ProductImage,
            crate::models::Review,
            CreateProduct,
            UpdateProduct,
            CreateReview,
            CatalogQuery,
            ProductResponse,
            ProductsResponse,
            ProductListingResponse,
            MessageResponse,
            AckResponse,
            ReviewsResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Catalog", description = "Product catalog endpoints (MongoDB)"),
        (name = "Reviews", description = "Product review endpoints")
    )
)]
pub struct ApiDoc;

/// Create the catalog router with all HTTP endpoints
pub fn router<R, M>(service: CatalogService<R, M>) -> Router
where
    R: CatalogRepository + 'static,
    M: MediaStore + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/products", get(list_products))
        .route("/product/{id}", get(get_product))
        .route("/admin/products", get(list_all_products))
        .route("/admin/product/new", post(create_product))
        .route(
            "/admin/product/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/review", post(create_review))
        .route("/reviews", get(list_reviews).delete(delete_review))
        .with_state(shared_service)
}

/// Storefront product listing with derived subsets
///
/// Returns one page of products (page size 9) together with the unfiltered
/// collection count, the filtered count, and the featured/premium/on-sale
/// subsets of the filtered set.
#[utoipa::path(
    get,
    path = "/products",
    tag = "Catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Product listing", body = ProductListingResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    Query(query): Query<CatalogQuery>,
) -> CatalogResult<Json<ProductListingResponse>> {
    let listing = service.list_products(query).await?;
    Ok(Json(listing.into()))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Every product, unpaginated (admin)
#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "Catalog",
    responses(
        (status = 200, description = "All products", body = ProductsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_all_products<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
) -> CatalogResult<Json<ProductsResponse>> {
    let products = service.list_all_products().await?;
    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}

/// Create a new product (admin)
///
/// Uploads the submitted image payloads to the media host one at a time,
/// then persists the product stamped with the caller's id.
#[utoipa::path(
    post,
    path = "/admin/product/new",
    tag = "Catalog",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    caller: AuthenticatedUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.create_product(input, &caller).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product,
        }),
    ))
}

/// Update a product (admin)
#[utoipa::path(
    put,
    path = "/admin/product/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    UuidPath(id): UuidPath,
    _caller: AuthenticatedUser,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> CatalogResult<Json<ProductResponse>> {
    let product = service.update_product(id, input).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Delete a product (admin)
#[utoipa::path(
    delete,
    path = "/admin/product/{id}",
    tag = "Catalog",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    UuidPath(id): UuidPath,
    _caller: AuthenticatedUser,
) -> CatalogResult<Json<MessageResponse>> {
    service.delete_product(id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "product deleted".to_string(),
    }))
}

/// Add or replace the caller's review of a product
#[utoipa::path(
    post,
    path = "/review",
    tag = "Reviews",
    request_body = CreateReview,
    responses(
        (status = 200, description = "Review recorded", body = AckResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_review<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    caller: AuthenticatedUser,
    ValidatedJson(input): ValidatedJson<CreateReview>,
) -> CatalogResult<Json<AckResponse>> {
    service.upsert_review(&caller, input).await?;
    Ok(Json(AckResponse { success: true }))
}

/// List the reviews of a product
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "Reviews",
    params(ReviewsQuery),
    responses(
        (status = 200, description = "Product reviews", body = ReviewsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_reviews<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    Query(query): Query<ReviewsQuery>,
) -> CatalogResult<Json<ReviewsResponse>> {
    let reviews = service.product_reviews(query.id).await?;
    Ok(Json(ReviewsResponse {
        success: true,
        reviews,
    }))
}

/// Delete a review from a product
///
/// The response carries the pre-deletion review list.
#[utoipa::path(
    delete,
    path = "/reviews",
    tag = "Reviews",
    params(DeleteReviewQuery),
    responses(
        (status = 200, description = "Review deleted", body = ReviewsResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_review<R: CatalogRepository, M: MediaStore>(
    State(service): State<Arc<CatalogService<R, M>>>,
    Query(query): Query<DeleteReviewQuery>,
    _caller: AuthenticatedUser,
) -> CatalogResult<Json<ReviewsResponse>> {
    let reviews = service.delete_review(query.product_id, query.id).await?;
    Ok(Json(ReviewsResponse {
        success: true,
        reviews,
    }))
}
