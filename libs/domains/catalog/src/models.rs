use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Image stored on the external media host.
///
/// Created as an upload side effect, never mutated afterwards. Removal of the
/// stored asset is delegated to the media host's retention tooling when the
/// owning product goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    /// Media-host identifier of the stored asset
    pub public_id: String,
    /// Retrievable URL
    pub url: String,
}

/// Customer review embedded in a product document.
///
/// At most one review exists per (product, user) pair; the service replaces
/// an existing review in place instead of appending a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Reviewing user
    pub user: Uuid,
    /// Display-name snapshot taken when the review was written
    pub name: String,
    /// Rating, 1-5
    pub rating: f64,
    /// Review text
    pub comment: String,
}

/// Product entity - represents a product stored in MongoDB.
///
/// Wire format is camelCase; the field spellings are the documented client
/// contract.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Price
    pub price: f64,
    /// Product description
    pub description: String,
    /// Category label
    pub category: String,
    /// Stock quantity
    pub stock: i32,
    /// Images hosted by the external media service
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Customer reviews
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Always equals `reviews.len()`
    pub num_of_reviews: u32,
    /// Mean of all review ratings; unset while there are no reviews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<f64>,
    /// Admin user that created the product
    pub user: Uuid,
    /// Free-form additional attributes
    #[serde(default)]
    pub product_info: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub on_sale: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new product.
///
/// `images` carries the raw payloads destined for the media host, not stored
/// image records; the service uploads them and attaches the results.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    /// Raw image payloads; a single string or an array of strings
    #[serde(default, deserialize_with = "one_or_many")]
    pub images: Vec<String>,
    /// Additional attributes; a single string or an array of strings
    #[serde(default, deserialize_with = "one_or_many")]
    pub product_info: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub on_sale: bool,
}

/// DTO for updating an existing product.
///
/// Present fields replace the stored value; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    /// Stored image records; uploads happen only on create
    pub images: Option<Vec<ProductImage>>,
    #[serde(default, deserialize_with = "opt_one_or_many")]
    pub product_info: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_premium: Option<bool>,
    pub on_sale: Option<bool>,
}

/// DTO for adding or replacing a review.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    /// Product being reviewed
    pub product_id: Uuid,
    /// Rating, 1-5
    #[validate(range(min = 1.0, max = 5.0))]
    pub rating: f64,
    /// Review text
    #[serde(default)]
    pub comment: String,
}

/// Query parameters for the reviews listing endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct ReviewsQuery {
    /// Product id
    pub id: Uuid,
}

/// Query parameters for the review deletion endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewQuery {
    /// Product id
    pub product_id: Uuid,
    /// Review id
    pub id: Uuid,
}

/// Result of a product listing computation.
///
/// The subset vectors and `filtered_count` come from the
/// searched-and-filtered (but unpaginated) result set, while `products` is
/// the paginated slice.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub res_per_page: i64,
    pub db_product_count: u64,
    pub products: Vec<Product>,
    pub featured_products: Vec<Product>,
    pub premium_products: Vec<Product>,
    pub on_sale_products: Vec<Product>,
    pub filtered_count: usize,
}

/// Envelope for a single product.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

/// Envelope for an unpaginated product collection.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

/// Envelope for the storefront listing.
///
/// Field spellings (including the historical `Prdcuts` ones) are the client
/// contract and must not be corrected.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListingResponse {
    pub success: bool,
    pub res_per_page: i64,
    pub db_product_count: u64,
    pub products: Vec<Product>,
    pub featured_products: Vec<Product>,
    #[serde(rename = "featuredProdcutsCount")]
    pub featured_products_count: usize,
    pub premium_products: Vec<Product>,
    pub premium_products_count: usize,
    pub on_sale_products: Vec<Product>,
    pub on_sale_products_count: usize,
    #[serde(rename = "filteredProdcutsCount")]
    pub filtered_products_count: usize,
}

impl From<ProductListing> for ProductListingResponse {
    fn from(listing: ProductListing) -> Self {
        Self {
            success: true,
            res_per_page: listing.res_per_page,
            db_product_count: listing.db_product_count,
            products: listing.products,
            featured_products_count: listing.featured_products.len(),
            featured_products: listing.featured_products,
            premium_products_count: listing.premium_products.len(),
            premium_products: listing.premium_products,
            on_sale_products_count: listing.on_sale_products.len(),
            on_sale_products: listing.on_sale_products,
            filtered_products_count: listing.filtered_count,
        }
    }
}

/// Envelope for deletion acknowledgements.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Bare success acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
}

/// Envelope for a product's review collection.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewsResponse {
    pub success: bool,
    pub reviews: Vec<Review>,
}

/// Mean of all review ratings; `None` for an empty review set.
pub fn mean_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    Some(reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64)
}

/// Accepts a single string or an array of strings; any other JSON shape is
/// rejected with a deserialization error.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged, expecting = "a string or an array of strings")]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Option-wrapped variant of [`one_or_many`] for partial updates.
fn opt_one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged, expecting = "a string or an array of strings")]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    }))
}

impl Product {
    /// Build a new product from the create DTO, uploaded image records, and
    /// the creating admin's id.
    pub fn new(input: CreateProduct, images: Vec<ProductImage>, owner: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            price: input.price,
            description: input.description,
            category: input.category,
            stock: input.stock,
            images,
            reviews: Vec::new(),
            num_of_reviews: 0,
            ratings: None,
            user: owner,
            product_info: input.product_info,
            is_featured: input.is_featured,
            is_premium: input.is_premium,
            on_sale: input.on_sale,
            created_at: Utc::now(),
        }
    }

    /// Apply updates from the update DTO.
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(product_info) = update.product_info {
            self.product_info = product_info;
        }
        if let Some(is_featured) = update.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(is_premium) = update.is_premium {
            self.is_premium = is_premium;
        }
        if let Some(on_sale) = update.on_sale {
            self.on_sale = on_sale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(user: Uuid, rating: f64) -> Review {
        Review {
            id: Uuid::now_v7(),
            user,
            name: "reviewer".to_string(),
            rating,
            comment: "fine".to_string(),
        }
    }

    #[test]
    fn test_mean_rating_empty_is_none() {
        assert_eq!(mean_rating(&[]), None);
    }

    #[test]
    fn test_mean_rating() {
        let reviews = vec![
            review(Uuid::now_v7(), 4.0),
            review(Uuid::now_v7(), 5.0),
            review(Uuid::now_v7(), 3.0),
        ];
        let mean = mean_rating(&reviews).unwrap();
        assert!((mean - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_create_product_accepts_single_image_string() {
        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99,
            "images": "data:image/png;base64,AAAA"
        }))
        .unwrap();

        assert_eq!(input.images, vec!["data:image/png;base64,AAAA".to_string()]);
        assert!(input.product_info.is_empty());
    }

    #[test]
    fn test_create_product_accepts_image_array() {
        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99,
            "images": ["imgA", "imgB"],
            "productInfo": ["Steel body", "E27 socket"]
        }))
        .unwrap();

        assert_eq!(input.images, vec!["imgA".to_string(), "imgB".to_string()]);
        assert_eq!(input.product_info.len(), 2);
    }

    #[test]
    fn test_create_product_rejects_non_string_images() {
        let result: Result<CreateProduct, _> = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99,
            "images": {"nested": "object"}
        }));
        assert!(result.is_err());

        let result: Result<CreateProduct, _> = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99,
            "images": [1, 2, 3]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_product_info_one_or_many() {
        let update: UpdateProduct = serde_json::from_value(serde_json::json!({
            "productInfo": "Single note"
        }))
        .unwrap();
        assert_eq!(update.product_info, Some(vec!["Single note".to_string()]));

        let update: UpdateProduct = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(update.product_info, None);
    }

    #[test]
    fn test_apply_update_replaces_present_fields_only() {
        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99,
            "category": "lighting",
            "stock": 4
        }))
        .unwrap();
        let mut product = Product::new(input, Vec::new(), Uuid::now_v7());

        product.apply_update(UpdateProduct {
            price: Some(29.99),
            on_sale: Some(true),
            ..Default::default()
        });

        assert_eq!(product.name, "Desk lamp");
        assert!((product.price - 29.99).abs() < 1e-9);
        assert_eq!(product.category, "lighting");
        assert!(product.on_sale);
    }

    #[test]
    fn test_product_serializes_with_wire_field_names() {
        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Desk lamp",
            "price": 39.99
        }))
        .unwrap();
        let product = Product::new(input, Vec::new(), Uuid::now_v7());

        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("_id").is_some());
        assert!(value.get("numOfReviews").is_some());
        assert!(value.get("productInfo").is_some());
        assert!(value.get("isFeatured").is_some());
        // No reviews yet, so the mean is absent entirely
        assert!(value.get("ratings").is_none());
    }

    #[test]
    fn test_listing_response_wire_field_names() {
        let listing = ProductListing {
            res_per_page: 9,
            db_product_count: 3,
            products: Vec::new(),
            featured_products: Vec::new(),
            premium_products: Vec::new(),
            on_sale_products: Vec::new(),
            filtered_count: 2,
        };
        let response: ProductListingResponse = listing.into();

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["resPerPage"], 9);
        assert_eq!(value["dbProductCount"], 3);
        assert_eq!(value["featuredProdcutsCount"], 0);
        assert_eq!(value["premiumProductsCount"], 0);
        assert_eq!(value["filteredProdcutsCount"], 2);
    }

    #[test]
    fn test_create_review_validation_bounds() {
        use validator::Validate;

        let review: CreateReview = serde_json::from_value(serde_json::json!({
            "productId": Uuid::now_v7(),
            "rating": 6.0,
            "comment": "too good"
        }))
        .unwrap();
        assert!(review.validate().is_err());

        let review: CreateReview = serde_json::from_value(serde_json::json!({
            "productId": Uuid::now_v7(),
            "rating": 4.5
        }))
        .unwrap();
        assert!(review.validate().is_ok());
    }
}
