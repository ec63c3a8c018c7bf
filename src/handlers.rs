// region:    --- Imports
use crate::auction::commands::{AuctionDetails, AuctionMedia, AuctionService};
use crate::auction::model::{Auction, AuctionDraft};
use crate::auction::outcome::Outcome;
use crate::bidding::commands::{BidService, PlaceBidCommand};
use crate::bidding::model::{AcceptedBid, Bid};
use crate::clock::Clock;
use crate::collaborators::{BlobStore, IdentityVerifier, Upload};
use crate::config::ServiceSettings;
use crate::error::AppError;
use crate::messaging::model::{Conversation, ConversationSummary, Message};
use crate::messaging::relay::MessageRelay;
use crate::notify::ChangeNotifier;
use crate::query::{AuctionFilter, BidHistoryEntry, CatalogQueries};
use crate::store::Stores;
use crate::users::commands::{UserService, VerificationOutcome};
use crate::users::model::{DocumentType, NewUser, ProfilePatch, User};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State
/// 핸들러가 공유하는 서비스 묶음
#[derive(Clone)]
pub struct AppState {
    pub auctions: AuctionService,
    pub bids: BidService,
    pub users: UserService,
    pub relay: MessageRelay,
    pub catalog: CatalogQueries,
}

impl AppState {
    pub fn new(
        stores: Stores,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
        settings: &ServiceSettings,
    ) -> Self {
        Self {
            auctions: AuctionService::new(
                stores.auctions.clone(),
                stores.users.clone(),
                blobs.clone(),
                notifier.clone(),
                clock.clone(),
            ),
            bids: BidService::new(
                stores.auctions.clone(),
                stores.bids.clone(),
                stores.users.clone(),
                notifier.clone(),
                clock.clone(),
                settings.max_bid_retries,
            ),
            users: UserService::new(
                stores.users.clone(),
                blobs,
                verifier,
                notifier.clone(),
                clock.clone(),
            ),
            relay: MessageRelay::new(stores.conversations, stores.users, notifier),
            catalog: CatalogQueries::new(stores.auctions, stores.bids, clock),
        }
    }
}

/// 라우터 설정
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auctions", post(handle_create_auction).get(handle_browse_auctions))
        .route("/auctions/:id", get(handle_get_auction))
        .route(
            "/auctions/:id/bids",
            post(handle_place_bid).get(handle_get_bid_history),
        )
        .route("/auctions/:id/highest-bid", get(handle_get_highest_bid))
        .route("/auctions/:id/outcome", get(handle_get_outcome))
        .route("/users", post(handle_register))
        .route("/users/:id", get(handle_get_user))
        .route("/users/:id/profile", put(handle_update_profile))
        .route("/users/:id/verification", post(handle_verify_identity))
        .route("/users/:id/auctions", get(handle_get_user_auctions))
        .route("/users/:id/bids", get(handle_get_user_bids))
        .route("/users/:id/won", get(handle_get_items_won))
        .route("/users/:id/conversations", get(handle_get_conversations))
        .route("/conversations", post(handle_open_conversation))
        .route(
            "/conversations/:id/messages",
            post(handle_post_message).get(handle_get_messages),
        )
        .route("/conversations/:id/read", put(handle_mark_read))
        .with_state(state)
}
// endregion: --- App State

// region:    --- Request Bodies
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    #[serde(default)]
    pub bidder_id: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub user_a: String,
    pub user_b: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub user_id: String,
    pub message_id: i64,
}

/// 목록 필터 쿼리 (다중 값은 쉼표로 구분)
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    pub search: Option<String>,
    pub max_bid: Option<i64>,
    pub conditions: Option<String>,
    pub locations: Option<String>,
    pub deliveries: Option<String>,
    pub seller_verification: Option<String>,
    pub remaining: Option<String>,
}

fn parse_list<T: DeserializeOwned>(field: &'static str, raw: Option<&str>) -> Result<Vec<T>, AppError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            serde_json::from_value(serde_json::Value::String(s.to_string()))
                .map_err(|_| AppError::validation(field, format!("알 수 없는 값: {}", s)))
        })
        .collect()
}

impl BrowseParams {
    pub fn into_filter(self) -> Result<AuctionFilter, AppError> {
        Ok(AuctionFilter {
            conditions: parse_list("conditions", self.conditions.as_deref())?,
            locations: parse_list("locations", self.locations.as_deref())?,
            deliveries: parse_list("deliveries", self.deliveries.as_deref())?,
            seller_verification: parse_list(
                "seller_verification",
                self.seller_verification.as_deref(),
            )?,
            remaining: parse_list("remaining", self.remaining.as_deref())?,
            search: self.search,
            max_bid: self.max_bid,
        })
    }
}
// endregion: --- Request Bodies

// region:    --- Multipart
fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation("multipart", e.body_text())
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> Result<Upload, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(Upload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}
// endregion: --- Multipart

// region:    --- Command Handlers
/// 경매 등록 (multipart: seller_id, auction, thumbnail, photos)
pub async fn handle_create_auction(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Auction>), AppError> {
    let mut seller_id = None;
    let mut draft = None;
    let mut thumbnail = None;
    let mut photos = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "seller_id" => seller_id = Some(field.text().await.map_err(multipart_error)?),
            "auction" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let parsed: AuctionDraft = serde_json::from_str(&raw)
                    .map_err(|e| AppError::validation("auction", e.to_string()))?;
                draft = Some(parsed);
            }
            "thumbnail" => thumbnail = Some(read_upload(field).await?),
            "photos" => photos.push(read_upload(field).await?),
            _ => {}
        }
    }

    let seller_id = seller_id.ok_or_else(|| AppError::validation("seller_id", "판매자 정보가 필요합니다."))?;
    let draft = draft.ok_or_else(|| AppError::validation("auction", "경매 정보가 필요합니다."))?;
    let thumbnail = thumbnail.ok_or_else(|| AppError::validation("thumbnail", "Please upload a thumbnail"))?;
    info!("{:<12} --> 경매 등록 요청 처리: {}", "Handler", draft.title);

    let auction = state
        .auctions
        .create_auction(&seller_id, draft, AuctionMedia { thumbnail, photos })
        .await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(body): Json<BidRequest>,
) -> Result<Json<AcceptedBid>, AppError> {
    let cmd = PlaceBidCommand {
        auction_id,
        bidder_id: body.bidder_id,
        amount: body.amount,
    };
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Handler", cmd);
    Ok(Json(state.bids.place_bid(cmd).await?))
}

pub async fn handle_register(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.users.register(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.update_profile(&user_id, patch).await?))
}

/// 신원 인증 (multipart: document_type, photo)
pub async fn handle_verify_identity(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VerificationOutcome>, AppError> {
    let mut document_type = None;
    let mut photo = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document_type" => {
                let raw = field.text().await.map_err(multipart_error)?;
                document_type = Some(DocumentType::parse(&raw).ok_or_else(|| {
                    AppError::validation("document_type", format!("알 수 없는 신분증 종류: {}", raw))
                })?);
            }
            "photo" => photo = Some(read_upload(field).await?),
            _ => {}
        }
    }
    let document_type =
        document_type.ok_or_else(|| AppError::validation("document_type", "Please select a document type"))?;
    let photo = photo.ok_or_else(|| AppError::validation("photo", "Please upload a photo of your ID"))?;

    Ok(Json(
        state
            .users
            .verify_identity(&user_id, document_type, photo)
            .await?,
    ))
}

pub async fn handle_open_conversation(
    State(state): State<AppState>,
    Json(body): Json<OpenConversationRequest>,
) -> Result<Json<Conversation>, AppError> {
    Ok(Json(
        state
            .relay
            .get_or_create_conversation(&body.user_a, &body.user_b)
            .await?,
    ))
}

pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = state
        .relay
        .post_message(conversation_id, &body.sender_id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
    Json(body): Json<MarkReadRequest>,
) -> Result<StatusCode, AppError> {
    state
        .relay
        .mark_read(conversation_id, &body.user_id, body.message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
// endregion: --- Command Handlers

// region:    --- Query Handlers
pub async fn handle_browse_auctions(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<Auction>>, AppError> {
    let filter = params.into_filter()?;
    Ok(Json(state.catalog.browse(&filter).await?))
}

/// 경매 상세 조회
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<AuctionDetails>, AppError> {
    info!("{:<12} --> 경매 상세 조회 id: {}", "HandlerQuery", auction_id);
    Ok(Json(state.auctions.auction_details(auction_id).await?))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<Vec<Bid>>, AppError> {
    Ok(Json(state.bids.bid_history(auction_id).await?))
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<Option<Bid>>, AppError> {
    Ok(Json(state.catalog.highest_bid(auction_id).await?))
}

pub async fn handle_get_outcome(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<Json<Outcome>, AppError> {
    Ok(Json(state.auctions.outcome(auction_id).await?))
}

pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_user(&user_id).await?))
}

pub async fn handle_get_user_auctions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Auction>>, AppError> {
    Ok(Json(state.catalog.auctions_created_by(&user_id).await?))
}

pub async fn handle_get_user_bids(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<BidHistoryEntry>>, AppError> {
    Ok(Json(state.catalog.bid_history(&user_id).await?))
}

pub async fn handle_get_items_won(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Auction>>, AppError> {
    Ok(Json(state.catalog.items_won(&user_id).await?))
}

pub async fn handle_get_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    Ok(Json(state.relay.conversations_for(&user_id).await?))
}

pub async fn handle_get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.relay.messages(conversation_id).await?))
}
// endregion: --- Query Handlers

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::Condition;
    use crate::query::RemainingBucket;

    #[test]
    fn browse_params_split_comma_lists() {
        let params = BrowseParams {
            conditions: Some("USED, NEW_WITH_PACKAGING".into()),
            remaining: Some("LESS_THAN_12_HOURS".into()),
            ..Default::default()
        };
        let filter = params.into_filter().unwrap();
        assert_eq!(
            filter.conditions,
            vec![Condition::Used, Condition::NewWithPackaging]
        );
        assert_eq!(filter.remaining, vec![RemainingBucket::LessThan12Hours]);
        assert!(filter.locations.is_empty());
    }

    #[test]
    fn unknown_filter_value_is_rejected() {
        let params = BrowseParams {
            deliveries: Some("TELEPORT".into()),
            ..Default::default()
        };
        let err = params.into_filter().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }
}
