// region:    --- Auctions
/// 경매 등록
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (title, description, condition, location, delivery, only_verified, seller_verified,
                          start_time, duration_days, duration_hours, end_time, starting_bid, reserve_bid,
                          created_by, thumbnail_url, photo_urls, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    RETURNING *
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = "SELECT * FROM auctions ORDER BY created_at DESC, id DESC";

/// 판매자별 경매 조회
pub const GET_AUCTIONS_BY_CREATOR: &str =
    "SELECT * FROM auctions WHERE created_by = $1 ORDER BY created_at DESC, id DESC";

/// 낙찰자별 경매 조회
pub const GET_AUCTIONS_BY_WINNER: &str =
    "SELECT * FROM auctions WHERE winning_bidder_id = $1 ORDER BY created_at DESC, id DESC";

/// 종료 처리 대상 경매 조회
pub const GET_DUE_AUCTIONS: &str =
    "SELECT * FROM auctions WHERE finished = FALSE AND end_time <= $1 ORDER BY end_time";

/// 입찰 조건부 갱신 (읽은 입찰가와 같고 진행 중일 때만)
pub const COMPARE_AND_SET_BID: &str = r#"
    UPDATE auctions
    SET current_bid = $1, current_bidder_id = $2, winning_bidder_id = $2, version = version + 1
    WHERE id = $3
      AND finished = FALSE
      AND start_time <= $4
      AND end_time > $4
      AND current_bid IS NOT DISTINCT FROM $5
    RETURNING *
"#;

/// 경매 종료 표시
pub const MARK_FINISHED: &str = r#"
    UPDATE auctions SET finished = TRUE, version = version + 1
    WHERE id = $1 AND finished = FALSE AND end_time <= $2
"#;
// endregion: --- Auctions

// region:    --- Bids
/// 입찰 원장 기록
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, user_id, amount, placed_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, user_id, amount, placed_at AS timestamp
"#;

/// 경매 입찰 이력 조회
pub const GET_BIDS_BY_AUCTION: &str = r#"
    SELECT id, auction_id, user_id, amount, placed_at AS timestamp
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at DESC, id DESC
"#;

/// 사용자 입찰 이력 조회
pub const GET_BIDS_BY_USER: &str = r#"
    SELECT id, auction_id, user_id, amount, placed_at AS timestamp
    FROM bids
    WHERE user_id = $1
    ORDER BY placed_at DESC, id DESC
"#;

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, auction_id, user_id, amount, placed_at AS timestamp
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, placed_at ASC
    LIMIT 1
"#;
// endregion: --- Bids

// region:    --- Users
/// 사용자 등록
pub const INSERT_USER: &str = r#"
    INSERT INTO users (id, email, username, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

pub const GET_USER: &str = "SELECT * FROM users WHERE id = $1";

pub const GET_USER_BY_USERNAME: &str = "SELECT * FROM users WHERE username = $1";

pub const GET_USER_BY_EMAIL: &str = "SELECT * FROM users WHERE email = $1";

/// 프로필 병합 수정 (NULL 파라미터는 기존 값 유지)
pub const UPDATE_PROFILE: &str = r#"
    UPDATE users SET
        first_name = COALESCE($2, first_name),
        last_name = COALESCE($3, last_name),
        phone_number = COALESCE($4, phone_number),
        address_line1 = COALESCE($5, address_line1),
        address_line2 = COALESCE($6, address_line2),
        country = COALESCE($7, country),
        city = COALESCE($8, city)
    WHERE id = $1
    RETURNING *
"#;

pub const MARK_VERIFIED: &str = "UPDATE users SET verified = TRUE WHERE id = $1";
// endregion: --- Users

// region:    --- Conversations
pub const GET_CONVERSATION: &str = "SELECT * FROM conversations WHERE id = $1";

pub const GET_CONVERSATION_BY_PAIR: &str =
    "SELECT * FROM conversations WHERE user_low = $1 AND user_high = $2";

/// 대화방 생성 (이미 있으면 아무것도 하지 않음)
pub const INSERT_CONVERSATION: &str = r#"
    INSERT INTO conversations (user_low, user_high)
    VALUES ($1, $2)
    ON CONFLICT (user_low, user_high) DO NOTHING
    RETURNING *
"#;

pub const GET_CONVERSATIONS_BY_USER: &str = r#"
    SELECT * FROM conversations
    WHERE user_low = $1 OR user_high = $1
    ORDER BY updated_at DESC, id DESC
"#;

/// 메시지 기록 (시각은 DB가 기록)
pub const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (conversation_id, sender_id, text)
    VALUES ($1, $2, $3)
    RETURNING id, conversation_id, sender_id, text, sent_at AS timestamp
"#;

pub const TOUCH_CONVERSATION: &str = "UPDATE conversations SET updated_at = $2 WHERE id = $1";

pub const GET_MESSAGES: &str = r#"
    SELECT id, conversation_id, sender_id, text, sent_at AS timestamp
    FROM messages
    WHERE conversation_id = $1
    ORDER BY sent_at ASC, id ASC
"#;

pub const GET_MESSAGE: &str = r#"
    SELECT id, conversation_id, sender_id, text, sent_at AS timestamp
    FROM messages
    WHERE conversation_id = $1 AND id = $2
"#;

pub const GET_LAST_MESSAGE: &str = r#"
    SELECT id, conversation_id, sender_id, text, sent_at AS timestamp
    FROM messages
    WHERE conversation_id = $1
    ORDER BY sent_at DESC, id DESC
    LIMIT 1
"#;

/// 사용자별 마지막 읽은 메시지 갱신
pub const SET_LAST_READ: &str = r#"
    UPDATE conversations
    SET last_read = last_read || jsonb_build_object($2::text, $3::bigint),
        updated_at = now()
    WHERE id = $1
"#;
// endregion: --- Conversations
