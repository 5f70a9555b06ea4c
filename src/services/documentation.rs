//! Aggregated OpenAPI document.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Arena Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::public_rooms,
        crate::routes::rooms::my_rooms,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::spectate,
        crate::routes::rooms::set_ready,
        crate::routes::rooms::kick_player,
        crate::routes::rooms::start_quiz,
        crate::routes::rooms::submit_answer,
        crate::routes::rooms::advance_question,
        crate::routes::rooms::end_room,
        crate::routes::matches::create_match,
        crate::routes::matches::public_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::join_match,
        crate::routes::matches::submit_bet,
        crate::routes::matches::submit_answer,
        crate::routes::matches::advance_question,
        crate::routes::matches::end_match,
        crate::routes::quizzes::generate_quiz,
        crate::routes::stats::track_topic,
        crate::routes::stats::trending_topics,
        crate::routes::stats::save_score,
        crate::routes::stats::save_progress,
        crate::routes::stats::load_progress,
        crate::routes::stats::clear_progress,
        crate::routes::admin::purge_rooms,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateMatchRequest,
            crate::dto::room::CreatedRoomResponse,
            crate::dto::room::JoinRequest,
            crate::dto::room::SpectateRequest,
            crate::dto::room::ReadyRequest,
            crate::dto::room::KickRequest,
            crate::dto::room::HostKeyRequest,
            crate::dto::room::BetRequest,
            crate::dto::room::AnswerRequest,
            crate::dto::room::RoomView,
            crate::dto::room::RoomSummary,
            crate::dto::room::PlayerView,
            crate::dto::room::QuestionView,
            crate::dto::room::AnswerView,
            crate::dto::quiz::GenerateQuizRequest,
            crate::dto::quiz::GeneratedQuizResponse,
            crate::dto::stats::TrackTopicRequest,
            crate::dto::stats::TrendingTopicView,
            crate::dto::stats::SaveScoreRequest,
            crate::dto::stats::SavedScoreResponse,
            crate::dto::stats::SaveProgressRequest,
            crate::dto::stats::ProgressView,
            crate::dto::admin::PurgeResponse,
            crate::error::ErrorBody,
            crate::state::room::RoomKind,
            crate::state::room::RoomStatus,
            crate::state::room::Difficulty,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Multiplayer room lifecycle"),
        (name = "matches", description = "Wagered head-to-head matches"),
        (name = "quizzes", description = "Standalone quiz generation"),
        (name = "stats", description = "Trending topics and solo results"),
        (name = "admin", description = "Administrative operations"),
    )
)]
pub struct ApiDoc;
