/// OpenAPI documentation generation.
pub mod documentation;
/// Game bootstrap and persisted-state access.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Pure hint engine (letter-head extraction and mask rendering).
pub mod hints;
/// Phase manager driving the gameplay loop.
pub mod phase_service;
/// Room membership collaborator seam.
pub mod room_gateway;
/// Pure scoring engine for guesses and drawer bonuses.
pub mod scoring;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage persistence coordinator.
pub mod storage_supervisor;
/// Fire-once timer scheduling with the staleness guard.
pub mod timer_service;
/// Turn manager funnelling every turn conclusion.
pub mod turn_service;
/// Word supply collaborator seam and the bundled dictionary.
pub mod word_bank;
