pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws;

// Re-export the main handlers to make them easily accessible
// to the binary that will build the web server router.
pub use middleware::require_actor;
pub use rest::{
    cards_handler, matches_handler, publish_listing_handler, rebuild_matches_handler,
    register_actor_handler, report_handler, submit_swipe_handler,
};
pub use ws::ws_handler;
