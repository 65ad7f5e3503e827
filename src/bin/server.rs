use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use warp::{self, Filter};

use sealed_rooms::config::ServerConfig;
use sealed_rooms::constants::WS_PATH;
use sealed_rooms::core::room::RoomRegistry;
use sealed_rooms::core::router::EventRouter;
use sealed_rooms::core::session::SessionManager;
use sealed_rooms::handlers::{handle_ws_client, provision_room};

#[tokio::main]
async fn main() {
    // Load .env before the logger so a RUST_LOG set there is honored
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("environment variables loaded from {}", path.display()),
        Err(e) => warn!("no .env file loaded: {}", e),
    }

    // Load config from the environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("configuration: host={}, port={}", config.host, config.port);

    // Composition root: the one registry instance everything else shares
    let registry = Arc::new(RoomRegistry::new());
    let router = Arc::new(EventRouter::new(registry.clone()));
    let sessions = Arc::new(SessionManager::new(registry.clone()));

    // Create WebSocket route
    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(with_shared(router))
        .and(with_shared(sessions))
        .map(
            |ws: warp::ws::Ws, router: Arc<EventRouter>, sessions: Arc<SessionManager>| {
                info!("new websocket connection");
                ws.on_upgrade(move |socket| handle_ws_client(socket, router, sessions))
            },
        );

    // Create room provisioning route
    let provision_route = warp::path!(String)
        .and(warp::post())
        .and(warp::body::json())
        .and(with_shared(registry))
        .and_then(provision_room);

    // Create health check route
    let health_route = warp::path("health").map(|| "OK");

    // Combine routes
    let routes = ws_route.or(health_route).or(provision_route);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("starting sealed-rooms relay on {}", addr);

    warp::serve(routes).run(addr).await;
}

// Helper function to hand shared state to a route
fn with_shared<T: Clone + Send + Sync + 'static>(
    value: T,
) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}
